//! Session state for authenticated API calls.
//!
//! The token lives in an explicit `Session` value that is passed to the
//! `ApiClient`, never in ambient global storage. When constructed with a
//! backing file the token survives across invocations; the file holds exactly
//! one token and each successful login overwrites it.

use crate::errors::Result;
use std::fs;
use std::path::PathBuf;

/// Holds the bearer token for the current user, with optional file persistence.
#[derive(Debug, Clone, Default)]
pub struct Session {
    token: Option<String>,
    path: Option<PathBuf>,
}

impl Session {
    /// Create an in-memory session with no token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session backed by a token file, reading any persisted token.
    ///
    /// A missing file is not an error; it just means nobody has logged in yet.
    pub fn load(path: PathBuf) -> Result<Self> {
        let token = match fs::read_to_string(&path) {
            Ok(contents) => {
                let trimmed = contents.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => return Err(err.into()),
        };

        Ok(Self {
            token,
            path: Some(path),
        })
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// `Authorization` header value for the held token, if any.
    pub fn bearer(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {t}"))
    }

    /// Store a new token, overwriting any prior value.
    ///
    /// Persists to the backing file when one is configured.
    pub fn set_token(&mut self, token: String) -> Result<()> {
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, &token)?;
        }
        self.token = Some(token);
        Ok(())
    }

    /// Drop the held token and remove the backing file if present.
    pub fn clear(&mut self) -> Result<()> {
        self.token = None;
        if let Some(path) = &self.path {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_session_starts_unauthenticated() {
        let session = Session::new();
        assert!(!session.is_authenticated());
        assert!(session.bearer().is_none());
    }

    #[test]
    fn set_token_overwrites_prior_value() {
        let mut session = Session::new();
        session.set_token("first".to_string()).unwrap();
        session.set_token("second".to_string()).unwrap();
        assert_eq!(session.token(), Some("second"));
        assert_eq!(session.bearer().unwrap(), "Bearer second");
    }

    #[test]
    fn token_persists_across_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");

        let mut session = Session::load(path.clone()).unwrap();
        assert!(!session.is_authenticated());
        session.set_token("abc123".to_string()).unwrap();

        let reloaded = Session::load(path).unwrap();
        assert_eq!(reloaded.token(), Some("abc123"));
    }

    #[test]
    fn clear_removes_token_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");

        let mut session = Session::load(path.clone()).unwrap();
        session.set_token("abc123".to_string()).unwrap();
        session.clear().unwrap();
        assert!(!path.exists());

        // Clearing again with nothing held is a no-op.
        session.clear().unwrap();
    }
}
