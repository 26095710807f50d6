//! Downloadable artifact lifecycle.
//!
//! A successful binary conversion produces a byte buffer that is registered
//! with an [`ArtifactStore`] and referenced through an opaque [`ArtifactId`],
//! mirroring the create/revoke pairing of browser object URLs. The workflow
//! owning an [`Artifact`] must release its id exactly once, either when the
//! artifact is superseded by a newer conversion or when the workflow is
//! cleared.

use crate::errors::Result;
use bytes::Bytes;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use uuid::Uuid;

/// Opaque reference to registered artifact bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArtifactId(Uuid);

impl ArtifactId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Convert to a short, readable string format.
    pub fn to_short_string(&self) -> String {
        let hex = format!("{:x}", self.0.as_u128());
        format!("art_{}", &hex[..8])
    }
}

impl std::fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_short_string())
    }
}

/// A downloadable artifact held by a workflow instance.
///
/// Owns no bytes itself; the bytes live in the store under `id` until the
/// workflow releases them.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub id: ArtifactId,
    /// MIME type inferred from the requested format
    pub mime: &'static str,
    /// Filename used when the artifact is saved
    pub filename: String,
    /// Decoded payload length in bytes
    pub len: usize,
}

/// Storage for artifact byte buffers.
///
/// Separated behind a trait so tests can observe register/release pairing
/// without touching workflow internals.
pub trait ArtifactStore: Send + Sync {
    /// Register a byte buffer and return a reference to it.
    fn register(&self, bytes: Bytes) -> ArtifactId;

    /// Read the bytes behind a reference, if it is still registered.
    fn read(&self, id: ArtifactId) -> Option<Bytes>;

    /// Release a reference. Releasing an unknown or already-released id is a
    /// no-op.
    fn release(&self, id: ArtifactId);
}

/// Production artifact store keeping buffers in process memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: Mutex<HashMap<ArtifactId, Bytes>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently registered (not yet released) artifacts.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("artifact store poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ArtifactStore for InMemoryStore {
    fn register(&self, bytes: Bytes) -> ArtifactId {
        let id = ArtifactId::new();
        self.entries
            .lock()
            .expect("artifact store poisoned")
            .insert(id, bytes);
        id
    }

    fn read(&self, id: ArtifactId) -> Option<Bytes> {
        self.entries
            .lock()
            .expect("artifact store poisoned")
            .get(&id)
            .cloned()
    }

    fn release(&self, id: ArtifactId) {
        self.entries
            .lock()
            .expect("artifact store poisoned")
            .remove(&id);
    }
}

/// Destination for the save action triggered by a download.
pub trait SaveSink: Send + Sync {
    /// Write the artifact bytes under the given filename, returning the final
    /// location.
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// Saves artifacts as files under a fixed output directory.
#[derive(Debug, Clone)]
pub struct FsSink {
    dir: PathBuf,
}

impl FsSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SaveSink for FsSink {
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(filename);
        std::fs::write(&path, bytes)?;
        tracing::info!(path = %path.display(), len = bytes.len(), "saved artifact");
        Ok(path)
    }
}

// ============================================================================
// Test/Mock Implementations
// ============================================================================

/// Artifact store that records releases, for asserting lifecycle pairing.
///
/// Delegates storage to an [`InMemoryStore`] and keeps a log of every release
/// call, including releases of already-removed ids.
#[derive(Debug, Default)]
pub struct MockArtifactStore {
    inner: InMemoryStore,
    releases: Mutex<Vec<ArtifactId>>,
    registrations: Mutex<Vec<ArtifactId>>,
}

impl MockArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of release calls made so far.
    pub fn release_count(&self) -> usize {
        self.releases.lock().expect("mock store poisoned").len()
    }

    /// Number of register calls made so far.
    pub fn register_count(&self) -> usize {
        self.registrations.lock().expect("mock store poisoned").len()
    }

    /// Number of artifacts currently held.
    pub fn live_count(&self) -> usize {
        self.inner.len()
    }

    /// Ids released so far, in order.
    pub fn released(&self) -> Vec<ArtifactId> {
        self.releases.lock().expect("mock store poisoned").clone()
    }
}

impl ArtifactStore for MockArtifactStore {
    fn register(&self, bytes: Bytes) -> ArtifactId {
        let id = self.inner.register(bytes);
        self.registrations
            .lock()
            .expect("mock store poisoned")
            .push(id);
        id
    }

    fn read(&self, id: ArtifactId) -> Option<Bytes> {
        self.inner.read(id)
    }

    fn release(&self, id: ArtifactId) {
        self.releases.lock().expect("mock store poisoned").push(id);
        self.inner.release(id);
    }
}

/// Save sink that records saves instead of touching the filesystem.
#[derive(Debug, Default)]
pub struct MockSaveSink {
    saves: Mutex<Vec<(String, usize)>>,
}

impl MockSaveSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_count(&self) -> usize {
        self.saves.lock().expect("mock sink poisoned").len()
    }

    /// Recorded (filename, byte length) pairs, in order.
    pub fn saves(&self) -> Vec<(String, usize)> {
        self.saves.lock().expect("mock sink poisoned").clone()
    }
}

impl SaveSink for MockSaveSink {
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        self.saves
            .lock()
            .expect("mock sink poisoned")
            .push((filename.to_string(), bytes.len()));
        Ok(PathBuf::from(filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_read_round_trips() {
        let store = InMemoryStore::new();
        let id = store.register(Bytes::from_static(b"%PDF-1.4"));
        assert_eq!(store.read(id).unwrap().as_ref(), b"%PDF-1.4");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn release_removes_bytes() {
        let store = InMemoryStore::new();
        let id = store.register(Bytes::from_static(b"data"));
        store.release(id);
        assert!(store.read(id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn releasing_unknown_id_is_a_noop() {
        let store = InMemoryStore::new();
        let id = store.register(Bytes::from_static(b"data"));
        store.release(id);
        store.release(id);
        assert!(store.is_empty());
    }

    #[test]
    fn mock_store_records_lifecycle() {
        let store = MockArtifactStore::new();
        let id = store.register(Bytes::from_static(b"one"));
        assert_eq!(store.register_count(), 1);
        assert_eq!(store.live_count(), 1);

        store.release(id);
        assert_eq!(store.release_count(), 1);
        assert_eq!(store.released(), vec![id]);
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn fs_sink_writes_under_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FsSink::new(dir.path());
        let path = sink.save("output.pdf", b"%PDF-1.4").unwrap();
        assert_eq!(path, dir.path().join("output.pdf"));
        assert_eq!(std::fs::read(path).unwrap(), b"%PDF-1.4");
    }
}
