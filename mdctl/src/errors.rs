use thiserror::Error as ThisError;

/// Result type for mdctl operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Message shown when the API cannot be reached; the underlying transport
/// error goes to the log, not the user.
pub const CONNECTIVITY_MESSAGE: &str =
    "Failed to convert markdown. Make sure the API server is running.";

/// Errors that can occur while talking to the conversion API.
///
/// The first four variants are the terminal outcomes of a conversion attempt;
/// none of them is retried automatically. Everything below them is ambient
/// (config, filesystem, serialization).
#[derive(Debug, ThisError)]
pub enum Error {
    /// Input rejected before any network call was made
    #[error("{message}")]
    Validation { message: String },

    /// Network or connection failure while reaching the API
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API responded but reported a failure; the message is shown verbatim
    #[error("{message}")]
    Business { message: String },

    /// The encoded file payload could not be materialized into bytes
    #[error("Invalid file payload: {0}")]
    Decode(#[from] base64::DecodeError),

    /// A conversion is already in flight on this workflow instance
    #[error("A conversion is already in progress")]
    Busy,

    /// Format string not in the supported set
    #[error("Unsupported output format: {format}")]
    UnknownFormat { format: String },

    /// The endpoint requires a token and the session does not hold one
    #[error("Not authenticated")]
    Unauthenticated,

    /// Configuration loading failed
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    /// Filesystem operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
        }
    }

    pub fn business(message: impl Into<String>) -> Self {
        Error::Business {
            message: message.into(),
        }
    }

    /// Returns a user-safe error message, without leaking transport internals.
    ///
    /// Transport failures are genericized; the underlying error is expected to
    /// be logged by the caller. Business and validation messages pass through
    /// verbatim.
    pub fn user_message(&self) -> String {
        match self {
            Error::Transport(_) => CONNECTIVITY_MESSAGE.to_string(),
            Error::Decode(_) => "Failed to prepare the converted file for download.".to_string(),
            Error::Io(_) => "Failed to write the output file.".to_string(),
            Error::Json(_) => "The API returned an unexpected response.".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_message_passes_through_verbatim() {
        let err = Error::business("Invalid format");
        assert_eq!(err.user_message(), "Invalid format");
        assert_eq!(err.to_string(), "Invalid format");
    }

    #[test]
    fn validation_message_passes_through_verbatim() {
        let err = Error::validation("Please enter some markdown content");
        assert_eq!(err.user_message(), "Please enter some markdown content");
    }

    #[tokio::test]
    async fn transport_error_maps_to_the_connectivity_message() {
        // Nothing listens on this port.
        let source = reqwest::Client::new()
            .get("http://127.0.0.1:9/api/health")
            .send()
            .await
            .unwrap_err();
        let err = Error::from(source);
        assert_eq!(err.user_message(), CONNECTIVITY_MESSAGE);
    }

    #[test]
    fn decode_error_is_genericized_for_users() {
        use base64::Engine as _;
        let source = base64::engine::general_purpose::STANDARD
            .decode("not valid base64!!!")
            .unwrap_err();
        let err = Error::from(source);
        assert!(err.user_message().contains("download"));
        assert!(err.to_string().starts_with("Invalid file payload"));
    }
}
