//! Conversion workflow and its state machine.
//!
//! One `ConversionWorkflow` instance owns its state exclusively and models at
//! most one outstanding conversion. A conversion attempt moves through
//! `Idle -> Requesting -> (Failed | DisplayingText | ArtifactReady)`; any
//! terminal phase transitions back through the next `convert()` or `clear()`.

use crate::api::{ApiClient, ConvertOutcome};
use crate::artifact::{Artifact, ArtifactStore, SaveSink};
use crate::errors::{Error, Result};
use crate::session::Session;
use crate::types::{HistoryEntry, OutputFormat};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, instrument};

pub use crate::errors::CONNECTIVITY_MESSAGE;

/// Message shown when `convert()` is called with nothing to convert.
pub const EMPTY_CONTENT_MESSAGE: &str = "Please enter some markdown content";

/// Phase of the current (or last) conversion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No attempt made yet, or state was cleared
    Idle,
    /// Request in flight
    Requesting,
    /// Attempt succeeded with inline text output
    DisplayingText,
    /// Attempt succeeded with a downloadable artifact held
    ArtifactReady,
    /// Attempt ended in one of the terminal errors
    Failed,
}

impl Phase {
    /// Check if this phase represents a finished attempt.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Phase::DisplayingText | Phase::ArtifactReady | Phase::Failed
        )
    }
}

/// Drives conversion attempts against the API and owns the resulting state.
///
/// The workflow holds at most one artifact at a time; a held artifact is
/// released exactly once, either when a newer conversion supersedes it or on
/// [`clear`](ConversionWorkflow::clear).
pub struct ConversionWorkflow {
    client: ApiClient,
    store: Arc<dyn ArtifactStore>,
    content: String,
    output: Option<String>,
    error: Option<String>,
    busy: bool,
    artifact: Option<Artifact>,
    phase: Phase,
}

impl ConversionWorkflow {
    pub fn new(client: ApiClient, store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            client,
            store,
            content: String::new(),
            output: None,
            error: None,
            busy: false,
            artifact: None,
            phase: Phase::Idle,
        }
    }

    /// Run one conversion attempt.
    ///
    /// Empty (after trimming) content fails with a validation error before any
    /// network call. A new attempt while one is in flight is rejected, not
    /// queued. On success the previous output and artifact are superseded; on
    /// failure exactly one user-facing error string is recorded and the error
    /// is also returned to the caller.
    #[instrument(skip(self, session, content), fields(format = %format))]
    pub async fn convert(
        &mut self,
        session: &Session,
        content: &str,
        format: OutputFormat,
    ) -> Result<()> {
        if self.busy {
            return Err(Error::Busy);
        }

        if content.trim().is_empty() {
            let err = Error::validation(EMPTY_CONTENT_MESSAGE);
            self.error = Some(err.user_message());
            self.phase = Phase::Failed;
            return Err(err);
        }

        self.busy = true;
        self.error = None;
        self.output = None;
        self.release_artifact();
        self.content = content.to_string();
        self.phase = Phase::Requesting;

        let result = self.client.convert(session, content, format).await;
        self.busy = false;

        match result {
            Ok(ConvertOutcome::Text(text)) => {
                debug!(output_len = text.len(), "conversion produced inline text");
                self.output = Some(text);
                self.phase = Phase::DisplayingText;
                Ok(())
            }
            Ok(ConvertOutcome::Bytes(bytes)) => {
                let len = bytes.len();
                let id = self.store.register(bytes);
                self.artifact = Some(Artifact {
                    id,
                    mime: format.mime(),
                    filename: format!("output.{}", format.extension()),
                    len,
                });
                debug!(artifact = %id, len, "conversion produced downloadable artifact");
                self.phase = Phase::ArtifactReady;
                Ok(())
            }
            Err(err) => {
                match &err {
                    Error::Transport(source) => {
                        error!(error = %source, "conversion request failed");
                        self.error = Some(CONNECTIVITY_MESSAGE.to_string());
                    }
                    other => {
                        self.error = Some(other.user_message());
                    }
                }
                self.phase = Phase::Failed;
                Err(err)
            }
        }
    }

    /// Reset content, output, error and the busy flag, and release any held
    /// artifact.
    ///
    /// Safe to call with nothing held; a second call is a no-op. Also recovers
    /// an instance whose in-flight `convert()` future was dropped at the await
    /// point, which would otherwise leave the busy flag set forever.
    pub fn clear(&mut self) {
        self.content.clear();
        self.output = None;
        self.error = None;
        self.busy = false;
        self.release_artifact();
        self.phase = Phase::Idle;
    }

    /// Save the held artifact through the sink.
    ///
    /// Returns `Ok(None)` without touching the sink when no artifact is held.
    /// Does not release the artifact, so repeated downloads work.
    pub fn download(&self, sink: &dyn SaveSink) -> Result<Option<PathBuf>> {
        let Some(artifact) = &self.artifact else {
            return Ok(None);
        };
        let Some(bytes) = self.store.read(artifact.id) else {
            return Ok(None);
        };
        let path = sink.save(&artifact.filename, &bytes)?;
        Ok(Some(path))
    }

    /// Fetch a stored conversion and save it through the same sink mechanism
    /// as [`download`](ConversionWorkflow::download).
    pub async fn download_history_entry(
        &self,
        session: &Session,
        entry: &HistoryEntry,
        sink: &dyn SaveSink,
    ) -> Result<PathBuf> {
        let bytes = self.client.history_download(session, entry.id).await?;
        sink.save(&entry.filename, &bytes)
    }

    fn release_artifact(&mut self) {
        if let Some(artifact) = self.artifact.take() {
            self.store.release(artifact.id);
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Converted text from the last successful text-format attempt.
    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    /// The single user-visible error string, if the last attempt failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn held_artifact(&self) -> Option<&Artifact> {
        self.artifact.as_ref()
    }
}
