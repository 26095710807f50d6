//! Client for a remote markdown conversion API.
//!
//! This crate drives the conversion workflow against an HTTP API that does the
//! actual rendering:
//! - Submits markdown with a target format and interprets the response as
//!   inline text (html/txt) or a base64-encoded file payload (pdf/docx)
//! - Manages the lifecycle of downloadable artifacts (register, save, release)
//! - Handles login/registration with token storage in an explicit session
//! - Lists conversion history and downloads stored entries
//!
//! # Example
//! ```ignore
//! use mdctl::{ApiClient, Config, ConversionWorkflow, InMemoryStore, OutputFormat, Session};
//!
//! let config = Config::default();
//! let client = ApiClient::new(&config);
//! let store = Arc::new(InMemoryStore::new());
//! let mut workflow = ConversionWorkflow::new(client, store);
//!
//! workflow.convert(&Session::new(), "# Title", OutputFormat::Html).await?;
//! println!("{}", workflow.output().unwrap_or_default());
//! ```

pub mod api;
pub mod artifact;
pub mod config;
pub mod errors;
pub mod session;
pub mod types;
pub mod workflow;

// Re-export commonly used types
pub use api::{ApiClient, ConvertOutcome, WireContract};
pub use artifact::{Artifact, ArtifactId, ArtifactStore, FsSink, InMemoryStore, SaveSink};
pub use config::{Args, Config};
pub use errors::{Error, Result};
pub use session::Session;
pub use types::*;
pub use workflow::{ConversionWorkflow, Phase};
