//! HTTP client for the conversion API.
//!
//! Thin request/response layer: every method maps to one endpoint and returns
//! typed results. All policy (validation, artifact lifecycle, error display)
//! lives in the workflow, not here.

use crate::config::Config;
use crate::errors::{Error, Result};
use crate::session::Session;
use crate::types::{
    ConversionRequest, ConversionResponse, Credentials, FormatsResponse, HealthResponse,
    HistoryEntry, OutputFormat, RawConversionRequest, TokenResponse, FALLBACK_FORMATS,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bytes::Bytes;
use reqwest::{header, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Which `/api/convert` contract the target deployment speaks.
///
/// The envelope contract posts `{content, format}` and answers with a JSON
/// [`ConversionResponse`] carrying base64 file data for binary formats. The
/// raw-binary contract posts `{markdown, format}` and answers with the
/// converted bytes as the response body. A deployment speaks exactly one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireContract {
    #[default]
    Envelope,
    RawBinary,
}

/// Result of a conversion call, split by payload kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertOutcome {
    /// Inline converted text (text-kind formats under the envelope contract)
    Text(String),
    /// Decoded file bytes ready to become a downloadable artifact
    Bytes(Bytes),
}

/// Client for the conversion API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base: String,
    timeout: Duration,
    wire: WireContract,
}

impl ApiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            base: config.api_url.as_str().trim_end_matches('/').to_string(),
            timeout: config.timeout(),
            wire: config.wire,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn get(&self, path: &str, session: &Session) -> reqwest::RequestBuilder {
        let mut req = self.client.get(self.url(path)).timeout(self.timeout);
        if let Some(bearer) = session.bearer() {
            req = req.header(header::AUTHORIZATION, bearer);
        }
        req
    }

    fn post_json<T: Serialize>(
        &self,
        path: &str,
        session: &Session,
        body: &T,
    ) -> reqwest::RequestBuilder {
        let mut req = self.client.post(self.url(path)).timeout(self.timeout).json(body);
        if let Some(bearer) = session.bearer() {
            req = req.header(header::AUTHORIZATION, bearer);
        }
        req
    }

    /// Map a non-2xx response to an error, extracting the API's message when
    /// the body carries one.
    ///
    /// A 401 with a message (e.g., rejected credentials) surfaces that message
    /// verbatim; a bare 401 means the request lacked a usable token.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| {
                v.get("message")
                    .or_else(|| v.get("error"))
                    .and_then(|m| m.as_str())
                    .map(String::from)
            });

        if status == StatusCode::UNAUTHORIZED {
            return match message {
                Some(message) => Err(Error::business(message)),
                None => Err(Error::Unauthenticated),
            };
        }

        Err(Error::business(message.unwrap_or_else(|| {
            if body.is_empty() {
                format!("API returned status {status}")
            } else {
                body
            }
        })))
    }

    /// `GET /api/health`
    pub async fn health(&self) -> Result<HealthResponse> {
        let response = self.get("/api/health", &Session::new()).send().await?;
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }

    /// `GET /api/formats`, falling back to `["html", "txt"]` when the endpoint
    /// is unreachable or answers badly.
    pub async fn formats(&self) -> Vec<String> {
        match self.try_formats().await {
            Ok(formats) => formats,
            Err(err) => {
                warn!(error = %err, "failed to load available formats, using fallback");
                FALLBACK_FORMATS.iter().map(|s| s.to_string()).collect()
            }
        }
    }

    async fn try_formats(&self) -> Result<Vec<String>> {
        let response = self.get("/api/formats", &Session::new()).send().await?;
        let response = Self::check_status(response).await?;
        let formats: FormatsResponse = response.json().await?;
        Ok(formats.formats)
    }

    /// `POST /api/convert` under the configured wire contract.
    #[instrument(skip(self, session, content), fields(format = %format, wire = ?self.wire, content_len = content.len()))]
    pub async fn convert(
        &self,
        session: &Session,
        content: &str,
        format: OutputFormat,
    ) -> Result<ConvertOutcome> {
        match self.wire {
            WireContract::Envelope => {
                let body = ConversionRequest {
                    content: content.to_string(),
                    format: format.as_str().to_string(),
                };
                let response = self.post_json("/api/convert", session, &body).send().await?;
                let response = Self::check_status(response).await?;
                let envelope: ConversionResponse = response.json().await?;

                if !envelope.success {
                    return Err(Error::business(envelope.message));
                }

                match envelope.file_data {
                    Some(data) => {
                        let bytes = BASE64.decode(data.as_bytes())?;
                        debug!(decoded_len = bytes.len(), "decoded file payload");
                        Ok(ConvertOutcome::Bytes(Bytes::from(bytes)))
                    }
                    None => Ok(ConvertOutcome::Text(envelope.converted_content)),
                }
            }
            WireContract::RawBinary => {
                let body = RawConversionRequest {
                    markdown: content.to_string(),
                    format: format.as_str().to_string(),
                };
                let response = self.post_json("/api/convert", session, &body).send().await?;
                let response = Self::check_status(response).await?;
                Ok(ConvertOutcome::Bytes(response.bytes().await?))
            }
        }
    }

    /// `POST /api/auth/login`; on success the token is stored in the session,
    /// overwriting any prior value.
    pub async fn login(&self, session: &mut Session, email: &str, password: &str) -> Result<()> {
        let token = self.authenticate("/api/auth/login", email, password).await?;
        session.set_token(token)
    }

    /// `POST /api/auth/register`; same token semantics as login.
    pub async fn register(&self, session: &mut Session, email: &str, password: &str) -> Result<()> {
        let token = self.authenticate("/api/auth/register", email, password).await?;
        session.set_token(token)
    }

    async fn authenticate(&self, path: &str, email: &str, password: &str) -> Result<String> {
        let body = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self.post_json(path, &Session::new(), &body).send().await?;
        let response = Self::check_status(response).await?;
        let token: TokenResponse = response.json().await?;
        Ok(token.token)
    }

    /// `GET /api/history` - entries in server-defined order.
    pub async fn history(&self, session: &Session) -> Result<Vec<HistoryEntry>> {
        let response = self.get("/api/history", session).send().await?;
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }

    /// `GET /api/history/{id}` - raw bytes of a stored conversion.
    pub async fn history_download(&self, session: &Session, id: i64) -> Result<Bytes> {
        let response = self
            .get(&format!("/api/history/{id}"), session)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        Ok(response.bytes().await?)
    }
}
