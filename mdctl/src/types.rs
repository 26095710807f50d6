use crate::errors::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Formats the API caller falls back to when the formats endpoint is unreachable.
pub const FALLBACK_FORMATS: [&str; 2] = ["html", "txt"];

/// Body for `POST /api/convert` under the JSON envelope contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRequest {
    /// Raw markdown text to convert
    pub content: String,

    /// Target output format (e.g., "html", "pdf")
    pub format: String,
}

/// Body for `POST /api/convert` under the raw-binary contract.
///
/// The raw-binary deployment names the text field `markdown` and answers with
/// the converted bytes directly instead of a JSON envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawConversionRequest {
    pub markdown: String,
    pub format: String,
}

/// Envelope returned by `POST /api/convert` under the JSON contract.
///
/// For a successful response exactly one of `converted_content` (text-kind
/// formats) and `file_data` (binary-kind formats, base64-encoded) carries the
/// result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversionResponse {
    pub success: bool,

    /// Converted output for text-kind formats
    pub converted_content: String,

    /// Echo of the requested format
    pub format: String,

    /// Error detail when `success` is false
    pub message: String,

    /// Base64-encoded file bytes for binary-kind formats
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_data: Option<String>,
}

/// Response from `GET /api/health`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthResponse {
    pub message: String,
    pub status: String,
}

/// Response from `GET /api/formats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatsResponse {
    pub formats: Vec<String>,
    pub message: String,
}

/// Body for `POST /api/auth/login` and `POST /api/auth/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Response from the auth endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenResponse {
    pub token: String,
}

/// One entry from `GET /api/history`. Server-defined order, read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub filename: String,
}

/// Whether a conversion's output comes back inline as text or as file bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Text,
    Binary,
}

/// The output formats the client knows how to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Html,
    Txt,
    Pdf,
    Docx,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Txt => "txt",
            OutputFormat::Pdf => "pdf",
            OutputFormat::Docx => "docx",
        }
    }

    /// File extension used when materializing a download.
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    /// MIME type for a downloadable artifact of this format.
    pub fn mime(&self) -> &'static str {
        match self {
            OutputFormat::Html => "text/html",
            OutputFormat::Txt => "text/plain",
            OutputFormat::Pdf => "application/pdf",
            OutputFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    /// Whether this format yields inline text or encoded file bytes.
    pub fn payload_kind(&self) -> PayloadKind {
        match self {
            OutputFormat::Html | OutputFormat::Txt => PayloadKind::Text,
            OutputFormat::Pdf | OutputFormat::Docx => PayloadKind::Binary,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "html" => Ok(OutputFormat::Html),
            "txt" => Ok(OutputFormat::Txt),
            "pdf" => Ok(OutputFormat::Pdf),
            "docx" => Ok(OutputFormat::Docx),
            other => Err(Error::UnknownFormat {
                format: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parsing_is_case_insensitive() {
        assert_eq!("PDF".parse::<OutputFormat>().unwrap(), OutputFormat::Pdf);
        assert_eq!("html".parse::<OutputFormat>().unwrap(), OutputFormat::Html);
        assert_eq!("Docx".parse::<OutputFormat>().unwrap(), OutputFormat::Docx);
    }

    #[test]
    fn unknown_format_is_rejected() {
        let err = "rtf".parse::<OutputFormat>().unwrap_err();
        assert!(matches!(err, Error::UnknownFormat { format } if format == "rtf"));
    }

    #[test]
    fn payload_kind_matches_format() {
        assert_eq!(OutputFormat::Html.payload_kind(), PayloadKind::Text);
        assert_eq!(OutputFormat::Txt.payload_kind(), PayloadKind::Text);
        assert_eq!(OutputFormat::Pdf.payload_kind(), PayloadKind::Binary);
        assert_eq!(OutputFormat::Docx.payload_kind(), PayloadKind::Binary);
    }

    #[test]
    fn mime_types() {
        assert_eq!(OutputFormat::Pdf.mime(), "application/pdf");
        assert_eq!(OutputFormat::Html.mime(), "text/html");
    }

    #[test]
    fn conversion_response_uses_camel_case_on_the_wire() {
        let json = r#"{
            "success": true,
            "convertedContent": "<h1>Title</h1>",
            "format": "html",
            "message": ""
        }"#;
        let response: ConversionResponse = serde_json::from_str(json).unwrap();
        assert!(response.success);
        assert_eq!(response.converted_content, "<h1>Title</h1>");
        assert!(response.file_data.is_none());
    }

    #[test]
    fn conversion_response_tolerates_missing_fields() {
        let response: ConversionResponse =
            serde_json::from_str(r#"{"success": false, "message": "Invalid format"}"#).unwrap();
        assert!(!response.success);
        assert_eq!(response.message, "Invalid format");
        assert!(response.converted_content.is_empty());
    }
}
