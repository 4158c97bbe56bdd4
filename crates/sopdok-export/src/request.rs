//! Export request model and validation

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sopdok_ooxml::DOCX_MIME_TYPE;

use crate::error::{ExportError, Result};

/// File stem used when a document has no usable title
pub const DEFAULT_FILE_STEM: &str = "document";

/// Output format of an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Docx,
}

impl ExportFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => DOCX_MIME_TYPE,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" | "word" => Ok(Self::Docx),
            other => Err(ExportError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Document metadata sent along with the HTML
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportMetadata {
    pub title: Option<String>,
    /// Revision date / status line shown in the document footer
    pub stand: Option<String>,
    pub document_id: Option<String>,
}

/// Request body as received, before validation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawExportRequest {
    pub html: Option<String>,
    pub format: Option<String>,
    pub metadata: Option<ExportMetadata>,
    pub cache_key: Option<String>,
}

impl RawExportRequest {
    /// Check mandatory fields and parse the format
    pub fn validate(self) -> Result<ExportRequest> {
        let html = self
            .html
            .filter(|h| !h.trim().is_empty())
            .ok_or(ExportError::MissingField("html"))?;
        let format = self
            .format
            .filter(|f| !f.trim().is_empty())
            .ok_or(ExportError::MissingField("format"))?
            .parse()?;
        let cache_key = self
            .cache_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        Ok(ExportRequest {
            html,
            format,
            metadata: self.metadata.unwrap_or_default(),
            cache_key,
        })
    }
}

/// A validated export request
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    pub html: String,
    pub format: ExportFormat,
    pub metadata: ExportMetadata,
    /// Caller-chosen key identifying the rendered content
    pub cache_key: Option<String>,
}

impl ExportRequest {
    pub fn new(html: impl Into<String>, format: ExportFormat) -> Self {
        Self {
            html: html.into(),
            format,
            metadata: ExportMetadata::default(),
            cache_key: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.metadata.title = Some(title.into());
        self
    }

    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    /// Parse and validate a JSON body
    pub fn from_json(body: &[u8]) -> Result<Self> {
        let raw: RawExportRequest = serde_json::from_slice(body)?;
        raw.validate()
    }

    /// Title with whitespace trimmed, if any
    pub fn title(&self) -> Option<&str> {
        self.metadata
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Download file name derived from the title
    pub fn file_name(&self) -> String {
        file_name_for(self.title(), self.format)
    }
}

/// `<title>.<ext>` with characters that break file systems removed
pub fn file_name_for(title: Option<&str>, format: ExportFormat) -> String {
    let stem: String = title
        .unwrap_or_default()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let stem = stem.trim().trim_matches('.');
    let stem = if stem.is_empty() { DEFAULT_FILE_STEM } else { stem };
    format!("{}.{}", stem, format.extension())
}

/// `Content-Disposition` value for an attachment download
///
/// Carries an ASCII fallback `filename` and an RFC 5987 `filename*` for
/// titles with non-ASCII characters.
pub fn content_disposition(file_name: &str) -> String {
    let ascii: String = file_name
        .chars()
        .map(|c| if c.is_ascii() && c != '"' { c } else { '_' })
        .collect();
    if ascii == file_name {
        format!("attachment; filename=\"{}\"", ascii)
    } else {
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            ascii,
            percent_encode(file_name)
        )
    }
}

fn percent_encode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{:02X}", b),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_full_request() {
        let body = br#"{
            "html": "<html><body><div class=\"sop-page\">1</div></body></html>",
            "format": "docx",
            "metadata": {"title": "Hand Hygiene", "stand": "2024-03", "documentId": "SOP-12"},
            "cacheKey": "abc123"
        }"#;
        let request = ExportRequest::from_json(body).unwrap();
        assert_eq!(request.format, ExportFormat::Docx);
        assert_eq!(request.metadata.document_id.as_deref(), Some("SOP-12"));
        assert_eq!(request.cache_key.as_deref(), Some("abc123"));
        assert_eq!(request.file_name(), "Hand Hygiene.docx");
    }

    #[test]
    fn test_missing_html() {
        let err = ExportRequest::from_json(br#"{"format": "pdf"}"#).unwrap_err();
        assert!(matches!(err, ExportError::MissingField("html")));
        let err = ExportRequest::from_json(br#"{"html": "  ", "format": "pdf"}"#).unwrap_err();
        assert!(matches!(err, ExportError::MissingField("html")));
    }

    #[test]
    fn test_missing_or_unknown_format() {
        let err = ExportRequest::from_json(br#"{"html": "<p>x</p>"}"#).unwrap_err();
        assert!(matches!(err, ExportError::MissingField("format")));
        let err = ExportRequest::from_json(br#"{"html": "<p>x</p>", "format": "odt"}"#)
            .unwrap_err();
        assert!(matches!(err, ExportError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            ExportRequest::from_json(b"{html:"),
            Err(ExportError::InvalidBody(_))
        ));
    }

    #[test]
    fn test_blank_cache_key_is_ignored() {
        let request =
            ExportRequest::from_json(br#"{"html": "<p/>", "format": "pdf", "cacheKey": " "}"#)
                .unwrap();
        assert_eq!(request.cache_key, None);
    }

    #[test]
    fn test_file_name_sanitized() {
        assert_eq!(
            file_name_for(Some("SOP 1/2: Cleaning?"), ExportFormat::Pdf),
            "SOP 1_2_ Cleaning_.pdf"
        );
        assert_eq!(file_name_for(Some("  "), ExportFormat::Docx), "document.docx");
        assert_eq!(file_name_for(None, ExportFormat::Pdf), "document.pdf");
    }

    #[test]
    fn test_content_disposition_ascii() {
        assert_eq!(
            content_disposition("Hand Hygiene.pdf"),
            "attachment; filename=\"Hand Hygiene.pdf\""
        );
    }

    #[test]
    fn test_content_disposition_unicode() {
        assert_eq!(
            content_disposition("Prüfung.pdf"),
            "attachment; filename=\"Pr_fung.pdf\"; filename*=UTF-8''Pr%C3%BCfung.pdf"
        );
    }
}
