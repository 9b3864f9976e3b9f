//! Error types for niem_translate
//!
//! Mirrors the error taxonomy of the assembler/compiler/translator pipeline:
//! bootstrap failures are fatal, assembly/schema warnings accumulate into
//! lists the caller inspects, and I/O or format errors surface immediately.

use std::fmt;
use thiserror::Error;

/// Result type alias using the crate's `Error`
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for niem_translate operations
#[derive(Error, Debug)]
pub enum Error {
    /// Parser/engine unavailable; fatal, exit 2 from the CLI
    #[error("bootstrap error: {0}")]
    Bootstrap(String),

    /// Initial-input inconsistency; reported but callers may continue with `-i`
    #[error("init error: {0}")]
    Init(String),

    /// The XML-Schema engine could not build a consistent model
    #[error("schema construction error: {0}")]
    SchemaConstruction(String),

    /// Corrupted or unparsable translation-model file
    #[error("format error: {0}")]
    Format(String),

    /// XML Schema parsing/building error
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// XML Schema or XML Catalog structural validation error
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A catalog document is syntactically invalid
    #[error("catalog parse error: {0}")]
    CatalogParse(String),

    /// A catalog file could not be read
    #[error("catalog I/O error: {0}")]
    CatalogIo(String),

    /// Name error (invalid XML Name/NCName/QName)
    #[error("name error: {0}")]
    Name(String),

    /// Namespace error
    #[error("namespace error: {0}")]
    Namespace(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// Resource loading error
    #[error("resource error: {0}")]
    Resource(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML event parsing error
    #[error("XML error: {0}")]
    Xml(String),

    /// URL parsing error
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<quick_xml::Error> for Error {
    fn from(e: quick_xml::Error) -> Self {
        Error::Xml(e.to_string())
    }
}

/// A catalog load attempt's outcome: success or a list of parse errors.
///
/// `set_catalogs` records one of these per configured file, and keeps going
/// past individual failures (spec §4.1: "parse failures on one catalog must
/// not abort the others").
#[derive(Debug, Clone)]
pub enum CatalogParseResult {
    /// The catalog (and any `nextCatalog` it references) parsed cleanly
    Ok,
    /// The catalog failed to parse; the listed errors were collected
    Err(Vec<String>),
}

impl CatalogParseResult {
    /// True if this result represents success
    pub fn is_ok(&self) -> bool {
        matches!(self, CatalogParseResult::Ok)
    }
}

/// XML Schema / XML Catalog parsing error
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Error message
    pub message: String,
    /// Location in the source document (`file:line`)
    pub location: Option<String>,
    /// Schema or catalog source that caused the error
    pub source: Option<String>,
}

impl ParseError {
    /// Create a new parse error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            source: None,
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the source
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref loc) = self.location {
            write!(f, " (at {})", loc)?;
        }
        if let Some(ref src) = self.source {
            write!(f, "\n\nSource:\n{}", src)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// Structural validation error (malformed catalog, schema component shape)
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Error message
    pub message: String,
    /// Path to the element that failed validation
    pub path: Option<String>,
    /// Reason for the failure
    pub reason: Option<String>,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
            reason: None,
        }
    }

    /// Set the path where validation failed
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the reason
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref reason) = self.reason {
            write!(f, "\n\nReason: {}", reason)?;
        }
        if let Some(ref path) = self.path {
            write!(f, "\n\nPath: {}", path)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("catalog root must be <catalog>")
            .with_reason("found <foo>")
            .with_path("catalog.xml");

        let msg = format!("{}", err);
        assert!(msg.contains("catalog root must be"));
        assert!(msg.contains("Reason:"));
        assert!(msg.contains("Path:"));
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::new("unexpected end tag")
            .with_location("schema.xsd:42")
            .with_source("<xs:element name='bad'>");

        let msg = format!("{}", err);
        assert!(msg.contains("unexpected end tag"));
        assert!(msg.contains("schema.xsd:42"));
        assert!(msg.contains("Source:"));
    }

    #[test]
    fn test_error_conversion() {
        let val_err = ValidationError::new("test");
        let err: Error = val_err.into();
        assert!(matches!(err, Error::Validation(_)));
    }
}
