//! Error types for the manualsync library.

use std::io;
use thiserror::Error;

/// Result type alias for manualsync operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while loading, reconciling, or rendering.
///
/// These are the *fatal* failures: an unreadable container, a missing
/// document body, malformed XML or JSON. Unresolved references encountered
/// during reconciliation (unknown block ids, unmatched anchors, missing
/// image files) are not errors: they are recovered locally and reported
/// through [`crate::sync::SyncReport`] counters.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The DOCX container archive could not be read or written.
    #[error("DOCX container error: {0}")]
    Container(String),

    /// A required package part is missing from the DOCX archive.
    #[error("Missing package part: {0}")]
    MissingPart(String),

    /// The document XML has no `w:body` element.
    #[error("Document body not found")]
    MissingBody,

    /// Error parsing or serializing OOXML content.
    #[error("XML error: {0}")]
    Xml(String),

    /// Error parsing the manual spec or capture manifest JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The manual spec violates a structural invariant.
    #[error("Invalid spec: {0}")]
    Spec(String),

    /// An embedded image could not be decoded.
    #[error("Image error: {0}")]
    Image(String),

    /// Error during flat rendering (LaTeX, Markdown).
    #[error("Rendering error: {0}")]
    Render(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            zip::result::ZipError::FileNotFound => {
                Error::MissingPart("archive entry not found".to_string())
            }
            _ => Error::Container(err.to_string()),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::MissingBody;
        assert_eq!(err.to_string(), "Document body not found");

        let err = Error::MissingPart("word/document.xml".to_string());
        assert_eq!(err.to_string(), "Missing package part: word/document.xml");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_zip_error_conversion() {
        let err: Error = zip::result::ZipError::FileNotFound.into();
        assert!(matches!(err, Error::MissingPart(_)));
    }
}
