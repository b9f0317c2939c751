//! Document input
//!
//! Documents are YAML (JSON is accepted as the YAML subset it is) and are parsed into a
//! generic JSON value so that comments and unknown keys can still be seen by validation.

use std::fmt;
use std::io::{self, Read};
use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Where a document is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    Stdin,
    Path(PathBuf),
}

impl DocumentSource {
    /// `-` selects stdin, anything else is a file path
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            Self::Stdin
        } else {
            Self::Path(PathBuf::from(arg))
        }
    }
}

impl fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdin => write!(f, "<stdin>"),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Errors reading or parsing a document
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("Failed to read {origin}")]
    Io {
        origin: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse {origin}")]
    Parse {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Read a whole document from a byte stream
pub fn read_document<R: Read>(mut reader: R, origin: &str) -> Result<String, ReadError> {
    let mut text = String::new();
    reader.read_to_string(&mut text).map_err(|source| ReadError::Io {
        origin: origin.to_string(),
        source,
    })?;
    debug!(%origin, bytes = text.len(), "read_document: read");
    Ok(text)
}

/// Parse YAML or JSON text into a generic value
///
/// An empty document parses as `null`, which validation then rejects.
pub fn parse_document(text: &str, origin: &str) -> Result<Value, ReadError> {
    serde_yaml::from_str::<Value>(text).map_err(|source| {
        debug!(%origin, error = %source, "parse_document: failed");
        ReadError::Parse {
            origin: origin.to_string(),
            source,
        }
    })
}

/// Read and parse a document from stdin or a file
pub fn load_document(source: &DocumentSource) -> Result<Value, ReadError> {
    let origin = source.to_string();
    let text = match source {
        DocumentSource::Stdin => read_document(io::stdin().lock(), &origin)?,
        DocumentSource::Path(path) => std::fs::read_to_string(path).map_err(|source| ReadError::Io {
            origin: origin.clone(),
            source,
        })?,
    };
    parse_document(&text, &origin)
}
