use std::fmt;

use thiserror::Error;

use crate::types::IntKind;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Malformed XML document: {0}")]
    XmlShape(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Verifier error: {0}")]
    VerifierError(String),

    #[error("Unknown record type \"{0}\"")]
    UnknownRecord(String),

    #[error("Recursive nesting of \"{0}\" is not allowed")]
    RecursiveRecord(String),

    #[error("Unsupported file extension for {0}")]
    UnsupportedFormat(String),
}

/// Why a native value was rejected for a field.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationErrorKind {
    #[error("value {value} out of range for {kind} [{min}, {max}]")]
    OutOfRange {
        kind:  IntKind,
        value: i128,
        min:   i64,
        max:   i64,
    },

    #[error("expected {expected}, found {found}")]
    WrongShape {
        expected: String,
        found:    String,
    },

    #[error("missing required field")]
    MissingField,

    #[error("unknown field")]
    UnknownField,
}

/// A value failed validation against its type descriptor. `path` locates the
/// value inside the instance, e.g. `$.address_history[1].city`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub path: String,
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    pub fn new(path: &str, kind: ValidationErrorKind) -> ValidationError {
        ValidationError { path: path.to_string(), kind }
    }

    pub(crate) fn wrong_shape(path: &str, expected: impl Into<String>, found: impl Into<String>) -> ValidationError {
        ValidationError::new(
            path,
            ValidationErrorKind::WrongShape {
                expected: expected.into(),
                found:    found.into(),
            },
        )
    }

    pub fn is_out_of_range(&self) -> bool {
        matches!(self.kind, ValidationErrorKind::OutOfRange { .. })
    }

    pub fn is_wrong_shape(&self) -> bool {
        matches!(self.kind, ValidationErrorKind::WrongShape { .. })
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation error at {}: {}", self.path, self.kind)
    }
}

impl std::error::Error for ValidationError {}
