use crate::schema::PhysicalType;
use thiserror::Error;

/// Errors raised while building a schema handler
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchemaError {
    #[error("schema has no elements")]
    Empty,

    #[error("element `{path}` declares {declared} children but only {found} follow it")]
    MissingChildren {
        path: String,
        declared: usize,
        found: usize,
    },

    #[error("{0} trailing elements do not belong to the root")]
    TrailingElements(usize),

    #[error("duplicate field `{name}` under `{parent}`")]
    DuplicateField { parent: String, name: String },

    #[error("leaf `{0}` has no physical type")]
    MissingPhysicalType(String),

    #[error("field name `{0}` contains the path delimiter `/`")]
    DelimiterInName(String),

    #[error("unknown schema path `{0}`")]
    UnknownPath(String),
}

/// Errors that abort a whole marshal batch
///
/// There is no partial result: when any of these surfaces, the caller gets no columns.
#[derive(Debug, Error)]
pub enum MarshalError {
    /// A value cannot be represented in the column's physical type
    #[error("cannot store {found} value in {physical_type:?} column `{path}`")]
    Coercion {
        path: String,
        physical_type: PhysicalType,
        found: &'static str,
    },

    /// The runtime value has a shape the schema path does not allow
    #[error("invalid value at `{path}`: {message}")]
    Invariant { path: String, message: String },

    /// A JSON document does not fit the schema it is decoded against
    #[error("cannot decode JSON at `{path}`: {message}")]
    Decode { path: String, message: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl MarshalError {
    pub(crate) fn invariant(path: &str, message: impl Into<String>) -> Self {
        MarshalError::Invariant {
            path: path.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn decode(path: &str, message: impl Into<String>) -> Self {
        MarshalError::Decode {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T, E = MarshalError> = std::result::Result<T, E>;
