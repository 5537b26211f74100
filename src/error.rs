use std::path::PathBuf;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the library
///
/// Only [`Error::Validation`] and [`Error::DocumentationIncomplete`] are raised by the
/// traversal engine itself; both abort the whole build call. Every other unsupported
/// shape degrades to a visible placeholder in the output instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A map key type other than a string was found while strict mode is on
    #[error("map key of {owner}.{field} must be a string, but {key_type} is used")]
    Validation {
        owner: String,
        field: String,
        key_type: String,
    },

    /// A primitive request parameter has no description while strict mode is on
    #[error("{owner}.{field} has no description; add a doc comment or a custom field desc")]
    DocumentationIncomplete { owner: String, field: String },

    /// A textual type reference could not be parsed
    #[error("invalid type reference `{input}`: {reason}")]
    TypeSyntax { input: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error in {}: {message}", file.display())]
    Parse { file: PathBuf, message: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("type `{0}` is not present in the type model")]
    TypeNotFound(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(format!("JSON: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Serialization(format!("YAML: {}", err))
    }
}

impl From<syn::Error> for Error {
    fn from(err: syn::Error) -> Self {
        Error::Parse {
            file: PathBuf::from("<unknown>"),
            message: err.to_string(),
        }
    }
}
