use std::result;
use thiserror::Error;

pub mod category {
    pub const UNRESOLVED: &str = "unresolved";
    pub const UNKNOWN_MEMBER: &str = "unknown-member";
    pub const UNKNOWN_GROUP: &str = "unknown-group";
    pub const CANNOT_CONVERT: &str = "cannot-convert";
    pub const ARITY: &str = "arity";
    pub const TYPE_MISMATCH: &str = "type-mismatch";
    pub const QUALIFY: &str = "qualify";
    pub const NOT_LOWERED: &str = "not-lowered";
}

#[derive(Error, Debug)]
pub enum Error {
    /// A concrete item was required but only an absent or chronically unresolved one exists.
    #[error("unknown item: {0}")]
    UnknownItem(String),
    #[error("{category}: {message}")]
    Compiler {
        category: &'static str,
        message: String,
    },
    #[error("Generic error: {0}")]
    Generic(eyre::Report),
}

impl Error {
    pub fn generic(message: impl Into<String>) -> Self {
        Error::Generic(eyre::Report::msg(message.into()))
    }

    pub fn compiler(category: &'static str, message: impl Into<String>) -> Self {
        Error::Compiler {
            category,
            message: message.into(),
        }
    }

    pub fn unknown_item(description: impl Into<String>) -> Self {
        Error::UnknownItem(description.into())
    }

    /// Short label shown to users next to the message.
    pub fn category(&self) -> &'static str {
        match self {
            Error::UnknownItem(_) => "unknown-item",
            Error::Compiler { category, .. } => category,
            Error::Generic(_) => "internal",
        }
    }
}

pub type Result<T> = result::Result<T, Error>;

impl From<eyre::Report> for Error {
    fn from(err: eyre::Report) -> Self {
        Error::Generic(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Generic(eyre::Report::new(e))
    }
}

impl From<std::fmt::Error> for Error {
    fn from(e: std::fmt::Error) -> Self {
        Error::Generic(eyre::Report::new(e))
    }
}
