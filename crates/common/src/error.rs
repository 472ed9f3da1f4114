use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Input rejected before anything was sent to the wallet.
    #[error("{0}")]
    Validation(String),

    /// The wallet or contract rejected a submitted transaction.
    #[error("Transaction failed: {0}")]
    Transaction(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("ABI error: {0}")]
    Abi(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// The two failure categories a user ever sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Shown as a blocking alert; nothing was submitted.
    Validation,
    /// Shown as inline error text after submission.
    Transaction,
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            _ => ErrorKind::Transaction,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
