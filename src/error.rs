//! Error types for block template construction

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsensusError {
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Unsupported script template: {0}")]
    UnsupportedTemplate(String),

    #[error("Hash mismatch: {0}")]
    HashMismatch(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Transaction validation failed: {0}")]
    TransactionValidation(String),

    #[error("Economic validation failed: {0}")]
    EconomicValidation(String),

    #[error("Invalid proof of work: {0}")]
    InvalidProofOfWork(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<hex::FromHexError> for ConsensusError {
    fn from(err: hex::FromHexError) -> Self {
        ConsensusError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConsensusError>;
