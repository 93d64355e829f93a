use thiserror::Error;
use timetravel_core_types::RecordError;

#[derive(Debug, Error)]
pub enum TlError {
    #[error("invalid argument: {0}")]
    InvalidArg(String),
    #[error("invalid record: {0}")]
    InvalidRecord(#[from] RecordError),
    #[error("invalid policy: {0}")]
    InvalidPolicy(#[from] serde_json::Error),
}

pub type TlResult<T> = Result<T, TlError>;
