use thiserror::Error;

pub type Result<T> = std::result::Result<T, GhostError>;

#[derive(Debug, Error)]
pub enum GhostError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("artifact format error: {0}")]
    Format(String),

    #[error("token overflow: {len} bytes exceeds the 255-byte limit")]
    TokenOverflow { len: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
