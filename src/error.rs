use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("invalid config: {0}")]
    Config(String),
    #[error("numeric failure: {0}")]
    Numeric(String),
    #[error("shape mismatch: {0}")]
    Shape(String),
}

pub type OrderResult<T> = Result<T, OrderError>;
