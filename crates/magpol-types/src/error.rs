use thiserror::Error;

#[derive(Error, Debug)]
pub enum MagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Physics constraint violated: {0}")]
    PhysicsViolation(String),

    #[error("Internal inconsistency: {0}")]
    Inconsistency(String),

    #[error("Linear algebra error: {0}")]
    LinAlg(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type MagResult<T> = Result<T, MagError>;
