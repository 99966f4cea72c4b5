use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("No data: {0}")]
    NoData(String),

    #[error("Generation error: {0}")]
    GenerationError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl MarketError {
    /// The message without the variant prefix, suitable for end users.
    pub fn reason(&self) -> &str {
        match self {
            MarketError::InvalidRequest(msg)
            | MarketError::ApiError(msg)
            | MarketError::NoData(msg)
            | MarketError::GenerationError(msg)
            | MarketError::Unknown(msg) => msg,
        }
    }
}
