use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// The provider has no record of the symbol at all. This is the only
    /// condition that stops an analysis before scoring.
    #[error("Ticker not found: {0}")]
    TickerNotFound(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AnalysisError {
    pub fn is_ticker_not_found(&self) -> bool {
        matches!(self, AnalysisError::TickerNotFound(_))
    }
}
