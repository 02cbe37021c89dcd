pub mod projection;
pub mod volatility;

/// Trading days per year used for annualization.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AnalysisError {
    #[error("Insufficient history: need at least {required} prices, have {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}
