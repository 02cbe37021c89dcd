pub mod types;
pub mod yahoo;

/// Failures while retrieving a price history.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("Invalid symbol: '{0}'")]
    InvalidSymbol(String),

    #[error("No historical data found for the requested symbol and period")]
    NotFound,

    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for DataError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DataError::MalformedResponse(err.to_string())
        } else {
            DataError::NetworkFailure(err.to_string())
        }
    }
}
