// src/error.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Market data unavailable for {ticker}: {reason}")]
    DataUnavailable { ticker: String, reason: String },

    #[error("Cannot normalize {ticker}: {reason}")]
    Normalization { ticker: String, reason: String },

    #[error("Chart rendering failed: {0}")]
    Render(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChartError {
    pub fn unavailable(ticker: impl Into<String>, reason: impl ToString) -> Self {
        ChartError::DataUnavailable {
            ticker: ticker.into(),
            reason: reason.to_string(),
        }
    }

    pub fn normalization(ticker: impl Into<String>, reason: impl Into<String>) -> Self {
        ChartError::Normalization {
            ticker: ticker.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ChartError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_ticker() {
        let err = ChartError::unavailable("CNDX.L", "yahoo status 404");
        assert_eq!(err.to_string(), "Market data unavailable for CNDX.L: yahoo status 404");

        let err = ChartError::normalization("IB01.L", "first price is missing");
        assert_eq!(err.to_string(), "Cannot normalize IB01.L: first price is missing");
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ChartError = io.into();
        assert!(matches!(err, ChartError::Io(_)));
    }
}
