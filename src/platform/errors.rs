use thiserror::Error;

pub type Result<T> = std::result::Result<T, PortfolioError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortfolioError {
    /// A raw position record is missing a required field, holds a value that
    /// cannot be coerced to its type, or holds an amount too large to
    /// aggregate. Aborts the whole classification run.
    #[error("Malformed position record {position}: field `{field}` {reason}")]
    MalformedRecord {
        position: String,
        field: &'static str,
        reason: String,
    },
    /// The account balance block holds a value that is not a number.
    #[error("Malformed balance for account {account}: field `{field}` {reason}")]
    MalformedBalance {
        account: String,
        field: &'static str,
        reason: String,
    },
}

impl PortfolioError {
    pub fn missing(position: &str, field: &'static str) -> Self {
        PortfolioError::MalformedRecord {
            position: position.to_string(),
            field,
            reason: "is missing".to_string(),
        }
    }

    pub fn invalid(position: &str, field: &'static str, reason: impl Into<String>) -> Self {
        PortfolioError::MalformedRecord {
            position: position.to_string(),
            field,
            reason: reason.into(),
        }
    }

    pub fn overflow(position: &str, field: &'static str) -> Self {
        PortfolioError::MalformedRecord {
            position: position.to_string(),
            field,
            reason: "overflows when aggregated".to_string(),
        }
    }
}
