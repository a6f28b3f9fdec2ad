use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TierError {
    #[error("{what} not found at {}. Run the data extraction workflow first.", path.display())]
    NotFound { what: String, path: PathBuf },

    #[error("Account {account} not found in Tier 3 {kind} accounts ({available} accounts available)")]
    AccountNotFound {
        account: String,
        kind: String,
        available: usize,
    },

    #[error("Period {period} not found for account {account}")]
    PeriodNotFound { account: String, period: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed JSON in {}: {source}", path.display())]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Raw source error: {0}")]
    ExternalSource(String),
}

impl TierError {
    /// True for every flavour of "the thing asked for does not exist".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TierError::NotFound { .. }
                | TierError::AccountNotFound { .. }
                | TierError::PeriodNotFound { .. }
        )
    }
}

pub type TierResult<T> = Result<T, TierError>;
