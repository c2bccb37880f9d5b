//! Error types for balance computation and settlement

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::ParticipantId;

/// Result type for settlement operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A ledger row was rejected before accumulation began
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Credits and debits do not reconcile within the conservation tolerance
    #[error("Data integrity violation: residual {residual} exceeds tolerance {tolerance}")]
    DataIntegrity { residual: Decimal, tolerance: Decimal },

    #[error("Payment confirmation {0} is already confirmed")]
    AlreadyConfirmed(u32),

    #[error("Participant {by} cannot confirm payment {confirmation} addressed to {to}")]
    NotRecipient {
        confirmation: u32,
        by: ParticipantId,
        to: ParticipantId,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encoding error: {0}")]
    Encoding(String),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }
}
