//! Error types for ledger operations

use thiserror::Error;

/// Errors that can occur while computing or persisting ledger records
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid period: {message}")]
    InvalidPeriod { message: String },

    #[error("Numerical overflow in calculation: {operation}")]
    NumericalOverflow { operation: String },

    #[error("Corrupt ledger data: {message}")]
    CorruptData { message: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Carry-forward failed for payee {payee_id}: {source}")]
    PayeeFailed {
        payee_id: i64,
        #[source]
        source: Box<LedgerError>,
    },
}

impl LedgerError {
    pub fn invalid_period(message: impl Into<String>) -> Self {
        Self::InvalidPeriod { message: message.into() }
    }

    pub fn numerical_overflow(operation: impl Into<String>) -> Self {
        Self::NumericalOverflow { operation: operation.into() }
    }

    pub fn corrupt_data(message: impl Into<String>) -> Self {
        Self::CorruptData { message: message.into() }
    }

    pub fn storage_error(message: impl Into<String>) -> Self {
        Self::StorageError { message: message.into() }
    }

    pub fn for_payee(payee_id: i64, source: LedgerError) -> Self {
        Self::PayeeFailed {
            payee_id,
            source: Box::new(source),
        }
    }

    /// `true` when the error was caused by caller input rather than storage
    /// or arithmetic.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidPeriod { .. })
    }
}
