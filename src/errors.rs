//! Unified error types for `MaintenanceBuddy`.
//!
//! Every fallible operation in the crate returns [`Result`]. The [`Error`]
//! enum distinguishes authorization failures, missing records, conflicts,
//! illegal state transitions, and input validation so that callers can map
//! each class to a distinct outcome without string matching.

use thiserror::Error;

/// All error conditions produced by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The session carries no usable identity for the requested operation
    /// (e.g. a resident session without a flat scope).
    #[error("Not authenticated")]
    Unauthorized,

    /// The session is valid but its role may not perform the operation.
    #[error("Forbidden: requires {required} role")]
    Forbidden {
        /// Role that would be allowed to perform the operation
        required: &'static str,
    },

    /// No flat with the given ID exists.
    #[error("Flat not found: {id}")]
    FlatNotFound {
        /// ID that was looked up
        id: i64,
    },

    /// No month with the given ID exists.
    #[error("Month not found: {id}")]
    MonthNotFound {
        /// ID that was looked up
        id: i64,
    },

    /// No payment with the given ID exists.
    #[error("Payment not found: {id}")]
    PaymentNotFound {
        /// ID that was looked up
        id: i64,
    },

    /// A month for this (month, year) pair already exists.
    #[error("Month {month}/{year} already exists")]
    MonthAlreadyExists {
        /// Calendar month (1-12)
        month: u32,
        /// Calendar year
        year: i32,
    },

    /// A payment for this (flat, month) pair already exists.
    #[error("Payment already exists for flat {flat_id} in month {month_id}")]
    PaymentAlreadyExists {
        /// Flat the duplicate belongs to
        flat_id: i64,
        /// Month the duplicate belongs to
        month_id: i64,
    },

    /// A record was not in the state the transition requires. Carries the
    /// actual state so callers can report what the record currently is.
    #[error("Invalid state: expected {expected}, found {actual}")]
    InvalidState {
        /// State the operation requires
        expected: &'static str,
        /// State the record is actually in
        actual: String,
    },

    /// A month cannot be closed while flats are still unpaid.
    #[error("{count} flat(s) still unpaid")]
    UnpaidFlats {
        /// Number of flats without a paid payment
        count: u64,
    },

    /// Input failed validation before any persistence was attempted.
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable description of the invalid input
        message: String,
    },

    /// A notification could not be delivered. Only ever observed inside
    /// best-effort dispatch; never propagated out of an operation.
    #[error("Notification delivery failed: {message}")]
    Notification {
        /// Description of the delivery failure
        message: String,
    },

    /// Configuration could not be loaded or parsed.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// Database error from the ORM layer.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Catch-all for internal invariant failures.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the failure
        message: String,
    },
}

/// Convenience `Result` type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::num::TryFromIntError> for Error {
    fn from(value: std::num::TryFromIntError) -> Self {
        Error::Internal {
            message: format!("Integer conversion failed: {value}"),
        }
    }
}
