// ❗ Error taxonomy
//
// Record-level problems (ValidationError) never leave the engine: they only
// exclude a record from totals. Engine-level problems (MetricsError) are
// threaded through every layer as Result and converted into the zero-valued
// default metrics at the facade boundary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a single raw record was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Error, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationError {
    /// Not an object at all (null, number, array, ...)
    #[error("Invalid transaction data")]
    Malformed,

    #[error("Amount is missing or not a number")]
    AmountNotNumeric,

    #[error("Amount must be greater than zero")]
    AmountNotPositive,

    #[error("Date is missing or not a valid calendar date")]
    InvalidDate,

    #[error("Expense must name the member who paid")]
    MissingPayer,

    #[error("Contribution must name the contributing member")]
    MissingContributor,

    #[error("Expense must be split between at least one member")]
    EmptySplit,
}

impl ValidationError {
    /// Field the error refers to
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Malformed => "record",
            ValidationError::AmountNotNumeric | ValidationError::AmountNotPositive => "amount",
            ValidationError::InvalidDate => "date",
            ValidationError::MissingPayer => "paidBy",
            ValidationError::MissingContributor => "contributedBy",
            ValidationError::EmptySplit => "splitBetween",
        }
    }
}

/// Failure of an aggregation as a whole
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricsError {
    /// A collaborator handed over something other than an array of records
    #[error("{collection} is not a collection of records (got {found})")]
    NotACollection {
        collection: &'static str,
        found: &'static str,
    },

    /// A running total overflowed to infinity or NaN
    #[error("{what} total is not a finite number")]
    NonFiniteTotal { what: String },

    /// Calendar arithmetic fell outside the supported date range
    #[error("period {year}-{month:02} is outside the supported calendar range")]
    PeriodOutOfRange { year: i32, month: u32 },
}

pub type MetricsResult<T> = std::result::Result<T, MetricsError>;

/// Guard used after every aggregation step
pub(crate) fn ensure_finite(what: &str, value: f64) -> MetricsResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(MetricsError::NonFiniteTotal {
            what: what.to_string(),
        })
    }
}
