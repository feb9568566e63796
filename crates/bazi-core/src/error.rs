//! Typed engine failures. The gateway translates these into HTTP responses;
//! the engine itself never clamps or substitutes defaults.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BaziError {
    /// The civil date/time does not exist, or the input year is outside the
    /// supported epoch range.
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// A solar-term or new-moon lookup fell outside the years the
    /// astronomical series covers. The calendar date itself may be valid.
    #[error("no astronomical coverage for year {year}")]
    MissingCoverage { year: i32 },

    /// Internal invariant violation (e.g. a negative onset duration).
    /// Always a defect, never user-triggered.
    #[error("computation error: {0}")]
    ComputationError(String),
}

pub type Result<T> = core::result::Result<T, BaziError>;
