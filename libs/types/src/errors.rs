//! Error types shared across the lending engine
//!
//! Two classes live here:
//! - `ParamsError`: configuration invariant violations, fatal at load time
//! - `InputError`: malformed values at the interface boundary, raised before
//!   any state is touched

use thiserror::Error;

/// Parameter invariant violations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParamsError {
    #[error("Lending thresholds must be positive and strictly increasing: basic {basic}, medium {medium}, full {full}")]
    ThresholdOrdering {
        basic: String,
        medium: String,
        full: String,
    },

    #[error("Ratio {name} out of range [0, 1]: {value}")]
    RatioOutOfRange { name: &'static str, value: String },

    #[error("Minimum reserve ratio {value} below floor {floor}")]
    MinimumReserveTooLow { value: String, floor: String },

    #[error("Combined reserve ratio must be below 1: {total}")]
    CombinedReserveTooHigh { total: String },

    #[error("Processing fee rate {value} exceeds maximum {max}")]
    ProcessingFeeRateTooHigh { value: String, max: String },

    #[error("Processing fee cap {value} out of range [0, {max}]")]
    ProcessingFeeCapOutOfRange { value: String, max: String },

    #[error("Early settlement rate {value} exceeds maximum {max}")]
    EarlySettlementRateTooHigh { value: String, max: String },

    #[error("Invalid lending config: {reason}")]
    InvalidConfig { reason: String },
}

/// Boundary validation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Invalid {field} format: {value}")]
    InvalidDecimal { field: &'static str, value: String },

    #[error("{field} must not be negative: {value}")]
    NegativeAmount { field: &'static str, value: String },

    #[error("{field} must be positive: {value}")]
    NonPositive { field: &'static str, value: String },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Unknown pool cohort: {0}")]
    UnknownPool(String),

    #[error("Unknown lending module: {0}")]
    UnknownModule(String),
}
