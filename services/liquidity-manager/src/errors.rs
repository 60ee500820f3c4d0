//! Liquidity manager error types
//!
//! Rejections are business outcomes and carry a `Rejection`; everything else
//! here is a failure of input, storage or a collaborator.

use thiserror::Error;
use types::errors::{InputError, ParamsError};

use crate::admission::Rejection;

/// Store value encoding/decoding failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Failed to encode value for key {key}: {reason}")]
    Encode { key: String, reason: String },

    #[error("Failed to decode value for key {key}: {reason}")]
    Decode { key: String, reason: String },
}

/// Pool value source failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("Pool source {source_name} unavailable: {reason}")]
    Unavailable {
        source_name: &'static str,
        reason: String,
    },
}

/// Bank transfer failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BankError {
    #[error("Insufficient module funds: required {required}, available {available}")]
    InsufficientFunds { required: String, available: String },

    #[error("Transfer rejected: {reason}")]
    Rejected { reason: String },
}

/// Keeper operation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KeeperError {
    #[error("Loan rejected: {0}")]
    Rejected(Rejection),

    #[error("Unauthorized: {caller} is not the module authority")]
    Unauthorized { caller: String },

    #[error("No active collateral loan for {borrower}")]
    NoActiveLoan { borrower: String },

    #[error("Unlock would leave {locked} locked for {user}, below the {required} backing the active loan")]
    CollateralBacksLoan {
        user: String,
        locked: String,
        required: String,
    },

    #[error("Arithmetic overflow updating {what}")]
    Overflow { what: &'static str },

    #[error("Invalid input: {0}")]
    Input(#[from] InputError),

    #[error("Invalid params: {0}")]
    Params(#[from] ParamsError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Bank error: {0}")]
    Bank(#[from] BankError),
}

/// Genesis load/validation failures, fatal to module initialization
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenesisError {
    #[error("Invalid params: {0}")]
    Params(#[from] ParamsError),

    #[error("Malformed genesis document: {0}")]
    Malformed(String),

    #[error("Invalid genesis state: {0}")]
    InvalidState(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
