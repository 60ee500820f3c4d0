//! Lending event definitions
//!
//! Every state-changing keeper operation returns the event it emitted so
//! the host can forward it to its event stream.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::ids::Address;
use types::params::LiquidityParams;
use types::status::{LendingModule, LiquidityStatus, PoolCohort};
use uuid::Uuid;

/// Event emitted by the liquidity manager
///
/// `event_type` is a pure function of the operation and the store it ran
/// against, so replaying a block reproduces it exactly. `event_id` is a
/// fresh uuid v7 for indexing and is not stable across replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LendingEvent {
    pub event_id: Uuid,
    pub event_type: LendingEventType,
}

/// Event type classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LendingEventType {
    /// Pool-funded loan admitted and recorded against the daily cap
    LoanProcessed {
        borrower: Address,
        module: LendingModule,
        amount: Decimal,
        processing_fee: Decimal,
        disbursed: Decimal,
        status: LiquidityStatus,
        daily_used: Decimal,
    },
    /// Stake-backed loan admitted and collateral locked
    CollateralLoanProcessed {
        borrower: Address,
        module: LendingModule,
        loan_amount: Decimal,
        collateral_amount: Decimal,
        originated_at: DateTime<Utc>,
    },
    /// Stake-backed loan settled and collateral released
    CollateralLoanRepaid {
        borrower: Address,
        loan_amount: Decimal,
        interest: Decimal,
        settlement_fee: Decimal,
        /// Total moved from the borrower into the module account
        amount_collected: Decimal,
        collateral_released: Decimal,
        repaid_at: DateTime<Utc>,
    },
    CollateralLocked {
        user: Address,
        amount: Decimal,
        locked_total: Decimal,
    },
    CollateralUnlocked {
        user: Address,
        amount: Decimal,
        locked_total: Decimal,
    },
    PoolMembershipUpdated {
        user: Address,
        cohort: PoolCohort,
        active: bool,
    },
    StakedAmountUpdated { user: Address, amount: Decimal },
    /// Daily lending counter cleared by the end-of-day hook
    DailyLendingReset { previous_used: Decimal },
    ParamsUpdated { params: LiquidityParams },
}

impl LendingEvent {
    pub fn new(event_type: LendingEventType) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            event_type,
        }
    }

    /// Short label for logs and indexing
    pub fn label(&self) -> &'static str {
        match &self.event_type {
            LendingEventType::LoanProcessed { .. } => "loan_processed",
            LendingEventType::CollateralLoanProcessed { .. } => "collateral_loan_processed",
            LendingEventType::CollateralLoanRepaid { .. } => "collateral_loan_repaid",
            LendingEventType::CollateralLocked { .. } => "collateral_locked",
            LendingEventType::CollateralUnlocked { .. } => "collateral_unlocked",
            LendingEventType::PoolMembershipUpdated { .. } => "pool_membership_updated",
            LendingEventType::StakedAmountUpdated { .. } => "staked_amount_updated",
            LendingEventType::DailyLendingReset { .. } => "daily_lending_reset",
            LendingEventType::ParamsUpdated { .. } => "params_updated",
        }
    }
}
