//! Loan admission controller
//!
//! Pure checks over a liquidity snapshot and the borrower's standing.
//! The first failing check decides the reason, so the order below is part
//! of the contract:
//!
//! Pool-funded loans:
//! 1. Lending available at the current status
//! 2. Borrower is a pool member
//! 3. Module open at the current status
//! 4. Amount within the status loan ceiling
//! 5. Amount within liquidity available for lending
//! 6. Daily cap not exceeded
//!
//! Stake-backed loans:
//! 1. Loan within LTV of the pledged collateral
//! 2. Stake covers the collateral
//! 3. Collateral not already pledged elsewhere

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use types::numeric::to_whole_rupees;
use types::status::LiquidityStatus;

use crate::status::LiquidityInfo;

/// Why a loan was refused
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rejection {
    /// Status is Building or Paused
    LendingUnavailable {
        status: LiquidityStatus,
        basic_threshold: Decimal,
        estimated_days: i64,
    },
    NotPoolMember,
    ModuleUnavailable { module: String },
    ExceedsMaxLoan { max_loan: Decimal },
    InsufficientLiquidity,
    DailyLimitReached,
    ExceedsCollateralLimit {
        max_loan: Decimal,
        collateral: Decimal,
        ltv: Decimal,
    },
    InsufficientStake { required: Decimal, staked: Decimal },
    CollateralInUse,
    ActiveLoanExists,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::LendingUnavailable {
                status: LiquidityStatus::Paused,
                ..
            } => write!(
                f,
                "Lending is temporarily paused due to low liquidity. It will resume automatically when reserves are restored."
            ),
            Rejection::LendingUnavailable {
                status: LiquidityStatus::Building,
                basic_threshold,
                estimated_days,
            } => {
                let crores = (to_whole_rupees(*basic_threshold) / Decimal::from(10_000_000)).trunc();
                write!(
                    f,
                    "Lending will be available when the liquidity pool reaches the basic threshold of ₹{crores} Cr."
                )?;
                if *estimated_days > 0 {
                    write!(f, " Estimated in {estimated_days} days.")?;
                }
                write!(f, " Join a Suraksha pool to help build liquidity faster.")
            }
            Rejection::LendingUnavailable { .. } => {
                write!(f, "Lending is currently unavailable. Please check back later.")
            }
            Rejection::NotPoolMember => write!(
                f,
                "Lending access restricted to Suraksha pool members. Join the Village or Urban Suraksha pool, or stake enough NAMO, to borrow."
            ),
            Rejection::ModuleUnavailable { module } => {
                write!(f, "Module {module} not available at current liquidity level")
            }
            Rejection::ExceedsMaxLoan { max_loan } => write!(
                f,
                "Loan amount exceeds maximum of ₹{}",
                to_whole_rupees(*max_loan)
            ),
            Rejection::InsufficientLiquidity => {
                write!(f, "Insufficient liquidity available for lending")
            }
            Rejection::DailyLimitReached => {
                write!(f, "Daily lending limit reached. Please try again tomorrow")
            }
            Rejection::ExceedsCollateralLimit {
                max_loan,
                collateral,
                ltv,
            } => write!(
                f,
                "Loan amount exceeds {}% collateral limit. Max loan: ₹{} against ₹{} collateral",
                (*ltv * Decimal::ONE_HUNDRED).normalize(),
                to_whole_rupees(*max_loan),
                to_whole_rupees(*collateral)
            ),
            Rejection::InsufficientStake { required, staked } => write!(
                f,
                "Insufficient staked NAMO. Required: ₹{}, Available: ₹{}",
                to_whole_rupees(*required),
                to_whole_rupees(*staked)
            ),
            Rejection::CollateralInUse => write!(
                f,
                "Part of your staked NAMO is already used as collateral. Stake more NAMO or repay existing loans"
            ),
            Rejection::ActiveLoanExists => write!(
                f,
                "An active collateral loan already exists. Repay it before taking another"
            ),
        }
    }
}

/// Outcome of an admission check
#[derive(Debug, Clone, PartialEq)]
pub enum AdmissionDecision {
    Approved,
    Rejected(Rejection),
}

impl AdmissionDecision {
    pub fn is_approved(&self) -> bool {
        matches!(self, AdmissionDecision::Approved)
    }

    /// Human-readable reason, empty when approved
    pub fn reason(&self) -> String {
        match self {
            AdmissionDecision::Approved => String::new(),
            AdmissionDecision::Rejected(rejection) => rejection.to_string(),
        }
    }

    /// `(success, reason)` pair for wallet/UI rendering
    pub fn into_pair(self) -> (bool, String) {
        let reason = self.reason();
        (self.is_approved(), reason)
    }

    pub fn into_result(self) -> Result<(), Rejection> {
        match self {
            AdmissionDecision::Approved => Ok(()),
            AdmissionDecision::Rejected(rejection) => Err(rejection),
        }
    }
}

impl From<Result<(), Rejection>> for AdmissionDecision {
    fn from(result: Result<(), Rejection>) -> Self {
        match result {
            Ok(()) => AdmissionDecision::Approved,
            Err(rejection) => AdmissionDecision::Rejected(rejection),
        }
    }
}

/// Pool-funded loan request
#[derive(Debug, Clone, Copy)]
pub struct LoanRequest<'a> {
    pub amount: Decimal,
    pub module: &'a str,
}

/// Check a pool-funded loan against the current snapshot
pub fn check_loan(
    info: &LiquidityInfo,
    basic_threshold: Decimal,
    is_pool_member: bool,
    daily_used: Decimal,
    request: LoanRequest<'_>,
) -> Result<(), Rejection> {
    // 1. Lending must be open at all
    if !info.status.is_lending_available() {
        return Err(Rejection::LendingUnavailable {
            status: info.status,
            basic_threshold,
            estimated_days: info.estimated_days_to_next,
        });
    }

    // 2. Members only
    if !is_pool_member {
        return Err(Rejection::NotPoolMember);
    }

    // 3. Module unlocked at this tier
    if !info.is_module_available(request.module) {
        return Err(Rejection::ModuleUnavailable {
            module: request.module.to_string(),
        });
    }

    // 4. Per-loan ceiling
    if request.amount > info.max_loan_amount {
        return Err(Rejection::ExceedsMaxLoan {
            max_loan: info.max_loan_amount,
        });
    }

    // 5. Pool capacity
    if request.amount > info.available_for_lending {
        return Err(Rejection::InsufficientLiquidity);
    }

    // 6. Daily cap, last so structural rejections surface first
    if daily_used.saturating_add(request.amount) > info.daily_lending_limit {
        return Err(Rejection::DailyLimitReached);
    }

    Ok(())
}

/// Borrower's stake position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StakePosition {
    pub staked: Decimal,
    pub locked: Decimal,
}

impl StakePosition {
    /// Stake not yet pledged; negative if the ledger is over-locked
    pub fn available(&self) -> Decimal {
        self.staked - self.locked
    }

    /// True when `amount` exceeds the unpledged stake
    pub fn exceeds_available(&self, amount: Decimal) -> bool {
        amount > self.available()
    }
}

/// Largest loan `collateral` supports at `ltv`
pub fn max_loan_for_collateral(collateral: Decimal, ltv: Decimal) -> Decimal {
    collateral * ltv
}

/// Check a stake-backed loan
pub fn check_collateral_loan(
    loan_amount: Decimal,
    collateral_amount: Decimal,
    ltv: Decimal,
    stake: StakePosition,
) -> Result<(), Rejection> {
    // 1. LTV
    let max_loan = max_loan_for_collateral(collateral_amount, ltv);
    if loan_amount > max_loan {
        return Err(Rejection::ExceedsCollateralLimit {
            max_loan,
            collateral: collateral_amount,
            ltv,
        });
    }

    // 2. Stake covers the pledge
    if stake.staked < collateral_amount {
        return Err(Rejection::InsufficientStake {
            required: collateral_amount,
            staked: stake.staked,
        });
    }

    // 3. No double pledging
    if stake.exceeds_available(collateral_amount) {
        return Err(Rejection::CollateralInUse);
    }

    Ok(())
}
