//! Query surface
//!
//! String-typed requests as they arrive from wallets and explorers. Each
//! handler validates its request into domain values first and only then
//! reads state, so a malformed request never reaches the store.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::ids::Address;
use types::loan::{CollateralLoan, LoanBreakdown};
use types::numeric::{parse_amount, parse_optional_amount, parse_positive_amount, to_whole_rupees};
use types::errors::InputError;
use types::status::{LendingModule, LiquidityStatus, PoolCohort};

use crate::admission::max_loan_for_collateral;
use crate::config::TierPolicy;
use crate::errors::KeeperError;
use crate::keeper::LiquidityKeeper;
use crate::sources::{Bank, PoolValueSources};
use crate::store::KvStore;

fn percent(ratio: Decimal) -> String {
    format!("{:.2}", ratio.saturating_mul(Decimal::ONE_HUNDRED))
}

fn parse_address(raw: &str) -> Result<Address, InputError> {
    Address::parse(raw)
}

// ── Liquidity status ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityStatusResponse {
    pub total_pool_value: Decimal,
    pub available_for_lending: Decimal,
    pub reserve_amount: Decimal,
    pub emergency_reserve: Decimal,
    pub loan_loss_provision: Decimal,
    pub status: LiquidityStatus,
    pub max_loan_amount: Decimal,
    pub daily_lending_limit: Decimal,
    pub available_modules: Vec<LendingModule>,
    pub next_threshold: Decimal,
    pub progress_to_next: Decimal,
    pub estimated_days_to_next: i64,
}

// ── Lending availability ────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LendingAvailabilityRequest {
    pub amount: String,
    pub module: String,
    pub borrower: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LendingAvailabilityResponse {
    pub available: bool,
    pub message: String,
}

// ── Pool progress ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolMilestone {
    pub status: LiquidityStatus,
    pub threshold: Decimal,
    pub achieved: bool,
    pub benefits: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolProgressResponse {
    pub current_value: Decimal,
    pub next_threshold: Decimal,
    /// Progress toward `next_threshold`, two decimals
    pub progress_percentage: String,
    pub estimated_days_to_next: i64,
    pub milestones: Vec<PoolMilestone>,
    pub status: LiquidityStatus,
}

// ── Daily stats ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyLendingStatsResponse {
    pub daily_limit: Decimal,
    pub daily_used: Decimal,
    /// `limit - used`, floored at zero
    pub daily_remaining: Decimal,
    pub utilization_percentage: String,
    pub status: LiquidityStatus,
}

// ── Collateral loans ────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollateralLoanAvailabilityRequest {
    pub loan_amount: String,
    pub collateral_amount: String,
    pub borrower: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollateralLoanAvailabilityResponse {
    pub available: bool,
    pub message: String,
    pub max_loan_amount: Decimal,
    pub required_collateral: Decimal,
    pub user_staked_amount: Decimal,
    pub user_locked_amount: Decimal,
    pub user_available_stake: Decimal,
    pub loan_to_value_ratio: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollateralLoanResponse {
    pub loan: Option<CollateralLoan>,
}

// ── Stake info ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStakeInfoResponse {
    pub staked_amount: Decimal,
    pub locked_collateral: Decimal,
    pub available_stake: Decimal,
    /// Available stake at the configured LTV
    pub max_borrow_capacity: Decimal,
    pub is_village_pool_member: bool,
    pub is_urban_pool_member: bool,
    pub is_eligible_for_lending: bool,
    pub loan_to_value_ratio: String,
}

// ── Fees ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanBreakdownRequest {
    pub loan_amount: String,
    pub interest_rate: String,
    pub term_months: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanBreakdownResponse {
    #[serde(flatten)]
    pub breakdown: LoanBreakdown,
    pub processing_fee_details: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeCalculatorRequest {
    /// Optional; empty skips the processing fee
    pub loan_amount: String,
    /// Optional; empty skips the early settlement fee
    pub remaining_principal: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeCalculatorResponse {
    pub processing_fee: Option<Decimal>,
    pub disbursed_amount: Option<Decimal>,
    pub early_settlement_fee: Option<Decimal>,
    pub processing_fee_rate: String,
    pub processing_fee_cap: String,
    pub early_settlement_rate: String,
}

fn tier_benefits(tier: &TierPolicy) -> Vec<String> {
    let mut benefits = vec![
        format!("₹{} max loans", to_whole_rupees(tier.max_loan)),
        format!("{}% daily limit", percent(tier.daily_limit_rate)),
    ];
    benefits.extend(tier.modules.iter().map(|m| format!("{m} lending")));
    benefits
}

impl<P: PoolValueSources, B: Bank> LiquidityKeeper<P, B> {
    pub fn query_liquidity_status(&self) -> LiquidityStatusResponse {
        let info = self.liquidity_info();
        LiquidityStatusResponse {
            total_pool_value: info.total_pool_value,
            available_for_lending: info.available_for_lending,
            reserve_amount: info.reserve_amount,
            emergency_reserve: info.emergency_reserve,
            loan_loss_provision: info.loan_loss_provision,
            status: info.status,
            max_loan_amount: info.max_loan_amount,
            daily_lending_limit: info.daily_lending_limit,
            available_modules: info.available_modules,
            next_threshold: info.next_threshold,
            progress_to_next: info.progress_to_next,
            estimated_days_to_next: info.estimated_days_to_next,
        }
    }

    pub fn query_lending_availability<S: KvStore + ?Sized>(
        &self,
        store: &S,
        req: &LendingAvailabilityRequest,
    ) -> Result<LendingAvailabilityResponse, KeeperError> {
        let amount = parse_amount("amount", &req.amount)?;
        if req.module.trim().is_empty() {
            return Err(InputError::MissingField("module").into());
        }
        let borrower = parse_address(&req.borrower)?;

        let (available, message) = self
            .can_process_loan(store, &borrower, amount, req.module.trim())?
            .into_pair();
        Ok(LendingAvailabilityResponse { available, message })
    }

    pub fn query_pool_progress(&self) -> PoolProgressResponse {
        let info = self.liquidity_info();
        let params = self.params();
        let config = self.config();

        let milestones = [
            (LiquidityStatus::Basic, params.lending_basic_threshold, &config.basic),
            (LiquidityStatus::Medium, params.lending_medium_threshold, &config.medium),
            (LiquidityStatus::Full, params.lending_full_threshold, &config.full),
        ]
        .into_iter()
        .map(|(status, threshold, tier)| PoolMilestone {
            status,
            threshold,
            achieved: info.total_pool_value >= threshold,
            benefits: tier_benefits(tier),
        })
        .collect();

        PoolProgressResponse {
            current_value: info.total_pool_value,
            next_threshold: info.next_threshold,
            progress_percentage: percent(info.progress_to_next),
            estimated_days_to_next: info.estimated_days_to_next,
            milestones,
            status: info.status,
        }
    }

    pub fn query_daily_lending_stats<S: KvStore + ?Sized>(
        &self,
        store: &S,
    ) -> Result<DailyLendingStatsResponse, KeeperError> {
        let info = self.liquidity_info();
        let daily_used = self.daily_lending_used(store)?;
        let daily_remaining = (info.daily_lending_limit - daily_used).max(Decimal::ZERO);
        let utilization = if info.daily_lending_limit > Decimal::ZERO {
            daily_used / info.daily_lending_limit
        } else {
            Decimal::ZERO
        };

        Ok(DailyLendingStatsResponse {
            daily_limit: info.daily_lending_limit,
            daily_used,
            daily_remaining,
            utilization_percentage: percent(utilization),
            status: info.status,
        })
    }

    pub fn query_collateral_loan_availability<S: KvStore + ?Sized>(
        &self,
        store: &S,
        req: &CollateralLoanAvailabilityRequest,
    ) -> Result<CollateralLoanAvailabilityResponse, KeeperError> {
        let loan_amount = parse_amount("loan_amount", &req.loan_amount)?;
        let collateral_amount = parse_amount("collateral_amount", &req.collateral_amount)?;
        let borrower = parse_address(&req.borrower)?;

        let (available, message) = self
            .can_process_collateral_loan(store, &borrower, loan_amount, collateral_amount)?
            .into_pair();
        let position = self.stake_position(store, &borrower)?;
        let ltv = self.config().collateral_ltv;

        Ok(CollateralLoanAvailabilityResponse {
            available,
            message,
            max_loan_amount: max_loan_for_collateral(collateral_amount, ltv),
            required_collateral: collateral_amount,
            user_staked_amount: position.staked,
            user_locked_amount: position.locked,
            user_available_stake: position.available(),
            loan_to_value_ratio: percent(ltv),
        })
    }

    pub fn query_user_stake_info<S: KvStore + ?Sized>(
        &self,
        store: &S,
        user: &str,
    ) -> Result<UserStakeInfoResponse, KeeperError> {
        let user = parse_address(user)?;
        let position = self.stake_position(store, &user)?;
        let ltv = self.config().collateral_ltv;

        Ok(UserStakeInfoResponse {
            staked_amount: position.staked,
            locked_collateral: position.locked,
            available_stake: position.available(),
            max_borrow_capacity: max_loan_for_collateral(position.available(), ltv),
            is_village_pool_member: self.is_cohort_member(store, PoolCohort::Village, &user),
            is_urban_pool_member: self.is_cohort_member(store, PoolCohort::Urban, &user),
            is_eligible_for_lending: self.is_pool_member(store, &user)?,
            loan_to_value_ratio: percent(ltv),
        })
    }

    pub fn query_collateral_loan<S: KvStore + ?Sized>(
        &self,
        store: &S,
        borrower: &str,
    ) -> Result<CollateralLoanResponse, KeeperError> {
        let borrower = parse_address(borrower)?;
        Ok(CollateralLoanResponse {
            loan: self.collateral_loan(store, &borrower)?,
        })
    }

    pub fn query_loan_breakdown(
        &self,
        req: &LoanBreakdownRequest,
    ) -> Result<LoanBreakdownResponse, KeeperError> {
        let loan_amount = parse_positive_amount("loan_amount", &req.loan_amount)?;
        let interest_rate = parse_amount("interest_rate", &req.interest_rate)?;
        let breakdown = self.loan_breakdown(loan_amount, interest_rate, req.term_months)?;
        let params = self.params();
        let processing_fee_details = format!(
            "{}% processing fee (capped at ₹{}). Your fee: ₹{}",
            percent(params.processing_fee_rate),
            to_whole_rupees(params.processing_fee_cap),
            to_whole_rupees(breakdown.processing_fee)
        );
        Ok(LoanBreakdownResponse {
            breakdown,
            processing_fee_details,
        })
    }

    pub fn query_fee_calculator(
        &self,
        req: &FeeCalculatorRequest,
    ) -> Result<FeeCalculatorResponse, KeeperError> {
        let loan_amount = parse_optional_amount("loan_amount", &req.loan_amount)?;
        let remaining = parse_optional_amount("remaining_principal", &req.remaining_principal)?;
        let params = self.params();

        let processing_fee = loan_amount.map(|amount| self.processing_fee(amount));
        Ok(FeeCalculatorResponse {
            processing_fee,
            disbursed_amount: loan_amount.zip(processing_fee).map(|(amount, fee)| amount - fee),
            early_settlement_fee: remaining.map(|principal| self.early_settlement_fee(principal)),
            processing_fee_rate: format!("{}%", percent(params.processing_fee_rate)),
            processing_fee_cap: format!("₹{}", to_whole_rupees(params.processing_fee_cap)),
            early_settlement_rate: format!("{}%", percent(params.early_settlement_rate)),
        })
    }
}
