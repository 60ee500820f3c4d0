//! Fee and amortization calculator
//!
//! Pure functions of `LiquidityParams` and request values.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::num::NonZeroU32;
use types::loan::{CollateralLoan, LoanBreakdown};
use types::params::LiquidityParams;

const MONTHS_PER_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);
const DAYS_PER_YEAR: Decimal = Decimal::from_parts(365, 0, 0, false, 0);

/// Processing fee: `loan × rate`, capped
pub fn processing_fee(params: &LiquidityParams, loan_amount: Decimal) -> Decimal {
    (loan_amount * params.processing_fee_rate).min(params.processing_fee_cap)
}

/// Net amount paid out after the processing fee
pub fn disbursed_amount(params: &LiquidityParams, approved_amount: Decimal) -> Decimal {
    approved_amount - processing_fee(params, approved_amount)
}

/// Fee for settling early, charged on outstanding principal only
pub fn early_settlement_fee(params: &LiquidityParams, remaining_principal: Decimal) -> Decimal {
    remaining_principal * params.early_settlement_rate
}

/// Simplified (flat-rate) EMI split into principal and interest parts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimplifiedEmi {
    pub monthly_principal: Decimal,
    pub monthly_interest: Decimal,
}

impl SimplifiedEmi {
    pub fn installment(&self) -> Option<Decimal> {
        self.monthly_principal.checked_add(self.monthly_interest)
    }
}

/// Flat-rate installment: interest accrues on the full principal every
/// month. This is not declining-balance amortization.
///
/// `None` when the request overflows decimal range.
pub fn simplified_emi(
    principal: Decimal,
    annual_rate: Decimal,
    term_months: NonZeroU32,
) -> Option<SimplifiedEmi> {
    let monthly_rate = annual_rate.checked_div(MONTHS_PER_YEAR)?;
    Some(SimplifiedEmi {
        monthly_principal: principal.checked_div(Decimal::from(term_months.get()))?,
        monthly_interest: principal.checked_mul(monthly_rate)?,
    })
}

/// Full cost breakdown for a loan
///
/// A zero loan amount yields a zero effective fee rate. `None` when any
/// intermediate amount overflows decimal range.
pub fn loan_breakdown(
    params: &LiquidityParams,
    loan_amount: Decimal,
    annual_rate: Decimal,
    term_months: NonZeroU32,
) -> Option<LoanBreakdown> {
    let fee = processing_fee(params, loan_amount);
    let emi = simplified_emi(loan_amount, annual_rate, term_months)?;
    let total_interest = emi
        .monthly_interest
        .checked_mul(Decimal::from(term_months.get()))?;
    let effective_fee_rate = if loan_amount.is_zero() {
        Decimal::ZERO
    } else {
        fee.checked_div(loan_amount)?
    };

    Some(LoanBreakdown {
        approved_amount: loan_amount,
        processing_fee: fee,
        disbursed_amount: loan_amount - fee,
        interest_rate: annual_rate,
        total_interest,
        total_repayment: loan_amount.checked_add(total_interest)?,
        monthly_emi: emi.installment()?,
        term_months: term_months.get(),
        effective_fee_rate,
    })
}

/// Amount a borrower pays to close a stake-backed loan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub principal: Decimal,
    /// Simple interest for whole days elapsed, actual/365
    pub interest: Decimal,
    pub early_settlement_fee: Decimal,
}

impl Settlement {
    pub fn total(&self) -> Option<Decimal> {
        self.principal
            .checked_add(self.interest)?
            .checked_add(self.early_settlement_fee)
    }
}

/// Settlement owed on `loan` at `settled_at`
///
/// Stake-backed loans carry no schedule, so the whole principal is treated
/// as settled early.
pub fn collateral_loan_settlement(
    params: &LiquidityParams,
    loan: &CollateralLoan,
    settled_at: DateTime<Utc>,
) -> Option<Settlement> {
    let days = (settled_at - loan.originated_at).num_days().max(0);
    let interest = loan
        .loan_amount
        .checked_mul(loan.interest_rate)?
        .checked_mul(Decimal::from(days))?
        .checked_div(DAYS_PER_YEAR)?;
    Some(Settlement {
        principal: loan.loan_amount,
        interest,
        early_settlement_fee: early_settlement_fee(params, loan.loan_amount),
    })
}
