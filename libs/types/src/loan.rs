//! Loan records and cost breakdowns

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::Address;
use crate::status::LendingModule;

/// Stake-backed loan record
///
/// Created on admission, deactivated on repayment, never deleted.
/// A borrower holds at most one active record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollateralLoan {
    pub borrower: Address,
    pub loan_amount: Decimal,
    pub collateral_amount: Decimal,
    pub originated_at: DateTime<Utc>,
    pub interest_rate: Decimal,
    pub module: LendingModule,
    pub active: bool,
    pub repaid_at: Option<DateTime<Utc>>,
}

impl CollateralLoan {
    /// Create a new active loan record
    pub fn new(
        borrower: Address,
        loan_amount: Decimal,
        collateral_amount: Decimal,
        interest_rate: Decimal,
        module: LendingModule,
        originated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            borrower,
            loan_amount,
            collateral_amount,
            originated_at,
            interest_rate,
            module,
            active: true,
            repaid_at: None,
        }
    }

    /// Mark the loan repaid
    pub fn close(&mut self, repaid_at: DateTime<Utc>) {
        self.active = false;
        self.repaid_at = Some(repaid_at);
    }

    /// Loan-to-value ratio of this record
    pub fn loan_to_value(&self) -> Decimal {
        if self.collateral_amount.is_zero() {
            return Decimal::ZERO;
        }
        self.loan_amount / self.collateral_amount
    }
}

/// Transparent cost breakdown for a loan
///
/// `monthly_emi` is a simplified flat-rate installment: interest is charged
/// on the full principal for every month of the term, not on the declining
/// balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanBreakdown {
    pub approved_amount: Decimal,
    pub processing_fee: Decimal,
    pub disbursed_amount: Decimal,
    pub interest_rate: Decimal,
    pub total_interest: Decimal,
    pub total_repayment: Decimal,
    pub monthly_emi: Decimal,
    pub term_months: u32,
    pub effective_fee_rate: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn borrower() -> Address {
        Address::parse("desh1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc5lzv7xu").unwrap()
    }

    #[test]
    fn test_collateral_loan_lifecycle() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let mut loan = CollateralLoan::new(
            borrower(),
            Decimal::from(70),
            Decimal::from(100),
            Decimal::new(8, 2),
            LendingModule::Krishimitra,
            start,
        );
        assert!(loan.active);
        assert_eq!(loan.loan_to_value(), Decimal::new(7, 1));

        let end = Utc.with_ymd_and_hms(2026, 9, 1, 9, 0, 0).unwrap();
        loan.close(end);
        assert!(!loan.active);
        assert_eq!(loan.repaid_at, Some(end));
    }

    #[test]
    fn test_loan_serialization() {
        let loan = CollateralLoan::new(
            borrower(),
            Decimal::from(70),
            Decimal::from(100),
            Decimal::new(8, 2),
            LendingModule::Vyavasayamitra,
            Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
        );
        let json = serde_json::to_string(&loan).unwrap();
        let back: CollateralLoan = serde_json::from_str(&json).unwrap();
        assert_eq!(loan, back);
    }
}
