//! Liquidity keeper
//!
//! Ties together pool aggregation, the status engine, admission checks,
//! the collateral ledger and fee policy. Every mutating operation runs its
//! admission check and its writes against one `StoreBranch`, so a rejected
//! or failed operation leaves the store untouched and two admissions can
//! never both pass against the same pre-state.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::num::NonZeroU32;
use tracing::{debug, info};
use types::errors::{InputError, ParamsError};
use types::ids::Address;
use types::loan::{CollateralLoan, LoanBreakdown};
use types::params::LiquidityParams;
use types::status::{LendingModule, PoolCohort};

use crate::admission::{self, AdmissionDecision, LoanRequest, Rejection, StakePosition};
use crate::collateral;
use crate::config::LendingConfig;
use crate::errors::{KeeperError, StoreError};
use crate::events::{LendingEvent, LendingEventType};
use crate::fees::{self, Settlement};
use crate::sources::{aggregate_pool_value, Bank, PoolValueBreakdown, PoolValueSources};
use crate::status::{self, LiquidityInfo};
use crate::store::{keys, read, read_decimal, write, KvStore, StoreBranch};

/// Result of an admitted pool-funded loan
#[derive(Debug, Clone, PartialEq)]
pub struct LoanReceipt {
    pub amount: Decimal,
    pub processing_fee: Decimal,
    pub disbursed_amount: Decimal,
    /// Daily counter after this loan
    pub daily_used: Decimal,
    pub event: LendingEvent,
}

/// Result of an admitted stake-backed loan
#[derive(Debug, Clone, PartialEq)]
pub struct CollateralLoanReceipt {
    pub loan: CollateralLoan,
    pub processing_fee: Decimal,
    pub disbursed_amount: Decimal,
    /// Locked balance after pledging
    pub locked_total: Decimal,
    pub event: LendingEvent,
}

/// Terms of a stake-backed loan request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollateralLoanTerms {
    pub loan_amount: Decimal,
    pub collateral_amount: Decimal,
    /// Annual rate recorded on the loan
    pub interest_rate: Decimal,
    pub module: LendingModule,
    pub originated_at: DateTime<Utc>,
}

fn non_positive(field: &'static str, value: Decimal) -> KeeperError {
    InputError::NonPositive {
        field,
        value: value.to_string(),
    }
    .into()
}

fn negative(field: &'static str, value: Decimal) -> KeeperError {
    InputError::NegativeAmount {
        field,
        value: value.to_string(),
    }
    .into()
}

/// Keeper for the liquidity manager module
///
/// Owns parameters, business config and the external capabilities. State
/// lives in the store handle passed to each call.
#[derive(Debug, Clone)]
pub struct LiquidityKeeper<P: PoolValueSources, B: Bank> {
    params: LiquidityParams,
    config: LendingConfig,
    authority: Address,
    sources: P,
    bank: B,
}

impl<P: PoolValueSources, B: Bank> LiquidityKeeper<P, B> {
    /// Create a keeper with default params and config
    pub fn new(authority: Address, sources: P, bank: B) -> Self {
        Self {
            params: LiquidityParams::default(),
            config: LendingConfig::default(),
            authority,
            sources,
            bank,
        }
    }

    /// Create a keeper with custom params and config, both validated
    pub fn with_config(
        params: LiquidityParams,
        config: LendingConfig,
        authority: Address,
        sources: P,
        bank: B,
    ) -> Result<Self, ParamsError> {
        params.validate()?;
        config.validate()?;
        Ok(Self {
            params,
            config,
            authority,
            sources,
            bank,
        })
    }

    pub fn params(&self) -> &LiquidityParams {
        &self.params
    }

    /// Replace governance params after validating them
    pub fn set_params(&mut self, params: LiquidityParams) -> Result<(), ParamsError> {
        params.validate()?;
        info!(
            basic = %params.lending_basic_threshold,
            medium = %params.lending_medium_threshold,
            full = %params.lending_full_threshold,
            "Liquidity params updated"
        );
        self.params = params;
        Ok(())
    }

    /// Governance params update. Authority only.
    pub fn update_params(
        &mut self,
        caller: &Address,
        params: LiquidityParams,
    ) -> Result<LendingEvent, KeeperError> {
        self.ensure_authority(caller)?;
        self.set_params(params.clone())?;
        Ok(LendingEvent::new(LendingEventType::ParamsUpdated { params }))
    }

    pub fn config(&self) -> &LendingConfig {
        &self.config
    }

    pub fn authority(&self) -> &Address {
        &self.authority
    }

    pub fn sources(&self) -> &P {
        &self.sources
    }

    pub fn sources_mut(&mut self) -> &mut P {
        &mut self.sources
    }

    pub fn bank(&self) -> &B {
        &self.bank
    }

    pub fn bank_mut(&mut self) -> &mut B {
        &mut self.bank
    }

    // ── Liquidity reads ─────────────────────────────────────────────

    /// Per-source pool value
    pub fn pool_value_breakdown(&self) -> PoolValueBreakdown {
        aggregate_pool_value(&self.sources)
    }

    /// Total value backing lending
    pub fn total_pool_value(&self) -> Decimal {
        self.pool_value_breakdown().total()
    }

    /// Fresh liquidity snapshot
    pub fn liquidity_info(&self) -> LiquidityInfo {
        status::liquidity_info(self.total_pool_value(), &self.params, &self.config)
    }

    pub fn is_lending_available(&self) -> bool {
        self.liquidity_info().status.is_lending_available()
    }

    // ── Membership and stake ────────────────────────────────────────

    /// Whether `user` belongs to a Suraksha cohort
    pub fn is_cohort_member<S: KvStore + ?Sized>(
        &self,
        store: &S,
        cohort: PoolCohort,
        user: &Address,
    ) -> bool {
        store.has(&keys::membership(cohort, user))
    }

    /// Village member, urban member, or staked at least the minimum
    pub fn is_pool_member<S: KvStore + ?Sized>(
        &self,
        store: &S,
        user: &Address,
    ) -> Result<bool, StoreError> {
        if self.is_cohort_member(store, PoolCohort::Village, user)
            || self.is_cohort_member(store, PoolCohort::Urban, user)
        {
            return Ok(true);
        }
        Ok(collateral::staked_amount(store, user)? >= self.config.min_stake_for_lending)
    }

    pub fn stake_position<S: KvStore + ?Sized>(
        &self,
        store: &S,
        user: &Address,
    ) -> Result<StakePosition, StoreError> {
        collateral::stake_position(store, user)
    }

    /// Record or clear cohort membership. Authority only.
    pub fn set_pool_membership<S: KvStore + ?Sized>(
        &self,
        store: &mut S,
        caller: &Address,
        user: &Address,
        cohort: PoolCohort,
        active: bool,
    ) -> Result<LendingEvent, KeeperError> {
        self.ensure_authority(caller)?;
        let key = keys::membership(cohort, user);
        if active {
            store.set(&key, vec![1]);
        } else {
            store.delete(&key);
        }
        info!(user = %user, cohort = cohort.as_str(), active, "Pool membership updated");
        Ok(LendingEvent::new(LendingEventType::PoolMembershipUpdated {
            user: user.clone(),
            cohort,
            active,
        }))
    }

    /// Overwrite a user's staked NAMO. Authority only.
    pub fn set_staked_amount<S: KvStore + ?Sized>(
        &self,
        store: &mut S,
        caller: &Address,
        user: &Address,
        amount: Decimal,
    ) -> Result<LendingEvent, KeeperError> {
        self.ensure_authority(caller)?;
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(negative("staked_amount", amount));
        }
        collateral::set_staked_amount(store, user, amount)?;
        info!(user = %user, %amount, "Staked amount updated");
        Ok(LendingEvent::new(LendingEventType::StakedAmountUpdated {
            user: user.clone(),
            amount,
        }))
    }

    fn ensure_authority(&self, caller: &Address) -> Result<(), KeeperError> {
        if caller != &self.authority {
            return Err(KeeperError::Unauthorized {
                caller: caller.to_string(),
            });
        }
        Ok(())
    }

    // ── Daily counter ───────────────────────────────────────────────

    /// Pool-funded lending recorded today
    pub fn daily_lending_used<S: KvStore + ?Sized>(&self, store: &S) -> Result<Decimal, StoreError> {
        read_decimal(store, keys::DAILY_LENDING_USED)
    }

    /// Clear the daily counter
    pub fn reset_daily_lending<S: KvStore + ?Sized>(
        &self,
        store: &mut S,
    ) -> Result<LendingEvent, StoreError> {
        let previous_used = self.daily_lending_used(store)?;
        write(store, keys::DAILY_LENDING_USED, &Decimal::ZERO)?;
        info!(%previous_used, "Daily lending counter reset");
        Ok(LendingEvent::new(LendingEventType::DailyLendingReset { previous_used }))
    }

    /// End-of-block hook: reset the daily counter once per UTC day
    ///
    /// The first call only records the current day.
    pub fn end_block<S: KvStore + ?Sized>(
        &self,
        store: &mut S,
        block_time: DateTime<Utc>,
    ) -> Result<Option<LendingEvent>, StoreError> {
        let today = block_time.date_naive();
        let last: Option<chrono::NaiveDate> = read(store, keys::LAST_DAILY_RESET)?;

        match last {
            Some(day) if day >= today => Ok(None),
            Some(_) => {
                let event = self.reset_daily_lending(store)?;
                write(store, keys::LAST_DAILY_RESET, &today)?;
                Ok(Some(event))
            }
            None => {
                write(store, keys::LAST_DAILY_RESET, &today)?;
                debug!(%today, "Daily reset clock initialized");
                Ok(None)
            }
        }
    }

    // ── Pool-funded loans ───────────────────────────────────────────

    fn check_loan<S: KvStore + ?Sized>(
        &self,
        store: &S,
        info: &LiquidityInfo,
        borrower: &Address,
        amount: Decimal,
        module: &str,
    ) -> Result<Result<(), Rejection>, StoreError> {
        let is_member = self.is_pool_member(store, borrower)?;
        let daily_used = self.daily_lending_used(store)?;
        Ok(admission::check_loan(
            info,
            self.params.lending_basic_threshold,
            is_member,
            daily_used,
            LoanRequest { amount, module },
        ))
    }

    /// Admission decision for a pool-funded loan, without side effects
    pub fn can_process_loan<S: KvStore + ?Sized>(
        &self,
        store: &S,
        borrower: &Address,
        amount: Decimal,
        module: &str,
    ) -> Result<AdmissionDecision, StoreError> {
        let info = self.liquidity_info();
        Ok(self.check_loan(store, &info, borrower, amount, module)?.into())
    }

    /// Admit a pool-funded loan, record it against the daily cap and
    /// disburse the net amount
    ///
    /// Nothing is written unless every step succeeds.
    pub fn process_loan<S: KvStore>(
        &mut self,
        store: &mut S,
        borrower: &Address,
        amount: Decimal,
        module: &str,
    ) -> Result<LoanReceipt, KeeperError> {
        if amount <= Decimal::ZERO {
            return Err(non_positive("amount", amount));
        }

        let info = self.liquidity_info();
        let mut branch = StoreBranch::new(store);

        if let Err(rejection) = self.check_loan(&branch, &info, borrower, amount, module)? {
            debug!(borrower = %borrower, %amount, module, reason = %rejection, "Loan rejected");
            return Err(KeeperError::Rejected(rejection));
        }
        let lending_module = info
            .available_modules
            .iter()
            .copied()
            .find(|m| m.as_str() == module)
            .ok_or_else(|| {
                KeeperError::Rejected(Rejection::ModuleUnavailable {
                    module: module.to_string(),
                })
            })?;

        let daily_used = self
            .daily_lending_used(&branch)?
            .checked_add(amount)
            .ok_or(KeeperError::Overflow { what: "daily_lending_used" })?;
        write(&mut branch, keys::DAILY_LENDING_USED, &daily_used)?;

        let processing_fee = fees::processing_fee(&self.params, amount);
        let disbursed_amount = amount - processing_fee;
        self.bank.send_from_module(borrower, disbursed_amount)?;
        branch.commit();

        info!(
            borrower = %borrower,
            module,
            %amount,
            %processing_fee,
            %daily_used,
            status = info.status.as_str(),
            "Loan processed"
        );

        let event = LendingEvent::new(LendingEventType::LoanProcessed {
            borrower: borrower.clone(),
            module: lending_module,
            amount,
            processing_fee,
            disbursed: disbursed_amount,
            status: info.status,
            daily_used,
        });
        Ok(LoanReceipt {
            amount,
            processing_fee,
            disbursed_amount,
            daily_used,
            event,
        })
    }

    // ── Stake-backed loans ──────────────────────────────────────────

    fn check_collateral_loan<S: KvStore + ?Sized>(
        &self,
        store: &S,
        borrower: &Address,
        loan_amount: Decimal,
        collateral_amount: Decimal,
    ) -> Result<Result<(), Rejection>, StoreError> {
        let stake = collateral::stake_position(store, borrower)?;
        let checked = admission::check_collateral_loan(
            loan_amount,
            collateral_amount,
            self.config.collateral_ltv,
            stake,
        );
        if checked.is_err() {
            return Ok(checked);
        }
        if self.active_collateral_loan(store, borrower)?.is_some() {
            return Ok(Err(Rejection::ActiveLoanExists));
        }
        Ok(Ok(()))
    }

    /// Admission decision for a stake-backed loan, without side effects
    pub fn can_process_collateral_loan<S: KvStore + ?Sized>(
        &self,
        store: &S,
        borrower: &Address,
        loan_amount: Decimal,
        collateral_amount: Decimal,
    ) -> Result<AdmissionDecision, StoreError> {
        Ok(self
            .check_collateral_loan(store, borrower, loan_amount, collateral_amount)?
            .into())
    }

    /// Loan record for `borrower`, active or not
    pub fn collateral_loan<S: KvStore + ?Sized>(
        &self,
        store: &S,
        borrower: &Address,
    ) -> Result<Option<CollateralLoan>, StoreError> {
        read(store, &keys::collateral_loan(borrower))
    }

    fn active_collateral_loan<S: KvStore + ?Sized>(
        &self,
        store: &S,
        borrower: &Address,
    ) -> Result<Option<CollateralLoan>, StoreError> {
        Ok(self.collateral_loan(store, borrower)?.filter(|loan| loan.active))
    }

    /// Admit a stake-backed loan, lock its collateral, store the record and
    /// disburse the net amount
    ///
    /// Stake-backed loans are not counted against the daily cap.
    pub fn process_collateral_loan<S: KvStore>(
        &mut self,
        store: &mut S,
        borrower: &Address,
        terms: CollateralLoanTerms,
    ) -> Result<CollateralLoanReceipt, KeeperError> {
        let CollateralLoanTerms {
            loan_amount,
            collateral_amount,
            interest_rate,
            module,
            originated_at,
        } = terms;
        if loan_amount <= Decimal::ZERO {
            return Err(non_positive("loan_amount", loan_amount));
        }
        if collateral_amount <= Decimal::ZERO {
            return Err(non_positive("collateral_amount", collateral_amount));
        }
        if interest_rate.is_sign_negative() && !interest_rate.is_zero() {
            return Err(negative("interest_rate", interest_rate));
        }

        let mut branch = StoreBranch::new(store);
        if let Err(rejection) =
            self.check_collateral_loan(&branch, borrower, loan_amount, collateral_amount)?
        {
            debug!(
                borrower = %borrower,
                %loan_amount,
                %collateral_amount,
                reason = %rejection,
                "Collateral loan rejected"
            );
            return Err(KeeperError::Rejected(rejection));
        }

        let locked_total = collateral::lock(&mut branch, borrower, collateral_amount)?;
        let loan = CollateralLoan::new(
            borrower.clone(),
            loan_amount,
            collateral_amount,
            interest_rate,
            module,
            originated_at,
        );
        write(&mut branch, &keys::collateral_loan(borrower), &loan)?;

        let processing_fee = fees::processing_fee(&self.params, loan_amount);
        let disbursed_amount = loan_amount - processing_fee;
        self.bank.send_from_module(borrower, disbursed_amount)?;
        branch.commit();

        info!(
            borrower = %borrower,
            module = module.as_str(),
            %loan_amount,
            %collateral_amount,
            %locked_total,
            "Collateral loan processed"
        );

        let event = LendingEvent::new(LendingEventType::CollateralLoanProcessed {
            borrower: borrower.clone(),
            module,
            loan_amount,
            collateral_amount,
            originated_at,
        });
        Ok(CollateralLoanReceipt {
            loan,
            processing_fee,
            disbursed_amount,
            locked_total,
            event,
        })
    }

    /// Amount owed to close the borrower's active loan at `at`
    pub fn collateral_loan_settlement<S: KvStore + ?Sized>(
        &self,
        store: &S,
        borrower: &Address,
        at: DateTime<Utc>,
    ) -> Result<Settlement, KeeperError> {
        let loan = self
            .active_collateral_loan(store, borrower)?
            .ok_or_else(|| KeeperError::NoActiveLoan {
                borrower: borrower.to_string(),
            })?;
        fees::collateral_loan_settlement(&self.params, &loan, at)
            .ok_or(KeeperError::Overflow { what: "collateral_loan_settlement" })
    }

    /// Collect the settlement from the borrower, close the active loan and
    /// release its collateral
    ///
    /// Nothing is written unless the borrower's payment goes through.
    pub fn repay_collateral_loan<S: KvStore>(
        &mut self,
        store: &mut S,
        borrower: &Address,
        repaid_at: DateTime<Utc>,
    ) -> Result<LendingEvent, KeeperError> {
        let mut branch = StoreBranch::new(store);
        let mut loan = self
            .active_collateral_loan(&branch, borrower)?
            .ok_or_else(|| KeeperError::NoActiveLoan {
                borrower: borrower.to_string(),
            })?;
        let settlement = fees::collateral_loan_settlement(&self.params, &loan, repaid_at)
            .ok_or(KeeperError::Overflow { what: "collateral_loan_settlement" })?;
        let amount_collected = settlement
            .total()
            .ok_or(KeeperError::Overflow { what: "collateral_loan_settlement" })?;

        collateral::unlock(&mut branch, borrower, loan.collateral_amount)?;
        loan.close(repaid_at);
        write(&mut branch, &keys::collateral_loan(borrower), &loan)?;

        self.bank.send_to_module(borrower, amount_collected)?;
        branch.commit();

        info!(
            borrower = %borrower,
            loan_amount = %loan.loan_amount,
            %amount_collected,
            collateral = %loan.collateral_amount,
            "Collateral loan repaid"
        );
        Ok(LendingEvent::new(LendingEventType::CollateralLoanRepaid {
            borrower: borrower.clone(),
            loan_amount: loan.loan_amount,
            interest: settlement.interest,
            settlement_fee: settlement.early_settlement_fee,
            amount_collected,
            collateral_released: loan.collateral_amount,
            repaid_at,
        }))
    }

    // ── Direct collateral ledger access ─────────────────────────────

    /// Add to the user's locked balance
    ///
    /// No stake check here: callers pledge only after
    /// `can_process_collateral_loan` has admitted the amount.
    pub fn lock_collateral<S: KvStore + ?Sized>(
        &self,
        store: &mut S,
        user: &Address,
        amount: Decimal,
    ) -> Result<LendingEvent, KeeperError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(negative("amount", amount));
        }
        let locked_total = collateral::lock(store, user, amount)?;
        debug!(user = %user, %amount, %locked_total, "Collateral locked");
        Ok(LendingEvent::new(LendingEventType::CollateralLocked {
            user: user.clone(),
            amount,
            locked_total,
        }))
    }

    /// Release part of the user's locked balance, floored at zero
    ///
    /// While a collateral loan is active the balance may not drop below
    /// that loan's collateral; repayment is the only way to release it.
    pub fn unlock_collateral<S: KvStore + ?Sized>(
        &self,
        store: &mut S,
        user: &Address,
        amount: Decimal,
    ) -> Result<LendingEvent, KeeperError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(negative("amount", amount));
        }
        if let Some(loan) = self.active_collateral_loan(&*store, user)? {
            let remaining = collateral::locked_amount(&*store, user)?.saturating_sub(amount);
            if remaining < loan.collateral_amount {
                debug!(user = %user, %amount, %remaining, "Unlock refused, collateral backs an active loan");
                return Err(KeeperError::CollateralBacksLoan {
                    user: user.to_string(),
                    locked: remaining.max(Decimal::ZERO).to_string(),
                    required: loan.collateral_amount.to_string(),
                });
            }
        }
        let locked_total = collateral::unlock(store, user, amount)?;
        debug!(user = %user, %amount, %locked_total, "Collateral unlocked");
        Ok(LendingEvent::new(LendingEventType::CollateralUnlocked {
            user: user.clone(),
            amount,
            locked_total,
        }))
    }

    /// True when `amount` exceeds the user's unpledged stake
    pub fn exceeds_available_collateral<S: KvStore + ?Sized>(
        &self,
        store: &S,
        user: &Address,
        amount: Decimal,
    ) -> Result<bool, StoreError> {
        collateral::exceeds_available_collateral(store, user, amount)
    }

    // ── Fees ────────────────────────────────────────────────────────

    pub fn processing_fee(&self, loan_amount: Decimal) -> Decimal {
        fees::processing_fee(&self.params, loan_amount)
    }

    pub fn early_settlement_fee(&self, remaining_principal: Decimal) -> Decimal {
        fees::early_settlement_fee(&self.params, remaining_principal)
    }

    /// Cost breakdown for a loan; the term must be at least one month
    pub fn loan_breakdown(
        &self,
        loan_amount: Decimal,
        annual_rate: Decimal,
        term_months: u32,
    ) -> Result<LoanBreakdown, KeeperError> {
        if loan_amount.is_sign_negative() && !loan_amount.is_zero() {
            return Err(negative("loan_amount", loan_amount));
        }
        let term = NonZeroU32::new(term_months).ok_or_else(|| {
            KeeperError::from(InputError::NonPositive {
                field: "term_months",
                value: term_months.to_string(),
            })
        })?;
        fees::loan_breakdown(&self.params, loan_amount, annual_rate, term)
            .ok_or(KeeperError::Overflow { what: "loan_breakdown" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::BankError;
    use crate::sources::{FixedPoolValues, LedgerBank, NoopBank};
    use crate::store::MemStore;
    use chrono::TimeZone;
    use types::numeric::{crores, lakhs, rupees};
    use types::status::LiquidityStatus;

    const AUTHORITY: &str = "desh1qgqsyqcyq5rqwzqfpg9scrgwpugpzysnzs23v9";
    const BORROWER: &str = "desh1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc5lzv7xu";

    fn addr(raw: &str) -> Address {
        Address::parse(raw).unwrap()
    }

    fn keeper_at(pool: Decimal) -> LiquidityKeeper<FixedPoolValues, NoopBank> {
        LiquidityKeeper::new(addr(AUTHORITY), FixedPoolValues::suraksha_only(pool), NoopBank)
    }

    fn member(keeper: &LiquidityKeeper<FixedPoolValues, NoopBank>, store: &mut MemStore) {
        keeper
            .set_pool_membership(store, &addr(AUTHORITY), &addr(BORROWER), PoolCohort::Village, true)
            .unwrap();
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    // ── Pool-funded loans ──

    #[test]
    fn test_building_rejects_with_estimate() {
        let keeper = keeper_at(crores(80));
        let store = MemStore::new();
        let decision = keeper
            .can_process_loan(&store, &addr(BORROWER), rupees(1_000), "krishimitra")
            .unwrap();
        let (ok, reason) = decision.into_pair();
        assert!(!ok);
        assert!(reason.contains("₹100 Cr"));
        assert!(reason.contains("4000 days"));
    }

    #[test]
    fn test_process_loan_records_daily_usage() {
        let mut keeper = keeper_at(crores(150));
        let mut store = MemStore::new();
        member(&keeper, &mut store);

        let receipt = keeper
            .process_loan(&mut store, &addr(BORROWER), rupees(40_000), "krishimitra")
            .unwrap();
        assert_eq!(receipt.processing_fee, rupees(400));
        assert_eq!(receipt.disbursed_amount, rupees(39_600));
        assert_eq!(keeper.daily_lending_used(&store).unwrap(), rupees(40_000));
        assert_eq!(receipt.event.label(), "loan_processed");
    }

    #[test]
    fn test_rejected_loan_leaves_store_untouched() {
        let mut keeper = keeper_at(crores(150));
        let mut store = MemStore::new();
        member(&keeper, &mut store);
        let before = store.clone();

        let err = keeper
            .process_loan(&mut store, &addr(BORROWER), rupees(60_000), "krishimitra")
            .unwrap_err();
        assert!(matches!(
            err,
            KeeperError::Rejected(Rejection::ExceedsMaxLoan { .. })
        ));
        assert_eq!(store, before);
    }

    #[test]
    fn test_bank_failure_rolls_back_daily_usage() {
        let mut keeper = LiquidityKeeper::new(
            addr(AUTHORITY),
            FixedPoolValues::suraksha_only(crores(150)),
            LedgerBank::with_module_balance(rupees(100)),
        );
        let mut store = MemStore::new();
        keeper
            .set_pool_membership(&mut store, &addr(AUTHORITY), &addr(BORROWER), PoolCohort::Urban, true)
            .unwrap();

        let err = keeper
            .process_loan(&mut store, &addr(BORROWER), rupees(10_000), "krishimitra")
            .unwrap_err();
        assert!(matches!(err, KeeperError::Bank(_)));
        assert_eq!(keeper.daily_lending_used(&store).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_non_member_with_enough_stake_is_member() {
        let keeper = keeper_at(crores(150));
        let mut store = MemStore::new();
        assert!(!keeper.is_pool_member(&store, &addr(BORROWER)).unwrap());
        keeper
            .set_staked_amount(&mut store, &addr(AUTHORITY), &addr(BORROWER), lakhs(1))
            .unwrap();
        assert!(keeper.is_pool_member(&store, &addr(BORROWER)).unwrap());
    }

    #[test]
    fn test_non_positive_amount_is_input_error() {
        let mut keeper = keeper_at(crores(150));
        let mut store = MemStore::new();
        let err = keeper
            .process_loan(&mut store, &addr(BORROWER), Decimal::ZERO, "krishimitra")
            .unwrap_err();
        assert!(matches!(err, KeeperError::Input(InputError::NonPositive { .. })));
    }

    // ── Authority ──

    #[test]
    fn test_membership_requires_authority() {
        let keeper = keeper_at(crores(150));
        let mut store = MemStore::new();
        let err = keeper
            .set_pool_membership(&mut store, &addr(BORROWER), &addr(BORROWER), PoolCohort::Village, true)
            .unwrap_err();
        assert!(matches!(err, KeeperError::Unauthorized { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn test_membership_can_be_revoked() {
        let keeper = keeper_at(crores(150));
        let mut store = MemStore::new();
        member(&keeper, &mut store);
        assert!(keeper.is_cohort_member(&store, PoolCohort::Village, &addr(BORROWER)));
        keeper
            .set_pool_membership(&mut store, &addr(AUTHORITY), &addr(BORROWER), PoolCohort::Village, false)
            .unwrap();
        assert!(!keeper.is_pool_member(&store, &addr(BORROWER)).unwrap());
    }

    // ── Stake-backed loans ──

    fn staked_keeper(stake: Decimal) -> (LiquidityKeeper<FixedPoolValues, NoopBank>, MemStore) {
        let keeper = keeper_at(crores(150));
        let mut store = MemStore::new();
        keeper
            .set_staked_amount(&mut store, &addr(AUTHORITY), &addr(BORROWER), stake)
            .unwrap();
        (keeper, store)
    }

    fn terms(loan_amount: Decimal, collateral_amount: Decimal) -> CollateralLoanTerms {
        CollateralLoanTerms {
            loan_amount,
            collateral_amount,
            interest_rate: Decimal::new(8, 2),
            module: LendingModule::Krishimitra,
            originated_at: at(2026, 3, 1, 10),
        }
    }

    #[test]
    fn test_collateral_loan_locks_and_repay_releases() {
        let (mut keeper, mut store) = staked_keeper(rupees(200_000));
        let receipt = keeper
            .process_collateral_loan(
                &mut store,
                &addr(BORROWER),
                terms(rupees(70_000), rupees(100_000)),
            )
            .unwrap();
        assert_eq!(receipt.locked_total, rupees(100_000));
        assert_eq!(receipt.disbursed_amount, rupees(69_300));
        // Not counted against the daily cap
        assert_eq!(keeper.daily_lending_used(&store).unwrap(), Decimal::ZERO);

        keeper
            .repay_collateral_loan(&mut store, &addr(BORROWER), at(2026, 6, 1, 10))
            .unwrap();
        let position = keeper.stake_position(&store, &addr(BORROWER)).unwrap();
        assert_eq!(position.locked, Decimal::ZERO);
        let loan = keeper.collateral_loan(&store, &addr(BORROWER)).unwrap().unwrap();
        assert!(!loan.active);
        assert_eq!(loan.repaid_at, Some(at(2026, 6, 1, 10)));
    }

    #[test]
    fn test_second_active_collateral_loan_rejected() {
        let (mut keeper, mut store) = staked_keeper(rupees(500_000));
        keeper
            .process_collateral_loan(
                &mut store,
                &addr(BORROWER),
                terms(rupees(10_000), rupees(20_000)),
            )
            .unwrap();
        let decision = keeper
            .can_process_collateral_loan(&store, &addr(BORROWER), rupees(10_000), rupees(20_000))
            .unwrap();
        assert_eq!(decision, AdmissionDecision::Rejected(Rejection::ActiveLoanExists));
    }

    #[test]
    fn test_collateral_loan_over_ltv_rejected() {
        let (keeper, store) = staked_keeper(rupees(200_000));
        let (ok, reason) = keeper
            .can_process_collateral_loan(&store, &addr(BORROWER), rupees(80_000), rupees(100_000))
            .unwrap()
            .into_pair();
        assert!(!ok);
        assert_eq!(
            reason,
            "Loan amount exceeds 70% collateral limit. Max loan: ₹70000 against ₹100000 collateral"
        );
    }

    #[test]
    fn test_repay_without_loan_fails() {
        let mut keeper = keeper_at(crores(150));
        let mut store = MemStore::new();
        let err = keeper
            .repay_collateral_loan(&mut store, &addr(BORROWER), at(2026, 1, 1, 0))
            .unwrap_err();
        assert!(matches!(err, KeeperError::NoActiveLoan { .. }));
    }

    fn ledger_keeper(stake: Decimal) -> (LiquidityKeeper<FixedPoolValues, LedgerBank>, MemStore) {
        let keeper = LiquidityKeeper::new(
            addr(AUTHORITY),
            FixedPoolValues::suraksha_only(crores(150)),
            LedgerBank::with_module_balance(crores(1)),
        );
        let mut store = MemStore::new();
        keeper
            .set_staked_amount(&mut store, &addr(AUTHORITY), &addr(BORROWER), stake)
            .unwrap();
        (keeper, store)
    }

    #[test]
    fn test_repay_collects_settlement_into_module() {
        let (mut keeper, mut store) = ledger_keeper(rupees(100_000));
        keeper
            .process_collateral_loan(&mut store, &addr(BORROWER), terms(rupees(70_000), rupees(100_000)))
            .unwrap();
        // Disbursed 69,300; top up to cover the settlement
        keeper.bank_mut().credit(&addr(BORROWER), rupees(10_000));
        let module_before = keeper.bank().module_balance();

        let settled_at = at(2026, 3, 1, 10) + chrono::Duration::days(365);
        let owed = keeper
            .collateral_loan_settlement(&store, &addr(BORROWER), settled_at)
            .unwrap();
        assert_eq!(owed.total(), Some(rupees(75_950)));

        let event = keeper
            .repay_collateral_loan(&mut store, &addr(BORROWER), settled_at)
            .unwrap();
        assert!(matches!(
            event.event_type,
            LendingEventType::CollateralLoanRepaid { amount_collected, .. } if amount_collected == rupees(75_950)
        ));
        assert_eq!(keeper.bank().module_balance(), module_before + rupees(75_950));
        assert_eq!(keeper.bank().balance(&addr(BORROWER)), rupees(3_350));
    }

    #[test]
    fn test_repay_without_funds_keeps_loan_and_collateral() {
        let (mut keeper, mut store) = ledger_keeper(rupees(100_000));
        keeper
            .process_collateral_loan(&mut store, &addr(BORROWER), terms(rupees(70_000), rupees(100_000)))
            .unwrap();
        let before = store.clone();

        // Only the net disbursement is held, short of the principal
        let err = keeper
            .repay_collateral_loan(&mut store, &addr(BORROWER), at(2026, 3, 2, 10))
            .unwrap_err();
        assert!(matches!(err, KeeperError::Bank(BankError::InsufficientFunds { .. })));
        assert_eq!(store, before);
        assert_eq!(keeper.stake_position(&store, &addr(BORROWER)).unwrap().locked, rupees(100_000));

        // Borrowing again is still blocked by the open loan
        let err = keeper
            .process_collateral_loan(&mut store, &addr(BORROWER), terms(rupees(1_000), rupees(2_000)))
            .unwrap_err();
        assert!(matches!(err, KeeperError::Rejected(_)));
        assert_eq!(keeper.bank().balance(&addr(BORROWER)), rupees(69_300));
    }

    #[test]
    fn test_unlock_cannot_release_loan_collateral() {
        let (mut keeper, mut store) = staked_keeper(rupees(200_000));
        keeper
            .process_collateral_loan(&mut store, &addr(BORROWER), terms(rupees(70_000), rupees(100_000)))
            .unwrap();
        keeper
            .lock_collateral(&mut store, &addr(BORROWER), rupees(20_000))
            .unwrap();

        let err = keeper
            .unlock_collateral(&mut store, &addr(BORROWER), rupees(20_001))
            .unwrap_err();
        assert!(matches!(err, KeeperError::CollateralBacksLoan { .. }));
        assert_eq!(keeper.stake_position(&store, &addr(BORROWER)).unwrap().locked, rupees(120_000));

        // Extra above the loan's collateral can still be released
        keeper
            .unlock_collateral(&mut store, &addr(BORROWER), rupees(20_000))
            .unwrap();
        assert_eq!(keeper.stake_position(&store, &addr(BORROWER)).unwrap().locked, rupees(100_000));
    }

    #[test]
    fn test_loan_breakdown_validates_term_and_range() {
        let keeper = keeper_at(crores(150));
        let err = keeper.loan_breakdown(rupees(10_000), Decimal::new(12, 2), 0).unwrap_err();
        assert!(matches!(err, KeeperError::Input(InputError::NonPositive { .. })));

        let err = keeper.loan_breakdown(Decimal::MAX, Decimal::from(12), 600).unwrap_err();
        assert!(matches!(err, KeeperError::Overflow { .. }));

        let b = keeper.loan_breakdown(rupees(120_000), Decimal::new(12, 2), 12).unwrap();
        assert_eq!(b.monthly_emi, rupees(11_200));
    }

    // ── Daily reset ──

    #[test]
    fn test_end_block_resets_on_new_day() {
        let mut keeper = keeper_at(crores(150));
        let mut store = MemStore::new();
        member(&keeper, &mut store);

        assert!(keeper.end_block(&mut store, at(2026, 3, 1, 9)).unwrap().is_none());
        keeper
            .process_loan(&mut store, &addr(BORROWER), rupees(10_000), "krishimitra")
            .unwrap();
        assert!(keeper.end_block(&mut store, at(2026, 3, 1, 23)).unwrap().is_none());
        assert_eq!(keeper.daily_lending_used(&store).unwrap(), rupees(10_000));

        let event = keeper.end_block(&mut store, at(2026, 3, 2, 0)).unwrap().unwrap();
        assert_eq!(event.label(), "daily_lending_reset");
        assert_eq!(keeper.daily_lending_used(&store).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_liquidity_info_reflects_sources() {
        let mut keeper = keeper_at(crores(80));
        assert_eq!(keeper.liquidity_info().status, LiquidityStatus::Building);
        keeper.sources_mut().suraksha = Some(crores(300));
        assert_eq!(keeper.liquidity_info().status, LiquidityStatus::Medium);
        assert!(keeper.is_lending_available());
    }

    #[test]
    fn test_set_params_rejects_invalid() {
        let mut keeper = keeper_at(crores(80));
        let mut params = LiquidityParams::default();
        params.lending_medium_threshold = crores(50);
        assert!(keeper.set_params(params).is_err());
        assert_eq!(keeper.params(), &LiquidityParams::default());
    }
}
