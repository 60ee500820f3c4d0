//! External capabilities consumed by the liquidity manager
//!
//! - `PoolValueSources`: read-only views of the sub-pools backing lending
//! - `Bank`: moves funds between borrowers and the module account
//!
//! The pool aggregator is failure-tolerant: a source that errors or reports
//! a negative value contributes zero, so a down dependency shrinks the
//! capacity estimate instead of blocking lending decisions.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::warn;
use types::ids::Address;

use crate::errors::{BankError, SourceError};

/// Read-only views of the liquidity that backs lending
pub trait PoolValueSources {
    /// Village and urban Suraksha pool value
    fn suraksha_pool_value(&self) -> Result<Decimal, SourceError>;

    /// Money-order DEX liquidity value
    fn dex_liquidity_value(&self) -> Result<Decimal, SourceError>;

    /// Value currently deployed in outstanding loans
    fn lending_book_value(&self) -> Result<Decimal, SourceError>;
}

/// Per-source contribution to the total pool value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolValueBreakdown {
    pub suraksha: Decimal,
    pub dex: Decimal,
    pub lending_book: Decimal,
}

impl PoolValueBreakdown {
    /// Sum of all sources, saturating at `Decimal::MAX`
    pub fn total(&self) -> Decimal {
        self.suraksha
            .saturating_add(self.dex)
            .saturating_add(self.lending_book)
    }
}

/// Query every source, substituting zero for failures
pub fn aggregate_pool_value<P: PoolValueSources + ?Sized>(sources: &P) -> PoolValueBreakdown {
    PoolValueBreakdown {
        suraksha: contribution("suraksha", sources.suraksha_pool_value()),
        dex: contribution("dex", sources.dex_liquidity_value()),
        lending_book: contribution("lending_book", sources.lending_book_value()),
    }
}

fn contribution(name: &'static str, reported: Result<Decimal, SourceError>) -> Decimal {
    match reported {
        Ok(value) if value.is_sign_negative() && !value.is_zero() => {
            warn!(source = name, %value, "Pool source reported negative value, counting zero");
            Decimal::ZERO
        }
        Ok(value) => value,
        Err(err) => {
            warn!(source = name, error = %err, "Pool source unavailable, counting zero");
            Decimal::ZERO
        }
    }
}

/// No sub-pool integrations wired: every source reports zero
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExternalPools;

impl PoolValueSources for NoExternalPools {
    fn suraksha_pool_value(&self) -> Result<Decimal, SourceError> {
        Ok(Decimal::ZERO)
    }

    fn dex_liquidity_value(&self) -> Result<Decimal, SourceError> {
        Ok(Decimal::ZERO)
    }

    fn lending_book_value(&self) -> Result<Decimal, SourceError> {
        Ok(Decimal::ZERO)
    }
}

/// Fixed sub-pool values; `None` behaves as an unavailable source
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FixedPoolValues {
    pub suraksha: Option<Decimal>,
    pub dex: Option<Decimal>,
    pub lending_book: Option<Decimal>,
}

impl FixedPoolValues {
    /// Entire pool value reported by the Suraksha source
    pub fn suraksha_only(value: Decimal) -> Self {
        Self {
            suraksha: Some(value),
            dex: Some(Decimal::ZERO),
            lending_book: Some(Decimal::ZERO),
        }
    }
}

fn fixed(name: &'static str, value: Option<Decimal>) -> Result<Decimal, SourceError> {
    value.ok_or(SourceError::Unavailable {
        source_name: name,
        reason: "no value reported".to_string(),
    })
}

impl PoolValueSources for FixedPoolValues {
    fn suraksha_pool_value(&self) -> Result<Decimal, SourceError> {
        fixed("suraksha", self.suraksha)
    }

    fn dex_liquidity_value(&self) -> Result<Decimal, SourceError> {
        fixed("dex", self.dex)
    }

    fn lending_book_value(&self) -> Result<Decimal, SourceError> {
        fixed("lending_book", self.lending_book)
    }
}

// ── Bank ────────────────────────────────────────────────────────────

/// Transfer capability for the lending module account
pub trait Bank {
    /// Move `amount` from the module account to `recipient`
    fn send_from_module(&mut self, recipient: &Address, amount: Decimal) -> Result<(), BankError>;

    /// Move `amount` from `sender` into the module account
    fn send_to_module(&mut self, sender: &Address, amount: Decimal) -> Result<(), BankError>;
}

/// Bank for hosts where the calling lending module disburses funds itself
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBank;

impl Bank for NoopBank {
    fn send_from_module(&mut self, _recipient: &Address, _amount: Decimal) -> Result<(), BankError> {
        Ok(())
    }

    fn send_to_module(&mut self, _sender: &Address, _amount: Decimal) -> Result<(), BankError> {
        Ok(())
    }
}

/// Module account with a finite balance, crediting recipients in memory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerBank {
    module_balance: Decimal,
    balances: BTreeMap<Address, Decimal>,
}

impl LedgerBank {
    pub fn with_module_balance(module_balance: Decimal) -> Self {
        Self {
            module_balance,
            balances: BTreeMap::new(),
        }
    }

    pub fn module_balance(&self) -> Decimal {
        self.module_balance
    }

    pub fn balance(&self, account: &Address) -> Decimal {
        self.balances.get(account).copied().unwrap_or(Decimal::ZERO)
    }

    /// Fund an account from outside the module
    pub fn credit(&mut self, account: &Address, amount: Decimal) {
        let balance = self.balances.entry(account.clone()).or_insert(Decimal::ZERO);
        *balance = balance.saturating_add(amount);
    }
}

fn reject_negative(amount: Decimal) -> Result<(), BankError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(BankError::Rejected {
            reason: format!("negative transfer amount {amount}"),
        });
    }
    Ok(())
}

impl Bank for LedgerBank {
    fn send_from_module(&mut self, recipient: &Address, amount: Decimal) -> Result<(), BankError> {
        reject_negative(amount)?;
        if amount > self.module_balance {
            return Err(BankError::InsufficientFunds {
                required: amount.to_string(),
                available: self.module_balance.to_string(),
            });
        }
        self.module_balance -= amount;
        self.credit(recipient, amount);
        Ok(())
    }

    fn send_to_module(&mut self, sender: &Address, amount: Decimal) -> Result<(), BankError> {
        reject_negative(amount)?;
        let available = self.balance(sender);
        if amount > available {
            return Err(BankError::InsufficientFunds {
                required: amount.to_string(),
                available: available.to_string(),
            });
        }
        let module_balance = self
            .module_balance
            .checked_add(amount)
            .ok_or_else(|| BankError::Rejected {
                reason: "module balance overflow".to_string(),
            })?;
        self.balances.insert(sender.clone(), available - amount);
        self.module_balance = module_balance;
        Ok(())
    }
}
