//! Genesis import and export
//!
//! `GenesisState` is the JSON document a chain starts from. Maps are
//! `BTreeMap`/`BTreeSet` so export order is deterministic and an
//! init → export round trip reproduces the input exactly.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;
use types::ids::Address;
use types::loan::CollateralLoan;
use types::params::LiquidityParams;
use types::status::PoolCohort;

use crate::config::LendingConfig;
use crate::errors::GenesisError;
use crate::keeper::LiquidityKeeper;
use crate::sources::{Bank, PoolValueSources};
use crate::store::{decode, keys, read, write, KvStore};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GenesisState {
    pub params: LiquidityParams,
    pub config: LendingConfig,
    pub daily_lending_used: Decimal,
    pub last_daily_reset: Option<NaiveDate>,
    pub village_members: BTreeSet<Address>,
    pub urban_members: BTreeSet<Address>,
    pub stakes: BTreeMap<Address, Decimal>,
    pub locked_collateral: BTreeMap<Address, Decimal>,
    pub collateral_loans: BTreeMap<Address, CollateralLoan>,
}

fn invalid(reason: String) -> GenesisError {
    GenesisError::InvalidState(reason)
}

impl GenesisState {
    pub fn from_json(json: &str) -> Result<Self, GenesisError> {
        serde_json::from_str(json).map_err(|e| GenesisError::Malformed(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, GenesisError> {
        serde_json::to_string_pretty(self).map_err(|e| GenesisError::Malformed(e.to_string()))
    }

    /// Check params, config and every record
    pub fn validate(&self) -> Result<(), GenesisError> {
        self.params.validate()?;
        self.config.validate()?;

        if self.daily_lending_used.is_sign_negative() && !self.daily_lending_used.is_zero() {
            return Err(invalid(format!(
                "daily_lending_used is negative: {}",
                self.daily_lending_used
            )));
        }
        for (addr, amount) in self.stakes.iter().chain(self.locked_collateral.iter()) {
            if amount.is_sign_negative() && !amount.is_zero() {
                return Err(invalid(format!("negative balance {amount} for {addr}")));
            }
        }
        for (addr, locked) in &self.locked_collateral {
            let staked = self.stakes.get(addr).copied().unwrap_or(Decimal::ZERO);
            if *locked > staked {
                return Err(invalid(format!(
                    "locked collateral {locked} exceeds stake {staked} for {addr}"
                )));
            }
        }
        for (addr, loan) in &self.collateral_loans {
            if &loan.borrower != addr {
                return Err(invalid(format!(
                    "collateral loan keyed by {addr} belongs to {}",
                    loan.borrower
                )));
            }
            if loan.active == loan.repaid_at.is_some() {
                return Err(invalid(format!(
                    "collateral loan for {addr} has inconsistent repayment state"
                )));
            }
        }
        Ok(())
    }
}

/// Validate `genesis`, write it into `store` and build the keeper
///
/// Any validation failure aborts before the store is written.
pub fn init_genesis<S, P, B>(
    store: &mut S,
    genesis: GenesisState,
    authority: Address,
    sources: P,
    bank: B,
) -> Result<LiquidityKeeper<P, B>, GenesisError>
where
    S: KvStore + ?Sized,
    P: PoolValueSources,
    B: Bank,
{
    genesis.validate()?;
    let GenesisState {
        params,
        config,
        daily_lending_used,
        last_daily_reset,
        village_members,
        urban_members,
        stakes,
        locked_collateral,
        collateral_loans,
    } = genesis;

    write(store, keys::DAILY_LENDING_USED, &daily_lending_used)?;
    if let Some(day) = last_daily_reset {
        write(store, keys::LAST_DAILY_RESET, &day)?;
    }
    for (cohort, members) in [(PoolCohort::Village, &village_members), (PoolCohort::Urban, &urban_members)] {
        for member in members {
            store.set(&keys::membership(cohort, member), vec![1]);
        }
    }
    for (addr, amount) in &stakes {
        write(store, &keys::staked(addr), amount)?;
    }
    for (addr, amount) in &locked_collateral {
        write(store, &keys::locked_collateral(addr), amount)?;
    }
    for (addr, loan) in &collateral_loans {
        write(store, &keys::collateral_loan(addr), loan)?;
    }

    info!(
        stakes = stakes.len(),
        members = village_members.len() + urban_members.len(),
        collateral_loans = collateral_loans.len(),
        "Liquidity manager genesis initialized"
    );
    Ok(LiquidityKeeper::with_config(params, config, authority, sources, bank)?)
}

fn scan_addresses<S: KvStore + ?Sized>(store: &S, prefix: &[u8]) -> Result<BTreeSet<Address>, GenesisError> {
    store
        .prefix_scan(prefix)
        .into_iter()
        .map(|(key, _)| {
            keys::address_suffix(prefix, &key)
                .ok_or_else(|| invalid(format!("malformed key {}", String::from_utf8_lossy(&key))))
        })
        .collect()
}

fn scan_values<S, T>(store: &S, prefix: &[u8]) -> Result<BTreeMap<Address, T>, GenesisError>
where
    S: KvStore + ?Sized,
    T: serde::de::DeserializeOwned,
{
    store
        .prefix_scan(prefix)
        .into_iter()
        .map(|(key, bytes)| {
            let addr = keys::address_suffix(prefix, &key)
                .ok_or_else(|| invalid(format!("malformed key {}", String::from_utf8_lossy(&key))))?;
            Ok((addr, decode(&key, &bytes)?))
        })
        .collect()
}

/// Read the module state back into a genesis document
pub fn export_genesis<S, P, B>(
    keeper: &LiquidityKeeper<P, B>,
    store: &S,
) -> Result<GenesisState, GenesisError>
where
    S: KvStore + ?Sized,
    P: PoolValueSources,
    B: Bank,
{
    Ok(GenesisState {
        params: keeper.params().clone(),
        config: keeper.config().clone(),
        daily_lending_used: keeper.daily_lending_used(store)?,
        last_daily_reset: read(store, keys::LAST_DAILY_RESET)?,
        village_members: scan_addresses(store, keys::VILLAGE_MEMBER_PREFIX)?,
        urban_members: scan_addresses(store, keys::URBAN_MEMBER_PREFIX)?,
        stakes: scan_values(store, keys::STAKED_NAMO_PREFIX)?,
        locked_collateral: scan_values(store, keys::LOCKED_COLLATERAL_PREFIX)?,
        collateral_loans: scan_values(store, keys::COLLATERAL_LOAN_PREFIX)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{NoExternalPools, NoopBank};
    use crate::store::MemStore;
    use chrono::{TimeZone, Utc};
    use types::numeric::{crores, lakhs, rupees};
    use types::status::LendingModule;

    const AUTHORITY: &str = "desh1qgqsyqcyq5rqwzqfpg9scrgwpugpzysnzs23v9";
    const USER: &str = "desh1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc5lzv7xu";

    fn addr(raw: &str) -> Address {
        Address::parse(raw).unwrap()
    }

    fn sample() -> GenesisState {
        let user = addr(USER);
        let mut genesis = GenesisState {
            daily_lending_used: rupees(12_000),
            last_daily_reset: NaiveDate::from_ymd_opt(2026, 5, 1),
            ..GenesisState::default()
        };
        genesis.village_members.insert(user.clone());
        genesis.stakes.insert(user.clone(), lakhs(2));
        genesis.locked_collateral.insert(user.clone(), lakhs(1));
        genesis.collateral_loans.insert(
            user.clone(),
            CollateralLoan::new(
                user,
                rupees(70_000),
                lakhs(1),
                Decimal::new(8, 2),
                LendingModule::Krishimitra,
                Utc.with_ymd_and_hms(2026, 4, 20, 8, 0, 0).unwrap(),
            ),
        );
        genesis
    }

    #[test]
    fn test_init_then_export_round_trips() {
        let mut store = MemStore::new();
        let keeper = init_genesis(&mut store, sample(), addr(AUTHORITY), NoExternalPools, NoopBank).unwrap();
        let exported = export_genesis(&keeper, &store).unwrap();
        assert_eq!(exported, sample());
        assert!(keeper.is_pool_member(&store, &addr(USER)).unwrap());
    }

    #[test]
    fn test_invalid_params_abort_before_writes() {
        let mut genesis = sample();
        genesis.params.lending_full_threshold = crores(200);
        let mut store = MemStore::new();
        let err = init_genesis(&mut store, genesis, addr(AUTHORITY), NoExternalPools, NoopBank).unwrap_err();
        assert!(matches!(err, GenesisError::Params(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_over_locked_genesis_rejected() {
        let mut genesis = sample();
        genesis.locked_collateral.insert(addr(USER), lakhs(3));
        assert!(matches!(genesis.validate(), Err(GenesisError::InvalidState(_))));
    }

    #[test]
    fn test_json_round_trip_and_defaults() {
        let json = sample().to_json().unwrap();
        assert_eq!(GenesisState::from_json(&json).unwrap(), sample());

        let empty = GenesisState::from_json("{}").unwrap();
        assert_eq!(empty, GenesisState::default());
        assert!(empty.validate().is_ok());
    }

    #[test]
    fn test_malformed_json() {
        let err = GenesisState::from_json("{\"daily_lending_used\": [").unwrap_err();
        assert!(matches!(err, GenesisError::Malformed(_)));
    }
}
