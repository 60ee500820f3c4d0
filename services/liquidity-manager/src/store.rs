//! Store handle: ordered byte-keyed state owned by the module
//!
//! Every keeper operation receives the store explicitly, the way the host
//! runtime hands a block-scoped context to each transaction.
//!
//! Layout (flat keys, fixed prefixes):
//! ```text
//! daily_lending_used                  -> Decimal
//! last_daily_reset                    -> NaiveDate
//! village_member_<addr>               -> [1]
//! urban_member_<addr>                 -> [1]
//! staked_namo_<addr>                  -> Decimal
//! locked_collateral_<addr>            -> Decimal
//! collateral_loan_<addr>              -> CollateralLoan
//! ```
//! Values are bincode-encoded.

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use types::ids::Address;
use types::status::PoolCohort;

use crate::errors::StoreError;

/// Ordered key-value store
pub trait KvStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    fn has(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>);

    fn delete(&mut self, key: &[u8]);

    /// All entries whose key starts with `prefix`, in key order
    fn prefix_scan(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)>;
}

// ── In-memory store ─────────────────────────────────────────────────

/// `BTreeMap`-backed store, used by tests and simulations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemStore {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvStore for MemStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>) {
        self.entries.insert(key.to_vec(), value);
    }

    fn delete(&mut self, key: &[u8]) {
        self.entries.remove(key);
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.entries
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

// ── Branch ──────────────────────────────────────────────────────────

/// Write buffer over a parent store
///
/// Reads see pending writes first. Nothing reaches the parent until
/// `commit`; dropping the branch discards every pending write.
pub struct StoreBranch<'a, S: KvStore> {
    parent: &'a mut S,
    /// `None` marks a pending delete
    pending: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a, S: KvStore> StoreBranch<'a, S> {
    pub fn new(parent: &'a mut S) -> Self {
        Self {
            parent,
            pending: BTreeMap::new(),
        }
    }

    /// Number of buffered writes
    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    /// Apply buffered writes to the parent in key order
    pub fn commit(self) {
        let StoreBranch { parent, pending } = self;
        for (key, value) in pending {
            match value {
                Some(v) => parent.set(&key, v),
                None => parent.delete(&key),
            }
        }
    }
}

impl<S: KvStore> KvStore for StoreBranch<'_, S> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.pending.get(key) {
            Some(pending) => pending.clone(),
            None => self.parent.get(key),
        }
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>) {
        self.pending.insert(key.to_vec(), Some(value));
    }

    fn delete(&mut self, key: &[u8]) {
        self.pending.insert(key.to_vec(), None);
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.parent.prefix_scan(prefix).into_iter().collect();
        for (key, value) in self.pending.iter().filter(|(k, _)| k.starts_with(prefix)) {
            match value {
                Some(v) => {
                    merged.insert(key.clone(), v.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        merged.into_iter().collect()
    }
}

// ── Keys ────────────────────────────────────────────────────────────

pub mod keys {
    use super::*;

    pub const DAILY_LENDING_USED: &[u8] = b"daily_lending_used";
    pub const LAST_DAILY_RESET: &[u8] = b"last_daily_reset";
    pub const VILLAGE_MEMBER_PREFIX: &[u8] = b"village_member_";
    pub const URBAN_MEMBER_PREFIX: &[u8] = b"urban_member_";
    pub const STAKED_NAMO_PREFIX: &[u8] = b"staked_namo_";
    pub const LOCKED_COLLATERAL_PREFIX: &[u8] = b"locked_collateral_";
    pub const COLLATERAL_LOAN_PREFIX: &[u8] = b"collateral_loan_";

    fn prefixed(prefix: &[u8], addr: &Address) -> Vec<u8> {
        let mut key = Vec::with_capacity(prefix.len() + addr.as_bytes().len());
        key.extend_from_slice(prefix);
        key.extend_from_slice(addr.as_bytes());
        key
    }

    pub fn membership_prefix(cohort: PoolCohort) -> &'static [u8] {
        match cohort {
            PoolCohort::Village => VILLAGE_MEMBER_PREFIX,
            PoolCohort::Urban => URBAN_MEMBER_PREFIX,
        }
    }

    pub fn membership(cohort: PoolCohort, addr: &Address) -> Vec<u8> {
        prefixed(membership_prefix(cohort), addr)
    }

    pub fn staked(addr: &Address) -> Vec<u8> {
        prefixed(STAKED_NAMO_PREFIX, addr)
    }

    pub fn locked_collateral(addr: &Address) -> Vec<u8> {
        prefixed(LOCKED_COLLATERAL_PREFIX, addr)
    }

    pub fn collateral_loan(addr: &Address) -> Vec<u8> {
        prefixed(COLLATERAL_LOAN_PREFIX, addr)
    }

    /// Recover the address suffix of a prefixed key
    pub fn address_suffix(prefix: &[u8], key: &[u8]) -> Option<Address> {
        let rest = key.strip_prefix(prefix)?;
        let raw = std::str::from_utf8(rest).ok()?;
        Address::parse(raw).ok()
    }
}

// ── Codec ───────────────────────────────────────────────────────────

fn key_label(key: &[u8]) -> String {
    String::from_utf8_lossy(key).into_owned()
}

/// Read and decode a value, `None` when absent
pub fn read<S: KvStore + ?Sized, T: DeserializeOwned>(
    store: &S,
    key: &[u8],
) -> Result<Option<T>, StoreError> {
    store.get(key).map(|bytes| decode(key, &bytes)).transpose()
}

/// Decode raw bytes read under `key`
pub fn decode<T: DeserializeOwned>(key: &[u8], bytes: &[u8]) -> Result<T, StoreError> {
    bincode::deserialize(bytes).map_err(|e| StoreError::Decode {
        key: key_label(key),
        reason: e.to_string(),
    })
}

/// Encode and write a value
pub fn write<S: KvStore + ?Sized, T: Serialize>(
    store: &mut S,
    key: &[u8],
    value: &T,
) -> Result<(), StoreError> {
    let bytes = bincode::serialize(value).map_err(|e| StoreError::Encode {
        key: key_label(key),
        reason: e.to_string(),
    })?;
    store.set(key, bytes);
    Ok(())
}

/// Read a decimal, zero when absent
pub fn read_decimal<S: KvStore + ?Sized>(store: &S, key: &[u8]) -> Result<Decimal, StoreError> {
    Ok(read(store, key)?.unwrap_or(Decimal::ZERO))
}
