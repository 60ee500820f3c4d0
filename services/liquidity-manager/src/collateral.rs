//! Collateral lock ledger
//!
//! Per-user staked and locked NAMO balances. The ledger itself enforces no
//! cap on locking; `locked <= staked` is guaranteed by the admission check
//! that runs in the same operation as the lock.

use rust_decimal::Decimal;
use tracing::warn;
use types::ids::Address;

use crate::admission::StakePosition;
use crate::errors::{KeeperError, StoreError};
use crate::store::{keys, read_decimal, write, KvStore};

/// Staked NAMO recorded for `user`
pub fn staked_amount<S: KvStore + ?Sized>(store: &S, user: &Address) -> Result<Decimal, StoreError> {
    read_decimal(store, &keys::staked(user))
}

/// Overwrite the staked NAMO recorded for `user`
pub fn set_staked_amount<S: KvStore + ?Sized>(
    store: &mut S,
    user: &Address,
    amount: Decimal,
) -> Result<(), StoreError> {
    write(store, &keys::staked(user), &amount)
}

/// NAMO currently pledged by `user`
pub fn locked_amount<S: KvStore + ?Sized>(store: &S, user: &Address) -> Result<Decimal, StoreError> {
    read_decimal(store, &keys::locked_collateral(user))
}

/// Staked and locked balances together
pub fn stake_position<S: KvStore + ?Sized>(
    store: &S,
    user: &Address,
) -> Result<StakePosition, StoreError> {
    Ok(StakePosition {
        staked: staked_amount(store, user)?,
        locked: locked_amount(store, user)?,
    })
}

/// True when `amount` exceeds the user's unpledged stake
///
/// `true` means the amount cannot be pledged, not that something is locked.
pub fn exceeds_available_collateral<S: KvStore + ?Sized>(
    store: &S,
    user: &Address,
    amount: Decimal,
) -> Result<bool, StoreError> {
    Ok(stake_position(store, user)?.exceeds_available(amount))
}

/// Add `amount` to the user's locked balance, returning the new balance
pub fn lock<S: KvStore + ?Sized>(
    store: &mut S,
    user: &Address,
    amount: Decimal,
) -> Result<Decimal, KeeperError> {
    let locked = locked_amount(store, user)?
        .checked_add(amount)
        .ok_or(KeeperError::Overflow { what: "locked_collateral" })?;
    write(store, &keys::locked_collateral(user), &locked)?;
    Ok(locked)
}

/// Subtract `amount` from the user's locked balance, floored at zero
///
/// Over-unlocking is tolerated and logged rather than rejected.
pub fn unlock<S: KvStore + ?Sized>(
    store: &mut S,
    user: &Address,
    amount: Decimal,
) -> Result<Decimal, StoreError> {
    let current = locked_amount(store, user)?;
    let mut locked = current.saturating_sub(amount);
    if locked.is_sign_negative() {
        warn!(
            user = %user,
            locked = %current,
            requested = %amount,
            "Unlock exceeds locked collateral, flooring at zero"
        );
        locked = Decimal::ZERO;
    }
    write(store, &keys::locked_collateral(user), &locked)?;
    Ok(locked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;

    fn user() -> Address {
        Address::parse("desh1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc5lzv7xu").unwrap()
    }

    #[test]
    fn test_lock_accumulates() {
        let mut store = MemStore::new();
        assert_eq!(lock(&mut store, &user(), Decimal::from(30)).unwrap(), Decimal::from(30));
        assert_eq!(lock(&mut store, &user(), Decimal::from(20)).unwrap(), Decimal::from(50));
        assert_eq!(locked_amount(&store, &user()).unwrap(), Decimal::from(50));
    }

    #[test]
    fn test_lock_then_unlock_restores() {
        let mut store = MemStore::new();
        lock(&mut store, &user(), Decimal::from(40)).unwrap();
        lock(&mut store, &user(), Decimal::from(15)).unwrap();
        unlock(&mut store, &user(), Decimal::from(15)).unwrap();
        assert_eq!(locked_amount(&store, &user()).unwrap(), Decimal::from(40));
    }

    #[test]
    fn test_over_unlock_floors_at_zero() {
        let mut store = MemStore::new();
        lock(&mut store, &user(), Decimal::from(10)).unwrap();
        assert_eq!(unlock(&mut store, &user(), Decimal::from(25)).unwrap(), Decimal::ZERO);
        assert_eq!(locked_amount(&store, &user()).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_lock_overflow_leaves_balance() {
        let mut store = MemStore::new();
        lock(&mut store, &user(), Decimal::MAX).unwrap();
        let err = lock(&mut store, &user(), Decimal::ONE).unwrap_err();
        assert!(matches!(err, KeeperError::Overflow { .. }));
        assert_eq!(locked_amount(&store, &user()).unwrap(), Decimal::MAX);
    }

    #[test]
    fn test_exceeds_available_collateral() {
        let mut store = MemStore::new();
        set_staked_amount(&mut store, &user(), Decimal::from(100)).unwrap();
        lock(&mut store, &user(), Decimal::from(60)).unwrap();

        assert!(!exceeds_available_collateral(&store, &user(), Decimal::from(40)).unwrap());
        assert!(exceeds_available_collateral(&store, &user(), Decimal::from(41)).unwrap());
    }

    #[test]
    fn test_unknown_user_has_empty_position() {
        let store = MemStore::new();
        assert_eq!(stake_position(&store, &user()).unwrap(), StakePosition::default());
    }
}
