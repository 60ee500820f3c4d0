//! Liquidity status engine
//!
//! Pure functions from (pool value, params, config) to status and limits.
//! Nothing here is persisted: `LiquidityInfo` is rebuilt on every read.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::params::LiquidityParams;
use types::status::{LendingModule, LiquidityStatus};

use crate::config::{LendingConfig, PausedFloor};

/// Reserve split of the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reserves {
    pub minimum: Decimal,
    pub emergency: Decimal,
    pub loan_loss_provision: Decimal,
}

impl Reserves {
    pub fn total(&self) -> Decimal {
        self.minimum
            .saturating_add(self.emergency)
            .saturating_add(self.loan_loss_provision)
    }
}

/// Snapshot of lending capacity derived from the current pool value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityInfo {
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

impl LiquidityInfo {
    /// Whether `module` is open at the current status
    pub fn is_module_available(&self, module: &str) -> bool {
        self.available_modules.iter().any(|m| m.as_str() == module)
    }
}

/// Reserve amounts held back from lending
pub fn reserves(pool: Decimal, params: &LiquidityParams) -> Reserves {
    Reserves {
        minimum: pool * params.minimum_reserve_ratio,
        emergency: pool * params.emergency_reserve_ratio,
        loan_loss_provision: pool * params.loan_loss_provision_ratio,
    }
}

/// Pool value minus all reserves, floored at zero
pub fn available_for_lending(pool: Decimal, params: &LiquidityParams) -> Decimal {
    let available = pool - reserves(pool, params).total();
    available.max(Decimal::ZERO)
}

/// Discrete status for a pool value
pub fn liquidity_status(
    pool: Decimal,
    params: &LiquidityParams,
    floor: PausedFloor,
) -> LiquidityStatus {
    let paused = match floor {
        PausedFloor::SelfReferential => pool <= pool * params.emergency_reserve_ratio,
        PausedFloor::Absolute(amount) => pool <= amount,
    };
    if paused {
        return LiquidityStatus::Paused;
    }

    if pool >= params.lending_full_threshold {
        LiquidityStatus::Full
    } else if pool >= params.lending_medium_threshold {
        LiquidityStatus::Medium
    } else if pool >= params.lending_basic_threshold {
        LiquidityStatus::Basic
    } else {
        LiquidityStatus::Building
    }
}

/// Largest single loan at a status
pub fn max_loan_amount(status: LiquidityStatus, config: &LendingConfig) -> Decimal {
    config
        .tier(status)
        .map_or(Decimal::ZERO, |tier| tier.max_loan)
}

/// Aggregate lending allowed per day at a status
pub fn daily_lending_limit(
    status: LiquidityStatus,
    available: Decimal,
    config: &LendingConfig,
) -> Decimal {
    config
        .tier(status)
        .map_or(Decimal::ZERO, |tier| available * tier.daily_limit_rate)
}

/// Modules open at a status
pub fn enabled_modules(status: LiquidityStatus, config: &LendingConfig) -> Vec<LendingModule> {
    config
        .tier(status)
        .map(|tier| tier.modules.clone())
        .unwrap_or_default()
}

/// Next threshold and fractional progress toward it
///
/// Below basic, progress is `pool / basic`; between thresholds it is linear
/// in the bracket; at or above full it is `(full, 1)`.
pub fn progress_to_next(pool: Decimal, params: &LiquidityParams) -> (Decimal, Decimal) {
    let basic = params.lending_basic_threshold;
    let medium = params.lending_medium_threshold;
    let full = params.lending_full_threshold;

    if pool < basic {
        (basic, pool / basic)
    } else if pool < medium {
        (medium, (pool - basic) / (medium - basic))
    } else if pool < full {
        (full, (pool - medium) / (full - medium))
    } else {
        (full, Decimal::ONE)
    }
}

/// Whole days until `next` at the configured average growth, zero if reached
pub fn estimate_days_to_next(pool: Decimal, next: Decimal, config: &LendingConfig) -> i64 {
    let remaining = next - pool;
    if remaining <= Decimal::ZERO {
        return 0;
    }
    let days = remaining
        .checked_div(config.average_daily_pool_growth)
        .map_or(Decimal::MAX, |days| days.trunc());
    i64::try_from(days).unwrap_or(i64::MAX).max(0)
}

/// Build the full liquidity snapshot for a pool value
pub fn liquidity_info(
    pool: Decimal,
    params: &LiquidityParams,
    config: &LendingConfig,
) -> LiquidityInfo {
    let reserves = reserves(pool, params);
    let available = available_for_lending(pool, params);
    let status = liquidity_status(pool, params, config.paused_floor);
    let (next_threshold, progress) = progress_to_next(pool, params);

    LiquidityInfo {
        total_pool_value: pool,
        available_for_lending: available,
        reserve_amount: reserves.minimum,
        emergency_reserve: reserves.emergency,
        loan_loss_provision: reserves.loan_loss_provision,
        status,
        max_loan_amount: max_loan_amount(status, config),
        daily_lending_limit: daily_lending_limit(status, available, config),
        available_modules: enabled_modules(status, config),
        next_threshold,
        progress_to_next: progress,
        estimated_days_to_next: estimate_days_to_next(pool, next_threshold, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::numeric::{crores, rupees};

    fn params() -> LiquidityParams {
        LiquidityParams::default()
    }

    fn config() -> LendingConfig {
        LendingConfig::default()
    }

    // ── Reserves ──

    #[test]
    fn test_available_is_pool_minus_reserves() {
        // 75% of the pool is reserved under default params
        let available = available_for_lending(crores(200), &params());
        assert_eq!(available, crores(50));
    }

    #[test]
    fn test_available_never_negative() {
        assert_eq!(available_for_lending(Decimal::ZERO, &params()), Decimal::ZERO);
        assert_eq!(available_for_lending(Decimal::from(-10), &params()), Decimal::ZERO);
    }

    #[test]
    fn test_reserve_split() {
        let r = reserves(crores(100), &params());
        assert_eq!(r.minimum, crores(50));
        assert_eq!(r.emergency, crores(15));
        assert_eq!(r.loan_loss_provision, crores(10));
        assert_eq!(r.total(), crores(75));
    }

    #[test]
    fn test_snapshot_at_decimal_max() {
        let info = liquidity_info(Decimal::MAX, &params(), &config());
        assert_eq!(info.status, LiquidityStatus::Full);
        assert!(info.available_for_lending > Decimal::ZERO);
        assert_eq!(info.estimated_days_to_next, 0);
    }

    // ── Status ──

    #[test]
    fn test_status_tiers() {
        let floor = PausedFloor::SelfReferential;
        assert_eq!(liquidity_status(crores(80), &params(), floor), LiquidityStatus::Building);
        assert_eq!(liquidity_status(crores(100), &params(), floor), LiquidityStatus::Basic);
        assert_eq!(liquidity_status(crores(150), &params(), floor), LiquidityStatus::Basic);
        assert_eq!(liquidity_status(crores(250), &params(), floor), LiquidityStatus::Medium);
        assert_eq!(liquidity_status(crores(499), &params(), floor), LiquidityStatus::Medium);
        assert_eq!(liquidity_status(crores(500), &params(), floor), LiquidityStatus::Full);
        assert_eq!(liquidity_status(crores(5_000), &params(), floor), LiquidityStatus::Full);
    }

    #[test]
    fn test_self_referential_floor_only_trips_on_empty_pool() {
        let floor = PausedFloor::SelfReferential;
        assert_eq!(liquidity_status(Decimal::ZERO, &params(), floor), LiquidityStatus::Paused);
        assert_eq!(liquidity_status(Decimal::ONE, &params(), floor), LiquidityStatus::Building);
    }

    #[test]
    fn test_absolute_floor() {
        let floor = PausedFloor::Absolute(crores(10));
        assert_eq!(liquidity_status(crores(10), &params(), floor), LiquidityStatus::Paused);
        assert_eq!(liquidity_status(crores(11), &params(), floor), LiquidityStatus::Building);
    }

    // ── Limits ──

    #[test]
    fn test_max_loan_ladder() {
        let c = config();
        assert_eq!(max_loan_amount(LiquidityStatus::Paused, &c), Decimal::ZERO);
        assert_eq!(max_loan_amount(LiquidityStatus::Building, &c), Decimal::ZERO);
        assert_eq!(max_loan_amount(LiquidityStatus::Basic, &c), rupees(50_000));
        assert_eq!(max_loan_amount(LiquidityStatus::Medium, &c), rupees(200_000));
        assert_eq!(max_loan_amount(LiquidityStatus::Full, &c), rupees(500_000));
    }

    #[test]
    fn test_daily_limit_rates() {
        let c = config();
        let available = rupees(1_000_000);
        assert_eq!(daily_lending_limit(LiquidityStatus::Building, available, &c), Decimal::ZERO);
        assert_eq!(daily_lending_limit(LiquidityStatus::Basic, available, &c), rupees(10_000));
        assert_eq!(daily_lending_limit(LiquidityStatus::Medium, available, &c), rupees(20_000));
        assert_eq!(daily_lending_limit(LiquidityStatus::Full, available, &c), rupees(30_000));
    }

    #[test]
    fn test_enabled_modules_are_cumulative() {
        let c = config();
        assert!(enabled_modules(LiquidityStatus::Building, &c).is_empty());
        assert_eq!(
            enabled_modules(LiquidityStatus::Basic, &c),
            vec![LendingModule::Krishimitra]
        );
        assert_eq!(
            enabled_modules(LiquidityStatus::Medium, &c),
            vec![LendingModule::Krishimitra, LendingModule::Vyavasayamitra]
        );
        assert_eq!(enabled_modules(LiquidityStatus::Full, &c).len(), 3);
    }

    // ── Progress ──

    #[test]
    fn test_progress_below_basic() {
        let (next, progress) = progress_to_next(crores(80), &params());
        assert_eq!(next, crores(100));
        assert_eq!(progress, Decimal::new(8, 1));
    }

    #[test]
    fn test_progress_between_thresholds() {
        // 100 Cr .. 250 Cr bracket, 175 Cr is halfway
        let (next, progress) = progress_to_next(crores(175), &params());
        assert_eq!(next, crores(250));
        assert_eq!(progress, Decimal::new(5, 1));

        let (next, progress) = progress_to_next(crores(375), &params());
        assert_eq!(next, crores(500));
        assert_eq!(progress, Decimal::new(5, 1));
    }

    #[test]
    fn test_progress_at_full() {
        assert_eq!(
            progress_to_next(crores(600), &params()),
            (crores(500), Decimal::ONE)
        );
    }

    #[test]
    fn test_estimate_days() {
        let c = config();
        // 20 Cr remaining at ₹50K per day
        assert_eq!(estimate_days_to_next(crores(80), crores(100), &c), 4_000);
        assert_eq!(estimate_days_to_next(crores(100), crores(100), &c), 0);
        assert_eq!(estimate_days_to_next(crores(600), crores(500), &c), 0);
    }

    // ── Snapshot ──

    #[test]
    fn test_building_snapshot() {
        let info = liquidity_info(crores(80), &params(), &config());
        assert_eq!(info.status, LiquidityStatus::Building);
        assert_eq!(info.daily_lending_limit, Decimal::ZERO);
        assert_eq!(info.max_loan_amount, Decimal::ZERO);
        assert!(info.available_modules.is_empty());
        assert_eq!(info.available_for_lending, crores(20));
    }

    #[test]
    fn test_basic_snapshot() {
        let info = liquidity_info(crores(150), &params(), &config());
        assert_eq!(info.status, LiquidityStatus::Basic);
        // available = 37.5 Cr, daily = 1% of that
        assert_eq!(info.available_for_lending, rupees(375_000_000));
        assert_eq!(info.daily_lending_limit, rupees(3_750_000));
        assert!(info.is_module_available("krishimitra"));
        assert!(!info.is_module_available("shikshamitra"));
    }
}
