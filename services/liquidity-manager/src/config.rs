//! Lending business constants
//!
//! Loan ladder, daily caps, module unlocks, LTV and the membership stake
//! live here as named values instead of inline literals. `Default`
//! reproduces the production constants.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::errors::ParamsError;
use types::numeric::{lakhs, rupees};
use types::status::{LendingModule, LiquidityStatus};

/// Rule deciding when the pool counts as below its emergency floor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", content = "floor")]
pub enum PausedFloor {
    /// `pool <= pool × emergency_reserve_ratio`
    ///
    /// Compares the pool against a fraction of itself, so for any valid ratio
    /// it only trips when the pool is zero. Kept as the default because it
    /// is what deployed chains evaluate.
    SelfReferential,
    /// `pool <= floor`, an absolute amount in micro-units
    Absolute(Decimal),
}

/// Limits unlocked at one liquidity tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierPolicy {
    /// Largest single loan
    pub max_loan: Decimal,
    /// Fraction of available liquidity lendable per day
    pub daily_limit_rate: Decimal,
    /// Modules open at this tier (cumulative)
    pub modules: Vec<LendingModule>,
}

/// Business configuration for the admission controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LendingConfig {
    /// Maximum loan as a fraction of pledged collateral
    pub collateral_ltv: Decimal,
    /// Stake that grants lending access without cohort membership
    pub min_stake_for_lending: Decimal,
    pub basic: TierPolicy,
    pub medium: TierPolicy,
    pub full: TierPolicy,
    /// Assumed daily pool growth for wait-time estimates
    pub average_daily_pool_growth: Decimal,
    pub paused_floor: PausedFloor,
}

impl Default for LendingConfig {
    fn default() -> Self {
        Self {
            collateral_ltv: Decimal::new(70, 2),
            min_stake_for_lending: lakhs(1),
            basic: TierPolicy {
                max_loan: rupees(50_000),
                daily_limit_rate: Decimal::new(1, 2),
                modules: vec![LendingModule::Krishimitra],
            },
            medium: TierPolicy {
                max_loan: lakhs(2),
                daily_limit_rate: Decimal::new(2, 2),
                modules: vec![LendingModule::Krishimitra, LendingModule::Vyavasayamitra],
            },
            full: TierPolicy {
                max_loan: lakhs(5),
                daily_limit_rate: Decimal::new(3, 2),
                modules: LendingModule::ALL.to_vec(),
            },
            average_daily_pool_growth: rupees(50_000),
            paused_floor: PausedFloor::SelfReferential,
        }
    }
}

impl LendingConfig {
    /// Tier policy for a status, `None` for Building and Paused
    pub fn tier(&self, status: LiquidityStatus) -> Option<&TierPolicy> {
        match status {
            LiquidityStatus::Basic => Some(&self.basic),
            LiquidityStatus::Medium => Some(&self.medium),
            LiquidityStatus::Full => Some(&self.full),
            LiquidityStatus::Building | LiquidityStatus::Paused => None,
        }
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.collateral_ltv <= Decimal::ZERO || self.collateral_ltv > Decimal::ONE {
            return Err(invalid(format!(
                "collateral_ltv must be in (0, 1]: {}",
                self.collateral_ltv
            )));
        }
        if self.min_stake_for_lending.is_sign_negative() {
            return Err(invalid("min_stake_for_lending must not be negative".into()));
        }
        if self.average_daily_pool_growth <= Decimal::ZERO {
            return Err(invalid("average_daily_pool_growth must be positive".into()));
        }
        if let PausedFloor::Absolute(floor) = self.paused_floor {
            if floor.is_sign_negative() {
                return Err(invalid("paused floor must not be negative".into()));
            }
        }

        let tiers = [("basic", &self.basic), ("medium", &self.medium), ("full", &self.full)];
        for (name, tier) in tiers {
            if tier.max_loan.is_sign_negative() {
                return Err(invalid(format!("{name} max_loan must not be negative")));
            }
            if tier.daily_limit_rate < Decimal::ZERO || tier.daily_limit_rate > Decimal::ONE {
                return Err(invalid(format!("{name} daily_limit_rate must be in [0, 1]")));
            }
        }
        if self.basic.max_loan > self.medium.max_loan || self.medium.max_loan > self.full.max_loan {
            return Err(invalid("loan ladder must be non-decreasing".into()));
        }
        let widens = |lower: &TierPolicy, upper: &TierPolicy| {
            lower.modules.iter().all(|m| upper.modules.contains(m))
        };
        if !widens(&self.basic, &self.medium) || !widens(&self.medium, &self.full) {
            return Err(invalid("module unlocks must be cumulative".into()));
        }

        Ok(())
    }
}

fn invalid(reason: String) -> ParamsError {
    ParamsError::InvalidConfig { reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_production_constants() {
        let config = LendingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.collateral_ltv, Decimal::new(7, 1));
        assert_eq!(config.min_stake_for_lending, Decimal::from(100_000_000_000i64));
        assert_eq!(config.basic.max_loan, Decimal::from(50_000_000_000i64));
        assert_eq!(config.medium.max_loan, Decimal::from(200_000_000_000i64));
        assert_eq!(config.full.max_loan, Decimal::from(500_000_000_000i64));
        assert_eq!(config.average_daily_pool_growth, Decimal::from(50_000_000_000i64));
        assert_eq!(config.paused_floor, PausedFloor::SelfReferential);
    }

    #[test]
    fn test_tier_lookup() {
        let config = LendingConfig::default();
        assert!(config.tier(LiquidityStatus::Building).is_none());
        assert!(config.tier(LiquidityStatus::Paused).is_none());
        assert_eq!(config.tier(LiquidityStatus::Full).unwrap().modules.len(), 3);
    }

    #[test]
    fn test_rejects_bad_ltv() {
        let config = LendingConfig {
            collateral_ltv: Decimal::new(11, 1),
            ..LendingConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ParamsError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_rejects_descending_ladder() {
        let mut config = LendingConfig::default();
        config.medium.max_loan = rupees(10_000);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_cumulative_modules() {
        let mut config = LendingConfig::default();
        config.medium.modules = vec![LendingModule::Vyavasayamitra];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = LendingConfig {
            paused_floor: PausedFloor::Absolute(rupees(1_000_000)),
            ..LendingConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: LendingConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
