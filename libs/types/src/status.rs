//! Liquidity status and lending module types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Discrete lending status derived from total pool value
///
/// Ordered by pool value: `Paused < Building < Basic < Medium < Full`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LiquidityStatus {
    /// Emergency floor breached, all lending stopped
    Paused,
    /// Pool below the basic threshold
    Building,
    /// Basic threshold reached
    Basic,
    /// Medium threshold reached
    Medium,
    /// Full threshold reached
    Full,
}

impl LiquidityStatus {
    /// Wire label
    pub fn as_str(&self) -> &'static str {
        match self {
            LiquidityStatus::Paused => "PAUSED",
            LiquidityStatus::Building => "BUILDING",
            LiquidityStatus::Basic => "BASIC",
            LiquidityStatus::Medium => "MEDIUM",
            LiquidityStatus::Full => "FULL",
        }
    }

    /// Whether any lending is possible at this status
    pub fn is_lending_available(&self) -> bool {
        !matches!(self, LiquidityStatus::Building | LiquidityStatus::Paused)
    }
}

impl fmt::Display for LiquidityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lending products gated by liquidity status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LendingModule {
    /// Agricultural loans
    Krishimitra,
    /// Business loans
    Vyavasayamitra,
    /// Education loans
    Shikshamitra,
}

impl LendingModule {
    pub const ALL: [LendingModule; 3] = [
        LendingModule::Krishimitra,
        LendingModule::Vyavasayamitra,
        LendingModule::Shikshamitra,
    ];

    /// Module name as used by callers
    pub fn as_str(&self) -> &'static str {
        match self {
            LendingModule::Krishimitra => "krishimitra",
            LendingModule::Vyavasayamitra => "vyavasayamitra",
            LendingModule::Shikshamitra => "shikshamitra",
        }
    }
}

impl fmt::Display for LendingModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LendingModule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LendingModule::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Pool cohorts whose members get lending access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolCohort {
    /// Village Suraksha pool
    Village,
    /// Urban Suraksha pool
    Urban,
}

impl PoolCohort {
    pub fn as_str(&self) -> &'static str {
        match self {
            PoolCohort::Village => "village",
            PoolCohort::Urban => "urban",
        }
    }
}

impl FromStr for PoolCohort {
    type Err = crate::errors::InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "village" => Ok(PoolCohort::Village),
            "urban" => Ok(PoolCohort::Urban),
            other => Err(crate::errors::InputError::UnknownPool(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_ordering() {
        assert!(LiquidityStatus::Paused < LiquidityStatus::Building);
        assert!(LiquidityStatus::Building < LiquidityStatus::Basic);
        assert!(LiquidityStatus::Basic < LiquidityStatus::Medium);
        assert!(LiquidityStatus::Medium < LiquidityStatus::Full);
    }

    #[test]
    fn test_lending_available() {
        assert!(!LiquidityStatus::Paused.is_lending_available());
        assert!(!LiquidityStatus::Building.is_lending_available());
        assert!(LiquidityStatus::Basic.is_lending_available());
        assert!(LiquidityStatus::Full.is_lending_available());
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&LiquidityStatus::Medium).unwrap();
        assert_eq!(json, "\"MEDIUM\"");
        assert_eq!(LiquidityStatus::Medium.to_string(), "MEDIUM");
    }

    #[test]
    fn test_module_parse() {
        assert_eq!(
            "vyavasayamitra".parse::<LendingModule>().unwrap(),
            LendingModule::Vyavasayamitra
        );
        assert!("gramsuraksha".parse::<LendingModule>().is_err());
        let json = serde_json::to_string(&LendingModule::Shikshamitra).unwrap();
        assert_eq!(json, "\"shikshamitra\"");
    }

    #[test]
    fn test_cohort_parse() {
        assert_eq!("urban".parse::<PoolCohort>().unwrap(), PoolCohort::Urban);
        assert!("metro".parse::<PoolCohort>().is_err());
    }
}
