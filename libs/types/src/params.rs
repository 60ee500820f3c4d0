//! Governance parameters for liquidity-gated lending
//!
//! Parameters are validated once at load time. A `LiquidityParams` that
//! passed `validate()` is assumed valid by every calculation downstream.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::ParamsError;
use crate::numeric::{crores, rupees};

/// Floor for the minimum reserve ratio (30%)
pub const MIN_RESERVE_RATIO_FLOOR: Decimal = Decimal::from_parts(30, 0, 0, false, 2);

/// Ceiling for the processing fee rate (5%)
pub const MAX_PROCESSING_FEE_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

/// Ceiling for the early settlement rate (2%)
pub const MAX_EARLY_SETTLEMENT_RATE: Decimal = Decimal::from_parts(2, 0, 0, false, 2);

/// Ceiling for the processing fee cap: ₹10,000 in micro-units
pub fn max_processing_fee_cap() -> Decimal {
    rupees(10_000)
}

/// Liquidity and fee parameters
///
/// Invariants (checked by `validate`):
/// - `0 < basic < medium < full`
/// - every ratio in [0, 1]
/// - `minimum_reserve_ratio >= 0.30`
/// - `minimum + emergency + loan_loss_provision < 1`
/// - `processing_fee_rate <= 0.05`, `0 <= processing_fee_cap <= ₹10,000`
/// - `early_settlement_rate <= 0.02`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityParams {
    pub lending_basic_threshold: Decimal,
    pub lending_medium_threshold: Decimal,
    pub lending_full_threshold: Decimal,
    pub minimum_reserve_ratio: Decimal,
    pub emergency_reserve_ratio: Decimal,
    pub loan_loss_provision_ratio: Decimal,
    pub processing_fee_rate: Decimal,
    pub processing_fee_cap: Decimal,
    pub early_settlement_rate: Decimal,
}

impl Default for LiquidityParams {
    fn default() -> Self {
        Self {
            lending_basic_threshold: crores(100),
            lending_medium_threshold: crores(250),
            lending_full_threshold: crores(500),
            minimum_reserve_ratio: Decimal::new(50, 2),
            emergency_reserve_ratio: Decimal::new(15, 2),
            loan_loss_provision_ratio: Decimal::new(10, 2),
            processing_fee_rate: Decimal::new(1, 2),
            processing_fee_cap: rupees(2_500),
            early_settlement_rate: Decimal::new(5, 3),
        }
    }
}

impl LiquidityParams {
    /// Build parameters and validate them in one step
    pub fn new_validated(params: LiquidityParams) -> Result<Self, ParamsError> {
        params.validate()?;
        Ok(params)
    }

    /// Parse parameters from JSON and validate them
    pub fn from_json(json: &str) -> Result<Self, ParamsError> {
        let params: LiquidityParams =
            serde_json::from_str(json).map_err(|e| ParamsError::InvalidConfig {
                reason: e.to_string(),
            })?;
        Self::new_validated(params)
    }

    /// Check every parameter invariant
    pub fn validate(&self) -> Result<(), ParamsError> {
        let basic = self.lending_basic_threshold;
        let medium = self.lending_medium_threshold;
        let full = self.lending_full_threshold;
        if basic <= Decimal::ZERO || basic >= medium || medium >= full {
            return Err(ParamsError::ThresholdOrdering {
                basic: basic.to_string(),
                medium: medium.to_string(),
                full: full.to_string(),
            });
        }

        check_ratio("minimum_reserve_ratio", self.minimum_reserve_ratio)?;
        check_ratio("emergency_reserve_ratio", self.emergency_reserve_ratio)?;
        check_ratio("loan_loss_provision_ratio", self.loan_loss_provision_ratio)?;

        if self.minimum_reserve_ratio < MIN_RESERVE_RATIO_FLOOR {
            return Err(ParamsError::MinimumReserveTooLow {
                value: self.minimum_reserve_ratio.to_string(),
                floor: MIN_RESERVE_RATIO_FLOOR.to_string(),
            });
        }

        let combined = self.combined_reserve_ratio();
        if combined >= Decimal::ONE {
            return Err(ParamsError::CombinedReserveTooHigh {
                total: combined.to_string(),
            });
        }

        check_ratio("processing_fee_rate", self.processing_fee_rate)?;
        if self.processing_fee_rate > MAX_PROCESSING_FEE_RATE {
            return Err(ParamsError::ProcessingFeeRateTooHigh {
                value: self.processing_fee_rate.to_string(),
                max: MAX_PROCESSING_FEE_RATE.to_string(),
            });
        }

        let cap_max = max_processing_fee_cap();
        if self.processing_fee_cap.is_sign_negative() || self.processing_fee_cap > cap_max {
            return Err(ParamsError::ProcessingFeeCapOutOfRange {
                value: self.processing_fee_cap.to_string(),
                max: cap_max.to_string(),
            });
        }

        check_ratio("early_settlement_rate", self.early_settlement_rate)?;
        if self.early_settlement_rate > MAX_EARLY_SETTLEMENT_RATE {
            return Err(ParamsError::EarlySettlementRateTooHigh {
                value: self.early_settlement_rate.to_string(),
                max: MAX_EARLY_SETTLEMENT_RATE.to_string(),
            });
        }

        Ok(())
    }

    /// Sum of the three reserve ratios
    pub fn combined_reserve_ratio(&self) -> Decimal {
        self.minimum_reserve_ratio + self.emergency_reserve_ratio + self.loan_loss_provision_ratio
    }
}

fn check_ratio(name: &'static str, value: Decimal) -> Result<(), ParamsError> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(ParamsError::RatioOutOfRange {
            name,
            value: value.to_string(),
        });
    }
    Ok(())
}
