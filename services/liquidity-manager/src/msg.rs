//! Message surface
//!
//! Transactions carry string fields. `validate_basic` turns each message
//! into domain values without touching state; `handle_msg` then routes the
//! validated message to the keeper.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use types::errors::InputError;
use types::ids::Address;
use types::numeric::{parse_amount, parse_positive_amount};
use types::params::LiquidityParams;
use types::status::{LendingModule, PoolCohort};

use crate::errors::KeeperError;
use crate::events::LendingEvent;
use crate::keeper::{CollateralLoanTerms, LiquidityKeeper};
use crate::sources::{Bank, PoolValueSources};
use crate::store::KvStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MsgProcessLoan {
    pub borrower: String,
    pub amount: String,
    pub module: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MsgProcessCollateralLoan {
    pub borrower: String,
    pub loan_amount: String,
    pub collateral_amount: String,
    pub interest_rate: String,
    pub module: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MsgRepayCollateralLoan {
    pub borrower: String,
}

/// Lock or unlock, depending on the `LendingMsg` variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MsgCollateral {
    pub user: String,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MsgSetPoolMembership {
    pub authority: String,
    pub user: String,
    pub cohort: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MsgSetStakedAmount {
    pub authority: String,
    pub user: String,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MsgUpdateParams {
    pub authority: String,
    pub params: LiquidityParams,
}

/// Every transaction the module accepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LendingMsg {
    ProcessLoan(MsgProcessLoan),
    ProcessCollateralLoan(MsgProcessCollateralLoan),
    RepayCollateralLoan(MsgRepayCollateralLoan),
    LockCollateral(MsgCollateral),
    UnlockCollateral(MsgCollateral),
    SetPoolMembership(MsgSetPoolMembership),
    SetStakedAmount(MsgSetStakedAmount),
    UpdateParams(MsgUpdateParams),
}

/// Message after boundary validation
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatedMsg {
    ProcessLoan {
        borrower: Address,
        amount: Decimal,
        /// Kept as a string so an unknown module surfaces as an admission
        /// rejection in check order
        module: String,
    },
    ProcessCollateralLoan {
        borrower: Address,
        loan_amount: Decimal,
        collateral_amount: Decimal,
        interest_rate: Decimal,
        module: LendingModule,
    },
    RepayCollateralLoan {
        borrower: Address,
    },
    LockCollateral {
        user: Address,
        amount: Decimal,
    },
    UnlockCollateral {
        user: Address,
        amount: Decimal,
    },
    SetPoolMembership {
        authority: Address,
        user: Address,
        cohort: PoolCohort,
        active: bool,
    },
    SetStakedAmount {
        authority: Address,
        user: Address,
        amount: Decimal,
    },
    UpdateParams {
        authority: Address,
        params: LiquidityParams,
    },
}

/// Outcome of a handled message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MsgResponse {
    pub event: LendingEvent,
    /// Set for loan disbursements
    pub processing_fee: Option<Decimal>,
    pub disbursed_amount: Option<Decimal>,
}

impl MsgResponse {
    fn event(event: LendingEvent) -> Self {
        Self {
            event,
            processing_fee: None,
            disbursed_amount: None,
        }
    }
}

fn parse_module(raw: &str) -> Result<LendingModule, InputError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(InputError::MissingField("module"));
    }
    LendingModule::from_str(raw).map_err(InputError::UnknownModule)
}

impl LendingMsg {
    /// Stateless validation of every field
    pub fn validate_basic(&self) -> Result<ValidatedMsg, InputError> {
        Ok(match self {
            LendingMsg::ProcessLoan(msg) => {
                let module = msg.module.trim();
                if module.is_empty() {
                    return Err(InputError::MissingField("module"));
                }
                ValidatedMsg::ProcessLoan {
                    borrower: Address::parse(&msg.borrower)?,
                    amount: parse_positive_amount("amount", &msg.amount)?,
                    module: module.to_string(),
                }
            }
            LendingMsg::ProcessCollateralLoan(msg) => ValidatedMsg::ProcessCollateralLoan {
                borrower: Address::parse(&msg.borrower)?,
                loan_amount: parse_positive_amount("loan_amount", &msg.loan_amount)?,
                collateral_amount: parse_positive_amount("collateral_amount", &msg.collateral_amount)?,
                interest_rate: parse_amount("interest_rate", &msg.interest_rate)?,
                module: parse_module(&msg.module)?,
            },
            LendingMsg::RepayCollateralLoan(msg) => ValidatedMsg::RepayCollateralLoan {
                borrower: Address::parse(&msg.borrower)?,
            },
            LendingMsg::LockCollateral(msg) => ValidatedMsg::LockCollateral {
                user: Address::parse(&msg.user)?,
                amount: parse_positive_amount("amount", &msg.amount)?,
            },
            LendingMsg::UnlockCollateral(msg) => ValidatedMsg::UnlockCollateral {
                user: Address::parse(&msg.user)?,
                amount: parse_positive_amount("amount", &msg.amount)?,
            },
            LendingMsg::SetPoolMembership(msg) => ValidatedMsg::SetPoolMembership {
                authority: Address::parse(&msg.authority)?,
                user: Address::parse(&msg.user)?,
                cohort: PoolCohort::from_str(msg.cohort.trim())?,
                active: msg.active,
            },
            LendingMsg::SetStakedAmount(msg) => ValidatedMsg::SetStakedAmount {
                authority: Address::parse(&msg.authority)?,
                user: Address::parse(&msg.user)?,
                amount: parse_amount("amount", &msg.amount)?,
            },
            LendingMsg::UpdateParams(msg) => ValidatedMsg::UpdateParams {
                authority: Address::parse(&msg.authority)?,
                params: msg.params.clone(),
            },
        })
    }
}

impl<P: PoolValueSources, B: Bank> LiquidityKeeper<P, B> {
    /// Validate and execute a message at `block_time`
    pub fn handle_msg<S: KvStore>(
        &mut self,
        store: &mut S,
        msg: &LendingMsg,
        block_time: DateTime<Utc>,
    ) -> Result<MsgResponse, KeeperError> {
        match msg.validate_basic()? {
            ValidatedMsg::ProcessLoan {
                borrower,
                amount,
                module,
            } => {
                let receipt = self.process_loan(store, &borrower, amount, &module)?;
                Ok(MsgResponse {
                    event: receipt.event,
                    processing_fee: Some(receipt.processing_fee),
                    disbursed_amount: Some(receipt.disbursed_amount),
                })
            }
            ValidatedMsg::ProcessCollateralLoan {
                borrower,
                loan_amount,
                collateral_amount,
                interest_rate,
                module,
            } => {
                let terms = CollateralLoanTerms {
                    loan_amount,
                    collateral_amount,
                    interest_rate,
                    module,
                    originated_at: block_time,
                };
                let receipt = self.process_collateral_loan(store, &borrower, terms)?;
                Ok(MsgResponse {
                    event: receipt.event,
                    processing_fee: Some(receipt.processing_fee),
                    disbursed_amount: Some(receipt.disbursed_amount),
                })
            }
            ValidatedMsg::RepayCollateralLoan { borrower } => self
                .repay_collateral_loan(store, &borrower, block_time)
                .map(MsgResponse::event),
            ValidatedMsg::LockCollateral { user, amount } => {
                self.lock_collateral(store, &user, amount).map(MsgResponse::event)
            }
            ValidatedMsg::UnlockCollateral { user, amount } => {
                self.unlock_collateral(store, &user, amount).map(MsgResponse::event)
            }
            ValidatedMsg::SetPoolMembership {
                authority,
                user,
                cohort,
                active,
            } => self
                .set_pool_membership(store, &authority, &user, cohort, active)
                .map(MsgResponse::event),
            ValidatedMsg::SetStakedAmount {
                authority,
                user,
                amount,
            } => self
                .set_staked_amount(store, &authority, &user, amount)
                .map(MsgResponse::event),
            ValidatedMsg::UpdateParams { authority, params } => self
                .update_params(&authority, params)
                .map(MsgResponse::event),
        }
    }
}
