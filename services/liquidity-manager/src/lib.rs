//! Liquidity Manager Service
//!
//! Liquidity-gated lending admission control. Lending unlocks in tiers as
//! the backing pool grows; reserves are carved out of the pool before any
//! lending capacity is computed, and every loan passes an ordered
//! admission check before it is recorded and disbursed.
//!
//! Provides pool aggregation, status and limit calculation, admission
//! checks for pool-funded and stake-backed loans, the collateral ledger,
//! fee previews, and the query/message/genesis surfaces of the module.

pub mod errors;
pub mod store;
pub mod config;
pub mod sources;
pub mod status;
pub mod admission;
pub mod collateral;
pub mod fees;
pub mod events;
pub mod keeper;
pub mod query;
pub mod msg;
pub mod genesis;

pub use admission::{AdmissionDecision, Rejection};
pub use config::{LendingConfig, PausedFloor, TierPolicy};
pub use errors::KeeperError;
pub use keeper::{CollateralLoanTerms, LiquidityKeeper, LoanReceipt};
pub use store::{KvStore, MemStore, StoreBranch};
