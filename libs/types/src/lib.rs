//! Types library for the liquidity-gated lending engine
//!
//! Shared domain types used by the liquidity manager and the lending
//! modules it gates. All arithmetic is deterministic `Decimal`.
//!
//! # Modules
//! - `ids`: Account addresses
//! - `numeric`: Micro-unit amount helpers and boundary parsing
//! - `params`: Governance parameters and their invariants
//! - `status`: Liquidity status, lending modules, pool cohorts
//! - `loan`: Collateral loan records and cost breakdowns
//! - `errors`: Parameter and input error taxonomy

pub mod ids;
pub mod numeric;
pub mod params;
pub mod status;
pub mod loan;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::params::*;
    pub use crate::status::*;
    pub use crate::loan::*;
    pub use crate::errors::*;
}
