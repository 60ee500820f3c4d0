//! Account identifiers
//!
//! Borrowers, stakers and the module authority are identified by bech32-style
//! account addresses carrying the chain's human-readable prefix.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::InputError;

/// Human-readable prefix for account addresses
pub const ADDRESS_HRP: &str = "desh";

/// Bech32 data alphabet
const BECH32_CHARSET: &str = "qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// Data part length bounds: 20-byte and 32-byte payloads plus the 6-char checksum
const MIN_DATA_LEN: usize = 38;
const MAX_DATA_LEN: usize = 58;

/// Account address
///
/// Format: `desh1<data>` where `<data>` uses the bech32 alphabet.
/// Only the shape is checked here; checksum verification belongs to the host
/// chain's signing layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parse and validate an address string
    pub fn parse(raw: &str) -> Result<Self, InputError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(InputError::MissingField("address"));
        }

        let invalid = || InputError::InvalidAddress(raw.to_string());

        let (hrp, data) = raw.rsplit_once('1').ok_or_else(invalid)?;
        if hrp != ADDRESS_HRP {
            return Err(invalid());
        }
        if data.len() < MIN_DATA_LEN || data.len() > MAX_DATA_LEN {
            return Err(invalid());
        }
        if !data.chars().all(|c| BECH32_CHARSET.contains(c)) {
            return Err(invalid());
        }

        Ok(Self(raw.to_string()))
    }

    /// Get the address string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Raw bytes used when building store keys
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Address {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = InputError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.0
    }
}
