//! Channel addresses.
//!
//! A channel address is the short code printed next to a vend slot. The
//! client only validates its length; whether the slot exists is up to the
//! server.

use std::fmt;
use std::str::FromStr;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Number of characters in every channel address.
pub const ADDRESS_LEN: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("channel address must be {ADDRESS_LEN} characters, got {0}")]
    Length(usize),
}

/// A validated two-character channel address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelAddress(CompactString);

impl ChannelAddress {
    /// Validate `raw` as a channel address.
    ///
    /// Length is counted in characters, so `"é1"` is a valid address.
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        let len = raw.chars().count();
        if len != ADDRESS_LEN {
            return Err(AddressError::Length(len));
        }
        Ok(Self(CompactString::from(raw)))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for ChannelAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ChannelAddress {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ChannelAddress> for String {
    fn from(value: ChannelAddress) -> Self {
        value.0.into_string()
    }
}

impl fmt::Display for ChannelAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
