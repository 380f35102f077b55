//! ISO 9362 bank identifier codes, used as the registry's secondary
//! uniqueness key.

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("invalid BIC: {0:?}")]
pub struct InvalidBic(pub String);

/// A validated 8 or 11 character bank identifier code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bic(String);

impl Bic {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Bic {
    type Err = InvalidBic;

    fn from_str(s: &str) -> Result<Self, InvalidBic> {
        lazy_static! {
            static ref BIC_RX: Regex =
                Regex::new("^[A-Z]{6}[A-Z0-9]{2}([A-Z0-9]{3})?$").unwrap();
        }
        if BIC_RX.is_match(s) {
            Ok(Bic(s.to_string()))
        } else {
            Err(InvalidBic(s.to_string()))
        }
    }
}

impl fmt::Display for Bic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}
