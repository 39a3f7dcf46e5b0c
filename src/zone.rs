//! Zoneinfo identifier validation.

use crate::error::{Error, Result};
use std::{fmt, str::FromStr};

/// Check that a candidate is a well formed `Area/Location` or
/// `Area/Location/SubLocation` zoneinfo name: two or three segments, none
/// empty. No other characters are constrained.
///
/// Used both for environment supplied names and to filter filesystem
/// entries during discovery.
pub fn is_zoneinfo_name(candidate: &str) -> bool {
    let mut segments = 0usize;
    for segment in candidate.split('/') {
        segments += 1;
        if segment.is_empty() || segments > 3 {
            return false;
        }
    }
    (2..=3).contains(&segments)
}

/// A zoneinfo identifier validated by [`is_zoneinfo_name`]. Immutable once
/// constructed.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ZoneName(String);

impl ZoneName {
    pub fn new(name: &str) -> Result<Self> {
        if is_zoneinfo_name(name) {
            Ok(Self(name.into()))
        } else {
            Err(Error::InvalidZoneName(name.into()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZoneName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ZoneName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}
