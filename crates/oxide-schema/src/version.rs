//! Database server version.

use std::fmt;

use serde::Serialize;

use crate::error::{GrammarError, Result};

/// A server version, tagged with the driver it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    /// Anything after the numeric core, e.g. `0ubuntu0.22.04.2`.
    pub pre: Option<String>,
    pub driver: String,
}

impl Version {
    /// Parses a version string leniently: `8.0.33-0ubuntu0.22.04.2`,
    /// `3.45.1`, `10.11.6-MariaDB`. Missing minor/patch default to 0.
    pub fn parse(driver: &str, text: &str) -> Result<Self> {
        let invalid = || GrammarError::InvalidVersion {
            driver: driver.to_string(),
            version: text.to_string(),
        };

        let text = text.trim();
        let core_end = text
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(text.len());
        let (core, rest) = text.split_at(core_end);

        let mut parts = core.split('.').filter(|p| !p.is_empty());
        let major = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(invalid)?;
        let minor = parts.next().map_or(Ok(0), |p| p.parse()).map_err(|_| invalid())?;
        let patch = parts.next().map_or(Ok(0), |p| p.parse()).map_err(|_| invalid())?;

        let pre = rest.trim_start_matches(['-', '+', ' ']);
        Ok(Self {
            major,
            minor,
            patch,
            pre: (!pre.is_empty()).then(|| pre.to_string()),
            driver: driver.to_string(),
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre {
            write!(f, "-{pre}")?;
        }
        Ok(())
    }
}
