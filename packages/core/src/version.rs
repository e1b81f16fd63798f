//! Version Information
//!
//! Corresponds to packages/core/src/version.ts

use once_cell::sync::Lazy;

/// Framework version, split the way the upstream `Version` class splits it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub full: String,
    pub major: String,
    pub minor: String,
    pub patch: String,
}

impl Version {
    pub fn new(full: &str) -> Self {
        let mut parts = full.splitn(3, '.');
        let major = parts.next().unwrap_or("").to_string();
        let minor = parts.next().unwrap_or("").to_string();
        let patch = parts.next().unwrap_or("").to_string();
        Version {
            full: full.to_string(),
            major,
            minor,
            patch,
        }
    }
}

/// Global VERSION instance
/// Matches Angular's: export const VERSION = new Version('0.0.0-PLACEHOLDER');
pub static VERSION: Lazy<Version> = Lazy::new(|| Version::new("0.0.0-PLACEHOLDER"));
