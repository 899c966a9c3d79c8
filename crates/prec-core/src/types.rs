use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, PrecError};

/// Version of an on-disk payload layout.
///
/// Readers accept any payload with the same major version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Bumped when old readers can no longer load new payloads.
    pub major: u32,
    /// Bumped for additive fields.
    pub minor: u32,
    /// Bumped for fixes that leave the layout alone.
    pub patch: u32,
}

impl SchemaVersion {
    /// Version `major.minor.patch`.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// Whether a reader at `self` can load a payload written at `written`.
    pub fn is_compatible(&self, written: &SchemaVersion) -> bool {
        self.major == written.major
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::new(1, 0, 0)
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Kinematic window (q2 bin) for which background shapes can be built.
///
/// Other windows of the analysis exist but have no category decomposition here,
/// so parsing them fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    /// The J/psi resonant window.
    Jpsi,
    /// The psi(2S) resonant window.
    Psi2,
}

impl Regime {
    /// Returns the canonical lowercase name of the regime.
    pub fn as_str(&self) -> &'static str {
        match self {
            Regime::Jpsi => "jpsi",
            Regime::Psi2 => "psi2",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Regime {
    type Err = PrecError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "jpsi" => Ok(Regime::Jpsi),
            "psi2" => Ok(Regime::Psi2),
            other => Err(PrecError::Config(
                ErrorInfo::new("invalid-regime", format!("invalid regime: {other}"))
                    .with_context("regime", other)
                    .with_hint("expected one of: jpsi, psi2"),
            )),
        }
    }
}
