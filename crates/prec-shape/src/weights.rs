//! Weight configuration and mean-one normalization.

use std::collections::BTreeMap;
use std::fmt;

use log::debug;
use prec_core::{ErrorInfo, PrecError};
use serde::{Deserialize, Serialize};

/// Which of the two per-event weight streams are switched on.
///
/// Serialized as `{"dec": 0|1, "sam": 0|1}`, the form hashed into cache keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, i64>", into = "BTreeMap<String, i64>")]
pub struct WeightConfig {
    dec: bool,
    sam: bool,
}

impl WeightConfig {
    /// Decay and sample weights both on.
    pub const ALL: WeightConfig = WeightConfig {
        dec: true,
        sam: true,
    };
    /// Both streams off: every event weighs one.
    pub const NONE: WeightConfig = WeightConfig {
        dec: false,
        sam: false,
    };

    /// Creates a configuration from the two switches.
    pub fn new(dec: bool, sam: bool) -> Self {
        Self { dec, sam }
    }

    /// Validates a loose flag mapping: keys exactly `dec` and `sam`, values 0 or 1.
    pub fn from_flags(flags: &BTreeMap<String, i64>) -> Result<Self, PrecError> {
        let invalid = |message: &str| {
            PrecError::Config(
                ErrorInfo::new("invalid-weight-config", message)
                    .with_context("flags", format!("{flags:?}"))
                    .with_hint("expected exactly {dec: 0|1, sam: 0|1}"),
            )
        };
        if flags.len() != 2 || !flags.contains_key("dec") || !flags.contains_key("sam") {
            return Err(invalid("weight flags must have exactly the keys dec and sam"));
        }
        let flag = |key: &str| match flags.get(key) {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(invalid("weight flag values must be 0 or 1")),
        };
        Ok(Self {
            dec: flag("dec")?,
            sam: flag("sam")?,
        })
    }

    /// Whether decay weights are read.
    pub fn dec(&self) -> bool {
        self.dec
    }

    /// Whether sample weights are read.
    pub fn sam(&self) -> bool {
        self.sam
    }

    /// Flag form of the configuration.
    pub fn flags(&self) -> BTreeMap<String, i64> {
        BTreeMap::from([
            ("dec".to_string(), i64::from(self.dec)),
            ("sam".to_string(), i64::from(self.sam)),
        ])
    }
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self::ALL
    }
}

impl TryFrom<BTreeMap<String, i64>> for WeightConfig {
    type Error = PrecError;

    fn try_from(flags: BTreeMap<String, i64>) -> Result<Self, Self::Error> {
        Self::from_flags(&flags)
    }
}

impl From<WeightConfig> for BTreeMap<String, i64> {
    fn from(config: WeightConfig) -> Self {
        config.flags()
    }
}

impl fmt::Display for WeightConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dec={} sam={}", u8::from(self.dec), u8::from(self.sam))
    }
}

/// Scales `weights` by `count / sum` so their mean is one.
///
/// An empty array normalizes to an empty array. A zero or non-finite sum is an
/// error, as is any non-finite entry.
pub fn normalize(weights: &[f64]) -> Result<Vec<f64>, PrecError> {
    if weights.is_empty() {
        return Ok(Vec::new());
    }
    if let Some(index) = weights.iter().position(|w| !w.is_finite()) {
        return Err(PrecError::Weight(
            ErrorInfo::new("non-finite-weight", "weights must be finite")
                .with_context("index", index.to_string())
                .with_context("value", weights[index].to_string()),
        ));
    }
    let sum: f64 = weights.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        return Err(PrecError::Weight(
            ErrorInfo::new("zero-weight-sum", "cannot normalize weights with a zero sum")
                .with_context("count", weights.len().to_string())
                .with_context("sum", sum.to_string()),
        ));
    }
    let factor = weights.len() as f64 / sum;
    Ok(weights.iter().map(|w| w * factor).collect())
}

/// Writes the distinct weights and their frequencies at debug level.
pub fn log_frequencies(title: &str, weights: &[f64]) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }
    let mut sorted = weights.to_vec();
    sorted.sort_by(f64::total_cmp);
    debug!("{}", "-".repeat(20));
    debug!("{title}");
    debug!("{:<10}{:>10}", "Frequency", "Weight");
    let mut start = 0;
    while start < sorted.len() {
        let value = sorted[start];
        let end = start + sorted[start..].iter().take_while(|w| **w == value).count();
        debug!("{:<10}{:>10.3}", end - start, value);
        start = end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_scales_to_unit_mean() {
        let out = normalize(&[1.0, 2.0, 3.0, 6.0]).expect("normalize");
        for (got, want) in out.iter().zip([1.0 / 3.0, 2.0 / 3.0, 1.0, 2.0]) {
            assert!((got - want).abs() < 1e-12);
        }
    }

    #[test]
    fn normalize_rejects_zero_sum() {
        let err = normalize(&[1.0, -1.0]).expect_err("zero sum");
        assert_eq!(err.code(), "zero-weight-sum");
        assert!(normalize(&[0.0, 0.0]).is_err());
        assert_eq!(normalize(&[1.0, f64::NAN]).expect_err("nan").code(), "non-finite-weight");
        assert!(normalize(&[]).expect("empty").is_empty());
    }

    #[test]
    fn flags_must_be_exactly_dec_and_sam() {
        let flags = |pairs: &[(&str, i64)]| {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect::<BTreeMap<_, _>>()
        };
        assert_eq!(
            WeightConfig::from_flags(&flags(&[("dec", 1), ("sam", 0)])).expect("valid"),
            WeightConfig::new(true, false)
        );
        for bad in [
            flags(&[("dec", 1)]),
            flags(&[("dec", 1), ("sam", 1), ("bkg", 0)]),
            flags(&[("dec", 1), ("smp", 1)]),
            flags(&[("dec", 2), ("sam", 1)]),
            flags(&[("dec", 0), ("sam", -1)]),
        ] {
            let err = WeightConfig::from_flags(&bad).expect_err("invalid");
            assert_eq!(err.code(), "invalid-weight-config");
        }
    }
}
