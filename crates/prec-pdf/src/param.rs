//! Fit parameters and mixture fractions.

use prec_core::{ErrorInfo, PrecError};
use serde::{Deserialize, Serialize};

/// A bounded parameter that a downstream fit may vary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Current value.
    pub value: f64,
    /// Lower bound.
    pub lower: f64,
    /// Upper bound.
    pub upper: f64,
}

impl Parameter {
    /// Creates a parameter, checking that `lower <= value <= upper`.
    pub fn new(name: impl Into<String>, value: f64, lower: f64, upper: f64) -> Result<Self, PrecError> {
        let name = name.into();
        if !(lower <= value && value <= upper) {
            return Err(PrecError::Pdf(
                ErrorInfo::new("parameter-bounds", "parameter value outside its bounds")
                    .with_context("name", name)
                    .with_context("value", value.to_string())
                    .with_context("bounds", format!("[{lower}, {upper}]")),
            ));
        }
        Ok(Self {
            name,
            value,
            lower,
            upper,
        })
    }
}

/// Mixing weight of one mixture component.
///
/// A `Fixed` fraction is a constant that no fit can move; a `Free` fraction
/// wraps a parameter exposed through [`crate::Density::parameters`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Fraction {
    /// Constant fraction.
    Fixed {
        /// Fraction name, `f_<component>` by convention.
        name: String,
        /// Fraction value in `[0, 1]`.
        value: f64,
    },
    /// Fraction left to a fit.
    Free(Parameter),
}

impl Fraction {
    /// Creates a fixed fraction.
    pub fn fixed(name: impl Into<String>, value: f64) -> Self {
        Fraction::Fixed {
            name: name.into(),
            value,
        }
    }

    /// Current value.
    pub fn value(&self) -> f64 {
        match self {
            Fraction::Fixed { value, .. } => *value,
            Fraction::Free(param) => param.value,
        }
    }

    /// Fraction name.
    pub fn name(&self) -> &str {
        match self {
            Fraction::Fixed { name, .. } => name,
            Fraction::Free(param) => &param.name,
        }
    }

    /// True when a fit may vary this fraction.
    pub fn is_floating(&self) -> bool {
        matches!(self, Fraction::Free(_))
    }
}
