//! Fraction-weighted sum of normalized densities.

use prec_core::{ErrorInfo, PrecError, RngHandle};
use rand::distributions::{Distribution, WeightedIndex};

use crate::param::{Fraction, Parameter};
use crate::Density;

const FRACTION_SUM_TOLERANCE: f64 = 1e-9;

fn sum_error(pdf: &str, code: &str, message: impl Into<String>) -> PrecError {
    PrecError::Pdf(ErrorInfo::new(code, message).with_context("pdf", pdf))
}

/// `p(x) = Σ_k f_k · p_k(x)` over components that share one support.
///
/// The sum is not extended: it carries no yield, only shape.
#[derive(Debug, Clone, PartialEq)]
pub struct SumPdf<D> {
    name: String,
    components: Vec<D>,
    fractions: Vec<Fraction>,
}

impl<D: Density> SumPdf<D> {
    /// Builds the sum. When every fraction is fixed they must add up to one.
    pub fn new(
        name: impl Into<String>,
        components: Vec<D>,
        fractions: Vec<Fraction>,
    ) -> Result<Self, PrecError> {
        let name = name.into();
        if components.is_empty() {
            return Err(sum_error(
                &name,
                "sum-components",
                "a sum needs at least one component",
            ));
        }
        if components.len() != fractions.len() {
            return Err(sum_error(
                &name,
                "sum-components",
                format!(
                    "{} components but {} fractions",
                    components.len(),
                    fractions.len()
                ),
            ));
        }
        let support = components[0].support();
        if let Some(other) = components.iter().find(|c| c.support() != support) {
            return Err(sum_error(
                &name,
                "sum-support",
                format!(
                    "component {} has support {:?}, expected {:?}",
                    other.name(),
                    other.support(),
                    support
                ),
            ));
        }
        if let Some(bad) = fractions
            .iter()
            .find(|f| !f.value().is_finite() || f.value() < 0.0 || f.value() > 1.0)
        {
            return Err(sum_error(
                &name,
                "fraction-range",
                format!("fraction {} = {} outside [0, 1]", bad.name(), bad.value()),
            ));
        }
        if fractions.iter().all(|f| !f.is_floating()) {
            let total: f64 = fractions.iter().map(Fraction::value).sum();
            if (total - 1.0).abs() > FRACTION_SUM_TOLERANCE {
                return Err(sum_error(
                    &name,
                    "fraction-sum",
                    format!("fixed fractions add up to {total}, expected 1"),
                ));
            }
        }
        Ok(Self {
            name,
            components,
            fractions,
        })
    }

    /// Components in insertion order.
    pub fn components(&self) -> &[D] {
        &self.components
    }

    /// Fractions aligned with [`SumPdf::components`].
    pub fn fractions(&self) -> &[Fraction] {
        &self.fractions
    }
}

impl<D: Density> Density for SumPdf<D> {
    fn name(&self) -> &str {
        &self.name
    }

    fn support(&self) -> (f64, f64) {
        self.components[0].support()
    }

    fn pdf(&self, x: f64) -> f64 {
        self.components
            .iter()
            .zip(&self.fractions)
            .map(|(c, f)| f.value() * c.pdf(x))
            .sum()
    }

    fn log_pdf(&self, x: f64) -> f64 {
        self.pdf(x).ln()
    }

    fn parameters(&self) -> Vec<Parameter> {
        let mut params: Vec<Parameter> = self
            .fractions
            .iter()
            .filter_map(|f| match f {
                Fraction::Free(p) => Some(p.clone()),
                Fraction::Fixed { .. } => None,
            })
            .collect();
        for component in &self.components {
            params.extend(component.parameters());
        }
        params
    }

    fn sample(&self, n: usize, rng: &mut RngHandle) -> Result<Vec<f64>, PrecError> {
        let shares: Vec<f64> = self.fractions.iter().map(Fraction::value).collect();
        let picker = WeightedIndex::new(&shares)
            .map_err(|err| sum_error(&self.name, "sum-sample", err.to_string()))?;
        let mut counts = vec![0usize; self.components.len()];
        for _ in 0..n {
            counts[picker.sample(rng)] += 1;
        }
        let mut out = Vec::with_capacity(n);
        for (component, count) in self.components.iter().zip(counts) {
            if count > 0 {
                out.extend(component.sample(count, rng)?);
            }
        }
        Ok(out)
    }
}
