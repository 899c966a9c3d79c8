//! Fixed-fraction combination of category densities.

use log::info;
use prec_core::{PrecError, RngHandle};
use prec_pdf::{Density, Fraction, Parameter, SumPdf};

use crate::density::CategoryDensity;

/// Fixed-fraction sum of two or more category densities.
#[derive(Debug, Clone, PartialEq)]
pub struct MixtureDensity {
    sum: SumPdf<CategoryDensity>,
    mass: Vec<f64>,
    wgt_br: Vec<f64>,
    wgt_dec: Vec<f64>,
    wgt_sam: Vec<f64>,
}

impl MixtureDensity {
    /// Component densities.
    pub fn components(&self) -> &[CategoryDensity] {
        self.sum.components()
    }

    /// Fractions aligned with the components; always [`Fraction::Fixed`].
    pub fn fractions(&self) -> &[Fraction] {
        self.sum.fractions()
    }

    /// Concatenated mass values.
    pub fn mass(&self) -> &[f64] {
        &self.mass
    }

    /// Concatenated combined weights.
    pub fn weights(&self) -> &[f64] {
        &self.wgt_br
    }

    /// Concatenated decay weights.
    pub fn decay_weights(&self) -> &[f64] {
        &self.wgt_dec
    }

    /// Concatenated sample weights.
    pub fn sample_weights(&self) -> &[f64] {
        &self.wgt_sam
    }
}

impl Density for MixtureDensity {
    fn name(&self) -> &str {
        self.sum.name()
    }

    fn support(&self) -> (f64, f64) {
        self.sum.support()
    }

    fn log_pdf(&self, x: f64) -> f64 {
        self.sum.log_pdf(x)
    }

    fn pdf(&self, x: f64) -> f64 {
        self.sum.pdf(x)
    }

    fn parameters(&self) -> Vec<Parameter> {
        self.sum.parameters()
    }

    fn sample(&self, n: usize, rng: &mut RngHandle) -> Result<Vec<f64>, PrecError> {
        self.sum.sample(n, rng)
    }
}

/// The background shape: a lone category density or a fixed mixture.
///
/// Neither variant is extended; attach a yield downstream, for instance seeded
/// with [`PrecShape::weighted_yield`].
#[derive(Debug, Clone, PartialEq)]
pub enum PrecShape {
    /// Exactly one category survived; it is returned as is.
    Single(CategoryDensity),
    /// Two or more categories.
    Mixture(MixtureDensity),
}

impl PrecShape {
    /// True for [`PrecShape::Mixture`].
    pub fn is_mixture(&self) -> bool {
        matches!(self, PrecShape::Mixture(_))
    }

    fn inner(&self) -> &dyn Density {
        match self {
            PrecShape::Single(density) => density,
            PrecShape::Mixture(mixture) => mixture,
        }
    }

    /// Component densities; one for [`PrecShape::Single`].
    pub fn components(&self) -> Vec<&CategoryDensity> {
        match self {
            PrecShape::Single(density) => vec![density],
            PrecShape::Mixture(mixture) => mixture.components().iter().collect(),
        }
    }

    /// Mass values of all components.
    pub fn mass(&self) -> &[f64] {
        match self {
            PrecShape::Single(density) => density.mass(),
            PrecShape::Mixture(mixture) => mixture.mass(),
        }
    }

    /// Combined weights of all components.
    pub fn weights(&self) -> &[f64] {
        match self {
            PrecShape::Single(density) => density.weights(),
            PrecShape::Mixture(mixture) => mixture.weights(),
        }
    }

    /// Decay weights of all components.
    pub fn decay_weights(&self) -> &[f64] {
        match self {
            PrecShape::Single(density) => density.decay_weights(),
            PrecShape::Mixture(mixture) => mixture.decay_weights(),
        }
    }

    /// Sample weights of all components.
    pub fn sample_weights(&self) -> &[f64] {
        match self {
            PrecShape::Single(density) => density.sample_weights(),
            PrecShape::Mixture(mixture) => mixture.sample_weights(),
        }
    }

    /// Sum of the combined weights.
    pub fn weighted_yield(&self) -> f64 {
        self.weights().iter().sum()
    }
}

impl Density for PrecShape {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn support(&self) -> (f64, f64) {
        self.inner().support()
    }

    fn log_pdf(&self, x: f64) -> f64 {
        self.inner().log_pdf(x)
    }

    fn pdf(&self, x: f64) -> f64 {
        self.inner().pdf(x)
    }

    fn parameters(&self) -> Vec<Parameter> {
        self.inner().parameters()
    }

    fn sample(&self, n: usize, rng: &mut RngHandle) -> Result<Vec<f64>, PrecError> {
        self.inner().sample(n, rng)
    }
}

/// Combines surviving category densities.
///
/// No density gives `None`. One density is passed through untouched. Two or
/// more are mixed with fixed fractions `yield_k / Σ yield`, where a yield is
/// the sum of the combined weights of a category.
pub fn combine(name: &str, densities: Vec<CategoryDensity>) -> Result<Option<PrecShape>, PrecError> {
    if densities.len() < 2 {
        return Ok(densities.into_iter().next().map(PrecShape::Single));
    }
    let yields: Vec<f64> = densities.iter().map(CategoryDensity::weighted_yield).collect();
    let total: f64 = yields.iter().sum();
    let fractions: Vec<Fraction> = densities
        .iter()
        .zip(&yields)
        .map(|(density, y)| Fraction::fixed(format!("f_{}", density.name()), y / total))
        .collect();
    for fraction in &fractions {
        info!("{:<40}{:>10.4}", fraction.name(), fraction.value());
    }

    let mut mass = Vec::new();
    let mut wgt_br = Vec::new();
    let mut wgt_dec = Vec::new();
    let mut wgt_sam = Vec::new();
    for density in &densities {
        mass.extend_from_slice(density.mass());
        wgt_br.extend_from_slice(density.weights());
        wgt_dec.extend_from_slice(density.decay_weights());
        wgt_sam.extend_from_slice(density.sample_weights());
    }
    let sum = SumPdf::new(name, densities, fractions)?;
    Ok(Some(PrecShape::Mixture(MixtureDensity {
        sum,
        mass,
        wgt_br,
        wgt_dec,
        wgt_sam,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::{WGT_BR, WGT_DEC, WGT_SAM};
    use crate::config::Observable;
    use prec_frame::Table;
    use prec_pdf::KdeOptions;

    fn density(label: &str, center: f64, weight: f64) -> CategoryDensity {
        let mass: Vec<f64> = (0..40).map(|i| center + i as f64).collect();
        let table = Table::new()
            .with_float("B_M", mass)
            .and_then(|t| t.with_float(WGT_BR, vec![weight; 40]))
            .and_then(|t| t.with_float(WGT_DEC, vec![1.0; 40]))
            .and_then(|t| t.with_float(WGT_SAM, vec![weight; 40]))
            .expect("table");
        let obs = Observable::new("m", 5000.0, 5600.0).expect("obs");
        CategoryDensity::fit(label, &table, "B_M", &obs, &KdeOptions::fixed(15.0)).expect("fit")
    }

    #[test]
    fn nothing_to_combine_is_none() {
        assert!(combine("prec", Vec::new()).expect("combine").is_none());
    }

    #[test]
    fn one_density_is_returned_unwrapped() {
        let single = density("bd", 5100.0, 1.0);
        let shape = combine("prec", vec![single.clone()]).expect("combine").expect("shape");
        assert_eq!(shape, PrecShape::Single(single));
        assert!(!shape.is_mixture());
        assert!(!shape.is_extended());
    }

    #[test]
    fn fractions_follow_weighted_yields() {
        let shape = combine(
            "prec",
            vec![density("a", 5100.0, 3.0), density("b", 5400.0, 1.0)],
        )
        .expect("combine")
        .expect("shape");
        let PrecShape::Mixture(mixture) = &shape else {
            panic!("expected a mixture");
        };
        let names: Vec<&str> = mixture.fractions().iter().map(Fraction::name).collect();
        assert_eq!(names, vec!["f_a", "f_b"]);
        assert!((mixture.fractions()[0].value() - 0.75).abs() < 1e-12);
        assert_eq!(shape.mass().len(), 80);
        assert_eq!(shape.weighted_yield(), 160.0);
        assert_eq!(shape.name(), "prec");
    }
}
