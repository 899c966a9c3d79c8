//! Normalized one-dimensional densities used as background shapes.
//!
//! [`KdePdf`] estimates a shape from weighted points; [`SumPdf`] mixes shapes
//! with [`Fraction`]s. Both implement [`Density`].
#![deny(missing_docs)]

pub mod kde;
mod math;
pub mod param;
pub mod sum;

use prec_core::{PrecError, RngHandle};

pub use kde::{Bandwidth, KdeOptions, KdePdf};
pub use param::{Fraction, Parameter};
pub use sum::SumPdf;

/// A probability density normalized on a bounded support.
pub trait Density {
    /// Density name.
    fn name(&self) -> &str;

    /// Inclusive support `(low, high)`.
    fn support(&self) -> (f64, f64);

    /// Natural log of the density; `-inf` outside the support.
    fn log_pdf(&self, x: f64) -> f64;

    /// Density value; zero outside the support.
    fn pdf(&self, x: f64) -> f64 {
        self.log_pdf(x).exp()
    }

    /// Whether the density carries its own yield. Background shapes never do.
    fn is_extended(&self) -> bool {
        false
    }

    /// Parameters a fit may vary.
    fn parameters(&self) -> Vec<Parameter> {
        Vec::new()
    }

    /// Draws `n` values from the density.
    fn sample(&self, n: usize, rng: &mut RngHandle) -> Result<Vec<f64>, PrecError>;
}
