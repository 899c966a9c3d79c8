//! Weighted Gaussian kernel density estimate.

use prec_core::{ErrorInfo, PrecError, RngHandle};
use rand::distributions::{Distribution, WeightedIndex};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::math::{
    effective_entries, standard_normal_cdf, standard_normal_logpdf, weighted_moments,
    weighted_quantile,
};
use crate::Density;

const MAX_REJECTIONS: usize = 10_000;

fn kde_error(code: &str, message: impl Into<String>) -> PrecError {
    PrecError::Pdf(ErrorInfo::new(code, message))
}

/// Bandwidth selection rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", content = "value", rename_all = "lowercase")]
pub enum Bandwidth {
    /// `0.9 · min(σ, IQR / 1.349) · n_eff^(-1/5)`.
    Silverman,
    /// `1.059 · σ · n_eff^(-1/5)`.
    Scott,
    /// Fixed kernel width in observable units.
    Fixed(f64),
}

impl Default for Bandwidth {
    fn default() -> Self {
        Bandwidth::Silverman
    }
}

/// Shape keywords of the kernel density estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KdeOptions {
    /// Bandwidth rule.
    #[serde(default)]
    pub bandwidth: Bandwidth,
    /// Fraction of the support width, measured from each edge, whose points are
    /// mirrored across that edge. Zero disables padding.
    #[serde(default)]
    pub padding: f64,
}

impl Default for KdeOptions {
    fn default() -> Self {
        Self {
            bandwidth: Bandwidth::Silverman,
            padding: 0.0,
        }
    }
}

impl KdeOptions {
    /// Options with a fixed bandwidth and no padding.
    pub fn fixed(bandwidth: f64) -> Self {
        Self {
            bandwidth: Bandwidth::Fixed(bandwidth),
            padding: 0.0,
        }
    }
}

/// Weighted Gaussian kernel density estimate on a bounded support.
///
/// Every kernel is truncated to `[low, high]` and renormalized, so
///
/// `p(x) = (1 / Σ w_i) Σ_i w_i · φ((x - x_i)/h) / (h · Z_i)`
///
/// with `Z_i = Φ((high - x_i)/h) - Φ((low - x_i)/h)` integrates to one on the
/// support whatever the bandwidth. Mirrored padding points take part in the sum
/// with the weight of the point they mirror.
#[derive(Debug, Clone, PartialEq)]
pub struct KdePdf {
    name: String,
    support: (f64, f64),
    centers: Vec<f64>,
    weights: Vec<f64>,
    /// Per-kernel log prefactor: `ln(w_i) - ln(h) - ln(Z_i)`.
    kernel_log_prefactor: Vec<f64>,
    log_sum_w: f64,
    bandwidth: f64,
    n_points: usize,
}

impl KdePdf {
    /// Builds the estimate from `values` and their non-negative `weights`.
    pub fn fit(
        name: impl Into<String>,
        support: (f64, f64),
        values: &[f64],
        weights: &[f64],
        options: &KdeOptions,
    ) -> Result<Self, PrecError> {
        let (low, high) = support;
        if !low.is_finite() || !high.is_finite() || low >= high {
            return Err(kde_error(
                "kde-support",
                format!("support must be finite with low < high, got ({low}, {high})"),
            ));
        }
        if values.is_empty() {
            return Err(kde_error("kde-input", "at least one value is required"));
        }
        if values.len() != weights.len() {
            return Err(kde_error(
                "kde-input",
                format!(
                    "weights length mismatch: expected {}, got {}",
                    values.len(),
                    weights.len()
                ),
            ));
        }
        if values.iter().any(|x| !x.is_finite() || *x < low || *x > high) {
            return Err(kde_error(
                "kde-input",
                format!("values must be finite and lie within [{low}, {high}]"),
            ));
        }
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(kde_error("kde-input", "weights must be finite and >= 0"));
        }
        if !(0.0..=0.5).contains(&options.padding) {
            return Err(kde_error(
                "kde-padding",
                format!("padding must lie in [0, 0.5], got {}", options.padding),
            ));
        }

        let bandwidth = resolve_bandwidth(values, weights, options.bandwidth)?;

        let mut centers = values.to_vec();
        let mut kernel_weights = weights.to_vec();
        if options.padding > 0.0 {
            let reach = options.padding * (high - low);
            for (&x, &w) in values.iter().zip(weights) {
                if x - low < reach {
                    centers.push(2.0 * low - x);
                    kernel_weights.push(w);
                }
                if high - x < reach {
                    centers.push(2.0 * high - x);
                    kernel_weights.push(w);
                }
            }
        }

        let inv_h = 1.0 / bandwidth;
        let log_h = bandwidth.ln();
        let mut sum_w = 0.0f64;
        let mut kernel_log_prefactor = Vec::with_capacity(centers.len());
        for (&x0, &w) in centers.iter().zip(&kernel_weights) {
            sum_w += w;
            let log_w = if w > 0.0 { w.ln() } else { f64::NEG_INFINITY };
            let mut z = standard_normal_cdf((high - x0) * inv_h) - standard_normal_cdf((low - x0) * inv_h);
            if !z.is_finite() || z <= 0.0 {
                // Kernel essentially outside the support: keep the density finite.
                z = f64::MIN_POSITIVE;
            }
            kernel_log_prefactor.push(log_w - log_h - z.ln());
        }
        if !(sum_w.is_finite() && sum_w > 0.0) {
            return Err(kde_error(
                "kde-input",
                format!("sum of weights must be > 0, got {sum_w}"),
            ));
        }

        Ok(Self {
            name: name.into(),
            support,
            centers,
            weights: kernel_weights,
            kernel_log_prefactor,
            log_sum_w: sum_w.ln(),
            bandwidth,
            n_points: values.len(),
        })
    }

    /// Resolved kernel width.
    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// Number of input points, excluding mirrored padding points.
    pub fn n_points(&self) -> usize {
        self.n_points
    }

    /// Number of kernels, including mirrored padding points.
    pub fn n_kernels(&self) -> usize {
        self.centers.len()
    }

    #[inline]
    fn log_sum_kernels_at(&self, x: f64) -> f64 {
        // Online logsumexp: keep (m, s) so that log(Σ exp(t_i)) = m + ln(s).
        let mut m = f64::NEG_INFINITY;
        let mut s = 0.0f64;
        for (x0, lpref) in self.centers.iter().zip(&self.kernel_log_prefactor) {
            if !lpref.is_finite() {
                continue;
            }
            let t = lpref + standard_normal_logpdf((x - x0) / self.bandwidth);
            if t > m {
                s = if m.is_finite() { s * (m - t).exp() + 1.0 } else { 1.0 };
                m = t;
            } else {
                s += (t - m).exp();
            }
        }
        if !m.is_finite() {
            return f64::NEG_INFINITY;
        }
        m + s.ln()
    }
}

fn resolve_bandwidth(values: &[f64], weights: &[f64], rule: Bandwidth) -> Result<f64, PrecError> {
    let h = match rule {
        Bandwidth::Fixed(h) => h,
        Bandwidth::Scott | Bandwidth::Silverman => {
            let n_eff = effective_entries(weights);
            if n_eff <= 0.0 {
                return Err(kde_error("kde-input", "sum of weights must be > 0"));
            }
            let (_, var) = weighted_moments(values, weights);
            let sigma = var.sqrt();
            let scale = n_eff.powf(-0.2);
            if rule == Bandwidth::Scott {
                1.059 * sigma * scale
            } else {
                let iqr = weighted_quantile(values, weights, 0.75)
                    - weighted_quantile(values, weights, 0.25);
                let spread = if iqr > 0.0 { sigma.min(iqr / 1.349) } else { sigma };
                0.9 * spread * scale
            }
        }
    };
    if !h.is_finite() || h <= 0.0 {
        return Err(kde_error(
            "kde-bandwidth",
            format!("bandwidth must be finite and > 0, got {h}"),
        ));
    }
    Ok(h)
}

impl Density for KdePdf {
    fn name(&self) -> &str {
        &self.name
    }

    fn support(&self) -> (f64, f64) {
        self.support
    }

    fn log_pdf(&self, x: f64) -> f64 {
        let (low, high) = self.support;
        if !x.is_finite() || x < low || x > high {
            return f64::NEG_INFINITY;
        }
        self.log_sum_kernels_at(x) - self.log_sum_w
    }

    fn sample(&self, n: usize, rng: &mut RngHandle) -> Result<Vec<f64>, PrecError> {
        let (low, high) = self.support;
        let index = WeightedIndex::new(&self.weights)
            .map_err(|err| kde_error("kde-sample", err.to_string()))?;
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            let center = self.centers[index.sample(rng)];
            let mut accepted = None;
            for _ in 0..MAX_REJECTIONS {
                let z: f64 = StandardNormal.sample(rng);
                let x = center + self.bandwidth * z;
                if (low..=high).contains(&x) {
                    accepted = Some(x);
                    break;
                }
            }
            let x = accepted.ok_or_else(|| {
                kde_error("kde-sample", format!("kernel at {center} never lands in the support"))
            })?;
            out.push(x);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn integrate(pdf: &KdePdf, steps: usize) -> f64 {
        let (low, high) = pdf.support();
        let dx = (high - low) / steps as f64;
        (0..steps)
            .map(|i| pdf.pdf(low + (i as f64 + 0.5) * dx) * dx)
            .sum()
    }

    #[test]
    fn normalized_on_support_even_near_edges() {
        let values = [5001.0, 5010.0, 5020.0, 5300.0, 5590.0];
        let pdf = KdePdf::fit("edge", (5000.0, 5600.0), &values, &[1.0; 5], &KdeOptions::fixed(40.0))
            .expect("kde");
        assert!((integrate(&pdf, 20_000) - 1.0).abs() < 1e-4);
        assert_eq!(pdf.pdf(4999.0), 0.0);
    }

    #[test]
    fn padding_mirrors_points_near_edges() {
        let values = [5001.0, 5300.0, 5599.0];
        let opts = KdeOptions {
            bandwidth: Bandwidth::Fixed(30.0),
            padding: 0.1,
        };
        let pdf = KdePdf::fit("pad", (5000.0, 5600.0), &values, &[1.0; 3], &opts).expect("kde");
        assert_eq!(pdf.n_points(), 3);
        assert_eq!(pdf.n_kernels(), 5);
        assert!((integrate(&pdf, 20_000) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn rejects_bad_inputs() {
        let opts = KdeOptions::default();
        assert!(KdePdf::fit("x", (0.0, 1.0), &[], &[], &opts).is_err());
        assert!(KdePdf::fit("x", (0.0, 1.0), &[0.5], &[1.0, 1.0], &opts).is_err());
        assert!(KdePdf::fit("x", (0.0, 1.0), &[2.0], &[1.0], &opts).is_err());
        assert!(KdePdf::fit("x", (0.0, 1.0), &[0.5], &[-1.0], &opts).is_err());
        assert!(KdePdf::fit("x", (1.0, 0.0), &[0.5], &[1.0], &opts).is_err());
        let err = KdePdf::fit("x", (0.0, 1.0), &[0.5, 0.5], &[1.0, 1.0], &opts).expect_err("zero spread");
        assert_eq!(err.code(), "kde-bandwidth");
    }

    #[test]
    fn zero_weights_do_not_contribute() {
        let opts = KdeOptions::fixed(10.0);
        let a = KdePdf::fit("a", (0.0, 100.0), &[20.0, 80.0], &[1.0, 0.0], &opts).expect("kde");
        let b = KdePdf::fit("b", (0.0, 100.0), &[20.0], &[1.0], &opts).expect("kde");
        for x in [10.0, 20.0, 50.0, 80.0] {
            assert!((a.pdf(x) - b.pdf(x)).abs() < 1e-15);
        }
    }

    #[test]
    fn scott_and_silverman_shrink_with_entries() {
        let few: Vec<f64> = (0..50).map(|i| i as f64).collect();
        let many: Vec<f64> = (0..5000).map(|i| i as f64 / 100.0).collect();
        for rule in [Bandwidth::Scott, Bandwidth::Silverman] {
            let opts = KdeOptions {
                bandwidth: rule,
                padding: 0.0,
            };
            let a = KdePdf::fit("a", (0.0, 50.0), &few, &vec![1.0; few.len()], &opts).expect("kde");
            let b = KdePdf::fit("b", (0.0, 50.0), &many, &vec![1.0; many.len()], &opts).expect("kde");
            assert!(b.bandwidth() < a.bandwidth());
        }
    }

    #[test]
    fn samples_stay_in_support() {
        let values: Vec<f64> = (0..40).map(|i| 5000.0 + 15.0 * i as f64).collect();
        let pdf = KdePdf::fit("s", (5000.0, 5600.0), &values, &vec![1.0; 40], &KdeOptions::default())
            .expect("kde");
        let mut rng = RngHandle::from_seed(11);
        let draws = pdf.sample(500, &mut rng).expect("sample");
        assert_eq!(draws.len(), 500);
        assert!(draws.iter().all(|x| (5000.0..=5600.0).contains(x)));
    }
}
