use std::f64::consts::SQRT_2;

#[inline]
pub(crate) fn standard_normal_logpdf(z: f64) -> f64 {
    // -0.5*ln(2π)
    const LOG_INV_SQRT_2PI: f64 = -0.918_938_533_204_672_7;
    LOG_INV_SQRT_2PI - 0.5 * z * z
}

#[inline]
pub(crate) fn standard_normal_cdf(z: f64) -> f64 {
    0.5 * statrs::function::erf::erfc(-z / SQRT_2)
}

/// Weighted mean and (population) variance.
pub(crate) fn weighted_moments(values: &[f64], weights: &[f64]) -> (f64, f64) {
    let sum_w: f64 = weights.iter().sum();
    let mean = values.iter().zip(weights).map(|(x, w)| x * w).sum::<f64>() / sum_w;
    let var = values
        .iter()
        .zip(weights)
        .map(|(x, w)| w * (x - mean) * (x - mean))
        .sum::<f64>()
        / sum_w;
    (mean, var)
}

/// Kish effective number of entries, `(Σw)² / Σw²`.
pub(crate) fn effective_entries(weights: &[f64]) -> f64 {
    let sum_w: f64 = weights.iter().sum();
    let sum_w2: f64 = weights.iter().map(|w| w * w).sum();
    if sum_w2 > 0.0 {
        sum_w * sum_w / sum_w2
    } else {
        0.0
    }
}

/// Weighted quantile using the cumulative weight of the sorted values.
pub(crate) fn weighted_quantile(values: &[f64], weights: &[f64], q: f64) -> f64 {
    let mut pairs: Vec<(f64, f64)> = values.iter().copied().zip(weights.iter().copied()).collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    let total: f64 = pairs.iter().map(|(_, w)| w).sum();
    let target = q * total;
    let mut acc = 0.0;
    for (x, w) in &pairs {
        acc += w;
        if acc >= target {
            return *x;
        }
    }
    pairs.last().map_or(f64::NAN, |(x, _)| *x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cdf_is_symmetric() {
        assert!((standard_normal_cdf(0.0) - 0.5).abs() < 1e-15);
        assert!((standard_normal_cdf(1.0) + standard_normal_cdf(-1.0) - 1.0).abs() < 1e-14);
        assert!((standard_normal_cdf(1.96) - 0.975_002_1).abs() < 1e-6);
    }

    #[test]
    fn moments_and_effective_entries() {
        let (mean, var) = weighted_moments(&[1.0, 3.0], &[1.0, 1.0]);
        assert_eq!((mean, var), (2.0, 1.0));
        assert_eq!(effective_entries(&[1.0; 10]), 10.0);
        assert!((effective_entries(&[2.0, 0.5, 0.5]) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn quantile_respects_weights() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(weighted_quantile(&values, &[1.0; 4], 0.5), 2.0);
        assert_eq!(weighted_quantile(&values, &[0.0, 0.0, 0.0, 1.0], 0.25), 4.0);
    }
}
