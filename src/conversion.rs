use crate::constants::{ArcSec, Degree, ARCSEC_PER_DEGREE};

/// Convert an angle from arcseconds to degrees
///
/// Arguments
/// ---------------
/// * `arcsec`: the angle in arcseconds
///
/// Return
/// ----------
/// * the angle in degrees
#[inline]
pub fn arcsec_to_deg(arcsec: ArcSec) -> Degree {
    arcsec / ARCSEC_PER_DEGREE
}

/// Convert an angle from degrees to arcseconds
///
/// Arguments
/// ---------------
/// * `deg`: the angle in degrees
///
/// Return
/// ----------
/// * the angle in arcseconds
#[inline]
pub fn deg_to_arcsec(deg: Degree) -> ArcSec {
    deg * ARCSEC_PER_DEGREE
}

/// Inverse-variance weights `1 / σ²` for a set of 1-σ uncertainties.
pub fn inverse_variance_weights(sigmas: &[f64]) -> Vec<f64> {
    sigmas.iter().map(|s| 1.0 / (s * s)).collect()
}

/// Inverse-variance weighted mean of `values`.
///
/// Computes `Σ(vᵢ/σᵢ²) / Σ(1/σᵢ²)`. The uncertainties must be strictly positive:
/// a sample with a vanishing σ dominates the result, a sample with a σ many orders
/// of magnitude above its peers contributes negligibly.
///
/// Arguments
/// ---------------
/// * `values`: the samples
/// * `sigmas`: the 1-σ uncertainty of each sample, same length as `values`
///
/// Return
/// ----------
/// * the weighted mean, or `NaN` for an empty input
pub fn weighted_mean(values: &[f64], sigmas: &[f64]) -> f64 {
    debug_assert_eq!(values.len(), sigmas.len());
    let (num, den) = values
        .iter()
        .zip(sigmas)
        .fold((0.0, 0.0), |(num, den), (v, s)| {
            let w = 1.0 / (s * s);
            (num + v * w, den + w)
        });
    num / den
}

/// Uncertainty of the inverse-variance weighted mean: `sqrt(1 / Σ(1/σᵢ²))`.
///
/// Returns `+inf` for an empty input (no information at all).
pub fn weighted_mean_error(sigmas: &[f64]) -> f64 {
    let den: f64 = inverse_variance_weights(sigmas).iter().sum();
    (1.0 / den).sqrt()
}
