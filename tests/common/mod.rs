use std::path::PathBuf;

use approx::assert_relative_eq;
use magstats::{Detection, FilterStats};

pub fn data_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name)
}

/// `n` detections of `aid` in filter `fid`, one day apart from `mjd0`, brightening by 0.1 mag.
pub fn light_curve(aid: &str, fid: u16, mjd0: f64, n: usize) -> Vec<Detection> {
    (0..n)
        .map(|i| {
            let mag = 18.0 - 0.1 * i as f64;
            Detection::new(format!("{aid}-{fid}-{i}"), aid, fid, mjd0 + i as f64, mag, 0.1)
                .with_corrected(mag - 0.05)
                .with_position(45.0, 0.5, -30.0, 0.5)
        })
        .collect()
}

pub fn assert_magnitudes_close(
    actual: &FilterStats,
    mean: f64,
    median: f64,
    min: f64,
    max: f64,
    sigma: f64,
) {
    let eps = 1e-10;
    assert_relative_eq!(actual.magmean.unwrap(), mean, epsilon = eps);
    assert_relative_eq!(actual.magmedian.unwrap(), median, epsilon = eps);
    assert_relative_eq!(actual.magmin.unwrap(), min, epsilon = eps);
    assert_relative_eq!(actual.magmax.unwrap(), max, epsilon = eps);
    assert_relative_eq!(actual.magsigma.unwrap(), sigma, epsilon = eps);
}
