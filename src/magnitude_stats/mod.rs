//! # Per-filter magnitude statistics
//!
//! [`MagnitudeStatistics`] computes one [`FilterStats`] record per `(aid, fid)` pair of a
//! [`LightCurveBatch`]. Each statistic comes from a dedicated calculator returning a
//! column `key → value`; [`MagnitudeStatistics::assemble`] outer-joins every enabled column.
//!
//! ## Calculators
//! -----------------
//! | calculator | columns | rows used |
//! |---|---|---|
//! | [`aggregate_stats`](MagnitudeStatistics::aggregate_stats) | `magmean`, `magmedian`, `magmax`, `magmin`, `magsigma` (+ `_corr`) | all / corrected |
//! | [`first_last`](MagnitudeStatistics::first_last) | `magfirst`, `maglast` (+ `_corr`) | all / corrected |
//! | [`first_last_mjd`](MagnitudeStatistics::first_last_mjd) | `firstmjd`, `lastmjd` | all |
//! | [`corrected_flag`](MagnitudeStatistics::corrected_flag), [`stellar_flag`](MagnitudeStatistics::stellar_flag) | `corrected`, `stellar` (first detection) | all |
//! | [`detection_count`](MagnitudeStatistics::detection_count), [`dubious_count`](MagnitudeStatistics::dubious_count) | `ndet`, `ndubious` | all |
//! | [`saturation_rate`](MagnitudeStatistics::saturation_rate) | `saturation_rate` | rows with `mag_corr` |
//! | [`dmdt`](MagnitudeStatistics::dmdt) | `dt_first`, `dm_first`, `sigmadm_first`, `dmdt_first` | first detection + non-detections |
//!
//! ## Numerical conventions
//! -----------------
//! * `magsigma` is the **population** standard deviation (divisor `n`); a single-sample
//!   group reports exactly `0`.
//! * The saturation rate of a group without any corrected magnitude is `0 / 0 = NaN`,
//!   which is a value, not an error.
//! * Aggregates are computed over sorted values, so they do not depend on row order.
pub mod dmdt;

use std::collections::BTreeMap;

use log::debug;

use crate::{
    constants::{FastHashMap, FilterKey, Magnitude, MJD},
    detections::{Detection, LightCurveBatch, NonDetection},
    grouping::{FirstLast, GroupCache, Subset, Which},
    magstats_errors::MagstatsError,
    params::{Calculator, MagstatsParams},
    records::{merge_column, FilterStats},
};

/// Mean, median, extrema and population standard deviation of a set of magnitudes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagnitudeSummary {
    pub mean: Magnitude,
    pub median: Magnitude,
    pub max: Magnitude,
    pub min: Magnitude,
    pub sigma: Magnitude,
}

impl MagnitudeSummary {
    /// Summarize `values` (reordered in place).
    ///
    /// Return
    /// ----------
    /// * `None` for an empty slice, otherwise the summary. One sample gives `sigma == 0`.
    pub fn from_values(values: &mut [Magnitude]) -> Option<Self> {
        let n = values.len();
        if n == 0 {
            return None;
        }
        values.sort_by(|a, b| a.total_cmp(b));

        let mean = values.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 1 {
            values[n / 2]
        } else {
            (values[n / 2 - 1] + values[n / 2]) / 2.0
        };
        let sigma = if n == 1 {
            0.0
        } else {
            (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64).sqrt()
        };

        Some(MagnitudeSummary {
            mean,
            median,
            max: values[n - 1],
            min: values[0],
            sigma,
        })
    }
}

/// Magnitude used by a row subset: raw `mag` for all rows, `mag_corr` for corrected ones.
fn magnitude_of(det: &Detection, subset: Subset) -> Magnitude {
    match subset {
        Subset::All => det.mag,
        Subset::Corrected => det.mag_corr.unwrap_or(f64::NAN),
    }
}

fn subset_of(corrected: bool) -> Subset {
    if corrected {
        Subset::Corrected
    } else {
        Subset::All
    }
}

/// Per-`(aid, fid)` statistics calculator over one batch.
///
/// Groupings and first/last selections are memoized for the lifetime of the value, which
/// should not outlive one magstats computation.
pub struct MagnitudeStatistics<'a> {
    cache: GroupCache<'a, FilterKey>,
    non_detections: &'a [NonDetection],
    params: &'a MagstatsParams,
}

impl<'a> MagnitudeStatistics<'a> {
    pub fn new(batch: &'a LightCurveBatch, params: &'a MagstatsParams) -> Self {
        MagnitudeStatistics {
            cache: GroupCache::new(batch.detections()),
            non_detections: batch.non_detections(),
            params,
        }
    }

    /// Mean, median, max, min and population std of the raw or corrected magnitudes.
    ///
    /// With `corrected == true`, only rows flagged corrected are used and groups without
    /// such rows are absent.
    pub fn aggregate_stats(&self, corrected: bool) -> FastHashMap<FilterKey, MagnitudeSummary> {
        let subset = subset_of(corrected);
        let rows = self.cache.rows();
        self.cache
            .groups(subset)
            .aggregate(|idx| {
                let mut values: Vec<Magnitude> =
                    idx.iter().map(|&i| magnitude_of(&rows[i], subset)).collect();
                MagnitudeSummary::from_values(&mut values)
            })
            .into_iter()
            .filter_map(|(k, s)| s.map(|s| (k, s)))
            .collect()
    }

    /// Raw or corrected magnitude at the first and last epoch of every group.
    pub fn first_last(&self, corrected: bool) -> FastHashMap<FilterKey, FirstLast<Magnitude>> {
        let subset = subset_of(corrected);
        self.cache.first_last(subset, |d| magnitude_of(d, subset))
    }

    /// Raw or corrected magnitude at the detection named by `which` (`"first"` or `"last"`).
    ///
    /// Errors
    /// ----------
    /// * [`MagstatsError::InvalidSelector`] for any other selector.
    pub fn magnitude_at(
        &self,
        which: &str,
        corrected: bool,
    ) -> Result<FastHashMap<FilterKey, Magnitude>, MagstatsError> {
        let which: Which = which.parse()?;
        let subset = subset_of(corrected);
        Ok(self.cache.value_at(which, subset, |d| magnitude_of(d, subset)))
    }

    pub fn first_last_mjd(&self) -> FastHashMap<FilterKey, FirstLast<MJD>> {
        self.cache.first_last(Subset::All, |d| d.mjd)
    }

    /// `corrected` flag of the first detection of every group.
    pub fn corrected_flag(&self) -> FastHashMap<FilterKey, bool> {
        self.cache.value_at(Which::First, Subset::All, |d| d.corrected)
    }

    /// `stellar` flag of the first detection of every group.
    pub fn stellar_flag(&self) -> FastHashMap<FilterKey, bool> {
        self.cache.value_at(Which::First, Subset::All, |d| d.stellar)
    }

    pub fn detection_count(&self) -> FastHashMap<FilterKey, usize> {
        self.cache.groups(Subset::All).aggregate(|idx| idx.len())
    }

    pub fn dubious_count(&self) -> FastHashMap<FilterKey, usize> {
        let rows = self.cache.rows();
        self.cache
            .groups(Subset::All)
            .aggregate(|idx| idx.iter().filter(|&&i| rows[i].dubious).count())
    }

    /// Fraction of corrected magnitudes brighter than the filter's saturation threshold.
    ///
    /// The denominator counts every detection of the group carrying a corrected magnitude;
    /// a group without any gives `NaN`.
    ///
    /// Errors
    /// ----------
    /// * [`MagstatsError::UnknownFilter`] when a group's filter has no configured threshold.
    pub fn saturation_rate(&self) -> Result<FastHashMap<FilterKey, f64>, MagstatsError> {
        let rows = self.cache.rows();
        self.cache
            .groups(Subset::All)
            .iter()
            .map(|(key, idx)| -> Result<(FilterKey, f64), MagstatsError> {
                let threshold = self.params.saturation.threshold(key.1)?;
                let (saturated, total) = idx
                    .iter()
                    .filter_map(|&i| rows[i].mag_corr)
                    .fold((0usize, 0usize), |(sat, tot), mag| {
                        (sat + usize::from(mag < threshold), tot + 1)
                    });
                Ok((key.clone(), saturated as f64 / total as f64))
            })
            .collect()
    }

    /// Outer-join every enabled calculator into one record per `(aid, fid)`, sorted by key.
    pub fn assemble(&self) -> Result<Vec<FilterStats>, MagstatsError> {
        let params = self.params;
        let mut records: BTreeMap<FilterKey, FilterStats> = BTreeMap::new();
        let empty = FilterStats::empty;

        if params.is_enabled(Calculator::Statistics) {
            merge_column(&mut records, self.aggregate_stats(false), empty, |r, s| {
                r.magmean = Some(s.mean);
                r.magmedian = Some(s.median);
                r.magmax = Some(s.max);
                r.magmin = Some(s.min);
                r.magsigma = Some(s.sigma);
            });
            merge_column(&mut records, self.first_last(false), empty, |r, fl| {
                r.magfirst = Some(fl.first);
                r.maglast = Some(fl.last);
            });
            merge_column(&mut records, self.aggregate_stats(true), empty, |r, s| {
                r.magmean_corr = Some(s.mean);
                r.magmedian_corr = Some(s.median);
                r.magmax_corr = Some(s.max);
                r.magmin_corr = Some(s.min);
                r.magsigma_corr = Some(s.sigma);
            });
            merge_column(&mut records, self.first_last(true), empty, |r, fl| {
                r.magfirst_corr = Some(fl.first);
                r.maglast_corr = Some(fl.last);
            });
        }
        if params.is_enabled(Calculator::Mjd) {
            merge_column(&mut records, self.first_last_mjd(), empty, |r, fl| {
                r.firstmjd = Some(fl.first);
                r.lastmjd = Some(fl.last);
            });
        }
        if params.is_enabled(Calculator::Corrected) {
            merge_column(&mut records, self.corrected_flag(), empty, |r, v| {
                r.corrected = Some(v)
            });
        }
        if params.is_enabled(Calculator::Stellar) {
            merge_column(&mut records, self.stellar_flag(), empty, |r, v| {
                r.stellar = Some(v)
            });
        }
        if params.is_enabled(Calculator::Ndet) {
            merge_column(&mut records, self.detection_count(), empty, |r, v| {
                r.ndet = Some(v)
            });
        }
        if params.is_enabled(Calculator::Ndubious) {
            merge_column(&mut records, self.dubious_count(), empty, |r, v| {
                r.ndubious = Some(v)
            });
        }
        if params.is_enabled(Calculator::SaturationRate) {
            merge_column(&mut records, self.saturation_rate()?, empty, |r, v| {
                r.saturation_rate = Some(v)
            });
        }
        if params.is_enabled(Calculator::Dmdt) {
            match self.dmdt() {
                Some(dmdt) => merge_column(&mut records, dmdt, empty, |r, v| r.dmdt = Some(v)),
                None => debug!("No non-detections in batch, dmdt features omitted"),
            }
        }

        debug!("Assembled {} per-filter records", records.len());
        Ok(records.into_values().collect())
    }
}
