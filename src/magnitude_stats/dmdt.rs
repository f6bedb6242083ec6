//! Rise-rate (dmdt) features of the first detection against prior non-detections.
//!
//! For every non-detection sharing the `(aid, fid)` key of a group:
//!
//! ```text
//! dt      = first_mjd - mjd
//! dm      = first_mag - diffmaglim
//! sigmadm = first_e_mag - diffmaglim
//! dmdt    = (first_mag + first_e_mag - diffmaglim) / dt
//! ```
//!
//! Only candidates with `dt > dt_min` are eligible, and the one with the **minimum** `dmdt`
//! wins. Equal rates keep the earliest non-detection.
use std::cmp::Ordering;

use crate::{
    constants::{FastHashMap, FilterKey, MJD},
    detections::{Detection, NonDetection},
    grouping::{Subset, Which},
    magnitude_stats::MagnitudeStatistics,
    records::DmdtFeatures,
};

/// Features of one non-detection against the first detection of its group.
///
/// Return
/// ----------
/// * `None` when the non-detection is not eligible (`dt <= dt_min`) or the rate is not finite.
fn candidate(first: &Detection, nd: &NonDetection, dt_min: f64) -> Option<DmdtFeatures> {
    let dt = first.mjd - nd.mjd;
    if !(dt > dt_min) {
        return None;
    }
    let dmdt = (first.mag + first.e_mag - nd.diffmaglim) / dt;
    if !dmdt.is_finite() {
        return None;
    }
    Some(DmdtFeatures {
        dt_first: dt,
        dm_first: first.mag - nd.diffmaglim,
        sigmadm_first: first.e_mag - nd.diffmaglim,
        dmdt_first: dmdt,
    })
}

/// Lower rate first, then earlier non-detection.
fn is_better(new: (&DmdtFeatures, MJD), current: (&DmdtFeatures, MJD)) -> bool {
    match new.0.dmdt_first.total_cmp(&current.0.dmdt_first) {
        Ordering::Less => true,
        Ordering::Equal => new.1 < current.1,
        Ordering::Greater => false,
    }
}

impl MagnitudeStatistics<'_> {
    /// dmdt features of every `(aid, fid)` group.
    ///
    /// Return
    /// ----------
    /// * `None` when the batch has no non-detection at all: the whole feature block is absent.
    /// * Otherwise a map holding only the groups with at least one eligible non-detection.
    pub fn dmdt(&self) -> Option<FastHashMap<FilterKey, DmdtFeatures>> {
        if self.non_detections.is_empty() {
            return None;
        }

        let rows = self.cache.rows();
        let first = self.cache.selected(Which::First, Subset::All);
        let dt_min = self.params.dt_min;

        let mut best: FastHashMap<FilterKey, (DmdtFeatures, MJD)> = FastHashMap::default();
        for nd in self.non_detections {
            let key = (nd.aid.clone(), nd.fid);
            let Some(&i) = first.get(&key) else {
                continue;
            };
            let Some(features) = candidate(&rows[i], nd, dt_min) else {
                continue;
            };
            match best.get_mut(&key) {
                Some(current) => {
                    if is_better((&features, nd.mjd), (&current.0, current.1)) {
                        *current = (features, nd.mjd);
                    }
                }
                None => {
                    best.insert(key, (features, nd.mjd));
                }
            }
        }

        Some(best.into_iter().map(|(k, (f, _))| (k, f)).collect())
    }
}

#[cfg(test)]
mod dmdt_test {
    use super::*;
    use crate::{detections::LightCurveBatch, params::MagstatsParams};
    use approx::assert_relative_eq;

    fn key(aid: &str, fid: u16) -> FilterKey {
        (aid.to_string(), fid)
    }

    #[test]
    fn test_no_non_detections_means_no_feature_block() {
        let batch = LightCurveBatch::new(
            vec![Detection::new("a", "AID1", 1, 10.0, 15.0, 0.1)],
            vec![],
        )
        .unwrap();
        let params = MagstatsParams::default();
        assert!(MagnitudeStatistics::new(&batch, &params).dmdt().is_none());
    }

    #[test]
    fn test_non_detections_too_close_are_not_eligible() {
        let batch = LightCurveBatch::new(
            vec![
                Detection::new("a", "AID1", 1, 10.0, 15.0, 0.1),
                Detection::new("b", "AID2", 1, 10.0, 15.0, 0.1),
            ],
            vec![
                NonDetection::new("AID1", 1, 9.5, 19.0),
                NonDetection::new("AID2", 1, 9.0, 19.0),
            ],
        )
        .unwrap();
        let params = MagstatsParams::default();
        let dmdt = MagnitudeStatistics::new(&batch, &params).dmdt().unwrap();

        assert_eq!(dmdt.len(), 1);
        assert!(!dmdt.contains_key(&key("AID1", 1)));
        assert!(dmdt.contains_key(&key("AID2", 1)));
    }

    #[test]
    fn test_minimum_rate_is_selected() {
        let batch = LightCurveBatch::new(
            vec![
                Detection::new("b", "AID1", 1, 12.0, 16.0, 0.5),
                Detection::new("a", "AID1", 1, 10.0, 15.0, 0.5),
                Detection::new("c", "AID1", 2, 10.0, 15.0, 0.5),
            ],
            vec![
                // dt = 1, dmdt = (15.5 - 18.5) / 1 = -3
                NonDetection::new("AID1", 1, 9.0, 18.5),
                // dt = 4, dmdt = (15.5 - 20.5) / 4 = -1.25
                NonDetection::new("AID1", 1, 6.0, 20.5),
                // later than the first detection
                NonDetection::new("AID1", 1, 11.0, 25.0),
                // other object
                NonDetection::new("AID9", 1, 1.0, 19.0),
            ],
        )
        .unwrap();
        let params = MagstatsParams::default();
        let dmdt = MagnitudeStatistics::new(&batch, &params).dmdt().unwrap();

        assert_eq!(dmdt.len(), 1);
        let f = dmdt[&key("AID1", 1)];
        assert_relative_eq!(f.dt_first, 1.0);
        assert_relative_eq!(f.dm_first, -3.5);
        assert_relative_eq!(f.sigmadm_first, -18.0);
        assert_relative_eq!(f.dmdt_first, -3.0);
    }

    #[test]
    fn test_equal_rates_keep_the_earliest_non_detection() {
        let batch = LightCurveBatch::new(
            vec![Detection::new("a", "AID1", 1, 10.0, 15.0, 0.0)],
            vec![
                // dt = 1, dmdt = -4
                NonDetection::new("AID1", 1, 9.0, 19.0),
                // dt = 2, dmdt = -4
                NonDetection::new("AID1", 1, 8.0, 23.0),
            ],
        )
        .unwrap();
        let params = MagstatsParams::default();
        let dmdt = MagnitudeStatistics::new(&batch, &params).dmdt().unwrap();
        assert_eq!(dmdt[&key("AID1", 1)].dt_first, 2.0);
    }

    #[test]
    fn test_dt_min_is_configurable() {
        let batch = LightCurveBatch::new(
            vec![Detection::new("a", "AID1", 1, 10.0, 15.0, 0.1)],
            vec![NonDetection::new("AID1", 1, 9.0, 19.0)],
        )
        .unwrap();
        let params = MagstatsParams::builder().dt_min(2.0).build().unwrap();
        let dmdt = MagnitudeStatistics::new(&batch, &params).dmdt().unwrap();
        assert!(dmdt.is_empty());
    }
}
