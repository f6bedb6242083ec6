//! # Magstats parameters
//!
//! This module defines [`MagstatsParams`] and its builder, which control the tunable parts of
//! the statistics computation:
//!
//! - the **saturation threshold** of every filter ([`SaturationThresholds`]),
//! - the **minimum time delta** a non-detection must precede the first detection by
//!   to be a dmdt candidate,
//! - the set of **excluded calculators** ([`Calculator`]), whose columns are left empty.
//!
//! ## Example
//!
//! ```rust
//! use magstats::params::{Calculator, MagstatsParams, SaturationThresholds};
//!
//! let params = MagstatsParams::builder()
//!     .saturation(SaturationThresholds::from_table([(1, 13.2), (2, 13.0)]))
//!     .dt_min(0.5)
//!     .exclude(Calculator::Dmdt)
//!     .exclude_names("ra,dec")
//!     .build()
//!     .unwrap();
//!
//! assert!(!params.is_enabled(Calculator::Ra));
//! assert!(params.saturation.threshold(3).is_err());
//! ```
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::{
    constants::{FilterId, Magnitude, DT_MIN, SATURATION_THRESHOLD},
    magstats_errors::MagstatsError,
};

/// Named calculators whose output can be excluded from the assembled records.
///
/// `Mjd`, `Ndet`, `Corrected` and `Stellar` exist at both the object and the
/// filter level; excluding them empties the column at both levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Calculator {
    // --- object level ---
    Ra,
    Dec,
    // --- both levels ---
    Mjd,
    Ndet,
    Corrected,
    Stellar,
    // --- filter level ---
    Statistics,
    Ndubious,
    SaturationRate,
    Dmdt,
}

impl Calculator {
    pub const ALL: [Calculator; 10] = [
        Calculator::Ra,
        Calculator::Dec,
        Calculator::Mjd,
        Calculator::Ndet,
        Calculator::Corrected,
        Calculator::Stellar,
        Calculator::Statistics,
        Calculator::Ndubious,
        Calculator::SaturationRate,
        Calculator::Dmdt,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Calculator::Ra => "ra",
            Calculator::Dec => "dec",
            Calculator::Mjd => "mjd",
            Calculator::Ndet => "ndet",
            Calculator::Corrected => "corrected",
            Calculator::Stellar => "stellar",
            Calculator::Statistics => "statistics",
            Calculator::Ndubious => "ndubious",
            Calculator::SaturationRate => "saturation_rate",
            Calculator::Dmdt => "dmdt",
        }
    }
}

impl fmt::Display for Calculator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Calculator {
    type Err = MagstatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Calculator::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| MagstatsError::UnknownCalculator(s.to_string()))
    }
}

/// Saturation threshold per filter.
///
/// Lookups hit the explicit per-filter table first, then the shared fallback.
/// Without a fallback, a filter missing from the table is an error
/// ([`MagstatsError::UnknownFilter`]) instead of silently using some default.
#[derive(Debug, Clone, PartialEq)]
pub struct SaturationThresholds {
    table: BTreeMap<FilterId, Magnitude>,
    fallback: Option<Magnitude>,
}

impl Default for SaturationThresholds {
    /// Every filter shares [`SATURATION_THRESHOLD`].
    fn default() -> Self {
        SaturationThresholds::uniform(SATURATION_THRESHOLD)
    }
}

impl SaturationThresholds {
    /// One threshold for every filter.
    pub fn uniform(threshold: Magnitude) -> Self {
        SaturationThresholds {
            table: BTreeMap::new(),
            fallback: Some(threshold),
        }
    }

    /// Explicit table, no fallback: only the listed filters are known.
    pub fn from_table(table: impl IntoIterator<Item = (FilterId, Magnitude)>) -> Self {
        SaturationThresholds {
            table: table.into_iter().collect(),
            fallback: None,
        }
    }

    pub fn with_filter(mut self, fid: FilterId, threshold: Magnitude) -> Self {
        self.table.insert(fid, threshold);
        self
    }

    pub fn with_fallback(mut self, threshold: Option<Magnitude>) -> Self {
        self.fallback = threshold;
        self
    }

    /// Threshold of filter `fid`.
    pub fn threshold(&self, fid: FilterId) -> Result<Magnitude, MagstatsError> {
        self.table
            .get(&fid)
            .copied()
            .or(self.fallback)
            .ok_or(MagstatsError::UnknownFilter(fid))
    }

    fn all_finite(&self) -> bool {
        self.table.values().chain(self.fallback.iter()).all(|t| t.is_finite())
    }
}

/// Configuration of a magstats computation.
///
/// Defaults
/// -----------------
/// * `saturation`: [`SATURATION_THRESHOLD`] (13.2 mag) for every filter
/// * `dt_min`: [`DT_MIN`] (0.5 d)
/// * `excluded`: empty (every calculator runs)
#[derive(Debug, Clone, PartialEq)]
pub struct MagstatsParams {
    pub saturation: SaturationThresholds,
    /// Non-detections must precede the first detection by strictly more than this (days)
    pub dt_min: f64,
    pub excluded: BTreeSet<Calculator>,
}

impl Default for MagstatsParams {
    fn default() -> Self {
        MagstatsParams {
            saturation: SaturationThresholds::default(),
            dt_min: DT_MIN,
            excluded: BTreeSet::new(),
        }
    }
}

impl MagstatsParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> MagstatsParamsBuilder {
        MagstatsParamsBuilder::new()
    }

    pub fn is_enabled(&self, calculator: Calculator) -> bool {
        !self.excluded.contains(&calculator)
    }
}

/// Builder for [`MagstatsParams`], with validation.
#[derive(Debug, Clone, Default)]
pub struct MagstatsParamsBuilder {
    params: MagstatsParams,
    excluded_names: Vec<String>,
}

impl MagstatsParamsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saturation(mut self, v: SaturationThresholds) -> Self {
        self.params.saturation = v;
        self
    }
    pub fn saturation_threshold(mut self, fid: FilterId, v: Magnitude) -> Self {
        self.params.saturation = self.params.saturation.with_filter(fid, v);
        self
    }
    pub fn dt_min(mut self, v: f64) -> Self {
        self.params.dt_min = v;
        self
    }
    pub fn exclude(mut self, v: Calculator) -> Self {
        self.params.excluded.insert(v);
        self
    }

    /// Exclude calculators by name, from a comma-separated list such as `"dmdt,ra"`.
    /// Names are checked by [`build`](Self::build).
    pub fn exclude_names(mut self, list: &str) -> Self {
        self.excluded_names.extend(
            list.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
        );
        self
    }

    /// Finalize the builder.
    ///
    /// Validation rules
    /// -----------------
    /// * `dt_min` must be finite and `>= 0`.
    /// * Every saturation threshold must be finite.
    /// * Every name given to [`exclude_names`](Self::exclude_names) must be a [`Calculator`].
    pub fn build(self) -> Result<MagstatsParams, MagstatsError> {
        let mut params = self.params;

        if !(params.dt_min.is_finite() && params.dt_min >= 0.0) {
            return Err(MagstatsError::InvalidParams(format!(
                "dt_min must be finite and non-negative (got {})",
                params.dt_min
            )));
        }
        if !params.saturation.all_finite() {
            return Err(MagstatsError::InvalidParams(
                "saturation thresholds must be finite".into(),
            ));
        }
        for name in &self.excluded_names {
            params.excluded.insert(name.parse()?);
        }

        Ok(params)
    }
}
