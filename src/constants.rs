//! # Constants and type definitions for magstats
//!
//! This module centralizes the **default thresholds**, **conversion factors**, and **common type
//! aliases** used throughout the `magstats` library.
//!
//! ## Overview
//!
//! - Photometric defaults (saturation threshold, minimum dmdt time delta)
//! - Unit conversions (degrees ↔ arcseconds)
//! - Core type aliases used across the crate
//! - The hash map flavour used for per-batch grouping

use ahash::RandomState;
use std::collections::HashMap;

// -------------------------------------------------------------------------------------------------
// Photometric defaults and unit conversions
// -------------------------------------------------------------------------------------------------

/// Default saturation threshold (magnitudes), shared by every filter
pub const SATURATION_THRESHOLD: Magnitude = 13.2;

/// Default minimum time delta (days) between a non-detection and the first detection
/// for the non-detection to be considered by the dmdt calculator
pub const DT_MIN: f64 = 0.5;

/// Arcseconds in one degree
pub const ARCSEC_PER_DEGREE: f64 = 3600.0;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in arcseconds
pub type ArcSec = f64;
/// Modified Julian Date (days)
pub type MJD = f64;
/// Apparent magnitude (or magnitude error)
pub type Magnitude = f64;

/// Identifier grouping all detections of one physical source (`aid`)
pub type ObjectId = String;
/// Identifier of a photometric passband (`fid`)
pub type FilterId = u16;

/// Key of a per-filter record: `(aid, fid)`
pub type FilterKey = (ObjectId, FilterId);

/// Hash map used for every per-batch grouping structure.
pub type FastHashMap<K, V> = HashMap<K, V, RandomState>;
