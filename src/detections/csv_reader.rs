//! CSV ingestion of detections and non-detections.
//!
//! Files must have a header row naming the [`Detection`] / [`NonDetection`] fields.
//! Empty cells of optional columns (`oid`, `tid`, `mag_corr`) are read as missing values.
use std::io;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::{
    detections::{Detection, LightCurveBatch, NonDetection},
    magstats_errors::MagstatsError,
};

fn read_records<T: DeserializeOwned, R: io::Read>(reader: R) -> Result<Vec<T>, MagstatsError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    rdr.deserialize()
        .map(|record| record.map_err(MagstatsError::from))
        .collect()
}

/// Read detections from any CSV source.
pub fn read_detections<R: io::Read>(reader: R) -> Result<Vec<Detection>, MagstatsError> {
    read_records(reader)
}

/// Read non-detections from any CSV source.
pub fn read_non_detections<R: io::Read>(reader: R) -> Result<Vec<NonDetection>, MagstatsError> {
    read_records(reader)
}

impl LightCurveBatch {
    /// Build a batch from a detections CSV file and an optional non-detections CSV file.
    ///
    /// Arguments
    /// -----------------
    /// * `detections` – Path of the detections file.
    /// * `non_detections` – Path of the non-detections file, `None` for a batch without any.
    ///
    /// Return
    /// ----------
    /// * `Ok(LightCurveBatch)` or the first I/O, parsing or validation error.
    pub fn from_csv_files(
        detections: &Path,
        non_detections: Option<&Path>,
    ) -> Result<Self, MagstatsError> {
        let dets = read_detections(std::fs::File::open(detections)?)?;
        let nds = match non_detections {
            Some(path) => read_non_detections(std::fs::File::open(path)?)?,
            None => Vec::new(),
        };
        LightCurveBatch::new(dets, nds)
    }
}
