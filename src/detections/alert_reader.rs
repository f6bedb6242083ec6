//! # Alert message ingestion
//!
//! Upstream stages deliver light curves as JSON messages, one per object:
//!
//! ```json
//! {
//!   "aid": "AL21XXX",
//!   "detections": [ { "candid": "...", "fid": 1, "mjd": 59000.1, ... } ],
//!   "non_detections": [ { "fid": 1, "mjd": 58990.2, "diffmaglim": 19.5 } ]
//! }
//! ```
//!
//! The message-level `aid` is stamped on every contained record that does not carry one,
//! then all messages are flattened into a single [`LightCurveBatch`].
//!
//! Error policy
//! -----------------
//! * A message without `aid` or `detections` fails with [`MagstatsError::MissingField`].
//! * A record missing a required field fails the whole ingestion with
//!   [`MagstatsError::JsonParsing`]; no partial batch is produced.
//! * `non_detections` may be absent or `null`, both meaning "no non-detection".
use log::debug;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    detections::{Detection, LightCurveBatch, NonDetection},
    magstats_errors::MagstatsError,
};

/// Deserialize every record of `records`, stamping `aid` on those that lack it.
fn records_with_aid<T: DeserializeOwned>(
    records: Vec<Value>,
    aid: &Value,
) -> Result<Vec<T>, MagstatsError> {
    records
        .into_iter()
        .map(|mut record| -> Result<T, MagstatsError> {
            if let Value::Object(fields) = &mut record {
                fields.entry("aid").or_insert_with(|| aid.clone());
            }
            Ok(serde_json::from_value(record)?)
        })
        .collect()
}

/// Move the record array `field` out of `message`.
fn take_records(message: &mut Value, field: &str) -> Result<Option<Vec<Value>>, MagstatsError> {
    match message.get_mut(field).map(Value::take) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(records)) => Ok(Some(records)),
        Some(_) => Err(MagstatsError::MissingField(format!(
            "{field} (expected an array of records)"
        ))),
    }
}

impl LightCurveBatch {
    /// Build a batch from already-parsed alert messages.
    ///
    /// Arguments
    /// -----------------
    /// * `messages` – One JSON object per astronomical object, see the module documentation.
    ///   Records are moved out of the messages, not copied.
    ///
    /// Return
    /// ----------
    /// * `Ok(LightCurveBatch)` holding the detections and deduplicated non-detections of
    ///   every message.
    /// * `Err(MagstatsError)` on the first malformed message or record.
    pub fn from_alert_messages(messages: Vec<Value>) -> Result<Self, MagstatsError> {
        let n_messages = messages.len();
        let mut detections = Vec::new();
        let mut non_detections = Vec::new();

        for mut message in messages {
            let aid = message
                .get("aid")
                .filter(|aid| !aid.is_null())
                .cloned()
                .ok_or_else(|| MagstatsError::MissingField("aid".into()))?;

            let dets = take_records(&mut message, "detections")?
                .ok_or_else(|| MagstatsError::MissingField("detections".into()))?;
            detections.extend(records_with_aid::<Detection>(dets, &aid)?);

            if let Some(nds) = take_records(&mut message, "non_detections")? {
                non_detections.extend(records_with_aid::<NonDetection>(nds, &aid)?);
            }
        }

        debug!("Parsed {n_messages} alert messages");
        LightCurveBatch::new(detections, non_detections)
    }

    /// Build a batch from a JSON array of alert messages.
    pub fn from_json_str(json: &str) -> Result<Self, MagstatsError> {
        let messages: Vec<Value> = serde_json::from_str(json)?;
        LightCurveBatch::from_alert_messages(messages)
    }
}
