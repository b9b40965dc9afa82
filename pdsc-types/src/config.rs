//! Per-instrument configuration, consumed only by ingest (spec §6).
//!
//! These are plain, `serde`-derived values. *Loading* them from a
//! configuration file or environment is a collaborator concern and out of
//! scope here; this module only defines the shape ingest consumes.

use crate::body::Body;
use crate::metadata::ColumnType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One `(pds_column, field_name, type)` mapping entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub pds_column: String,
    pub field_name: String,
    pub column_type: ColumnType,
}

/// Segmentation parameters for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationConfig {
    /// Target ground resolution Δ, in meters, bounding segment size.
    pub resolution_m: f64,
    /// Extra localizer-constructor flags, e.g. `{"nomap": true}`.
    #[serde(default)]
    pub localizer_kwargs: HashMap<String, LocalizerFlag>,
}

/// A value for a localizer constructor flag (spec §4.3: `browse`, `nomap`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocalizerFlag {
    Bool(bool),
    Text(String),
}

impl LocalizerFlag {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            LocalizerFlag::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// The full per-instrument configuration mapping from spec §6.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentConfig {
    pub instrument: String,
    pub body: Body,
    pub columns: Vec<ColumnSpec>,
    /// field -> multiplicative scale factor, for unit conversion.
    #[serde(default)]
    pub scale_factors: HashMap<String, f64>,
    /// Fields to secondary-index in the metadata store.
    #[serde(default)]
    pub index_fields: Vec<String>,
    pub segmentation: SegmentationConfig,
}

impl InstrumentConfig {
    /// The field marked as the observation-id column, if any `ColumnSpec`'s
    /// `field_name` is `"observation_id"`.
    pub fn observation_id_field(&self) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.field_name == "observation_id")
            .map(|c| c.field_name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> InstrumentConfig {
        InstrumentConfig {
            instrument: "hirise_rdr".to_string(),
            body: Body::MARS,
            columns: vec![ColumnSpec {
                pds_column: "PRODUCT_ID".to_string(),
                field_name: "observation_id".to_string(),
                column_type: ColumnType::Text,
            }],
            scale_factors: HashMap::new(),
            index_fields: vec!["corner1_latitude".to_string()],
            segmentation: SegmentationConfig {
                resolution_m: 100.0,
                localizer_kwargs: HashMap::new(),
            },
        }
    }

    #[test]
    fn finds_observation_id_field() {
        assert_eq!(sample().observation_id_field(), Some("observation_id"));
    }

    #[test]
    fn round_trips_through_json() {
        let cfg = sample();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: InstrumentConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }
}
