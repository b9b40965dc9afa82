//! A single imaging event by one instrument (spec §3).

use crate::error::PdscError;
use crate::metadata::MetadataRecord;
use crate::segment::Segment;
use serde::{Deserialize, Serialize};

/// A uniquely identified imaging event by one instrument.
///
/// Created once at ingest and immutable thereafter. Owns a nonempty
/// sequence of segments tiling its footprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub instrument: String,
    pub observation_id: String,
    pub samples: u32,
    pub lines: u32,
    pub metadata: MetadataRecord,
    segments: Vec<Segment>,
}

impl Observation {
    /// Construct an observation, enforcing the "owns a nonempty sequence of
    /// segments" invariant from spec §3.
    pub fn new(
        instrument: impl Into<String>,
        observation_id: impl Into<String>,
        samples: u32,
        lines: u32,
        metadata: MetadataRecord,
        segments: Vec<Segment>,
    ) -> Result<Self, PdscError> {
        let instrument = instrument.into();
        let observation_id = observation_id.into();
        if segments.is_empty() {
            return Err(PdscError::DegenerateSegment {
                instrument,
                observation_id,
            });
        }
        Ok(Observation {
            instrument,
            observation_id,
            samples,
            lines,
            metadata,
            segments,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}
