//! The triangular footprint segment — the unit of spatial indexing (spec §3).

use crate::error::PdscError;
use crate::geometry::{self, Unit3};
use serde::{Deserialize, Serialize};

/// A spherical triangle approximating part of one observation's footprint.
///
/// Vertices are stored as unit vectors (never as latitude/longitude
/// averages — spec §9's "numerical hazard" note), so queries near the poles
/// or the ±180° meridian behave identically to queries anywhere else.
/// `center` and `radius` are computed once at construction and cached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub segment_id: u64,
    pub vertices: [Unit3; 3],
    pub center: Unit3,
    /// Max geodesic distance from `center` to any vertex, in *radians*
    /// (angular, body-radius-independent — multiply by the body radius to
    /// get meters).
    pub radius_rad: f64,
}

impl Segment {
    /// Construct a segment from three vertices on the unit sphere, given in
    /// counter-clockwise order as viewed from outside the sphere.
    ///
    /// Rejects degenerate triples: any pair of vertices closer than
    /// [`geometry::DEGENERATE_ANGLE_RAD`] (spec §4.1). Does not itself
    /// verify the CCW ordering invariant — that is the segmenter's
    /// responsibility at construction time, and is checked as a property in
    /// the segmenter's test suite.
    pub fn try_new(
        segment_id: u64,
        instrument: &str,
        observation_id: &str,
        vertices: [Unit3; 3],
    ) -> Result<Self, PdscError> {
        let [v1, v2, v3] = vertices;
        if geometry::is_degenerate_pair(v1, v2)
            || geometry::is_degenerate_pair(v2, v3)
            || geometry::is_degenerate_pair(v3, v1)
        {
            return Err(PdscError::DegenerateSegment {
                instrument: instrument.to_string(),
                observation_id: observation_id.to_string(),
            });
        }
        let center = geometry::mean_direction(&vertices).ok_or_else(|| PdscError::DegenerateSegment {
            instrument: instrument.to_string(),
            observation_id: observation_id.to_string(),
        })?;
        let radius_rad = vertices
            .iter()
            .map(|&v| geometry::angular_distance(center, v))
            .fold(0.0_f64, f64::max);
        Ok(Segment {
            segment_id,
            vertices,
            center,
            radius_rad,
        })
    }

    /// The bounding radius in meters for a body of the given radius.
    pub fn radius_m(&self, body_radius_m: f64) -> f64 {
        self.radius_rad * body_radius_m
    }

    /// `true` iff the three vertices wind counter-clockwise as viewed from
    /// outside the sphere, i.e. each edge's inward normal points roughly
    /// toward the segment's own center (spec §3 invariant).
    pub fn is_counter_clockwise(&self) -> bool {
        self.vertices
            .iter()
            .zip(self.vertices.iter().cycle().skip(1))
            .all(|(&a, &b)| geometry::dot(geometry::cross(a, b), self.center) >= 0.0)
    }
}
