//! Point, ε-point, and overlap queries over a per-instrument index (spec
//! §4.7).

use crate::balltree::BallTree;
use crate::cancel::CancellationToken;
use crate::geometry::{point_in_spherical_triangle, point_to_triangle_distance, project_to_tangent_plane, triangles_intersect_2d};
use crate::store::SegmentStore;
use pdsc_types::geometry::{latlon_to_unit, mean_direction};
use pdsc_types::{PdscError, PdscResult, Segment};
use std::collections::HashSet;

/// One instrument's queryable segment index: its ball tree plus the
/// segment store it was built from, and the body radius the tree's
/// angular radii are scaled by.
pub struct QueryEngine<'a> {
    instrument: &'a str,
    tree: &'a BallTree,
    segments: &'a SegmentStore,
    body_radius_m: f64,
}

impl<'a> QueryEngine<'a> {
    pub fn new(
        instrument: &'a str,
        tree: &'a BallTree,
        segments: &'a SegmentStore,
        body_radius_m: f64,
    ) -> Self {
        Self {
            instrument,
            tree,
            segments,
            body_radius_m,
        }
    }

    /// Point query `(lat, lon, epsilon_m)`: observation ids whose footprint
    /// contains, or lies within `epsilon_m` meters of, the target.
    pub fn point_query(
        &self,
        lat: f64,
        lon: f64,
        epsilon_m: f64,
        cancellation: Option<&CancellationToken>,
    ) -> PdscResult<Vec<String>> {
        if cancellation.is_some_and(CancellationToken::is_cancelled) {
            return Err(PdscError::Cancelled {
                instrument: self.instrument.to_string(),
                operation: "point_query",
            });
        }
        let target = latlon_to_unit(lat, lon);
        let rho_rad = self.tree.r_max_rad + epsilon_m / self.body_radius_m;
        let candidate_ids = self.tree.radius_search(target, rho_rad, cancellation);

        let mut hits = Vec::new();
        let mut seen_observations = HashSet::new();
        for segment_id in candidate_ids {
            if cancellation.is_some_and(CancellationToken::is_cancelled) {
                return Err(PdscError::Cancelled {
                    instrument: self.instrument.to_string(),
                    operation: "point_query",
                });
            }
            let observation_id = self.segments.observation_id_for_segment(segment_id)?;
            if seen_observations.contains(&observation_id) {
                continue;
            }
            let segment = self.segments.segment_by_id(segment_id)?;
            let triangle = (segment.vertices[0], segment.vertices[1], segment.vertices[2]);
            let is_hit = if epsilon_m <= 0.0 {
                point_in_spherical_triangle(target, triangle)
            } else {
                point_to_triangle_distance(target, triangle, self.body_radius_m) <= epsilon_m
            };
            if is_hit {
                seen_observations.insert(observation_id.clone());
                hits.push(observation_id);
            }
        }
        Ok(hits)
    }

    /// `find_observations_of_latlon`: the epsilon = 0 (or caller-supplied
    /// small default) special case of [`Self::point_query`].
    pub fn observations_of_latlon(&self, lat: f64, lon: f64) -> PdscResult<Vec<String>> {
        self.point_query(lat, lon, 0.0, None)
    }

    /// Overlap query: observation ids in `other`'s index whose footprint
    /// intersects `observation_id`'s footprint in this index.
    pub fn overlap_query(
        &self,
        observation_id: &str,
        other: &QueryEngine<'_>,
        cancellation: Option<&CancellationToken>,
    ) -> PdscResult<Vec<String>> {
        if cancellation.is_some_and(CancellationToken::is_cancelled) {
            return Err(PdscError::Cancelled {
                instrument: self.instrument.to_string(),
                operation: "overlap_query",
            });
        }
        let segments_a = self.segments.segments_for_observation(observation_id)?;

        let mut hits = Vec::new();
        let mut seen = HashSet::new();
        for seg_a in &segments_a {
            if cancellation.is_some_and(CancellationToken::is_cancelled) {
                return Err(PdscError::Cancelled {
                    instrument: self.instrument.to_string(),
                    operation: "overlap_query",
                });
            }
            let rho_rad = seg_a.radius_rad + other.tree.r_max_rad;
            let candidates = other.tree.radius_search(seg_a.center, rho_rad, cancellation);

            for segment_id in candidates {
                let observation_b = other.segments.observation_id_for_segment(segment_id)?;
                if seen.contains(&observation_b) {
                    continue;
                }
                let seg_b = other.segments.segment_by_id(segment_id)?;
                if segments_overlap(seg_a, &seg_b) {
                    seen.insert(observation_b.clone());
                    hits.push(observation_b);
                }
            }
        }
        Ok(hits)
    }
}

/// Tests whether two spherical-triangle segments intersect, via gnomonic
/// projection onto the tangent plane anchored at the renormalized vector
/// mean of their two centers (spec §9's resolved open question).
fn segments_overlap(a: &Segment, b: &Segment) -> bool {
    let anchor = match mean_direction(&[a.center, b.center]) {
        Some(anchor) => anchor,
        // Antipodal centers: no finite tangent plane contains both, so no
        // overlap test is possible; bounded by the ball-tree filter in
        // practice, since r_max_rad never approaches half the sphere.
        None => return false,
    };
    let points = [
        a.vertices[0],
        a.vertices[1],
        a.vertices[2],
        b.vertices[0],
        b.vertices[1],
        b.vertices[2],
    ];
    let projected = project_to_tangent_plane(&points, anchor);
    let tri_a = [projected[0], projected[1], projected[2]];
    let tri_b = [projected[3], projected[4], projected[5]];
    triangles_intersect_2d(tri_a, tri_b)
}

/// Symmetric to `segments_overlap`, exposed for property tests verifying
/// overlap symmetry (spec §8, property 7).
pub fn triangles_overlap_directly(a: &Segment, b: &Segment) -> bool {
    segments_overlap(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SegmentStore;

    fn triangle(id: u64, obs: &str, lat_offset: f64, lon_offset: f64) -> Segment {
        Segment::try_new(
            id,
            "ctx",
            obs,
            [
                latlon_to_unit(0.0 + lat_offset, -1.0 + lon_offset),
                latlon_to_unit(0.0 + lat_offset, 1.0 + lon_offset),
                latlon_to_unit(1.0 + lat_offset, 0.0 + lon_offset),
            ],
        )
        .unwrap()
    }

    fn build_index(segments: &[(&str, Segment)]) -> (SegmentStore, BallTree) {
        let store = SegmentStore::create(":memory:", "ctx").unwrap();
        let mut centers = Vec::new();
        let mut ids = Vec::new();
        let mut radii = Vec::new();
        for (obs, seg) in segments {
            store.insert(obs, seg).unwrap();
            centers.push(seg.center);
            ids.push(seg.segment_id);
            radii.push(seg.radius_rad);
        }
        let tree = BallTree::build(centers, ids, &radii, 3_396_000.0, 4);
        (store, tree)
    }

    #[test]
    fn point_query_finds_containing_observation() {
        let seg = triangle(1, "OBS1", 0.0, 0.0);
        let (store, tree) = build_index(&[("OBS1", seg)]);
        let engine = QueryEngine::new("ctx", &tree, &store, 3_396_000.0);

        let hits = engine.point_query(0.3, 0.0, 0.0, None).unwrap();
        assert_eq!(hits, vec!["OBS1".to_string()]);
    }

    #[test]
    fn point_query_epsilon_widens_matches_monotonically() {
        let seg = triangle(1, "OBS1", 0.0, 0.0);
        let (store, tree) = build_index(&[("OBS1", seg)]);
        let engine = QueryEngine::new("ctx", &tree, &store, 3_396_000.0);

        // A point well outside the triangle but within a generous epsilon.
        let far_lat = -5.0;
        let narrow = engine.point_query(far_lat, 0.0, 1.0, None).unwrap();
        let wide = engine.point_query(far_lat, 0.0, 2_000_000.0, None).unwrap();
        assert!(narrow.len() <= wide.len());
    }

    #[test]
    fn overlap_query_finds_intersecting_observation_in_other_instrument() {
        let seg_a = triangle(1, "A1", 0.0, 0.0);
        let seg_b = triangle(2, "B1", 0.1, 0.1);
        let (store_a, tree_a) = build_index(&[("A1", seg_a)]);
        let (store_b, tree_b) = build_index(&[("B1", seg_b)]);

        let engine_a = QueryEngine::new("hirise_rdr", &tree_a, &store_a, 3_396_000.0);
        let engine_b = QueryEngine::new("ctx", &tree_b, &store_b, 3_396_000.0);

        let hits = engine_a.overlap_query("A1", &engine_b, None).unwrap();
        assert_eq!(hits, vec!["B1".to_string()]);
    }

    #[test]
    fn overlap_query_is_symmetric() {
        let seg_a = triangle(1, "A1", 0.0, 0.0);
        let seg_b = triangle(2, "B1", 0.1, 0.1);
        let (store_a, tree_a) = build_index(&[("A1", seg_a)]);
        let (store_b, tree_b) = build_index(&[("B1", seg_b)]);

        let engine_a = QueryEngine::new("hirise_rdr", &tree_a, &store_a, 3_396_000.0);
        let engine_b = QueryEngine::new("ctx", &tree_b, &store_b, 3_396_000.0);

        let a_to_b = engine_a.overlap_query("A1", &engine_b, None).unwrap();
        let b_to_a = engine_b.overlap_query("B1", &engine_a, None).unwrap();
        assert_eq!(!a_to_b.is_empty(), !b_to_a.is_empty());
    }

    #[test]
    fn self_overlap_always_includes_itself() {
        let seg = triangle(1, "A1", 0.0, 0.0);
        let (store, tree) = build_index(&[("A1", seg)]);
        let engine = QueryEngine::new("hirise_rdr", &tree, &store, 3_396_000.0);

        let hits = engine.overlap_query("A1", &engine, None).unwrap();
        assert!(hits.contains(&"A1".to_string()));
    }

    #[test]
    fn cancelled_point_query_returns_cancelled_error() {
        let seg = triangle(1, "OBS1", 0.0, 0.0);
        let (store, tree) = build_index(&[("OBS1", seg)]);
        let engine = QueryEngine::new("ctx", &tree, &store, 3_396_000.0);
        let token = CancellationToken::new();
        token.cancel();

        let err = engine.point_query(0.3, 0.0, 0.0, Some(&token)).unwrap_err();
        assert!(matches!(err, PdscError::Cancelled { .. }));
    }
}
