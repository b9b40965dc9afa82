//! Turns a localizer, a pixel-space extent, and a target ground resolution
//! into the triangular segments that tile an observation's footprint
//! (spec §4.2).

use crate::localize::Localizer;
use pdsc_types::{PdscError, PdscResult, Segment};

/// How the segmenter should treat grid rows that cross a pole.
///
/// The unit-vector representation degrades gracefully at the poles (no
/// longitude singularity the way a lat/lon grid has), so the default is to
/// walk straight through; `Skip` exists for localizers known to misbehave
/// near their pole (e.g. azimuthal projections centered elsewhere).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PoleHandling {
    #[default]
    ContinueThrough,
    Skip,
}

/// Walks an observation's pixel grid and emits the triangular segments
/// tiling its footprint.
pub struct Segmenter {
    resolution_m: f64,
    body_radius_m: f64,
    pole_handling: PoleHandling,
}

impl Segmenter {
    pub fn new(resolution_m: f64, body_radius_m: f64) -> Self {
        Self {
            resolution_m,
            body_radius_m,
            pole_handling: PoleHandling::default(),
        }
    }

    pub fn with_pole_handling(mut self, pole_handling: PoleHandling) -> Self {
        self.pole_handling = pole_handling;
        self
    }

    /// Tiles the `samples` x `lines` pixel extent of `localizer` into
    /// segments, skipping any that fail the non-degeneracy check (logged at
    /// `warn`), and fails with `DegenerateSegment` if none survive.
    pub fn segment(
        &self,
        instrument: &str,
        observation_id: &str,
        localizer: &dyn Localizer,
        samples: u32,
        lines: u32,
    ) -> PdscResult<Vec<Segment>> {
        let grid = self.grid_nodes(localizer, samples, lines);
        let rows = grid.len();
        let cols = if rows > 0 { grid[0].len() } else { 0 };

        let mut segments = Vec::new();
        let mut next_id = 0u64;
        for r in 0..rows.saturating_sub(1) {
            for c in 0..cols.saturating_sub(1) {
                if self.pole_handling == PoleHandling::Skip && row_crosses_pole(&grid[r]) {
                    continue;
                }
                let nw = pdsc_types::geometry::latlon_to_unit(grid[r][c].0, grid[r][c].1);
                let ne = pdsc_types::geometry::latlon_to_unit(grid[r][c + 1].0, grid[r][c + 1].1);
                let sw = pdsc_types::geometry::latlon_to_unit(grid[r + 1][c].0, grid[r + 1][c].1);
                let se = pdsc_types::geometry::latlon_to_unit(
                    grid[r + 1][c + 1].0,
                    grid[r + 1][c + 1].1,
                );

                // Fixed NW-SE diagonal split, per spec §4.2. Vertex order is
                // chosen so both triangles wind counter-clockwise as viewed
                // from outside the sphere (spec §3): nw/sw/se and nw/se/ne.
                for vertices in [[nw, sw, se], [nw, se, ne]] {
                    match Segment::try_new(next_id, instrument, observation_id, vertices) {
                        Ok(seg) => {
                            next_id += 1;
                            segments.push(seg);
                        }
                        Err(err) => {
                            log::warn!(
                                "{instrument}/{observation_id}: skipping degenerate segment: {err}"
                            );
                        }
                    }
                }
            }
        }

        if segments.is_empty() {
            return Err(PdscError::DegenerateSegment {
                instrument: instrument.to_string(),
                observation_id: observation_id.to_string(),
            });
        }
        Ok(segments)
    }

    /// Computes the coarse pixel step that keeps adjacent grid vertices
    /// roughly `resolution_m` apart on the surface, then evaluates
    /// `pixel_to_latlon` at every node of the resulting grid, including a
    /// final partial step per axis so the full footprint is covered.
    fn grid_nodes(
        &self,
        localizer: &dyn Localizer,
        samples: u32,
        lines: u32,
    ) -> Vec<Vec<(f64, f64)>> {
        let step_px = self.pixel_step(localizer, samples, lines);
        let row_positions = axis_positions(lines as f64, step_px);
        let col_positions = axis_positions(samples as f64, step_px);

        row_positions
            .iter()
            .map(|&row| {
                col_positions
                    .iter()
                    .map(|&col| localizer.pixel_to_latlon(row, col))
                    .collect()
            })
            .collect()
    }

    /// Estimates the pixel step whose surface span is approximately
    /// `resolution_m`, by sampling the localizer's along-track ground
    /// sample distance near the image center.
    fn pixel_step(&self, localizer: &dyn Localizer, samples: u32, lines: u32) -> f64 {
        let mid_row = lines as f64 / 2.0;
        let mid_col = samples as f64 / 2.0;
        let p0 = localizer.pixel_to_unit(mid_row, mid_col);
        let p1 = localizer.pixel_to_unit((mid_row + 1.0).min(lines as f64), mid_col);
        let per_pixel_m =
            pdsc_types::geometry::geodesic_distance(p0, p1, self.body_radius_m).max(1e-6);
        (self.resolution_m / per_pixel_m).max(1.0)
    }
}

/// `0, step, 2*step, ..., extent`, always ending exactly at `extent` (the
/// final step is partial when `extent` is not a multiple of `step`).
fn axis_positions(extent: f64, step: f64) -> Vec<f64> {
    let mut positions = Vec::new();
    let mut x = 0.0;
    while x < extent {
        positions.push(x);
        x += step;
    }
    positions.push(extent);
    positions
}

fn row_crosses_pole(row: &[(f64, f64)]) -> bool {
    row.iter().any(|&(lat, _)| lat.abs() > 89.9)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::localize::FourCornerLocalizer;

    fn square_localizer() -> FourCornerLocalizer {
        FourCornerLocalizer::new(
            (1.0, -1.0),
            (1.0, 1.0),
            (-1.0, 1.0),
            (-1.0, -1.0),
            1000,
            1000,
        )
    }

    #[test]
    fn tiles_footprint_with_at_least_two_triangles() {
        let segmenter = Segmenter::new(20_000.0, 3_396_000.0);
        let segments = segmenter
            .segment("ctx", "TEST_0001", &square_localizer(), 1000, 1000)
            .expect("non-degenerate footprint");
        assert!(segments.len() >= 2);
    }

    #[test]
    fn axis_positions_always_reaches_extent() {
        let positions = axis_positions(1000.0, 137.0);
        assert_eq!(*positions.last().unwrap(), 1000.0);
    }

    #[test]
    fn pixel_coverage_lands_inside_some_segment() {
        let segmenter = Segmenter::new(20_000.0, 3_396_000.0);
        let localizer = square_localizer();
        let segments = segmenter
            .segment("ctx", "TEST_0002", &localizer, 1000, 1000)
            .unwrap();

        for &(row, col) in &[(0.0, 0.0), (500.0, 500.0), (999.0, 999.0), (250.0, 800.0)] {
            let (lat, lon) = localizer.pixel_to_latlon(row, col);
            let p = pdsc_types::geometry::latlon_to_unit(lat, lon);
            let inside = segments.iter().any(|s| {
                let [v1, v2, v3] = s.vertices;
                crate::geometry::point_in_spherical_triangle(p, (v1, v2, v3))
            });
            assert!(inside, "pixel ({row}, {col}) not covered by any segment");
        }
    }

    #[test]
    fn continue_through_tiles_a_footprint_straddling_the_pole() {
        let (ul, ur, lr, ll) = pdsc_test_fixtures::polar_crossing_footprint_corners();
        let localizer = FourCornerLocalizer::new(ul, ur, lr, ll, 200, 200);

        let segmenter = Segmenter::new(20_000.0, 3_396_000.0)
            .with_pole_handling(PoleHandling::ContinueThrough);
        let segments = segmenter
            .segment("ctx", "POLAR_0001", &localizer, 200, 200)
            .expect("pole-straddling footprint is not degenerate");
        assert!(segments.len() >= 2);

        let (lat, lon) = localizer.pixel_to_latlon(100.0, 100.0);
        let p = pdsc_types::geometry::latlon_to_unit(lat, lon);
        assert!(segments.iter().any(|s| {
            let [v1, v2, v3] = s.vertices;
            crate::geometry::point_in_spherical_triangle(p, (v1, v2, v3))
        }));
    }

    #[test]
    fn skip_drops_rows_that_cross_the_pole() {
        let (ul, ur, lr, ll) = pdsc_test_fixtures::polar_crossing_footprint_corners();
        let localizer = FourCornerLocalizer::new(ul, ur, lr, ll, 200, 200);

        let segmenter =
            Segmenter::new(20_000.0, 3_396_000.0).with_pole_handling(PoleHandling::Skip);
        let err = segmenter
            .segment("ctx", "POLAR_0002", &localizer, 200, 200)
            .unwrap_err();
        assert!(matches!(err, PdscError::DegenerateSegment { .. }));
    }

    #[test]
    fn zero_area_footprint_is_degenerate() {
        let localizer = FourCornerLocalizer::new(
            (1.0, 1.0),
            (1.0, 1.0),
            (1.0, 1.0),
            (1.0, 1.0),
            1000,
            1000,
        );
        let segmenter = Segmenter::new(20_000.0, 3_396_000.0);
        let err = segmenter
            .segment("ctx", "TEST_0003", &localizer, 1000, 1000)
            .unwrap_err();
        assert!(matches!(err, PdscError::DegenerateSegment { .. }));
    }
}
