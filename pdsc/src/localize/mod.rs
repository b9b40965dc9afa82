//! The pixel↔latitude/longitude localizer contract and its three
//! implementation families (spec §4.3).

mod four_corner;
mod geodesic;
mod map;
mod registry;

pub use four_corner::FourCornerLocalizer;
pub use geodesic::{FlightDirection, GeodesicLocalizer};
pub use map::{MapLocalizer, MapProjection};
pub use registry::{LocalizerFactory, Registry};

use pdsc_types::geometry::Unit3;

/// The per-instrument mapping between image pixel coordinates and body
/// surface coordinates.
///
/// Implementors must accept any `(row, col)` in `[0, lines] x [0, samples]`
/// (extended by one past the last pixel so footprint corners are
/// reachable), per spec §4.3.
pub trait Localizer: std::fmt::Debug {
    /// Map a pixel coordinate to (latitude, longitude) in degrees.
    fn pixel_to_latlon(&self, row: f64, col: f64) -> (f64, f64);

    /// Invert `pixel_to_latlon`. The default implementation numerically
    /// inverts it via coarse-to-fine grid search followed by a local
    /// refinement; implementations with a closed-form inverse (e.g.
    /// [`MapLocalizer`]) should override this for exactness and speed.
    fn latlon_to_pixel(&self, lat: f64, lon: f64, samples: u32, lines: u32) -> (f64, f64) {
        numeric_inverse(self, lat, lon, samples, lines)
    }

    /// Vectorized "is each of these points inside any pixel of the
    /// observation?" check, used in tests and by consumers that already
    /// have candidate points in hand.
    fn location_mask(&self, latlons: &[(f64, f64)], samples: u32, lines: u32) -> Vec<bool> {
        latlons
            .iter()
            .map(|&(lat, lon)| {
                let (row, col) = self.latlon_to_pixel(lat, lon, samples, lines);
                (0.0..=lines as f64).contains(&row) && (0.0..=samples as f64).contains(&col)
            })
            .collect()
    }

    /// Unit-vector surface point for a pixel, convenience wrapper over
    /// `pixel_to_latlon` for callers in the geometry kernel.
    fn pixel_to_unit(&self, row: f64, col: f64) -> Unit3 {
        let (lat, lon) = self.pixel_to_latlon(row, col);
        pdsc_types::geometry::latlon_to_unit(lat, lon)
    }
}

/// Two-variable Newton's method with a coarse-to-fine fallback, used as the
/// default `latlon_to_pixel` for localizers with no closed-form inverse.
///
/// Accuracy: within the 1e-1 pixel tolerance spec §8 requires of
/// numerically-inverted localizers, for any well-conditioned (non-singular
/// Jacobian) mapping.
fn numeric_inverse<L: Localizer + ?Sized>(
    loc: &L,
    target_lat: f64,
    target_lon: f64,
    samples: u32,
    lines: u32,
) -> (f64, f64) {
    let target = pdsc_types::geometry::latlon_to_unit(target_lat, target_lon);

    // Coarse search: evaluate a modest grid and keep the closest sample as
    // the Newton seed, so we converge even for localizers whose inverse is
    // far from the image center.
    const COARSE_STEPS: usize = 12;
    let mut best = (0.0_f64, 0.0_f64);
    let mut best_dist = f64::INFINITY;
    for i in 0..=COARSE_STEPS {
        for j in 0..=COARSE_STEPS {
            let row = lines as f64 * i as f64 / COARSE_STEPS as f64;
            let col = samples as f64 * j as f64 / COARSE_STEPS as f64;
            let p = loc.pixel_to_unit(row, col);
            let d = pdsc_types::geometry::angular_distance(p, target);
            if d < best_dist {
                best_dist = d;
                best = (row, col);
            }
        }
    }

    // Newton refinement via finite-difference Jacobian on the unit-sphere
    // residual, projected into the local tangent plane.
    let (mut row, mut col) = best;
    let h = 1.0;
    for _ in 0..25 {
        let p = loc.pixel_to_unit(row, col);
        let residual = [p[0] - target[0], p[1] - target[1], p[2] - target[2]];
        if residual.iter().map(|r| r * r).sum::<f64>().sqrt() < 1e-10 {
            break;
        }
        let p_dr = loc.pixel_to_unit(row + h, col);
        let p_dc = loc.pixel_to_unit(row, col + h);
        let d_row = [
            (p_dr[0] - p[0]) / h,
            (p_dr[1] - p[1]) / h,
            (p_dr[2] - p[2]) / h,
        ];
        let d_col = [
            (p_dc[0] - p[0]) / h,
            (p_dc[1] - p[1]) / h,
            (p_dc[2] - p[2]) / h,
        ];
        // Solve the 2x3 least-squares system (J^T J) delta = J^T residual
        // for the two pixel-space unknowns.
        let a = dot3(d_row, d_row);
        let b = dot3(d_row, d_col);
        let c = dot3(d_col, d_col);
        let rhs_row = dot3(d_row, residual);
        let rhs_col = dot3(d_col, residual);
        let det = a * c - b * b;
        if det.abs() < 1e-18 {
            break;
        }
        let delta_row = (c * rhs_row - b * rhs_col) / det;
        let delta_col = (a * rhs_col - b * rhs_row) / det;
        row -= delta_row;
        col -= delta_col;
        row = row.clamp(0.0, lines as f64);
        col = col.clamp(0.0, samples as f64);
    }
    (row, col)
}

fn dot3(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}
