use super::Localizer;
use pdsc_types::geometry::{self, Unit3};

/// Bilinear interpolation across four footprint corners, used when only
/// corner geography (no pointing model) is available (spec §4.3).
///
/// Corners are indexed the way PDS labels them: 1 = upper-left (row 0, col
/// 0), 2 = upper-right (row 0, col samples), 3 = lower-right (row lines,
/// col samples), 4 = lower-left (row lines, col 0).
#[derive(Debug, Clone, Copy)]
pub struct FourCornerLocalizer {
    corner1: Unit3,
    corner2: Unit3,
    corner3: Unit3,
    corner4: Unit3,
    samples: f64,
    lines: f64,
}

impl FourCornerLocalizer {
    pub fn new(
        corner1: (f64, f64),
        corner2: (f64, f64),
        corner3: (f64, f64),
        corner4: (f64, f64),
        samples: u32,
        lines: u32,
    ) -> Self {
        Self {
            corner1: geometry::latlon_to_unit(corner1.0, corner1.1),
            corner2: geometry::latlon_to_unit(corner2.0, corner2.1),
            corner3: geometry::latlon_to_unit(corner3.0, corner3.1),
            corner4: geometry::latlon_to_unit(corner4.0, corner4.1),
            samples: samples as f64,
            lines: lines as f64,
        }
    }
}

impl Localizer for FourCornerLocalizer {
    fn pixel_to_latlon(&self, row: f64, col: f64) -> (f64, f64) {
        let u = (col / self.samples).clamp(0.0, 1.0);
        let v = (row / self.lines).clamp(0.0, 1.0);

        // Bilinear blend in unit-vector space, then renormalize onto the
        // sphere: top edge interpolated between corners 1 and 2, bottom
        // edge between 4 and 3, then interpolated between those by v.
        let top = lerp3(self.corner1, self.corner2, u);
        let bottom = lerp3(self.corner4, self.corner3, u);
        let blended = lerp3(top, bottom, v);
        let unit = geometry::normalize(blended).unwrap_or(self.corner1);
        geometry::unit_to_latlon(unit)
    }
}

fn lerp3(a: Unit3, b: Unit3, t: f64) -> Unit3 {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn upper_left_pixel_matches_corner1() {
        let loc = square_localizer();
        let (lat, lon) = loc.pixel_to_latlon(0.0, 0.0);
        assert!((lat - 1.0).abs() < 1e-6);
        assert!((lon - (-1.0_f64).rem_euclid(360.0)).abs() < 1e-6);
    }

    #[test]
    fn lower_right_pixel_matches_corner3() {
        let loc = square_localizer();
        let (lat, lon) = loc.pixel_to_latlon(1000.0, 1000.0);
        assert!((lat - (-1.0)).abs() < 1e-6);
        assert!((lon - 1.0).abs() < 1e-6);
    }

    #[test]
    fn center_pixel_is_near_geometric_mean() {
        let loc = square_localizer();
        let (lat, lon) = loc.pixel_to_latlon(500.0, 500.0);
        assert!(lat.abs() < 1e-3);
        assert!(lon.abs() < 1e-3 || (lon - 360.0).abs() < 1e-3);
    }

    #[test]
    fn round_trips_within_numeric_tolerance() {
        let loc = square_localizer();
        let (lat, lon) = loc.pixel_to_latlon(250.0, 800.0);
        let (row, col) = loc.latlon_to_pixel(lat, lon, 1000, 1000);
        assert!((row - 250.0).abs() < 0.1);
        assert!((col - 800.0).abs() < 0.1);
    }
}
