use super::Localizer;
use pdsc_types::geometry::{self, Unit3};
use std::collections::HashMap;

/// Ascending/descending orbit direction, which flips the sign of row
/// (along-track) offsets (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightDirection {
    Ascending,
    Descending,
}

/// Per-CCD/channel pixel origin shift for HiRISE EDR products, applied
/// before the along-track/cross-track walk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CcdOffset {
    pub row_offset_px: f64,
    pub col_offset_px: f64,
}

/// Along-track/cross-track localizer used by push-broom and framing
/// instruments (CTX, MOC, HiRISE EDR, THEMIS) whose footprint is described
/// by a center point, a flight azimuth, and a ground sample distance.
///
/// A pixel at `(row, col)` is reached from the image center by walking
/// `(row - center_row)` pixel-heights along the flight great circle and
/// then `(col - center_col)` pixel-widths along the perpendicular great
/// circle, composing two small-angle rotations of the center unit vector.
#[derive(Debug, Clone)]
pub struct GeodesicLocalizer {
    center: Unit3,
    /// North azimuth of the flight direction, radians, clockwise from north.
    azimuth_rad: f64,
    pixel_height_m: f64,
    pixel_width_m: f64,
    body_radius_m: f64,
    center_row: f64,
    center_col: f64,
    flight: FlightDirection,
    ccd_offsets: HashMap<(u32, u32), CcdOffset>,
}

impl GeodesicLocalizer {
    pub fn new(
        center_lat: f64,
        center_lon: f64,
        azimuth_deg: f64,
        pixel_height_m: f64,
        pixel_width_m: f64,
        body_radius_m: f64,
        center_row: f64,
        center_col: f64,
        flight: FlightDirection,
    ) -> Self {
        Self {
            center: geometry::latlon_to_unit(center_lat, center_lon),
            azimuth_rad: azimuth_deg.to_radians(),
            pixel_height_m,
            pixel_width_m,
            body_radius_m,
            center_row,
            center_col,
            flight,
            ccd_offsets: HashMap::new(),
        }
    }

    /// Registers a per-(ccd, channel) pixel origin shift for HiRISE EDR
    /// products. Lookups for an unregistered (ccd, channel) pair apply no
    /// shift.
    pub fn with_ccd_offset(mut self, ccd: u32, channel: u32, offset: CcdOffset) -> Self {
        self.ccd_offsets.insert((ccd, channel), offset);
        self
    }

    fn ccd_shift(&self, ccd: Option<(u32, u32)>) -> (f64, f64) {
        match ccd.and_then(|key| self.ccd_offsets.get(&key)) {
            Some(off) => (off.row_offset_px, off.col_offset_px),
            None => (0.0, 0.0),
        }
    }

    /// Like [`Localizer::pixel_to_latlon`] but applies the CCD/channel
    /// origin shift for HiRISE EDR products that carry one.
    pub fn pixel_to_latlon_for_ccd(&self, row: f64, col: f64, ccd: (u32, u32)) -> (f64, f64) {
        let (dr, dc) = self.ccd_shift(Some(ccd));
        self.pixel_to_latlon(row + dr, col + dc)
    }

    fn along_across_offsets(&self, row: f64, col: f64) -> (f64, f64) {
        let row_sign = match self.flight {
            FlightDirection::Ascending => 1.0,
            FlightDirection::Descending => -1.0,
        };
        let along_m = row_sign * (row - self.center_row) * self.pixel_height_m;
        let across_m = (col - self.center_col) * self.pixel_width_m;
        (along_m, across_m)
    }
}

impl Localizer for GeodesicLocalizer {
    fn pixel_to_latlon(&self, row: f64, col: f64) -> (f64, f64) {
        let (along_m, across_m) = self.along_across_offsets(row, col);

        // Two composed small-circle rotations of the center vector: first
        // along the flight azimuth, then perpendicular to it, each through
        // the small angle subtended at the body's surface.
        let along_angle = along_m / self.body_radius_m;
        let across_angle = across_m / self.body_radius_m;

        let flight_axis = flight_rotation_axis(self.center, self.azimuth_rad);
        let p1 = rotate_about_axis(self.center, flight_axis, along_angle);

        let cross_azimuth = self.azimuth_rad + std::f64::consts::FRAC_PI_2;
        let cross_axis = flight_rotation_axis(p1, cross_azimuth);
        let p2 = rotate_about_axis(p1, cross_axis, across_angle);

        geometry::unit_to_latlon(p2)
    }
}

/// The rotation axis that carries `center` along a great circle whose
/// heading at `center` is `azimuth_rad` clockwise from north.
fn flight_rotation_axis(center: Unit3, azimuth_rad: f64) -> Unit3 {
    let (lat_deg, lon_deg) = geometry::unit_to_latlon(center);
    let (lat, lon) = (lat_deg.to_radians(), lon_deg.to_radians());
    // Partial derivatives of the unit-vector map with respect to latitude
    // and longitude, each already tangent to the sphere at `center`.
    let north_tangent = [-lat.sin() * lon.cos(), -lat.sin() * lon.sin(), lat.cos()];
    let east_tangent = [-lon.sin(), lon.cos(), 0.0];

    // Heading vector in the tangent plane, then the axis perpendicular to
    // both center and heading (rotating about it moves center along the
    // great circle with that heading).
    let heading = [
        azimuth_rad.cos() * north_tangent[0] + azimuth_rad.sin() * east_tangent[0],
        azimuth_rad.cos() * north_tangent[1] + azimuth_rad.sin() * east_tangent[1],
        azimuth_rad.cos() * north_tangent[2] + azimuth_rad.sin() * east_tangent[2],
    ];
    geometry::normalize(geometry::cross(heading, center)).unwrap_or([1.0, 0.0, 0.0])
}

/// Rodrigues' rotation formula: rotate `v` by `angle_rad` about unit axis
/// `axis`.
fn rotate_about_axis(v: Unit3, axis: Unit3, angle_rad: f64) -> Unit3 {
    let (s, c) = angle_rad.sin_cos();
    let cross = geometry::cross(axis, v);
    let dot = geometry::dot(axis, v);
    [
        v[0] * c + cross[0] * s + axis[0] * dot * (1.0 - c),
        v[1] * c + cross[1] * s + axis[1] * dot * (1.0 - c),
        v[2] * c + cross[2] * s + axis[2] * dot * (1.0 - c),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_localizer() -> GeodesicLocalizer {
        GeodesicLocalizer::new(
            0.0,
            0.0,
            0.0,
            10.0,
            10.0,
            3_396_000.0,
            500.0,
            500.0,
            FlightDirection::Ascending,
        )
    }

    #[test]
    fn center_pixel_maps_to_center_latlon() {
        let loc = sample_localizer();
        let (lat, lon) = loc.pixel_to_latlon(500.0, 500.0);
        assert!(lat.abs() < 1e-9);
        assert!(lon.abs() < 1e-9 || (lon - 360.0).abs() < 1e-9);
    }

    #[test]
    fn descending_flight_flips_row_sign() {
        let asc = GeodesicLocalizer::new(
            0.0,
            0.0,
            0.0,
            10.0,
            10.0,
            3_396_000.0,
            500.0,
            500.0,
            FlightDirection::Ascending,
        );
        let desc = GeodesicLocalizer::new(
            0.0,
            0.0,
            0.0,
            10.0,
            10.0,
            3_396_000.0,
            500.0,
            500.0,
            FlightDirection::Descending,
        );
        let (lat_asc, _) = asc.pixel_to_latlon(600.0, 500.0);
        let (lat_desc, _) = desc.pixel_to_latlon(600.0, 500.0);
        assert!((lat_asc + lat_desc).abs() < 1e-9);
    }

    #[test]
    fn round_trips_within_numeric_tolerance() {
        let loc = sample_localizer();
        let (lat, lon) = loc.pixel_to_latlon(300.0, 650.0);
        let (row, col) = loc.latlon_to_pixel(lat, lon, 1000, 1000);
        assert!((row - 300.0).abs() < 0.1);
        assert!((col - 650.0).abs() < 0.1);
    }

    #[test]
    fn unregistered_ccd_applies_no_shift() {
        let loc = sample_localizer();
        let plain = loc.pixel_to_latlon(200.0, 200.0);
        let shifted = loc.pixel_to_latlon_for_ccd(200.0, 200.0, (9, 9));
        assert_eq!(plain, shifted);
    }

    #[test]
    fn registered_ccd_shift_changes_result() {
        let loc = sample_localizer().with_ccd_offset(
            0,
            0,
            CcdOffset {
                row_offset_px: 50.0,
                col_offset_px: 0.0,
            },
        );
        let plain = loc.pixel_to_latlon(200.0, 200.0);
        let shifted = loc.pixel_to_latlon_for_ccd(200.0, 200.0, (0, 0));
        assert_ne!(plain, shifted);
    }
}
