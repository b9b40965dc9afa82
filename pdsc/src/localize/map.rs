use super::{FourCornerLocalizer, Localizer};
use pdsc_types::geometry;

/// Supported map projections for [`MapLocalizer`] (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapProjection {
    Equirectangular,
    PolarStereographic { north_pole: bool },
}

/// Fallback used when map metadata is absent ("nomap"): corner geography is
/// fit with a [`FourCornerLocalizer`] instead.
#[derive(Debug)]
enum Inner {
    Projected {
        projection: MapProjection,
        scale_m_per_px: f64,
        center_lat: f64,
        center_lon: f64,
        line_projection_offset: f64,
        sample_projection_offset: f64,
        body_radius_m: f64,
        browse_scale: f64,
    },
    Nomap(FourCornerLocalizer),
}

/// Projected-coordinate localizer (equirectangular, polar stereographic),
/// invertible in closed form. HiRISE RDR products use this directly; a
/// `browse` variant additionally rescales pixel coordinates to a fixed
/// browse-image width, and a `nomap` variant falls back to corner-fit
/// localization when no map metadata is present (spec §4.3).
#[derive(Debug)]
pub struct MapLocalizer {
    inner: Inner,
}

impl MapLocalizer {
    #[allow(clippy::too_many_arguments)]
    pub fn projected(
        projection: MapProjection,
        scale_m_per_px: f64,
        center_lat: f64,
        center_lon: f64,
        line_projection_offset: f64,
        sample_projection_offset: f64,
        body_radius_m: f64,
    ) -> Self {
        Self {
            inner: Inner::Projected {
                projection,
                scale_m_per_px,
                center_lat,
                center_lon,
                line_projection_offset,
                sample_projection_offset,
                body_radius_m,
                browse_scale: 1.0,
            },
        }
    }

    /// Rescales pixel coordinates by `full_width / browse_width` before
    /// projecting, so pixel coordinates measured on a reduced-resolution
    /// browse image land at the correct surface location.
    pub fn browse(self, full_width_px: u32, browse_width_px: u32) -> Self {
        match self.inner {
            Inner::Projected {
                projection,
                scale_m_per_px,
                center_lat,
                center_lon,
                line_projection_offset,
                sample_projection_offset,
                body_radius_m,
                ..
            } => Self {
                inner: Inner::Projected {
                    projection,
                    scale_m_per_px,
                    center_lat,
                    center_lon,
                    line_projection_offset,
                    sample_projection_offset,
                    body_radius_m,
                    browse_scale: full_width_px as f64 / browse_width_px as f64,
                },
            },
            nomap => Self { inner: nomap },
        }
    }

    /// Falls back to bilinear corner-fit localization when map metadata is
    /// absent from the label.
    pub fn nomap(corners: FourCornerLocalizer) -> Self {
        Self {
            inner: Inner::Nomap(corners),
        }
    }
}

impl Localizer for MapLocalizer {
    fn pixel_to_latlon(&self, row: f64, col: f64) -> (f64, f64) {
        match &self.inner {
            Inner::Nomap(four_corner) => four_corner.pixel_to_latlon(row, col),
            Inner::Projected {
                projection,
                scale_m_per_px,
                center_lat,
                center_lon,
                line_projection_offset,
                sample_projection_offset,
                body_radius_m,
                browse_scale,
            } => {
                let x_m = (col * browse_scale - sample_projection_offset) * scale_m_per_px;
                let y_m = (line_projection_offset - row * browse_scale) * scale_m_per_px;
                match *projection {
                    MapProjection::Equirectangular => {
                        let lat0 = center_lat.to_radians();
                        let lat = center_lat + (y_m / body_radius_m).to_degrees();
                        let lon =
                            center_lon + (x_m / (body_radius_m * lat0.cos())).to_degrees();
                        (lat, geometry::normalize_lon_deg(lon))
                    }
                    MapProjection::PolarStereographic { north_pole } => {
                        let rho = (x_m * x_m + y_m * y_m).sqrt();
                        let c = 2.0 * (rho / (2.0 * body_radius_m)).atan();
                        let sign = if north_pole { 1.0 } else { -1.0 };
                        let lat = if rho < 1e-9 {
                            sign * 90.0
                        } else {
                            (sign * c.cos()).asin().to_degrees()
                        };
                        let lon = if rho < 1e-9 {
                            *center_lon
                        } else {
                            let theta = y_m.atan2(x_m);
                            let lon_rad = if north_pole {
                                theta
                            } else {
                                std::f64::consts::PI - theta
                            };
                            lon_rad.to_degrees()
                        };
                        (lat, geometry::normalize_lon_deg(lon))
                    }
                }
            }
        }
    }

    fn latlon_to_pixel(&self, lat: f64, lon: f64, samples: u32, lines: u32) -> (f64, f64) {
        match &self.inner {
            Inner::Nomap(four_corner) => four_corner.latlon_to_pixel(lat, lon, samples, lines),
            Inner::Projected {
                projection,
                scale_m_per_px,
                center_lat,
                center_lon,
                line_projection_offset,
                sample_projection_offset,
                body_radius_m,
                browse_scale,
            } => {
                let (x_m, y_m) = match *projection {
                    MapProjection::Equirectangular => {
                        let lat0 = center_lat.to_radians();
                        let y_m = (lat - center_lat).to_radians() * body_radius_m;
                        let x_m =
                            (lon - center_lon).to_radians() * body_radius_m * lat0.cos();
                        (x_m, y_m)
                    }
                    MapProjection::PolarStereographic { north_pole } => {
                        let sign = if north_pole { 1.0 } else { -1.0 };
                        let c = (sign * lat.to_radians()).cos().acos();
                        let rho = 2.0 * body_radius_m * (c / 2.0).tan();
                        let theta = if north_pole {
                            lon.to_radians()
                        } else {
                            std::f64::consts::PI - lon.to_radians()
                        };
                        (rho * theta.cos(), rho * theta.sin())
                    }
                };
                let col = (x_m / scale_m_per_px + sample_projection_offset) / browse_scale;
                let row = (line_projection_offset - y_m / scale_m_per_px) / browse_scale;
                (
                    row.clamp(0.0, lines as f64),
                    col.clamp(0.0, samples as f64),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn equirect() -> MapLocalizer {
        MapLocalizer::projected(MapProjection::Equirectangular, 1.0, 0.0, 0.0, 500.0, 500.0, 3_396_000.0)
    }

    #[test]
    fn projection_center_maps_to_offset_pixel() {
        let loc = equirect();
        let (row, col) = loc.latlon_to_pixel(0.0, 0.0, 1000, 1000);
        assert!((row - 500.0).abs() < 1e-6);
        assert!((col - 500.0).abs() < 1e-6);
    }

    #[test]
    fn equirectangular_round_trips_exactly() {
        let loc = equirect();
        let (lat, lon) = loc.pixel_to_latlon(300.0, 700.0);
        let (row, col) = loc.latlon_to_pixel(lat, lon, 1000, 1000);
        assert!((row - 300.0).abs() < 1e-3);
        assert!((col - 700.0).abs() < 1e-3);
    }

    #[test]
    fn browse_rescales_pixel_coordinates() {
        let full = equirect();
        let browse = equirect().browse(1000, 500);
        let (lat_full, lon_full) = full.pixel_to_latlon(300.0, 700.0);
        let (lat_browse, lon_browse) = browse.pixel_to_latlon(150.0, 350.0);
        assert!((lat_full - lat_browse).abs() < 1e-6);
        assert!((lon_full - lon_browse).abs() < 1e-6);
    }

    #[test]
    fn polar_stereographic_round_trips_away_from_pole() {
        let loc = MapLocalizer::projected(
            MapProjection::PolarStereographic { north_pole: true },
            50.0,
            90.0,
            0.0,
            512.0,
            512.0,
            3_396_000.0,
        );
        let (lat, lon) = loc.pixel_to_latlon(400.0, 600.0);
        let (row, col) = loc.latlon_to_pixel(lat, lon, 1024, 1024);
        assert!((row - 400.0).abs() < 0.5);
        assert!((col - 600.0).abs() < 0.5);
    }

    #[test]
    fn nomap_variant_delegates_to_four_corner() {
        let corners = FourCornerLocalizer::new(
            (1.0, -1.0),
            (1.0, 1.0),
            (-1.0, 1.0),
            (-1.0, -1.0),
            1000,
            1000,
        );
        let direct = corners.pixel_to_latlon(0.0, 0.0);
        let loc = MapLocalizer::nomap(corners);
        assert_eq!(direct, loc.pixel_to_latlon(0.0, 0.0));
    }
}
