//! The spherical geometry kernel: latitude/longitude, unit vectors, and the
//! handful of exact vector-algebra primitives needed to validate a segment's
//! invariants. The richer predicates used by queries (inward-normal tests,
//! tangent-plane projection) live in `pdsc::geometry`, which is built on top
//! of these.
//!
//! All primitives are deterministic, free of global state, and never panic
//! on finite input; `acos`/`asin` arguments are clamped to `[-1, 1]` before
//! use, and callers are expected to reject near-antipodal/coincident vertex
//! pairs before relying on normalization.

/// A point on the unit sphere, in body-fixed Cartesian coordinates.
pub type Unit3 = [f64; 3];

/// Vertex pairs closer than this angular distance (radians) are treated as
/// degenerate and rejected at segment construction (spec §4.1).
pub const DEGENERATE_ANGLE_RAD: f64 = 1e-12;

/// Convert latitude/longitude in degrees to a unit vector.
///
/// `lat` is expected in `[-90, 90]`; `lon` may be given in either the
/// `[0, 360)` or `(-180, 180]` convention — both produce the same point.
pub fn latlon_to_unit(lat_deg: f64, lon_deg: f64) -> Unit3 {
    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lon, cos_lon) = lon.sin_cos();
    [cos_lat * cos_lon, cos_lat * sin_lon, sin_lat]
}

/// Convert a unit vector back to latitude/longitude in degrees.
///
/// `lon` is always returned normalized to `[0, 360)`.
pub fn unit_to_latlon(v: Unit3) -> (f64, f64) {
    let lat = clamp_unit(v[2]).asin().to_degrees();
    let lon = v[1].atan2(v[0]).to_degrees();
    (lat, normalize_lon_deg(lon))
}

/// Normalize a longitude in degrees to `[0, 360)`.
pub fn normalize_lon_deg(lon_deg: f64) -> f64 {
    let wrapped = lon_deg % 360.0;
    if wrapped < 0.0 {
        wrapped + 360.0
    } else {
        wrapped
    }
}

/// Clamp an `acos`/`asin` argument into `[-1, 1]` to absorb floating-point
/// drift near the poles of a dot-product computation.
pub fn clamp_unit(x: f64) -> f64 {
    x.clamp(-1.0, 1.0)
}

/// Dot product of two 3-vectors.
pub fn dot(a: Unit3, b: Unit3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Cross product `a x b`.
pub fn cross(a: Unit3, b: Unit3) -> Unit3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Euclidean length of a 3-vector.
pub fn norm(v: Unit3) -> f64 {
    dot(v, v).sqrt()
}

/// Normalize a 3-vector to unit length.
///
/// Returns `None` if the vector is (numerically) the zero vector, since it
/// has no well-defined direction.
pub fn normalize(v: Unit3) -> Option<Unit3> {
    let n = norm(v);
    if n < f64::EPSILON {
        None
    } else {
        Some([v[0] / n, v[1] / n, v[2] / n])
    }
}

/// The great-circle central angle, in radians, between two unit vectors.
pub fn angular_distance(a: Unit3, b: Unit3) -> f64 {
    clamp_unit(dot(a, b)).acos()
}

/// Haversine geodesic distance in meters between two unit vectors on a
/// sphere of the given radius.
pub fn geodesic_distance(a: Unit3, b: Unit3, body_radius_m: f64) -> f64 {
    angular_distance(a, b) * body_radius_m
}

/// `true` if `a` and `b` are closer than [`DEGENERATE_ANGLE_RAD`] — either
/// coincident or, after normalization, effectively the same direction.
pub fn is_degenerate_pair(a: Unit3, b: Unit3) -> bool {
    angular_distance(a, b) < DEGENERATE_ANGLE_RAD
}

/// The normalized vector mean of a set of unit vectors, renormalized back
/// onto the sphere.
///
/// Returns `None` if the mean vector is (numerically) zero, which can only
/// happen for point sets that exactly cancel (e.g. two antipodal points).
pub fn mean_direction(points: &[Unit3]) -> Option<Unit3> {
    if points.is_empty() {
        return None;
    }
    let sum = points.iter().fold([0.0, 0.0, 0.0], |acc, p| {
        [acc[0] + p[0], acc[1] + p[1], acc[2] + p[2]]
    });
    normalize(sum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn equator_prime_meridian_is_x_axis() {
        let v = latlon_to_unit(0.0, 0.0);
        assert_relative_eq!(v[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(v[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(v[2], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn north_pole_is_z_axis() {
        let v = latlon_to_unit(90.0, 123.4);
        assert_relative_eq!(v[2], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn round_trip_latlon() {
        for &(lat, lon) in &[
            (0.0, 0.0),
            (45.0, 90.0),
            (-45.0, 270.0),
            (-89.9, 10.0),
            (12.3, 359.0),
        ] {
            let v = latlon_to_unit(lat, lon);
            let (lat2, lon2) = unit_to_latlon(v);
            assert_relative_eq!(lat, lat2, epsilon = 1e-9);
            assert_relative_eq!(normalize_lon_deg(lon), lon2, epsilon = 1e-9);
        }
    }

    #[test]
    fn both_longitude_conventions_agree() {
        let a = latlon_to_unit(10.0, -30.0);
        let b = latlon_to_unit(10.0, 330.0);
        assert_relative_eq!(a[0], b[0], epsilon = 1e-12);
        assert_relative_eq!(a[1], b[1], epsilon = 1e-12);
        assert_relative_eq!(a[2], b[2], epsilon = 1e-12);
    }

    #[test]
    fn unit_to_latlon_longitude_is_normalized() {
        let (_, lon) = unit_to_latlon(latlon_to_unit(0.0, -90.0));
        assert!((0.0..360.0).contains(&lon));
    }

    #[test]
    fn geodesic_distance_quarter_great_circle() {
        let a = latlon_to_unit(0.0, 0.0);
        let b = latlon_to_unit(0.0, 90.0);
        let r = 6_371_000.0;
        let d = geodesic_distance(a, b, r);
        assert_relative_eq!(d, r * std::f64::consts::FRAC_PI_2, epsilon = 1e-6);
    }

    #[test]
    fn geodesic_distance_antipodal_is_half_circumference() {
        let a = latlon_to_unit(10.0, 20.0);
        let b = latlon_to_unit(-10.0, 200.0);
        let r = 3_389_500.0; // Mars
        let d = geodesic_distance(a, b, r);
        assert_relative_eq!(d, r * std::f64::consts::PI, epsilon = 1.0);
    }

    #[test]
    fn degenerate_pair_detection() {
        let a = latlon_to_unit(1.0, 1.0);
        let b = latlon_to_unit(1.0, 1.0 + 1e-14);
        assert!(is_degenerate_pair(a, b));
        let c = latlon_to_unit(1.0, 1.1);
        assert!(!is_degenerate_pair(a, c));
    }

    #[test]
    fn mean_direction_of_triangle_is_between_vertices() {
        let v1 = latlon_to_unit(0.0, -1.0);
        let v2 = latlon_to_unit(0.0, 1.0);
        let v3 = latlon_to_unit(1.0, 0.0);
        let mean = mean_direction(&[v1, v2, v3]).unwrap();
        assert_relative_eq!(norm(mean), 1.0, epsilon = 1e-12);
        // the mean should lean toward each vertex, i.e. be closer to all
        // three than an arbitrary distant point is.
        let far = latlon_to_unit(-80.0, 170.0);
        for v in [v1, v2, v3] {
            assert!(angular_distance(mean, v) < angular_distance(far, v));
        }
    }

    #[test]
    fn mean_direction_empty_is_none() {
        assert!(mean_direction(&[]).is_none());
    }

    #[test]
    fn cross_product_orthogonal_to_inputs() {
        let a = latlon_to_unit(0.0, 0.0);
        let b = latlon_to_unit(0.0, 90.0);
        let n = cross(a, b);
        assert_relative_eq!(dot(n, a), 0.0, epsilon = 1e-12);
        assert_relative_eq!(dot(n, b), 0.0, epsilon = 1e-12);
    }
}
