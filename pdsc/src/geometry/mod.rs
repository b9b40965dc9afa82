//! Spherical-triangle predicates built on [`pdsc_types::geometry`]'s vector
//! algebra: inward edge normals, point-in-triangle, closest-point-on-edge,
//! point-to-triangle distance, and gnomonic tangent-plane projection (spec
//! §4.1). These are the primitives the query engine composes into point and
//! overlap queries.

mod tangent;

pub use pdsc_types::geometry::{
    angular_distance, clamp_unit, cross, dot, geodesic_distance, is_degenerate_pair,
    latlon_to_unit, mean_direction, norm, normalize, normalize_lon_deg, unit_to_latlon, Unit3,
    DEGENERATE_ANGLE_RAD,
};
pub use tangent::{project_to_tangent_plane, triangles_intersect_2d, Point2, TANGENT_EPS};

/// The inward-pointing plane normal for an edge `v1 -> v2` of a
/// counter-clockwise-wound spherical triangle: `n = v1 x v2`. The half-space
/// `n . p >= 0` is the interior side (spec §4.1).
pub fn edge_plane_normal(v1: Unit3, v2: Unit3) -> Unit3 {
    cross(v1, v2)
}

/// `true` iff unit vector `p` lies inside (or on the boundary of) the
/// spherical triangle `(v1, v2, v3)`, assumed counter-clockwise.
///
/// The boundary (any edge dot product exactly zero) counts as inside, per
/// spec §4.1's tie-break rule.
pub fn point_in_spherical_triangle(p: Unit3, triangle: (Unit3, Unit3, Unit3)) -> bool {
    let (v1, v2, v3) = triangle;
    dot(edge_plane_normal(v1, v2), p) >= 0.0
        && dot(edge_plane_normal(v2, v3), p) >= 0.0
        && dot(edge_plane_normal(v3, v1), p) >= 0.0
}

/// Project `p` onto the great-circle arc through `v1` and `v2`, returning
/// the projected point only if it actually lies between the two endpoints.
///
/// The projection plane is the one through `v1`, `v2`, and the sphere's
/// center; the endpoint test reuses the inward-normal half-space test
/// against the two planes bounding the edge at each endpoint (spec §4.1).
/// Returns `None` when the closest point on the *full* great circle falls
/// outside the arc — in that case the closest point on the segment is one
/// of its endpoints, which the caller tests directly.
pub fn closest_point_on_spherical_edge(p: Unit3, v1: Unit3, v2: Unit3) -> Option<Unit3> {
    let edge_normal = edge_plane_normal(v1, v2);
    let edge_normal = normalize(edge_normal)?;
    // Component of p orthogonal to the edge's plane is removed, leaving the
    // in-plane projection, which is then renormalized onto the sphere.
    let out_of_plane = dot(p, edge_normal);
    let in_plane = [
        p[0] - out_of_plane * edge_normal[0],
        p[1] - out_of_plane * edge_normal[1],
        p[2] - out_of_plane * edge_normal[2],
    ];
    let q = normalize(in_plane)?;

    // The in-plane equation is satisfied by both q and its antipode; keep
    // whichever side actually faces p.
    let q = if dot(q, p) >= 0.0 {
        q
    } else {
        [-q[0], -q[1], -q[2]]
    };

    // q lies on the arc iff it is on the interior side of the half-planes
    // bounding each endpoint: the plane through the origin, v1, and the
    // pole of the edge (edge_normal x v1), and symmetrically at v2.
    let start_bound = cross(edge_normal, v1);
    let end_bound = cross(v2, edge_normal);
    let on_arc = dot(start_bound, q) >= -f64::EPSILON && dot(end_bound, q) >= -f64::EPSILON;

    on_arc.then_some(q)
}

/// Geodesic distance in meters from `p` to the spherical triangle
/// `(v1, v2, v3)`: zero if `p` is inside, else the minimum over up to six
/// candidates (three arc projections that land on their arc, three
/// vertices) (spec §4.1).
pub fn point_to_triangle_distance(
    p: Unit3,
    triangle: (Unit3, Unit3, Unit3),
    body_radius_m: f64,
) -> f64 {
    let (v1, v2, v3) = triangle;
    if point_in_spherical_triangle(p, triangle) {
        return 0.0;
    }
    let edges = [(v1, v2), (v2, v3), (v3, v1)];
    let mut best = f64::INFINITY;
    for &(a, b) in &edges {
        if let Some(q) = closest_point_on_spherical_edge(p, a, b) {
            best = best.min(geodesic_distance(p, q, body_radius_m));
        }
    }
    for v in [v1, v2, v3] {
        best = best.min(geodesic_distance(p, v, body_radius_m));
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ccw_triangle() -> (Unit3, Unit3, Unit3) {
        (
            latlon_to_unit(0.0, -1.0),
            latlon_to_unit(0.0, 1.0),
            latlon_to_unit(1.0, 0.0),
        )
    }

    #[test]
    fn center_of_triangle_is_inside() {
        let tri = ccw_triangle();
        let center = mean_direction(&[tri.0, tri.1, tri.2]).unwrap();
        assert!(point_in_spherical_triangle(center, tri));
    }

    #[test]
    fn far_point_is_outside() {
        let tri = ccw_triangle();
        let far = latlon_to_unit(-80.0, 170.0);
        assert!(!point_in_spherical_triangle(far, tri));
    }

    #[test]
    fn vertex_is_on_boundary_and_counts_as_inside() {
        let tri = ccw_triangle();
        assert!(point_in_spherical_triangle(tri.0, tri));
    }

    #[test]
    fn distance_is_zero_when_inside() {
        let tri = ccw_triangle();
        let center = mean_direction(&[tri.0, tri.1, tri.2]).unwrap();
        assert_eq!(point_to_triangle_distance(center, tri, 3_389_500.0), 0.0);
    }

    #[test]
    fn distance_is_positive_when_outside() {
        let tri = ccw_triangle();
        let far = latlon_to_unit(-80.0, 170.0);
        let d = point_to_triangle_distance(far, tri, 3_389_500.0);
        assert!(d > 0.0);
    }

    #[test]
    fn distance_never_exceeds_nearest_vertex_distance() {
        let tri = ccw_triangle();
        let p = latlon_to_unit(-1.0, 0.0);
        let d = point_to_triangle_distance(p, tri, 1.0);
        let nearest_vertex = [tri.0, tri.1, tri.2]
            .iter()
            .map(|&v| angular_distance(p, v))
            .fold(f64::INFINITY, f64::min);
        assert!(d <= nearest_vertex + 1e-9);
    }

    #[test]
    fn closest_point_on_edge_lies_between_endpoints() {
        let v1 = latlon_to_unit(0.0, -10.0);
        let v2 = latlon_to_unit(0.0, 10.0);
        let p = latlon_to_unit(5.0, 0.0);
        let q = closest_point_on_spherical_edge(p, v1, v2).expect("projection lands on arc");
        // q should be much closer to the equator-midpoint direction than to
        // either endpoint in longitude.
        let (_, lon) = unit_to_latlon(q);
        assert!((lon - 0.0).abs() < 1.0 || (lon - 360.0).abs() < 1.0);
    }

    #[test]
    fn closest_point_off_the_arc_returns_none() {
        let v1 = latlon_to_unit(0.0, -10.0);
        let v2 = latlon_to_unit(0.0, 10.0);
        let p = latlon_to_unit(0.0, 90.0);
        assert!(closest_point_on_spherical_edge(p, v1, v2).is_none());
    }
}
