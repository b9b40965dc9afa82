//! Gnomonic tangent-plane projection and 2-D triangle intersection, used by
//! the overlap query's filter-verify step (spec §4.7).

use super::{cross, dot, normalize};
use pdsc_types::geometry::Unit3;

/// A point in the 2-D tangent plane at some anchor on the sphere.
pub type Point2 = [f64; 2];

/// Two points closer than this in tangent-plane units are treated as
/// coincident by the separating-axis test, to absorb floating-point noise
/// introduced by the projection.
pub const TANGENT_EPS: f64 = 1e-12;

/// Gnomonic-project a set of unit vectors into the 2-D tangent plane at
/// `anchor`. Each output coordinate is the point's position along an
/// arbitrary (but consistent, across the whole call) orthonormal basis of
/// the plane tangent to the sphere at `anchor`.
///
/// Distortion grows with angular distance from the anchor, which is why the
/// overlap query only ever projects a segment pair anchored at their own
/// midpoint (spec §4.7): distortion stays bounded by the segment resolution
/// Δ over the body radius R.
///
/// Points exactly antipodal to `anchor` have no gnomonic image and are
/// mapped to `[f64::INFINITY, f64::INFINITY]`, which a subsequent
/// intersection test will correctly treat as "no overlap" rather than
/// panicking.
pub fn project_to_tangent_plane(points: &[Unit3], anchor: Unit3) -> Vec<Point2> {
    let anchor = normalize(anchor).unwrap_or([0.0, 0.0, 1.0]);
    let (u, v) = tangent_basis(anchor);
    points
        .iter()
        .map(|&p| {
            let denom = dot(anchor, p);
            if denom <= f64::EPSILON {
                return [f64::INFINITY, f64::INFINITY];
            }
            [dot(p, u) / denom, dot(p, v) / denom]
        })
        .collect()
}

/// An arbitrary orthonormal basis (u, v) of the plane tangent to the sphere
/// at `anchor`.
fn tangent_basis(anchor: Unit3) -> (Unit3, Unit3) {
    // Any vector not parallel to `anchor` works as a seed; z is parallel
    // only when anchor is a pole, in which case x is used instead.
    let seed = if anchor[2].abs() < 0.9 {
        [0.0, 0.0, 1.0]
    } else {
        [1.0, 0.0, 0.0]
    };
    let u = normalize(cross(seed, anchor)).unwrap_or([1.0, 0.0, 0.0]);
    let v = cross(anchor, u);
    (u, v)
}

/// Separating-axis test for two triangles in the plane.
///
/// Two convex polygons do not intersect iff some edge of either one has all
/// vertices of the other polygon strictly on its outer side. With only
/// three edges per triangle, six candidate axes suffice.
pub fn triangles_intersect_2d(a: [Point2; 3], b: [Point2; 3]) -> bool {
    if a.iter().any(|p| !p[0].is_finite() || !p[1].is_finite())
        || b.iter().any(|p| !p[0].is_finite() || !p[1].is_finite())
    {
        return false;
    }
    !has_separating_axis(&a, &b) && !has_separating_axis(&b, &a)
}

fn has_separating_axis(edges_of: &[Point2; 3], other: &[Point2; 3]) -> bool {
    for i in 0..3 {
        let p0 = edges_of[i];
        let p1 = edges_of[(i + 1) % 3];
        let edge = [p1[0] - p0[0], p1[1] - p0[1]];
        // Outward normal (perpendicular to the edge); consistent for all
        // three edges of a consistently-wound triangle.
        let axis = [-edge[1], edge[0]];

        // If every point of `other` lies strictly beyond every point of
        // `edges_of` along this axis, the axis separates them.
        let self_max = edges_of
            .iter()
            .map(|p| dot2(axis, sub2(*p, p0)))
            .fold(f64::NEG_INFINITY, f64::max);
        let other_min = other
            .iter()
            .map(|p| dot2(axis, sub2(*p, p0)))
            .fold(f64::INFINITY, f64::min);

        if other_min > self_max + TANGENT_EPS {
            return true;
        }
    }
    false
}

fn sub2(a: Point2, b: Point2) -> Point2 {
    [a[0] - b[0], a[1] - b[1]]
}

fn dot2(a: Point2, b: Point2) -> f64 {
    a[0] * b[0] + a[1] * b[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdsc_types::geometry::latlon_to_unit;

    #[test]
    fn projects_anchor_to_origin() {
        let anchor = latlon_to_unit(10.0, 20.0);
        let pts = project_to_tangent_plane(&[anchor], anchor);
        assert!(pts[0][0].abs() < 1e-9);
        assert!(pts[0][1].abs() < 1e-9);
    }

    #[test]
    fn identical_triangles_intersect() {
        let tri = [[0.0, 0.0], [2.0, 0.0], [0.0, 2.0]];
        assert!(triangles_intersect_2d(tri, tri));
    }

    #[test]
    fn disjoint_triangles_do_not_intersect() {
        let a = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        let b = [[10.0, 10.0], [11.0, 10.0], [10.0, 11.0]];
        assert!(!triangles_intersect_2d(a, b));
    }

    #[test]
    fn overlapping_triangles_intersect() {
        let a = [[0.0, 0.0], [4.0, 0.0], [0.0, 4.0]];
        let b = [[1.0, 1.0], [5.0, 1.0], [1.0, 5.0]];
        assert!(triangles_intersect_2d(a, b));
    }

    #[test]
    fn touching_edge_counts_as_intersecting() {
        let a = [[0.0, 0.0], [2.0, 0.0], [0.0, 2.0]];
        let b = [[2.0, 0.0], [4.0, 0.0], [2.0, 2.0]];
        assert!(triangles_intersect_2d(a, b));
    }

    #[test]
    fn non_finite_points_never_intersect() {
        let a = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        let b = [[f64::INFINITY, f64::INFINITY], [1.0, 1.0], [2.0, 2.0]];
        assert!(!triangles_intersect_2d(a, b));
    }

    #[test]
    fn real_segment_pair_overlap_matches_spherical_overlap() {
        // Two triangles sharing an interior point on the sphere should
        // project to overlapping 2-D triangles when anchored near them.
        let v1 = latlon_to_unit(0.0, -1.0);
        let v2 = latlon_to_unit(0.0, 1.0);
        let v3 = latlon_to_unit(1.0, 0.0);
        let w1 = latlon_to_unit(-0.5, -0.5);
        let w2 = latlon_to_unit(0.5, 0.5);
        let w3 = latlon_to_unit(-0.5, 0.5);

        let anchor = pdsc_types::geometry::mean_direction(&[v1, v2, v3, w1, w2, w3]).unwrap();
        let pts = project_to_tangent_plane(&[v1, v2, v3, w1, w2, w3], anchor);
        let tri_a = [pts[0], pts[1], pts[2]];
        let tri_b = [pts[3], pts[4], pts[5]];
        assert!(triangles_intersect_2d(tri_a, tri_b));
    }
}
