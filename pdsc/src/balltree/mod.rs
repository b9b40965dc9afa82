//! A static, bulk-loaded ball tree over segment centers under geodesic
//! distance (spec §4.6).
//!
//! Grounded on the node shape and ball-bound pruning rule of `geo`'s own
//! `ball_tree` module, adapted in two ways the spec calls for: the metric
//! is geodesic distance over unit vectors rather than squared Euclidean
//! distance over planar coordinates, and the split rule is the two-anchor
//! max-pairwise-distance partition rather than a KD median split.

mod persist;

pub use persist::{TreeReadError, TreeWriteError};

use crate::cancel::CancellationToken;
use pdsc_types::geometry::{angular_distance, mean_direction, Unit3};

/// Points in a leaf smaller than this stop splitting further.
pub const DEFAULT_LEAF_CAPACITY: u32 = 32;

#[derive(Debug, Clone)]
struct Node {
    center: Unit3,
    radius_rad: f64,
    start: usize,
    end: usize,
    kind: NodeKind,
}

#[derive(Debug, Clone, Copy)]
enum NodeKind {
    Leaf,
    Branch { left: usize, right: usize },
}

/// An immutable, pre-order-numbered ball tree over a fixed set of segment
/// centers.
#[derive(Debug, Clone)]
pub struct BallTree {
    nodes: Vec<Node>,
    /// Segment ids reordered to match the tree's leaf layout (parallel to
    /// the original `centers` input, permuted during build).
    segment_ids: Vec<u64>,
    pub body_radius_m: f64,
    /// The maximum radius (radians) of any segment indexed by this tree,
    /// stored alongside per spec §4.6, used by callers to size a query's
    /// search radius.
    pub r_max_rad: f64,
    pub leaf_capacity: u32,
}

impl BallTree {
    /// Builds a tree over `centers[i]` paired with `segment_ids[i]`, each
    /// contributing a bounding `segment_radii_rad[i]` (used only to compute
    /// `r_max_rad`, not as part of the tree's own geometry).
    pub fn build(
        centers: Vec<Unit3>,
        segment_ids: Vec<u64>,
        segment_radii_rad: &[f64],
        body_radius_m: f64,
        leaf_capacity: u32,
    ) -> Self {
        assert_eq!(centers.len(), segment_ids.len());
        assert_eq!(centers.len(), segment_radii_rad.len());

        let r_max_rad = segment_radii_rad.iter().cloned().fold(0.0_f64, f64::max);
        let n = centers.len();
        let mut order: Vec<usize> = (0..n).collect();
        let mut nodes = Vec::new();
        if n > 0 {
            build_recursive(&centers, &mut order, 0, n, &mut nodes, leaf_capacity as usize);
        }

        let ordered_ids = order.iter().map(|&i| segment_ids[i]).collect();

        BallTree {
            nodes,
            segment_ids: ordered_ids,
            body_radius_m,
            r_max_rad,
            leaf_capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.segment_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segment_ids.is_empty()
    }

    /// Every segment id whose center lies within `rho_rad` (angular radians)
    /// of `target`. Descends a child iff
    /// `geodesic(target, child.center) <= rho_rad + child.radius_rad`
    /// (spec §4.6); the result is a superset, verified by the caller's
    /// geometric filter.
    ///
    /// `cancellation`, if given, is checked before each batch of child
    /// descents (spec §5); a cancelled search returns whatever it has
    /// collected so far, which the caller discards rather than treating as
    /// a complete answer.
    pub fn radius_search(
        &self,
        target: Unit3,
        rho_rad: f64,
        cancellation: Option<&CancellationToken>,
    ) -> Vec<u64> {
        let mut results = Vec::new();
        if !self.is_empty() {
            self.radius_search_node(0, target, rho_rad, cancellation, &mut results);
        }
        results
    }

    fn radius_search_node(
        &self,
        node_idx: usize,
        target: Unit3,
        rho_rad: f64,
        cancellation: Option<&CancellationToken>,
        results: &mut Vec<u64>,
    ) {
        if cancellation.is_some_and(CancellationToken::is_cancelled) {
            return;
        }
        let node = &self.nodes[node_idx];
        let dist = angular_distance(target, node.center);
        if dist - node.radius_rad > rho_rad {
            return;
        }
        match node.kind {
            NodeKind::Leaf => {
                results.extend_from_slice(&self.segment_ids[node.start..node.end]);
            }
            NodeKind::Branch { left, right } => {
                self.radius_search_node(left, target, rho_rad, cancellation, results);
                self.radius_search_node(right, target, rho_rad, cancellation, results);
            }
        }
    }
}

/// Recursively builds the tree over `order[start..end]`, permuting `order`
/// in place so each leaf's `[start, end)` range is contiguous.
fn build_recursive(
    centers: &[Unit3],
    order: &mut [usize],
    start: usize,
    end: usize,
    nodes: &mut Vec<Node>,
    leaf_capacity: usize,
) -> usize {
    let count = end - start;
    debug_assert!(count > 0);

    let points: Vec<Unit3> = order[start..end].iter().map(|&i| centers[i]).collect();
    let center = mean_direction(&points).unwrap_or(points[0]);
    let radius_rad = points
        .iter()
        .map(|&p| angular_distance(center, p))
        .fold(0.0_f64, f64::max);

    let node_idx = nodes.len();
    if count <= leaf_capacity {
        nodes.push(Node {
            center,
            radius_rad,
            start,
            end,
            kind: NodeKind::Leaf,
        });
        return node_idx;
    }

    nodes.push(Node {
        center,
        radius_rad,
        start,
        end,
        kind: NodeKind::Leaf, // overwritten once children are known
    });

    let (anchor_a, anchor_b) = max_pairwise_anchors(&points);
    let a = points[anchor_a];
    let b = points[anchor_b];
    let closer_to_a = |idx: usize| angular_distance(a, centers[idx]) <= angular_distance(b, centers[idx]);

    // Partition in place: points closer to anchor `a` first, so the split
    // point falls out of the partition itself.
    order[start..end].sort_by_key(|&i| std::cmp::Reverse(closer_to_a(i)));

    // Guard against a degenerate split (every point equidistant, or all
    // identical) collapsing one side to zero, which would recurse forever.
    let computed = start + order[start..end].iter().filter(|&&i| closer_to_a(i)).count();
    let mid = if computed == start || computed == end {
        start + count / 2
    } else {
        computed
    };

    let left = build_recursive(centers, order, start, mid, nodes, leaf_capacity);
    let right = build_recursive(centers, order, mid, end, nodes, leaf_capacity);
    nodes[node_idx].kind = NodeKind::Branch { left, right };
    node_idx
}

/// The two points with maximum pairwise geodesic distance among `points`,
/// as the two partition anchors (spec §4.6). Exact, O(n^2): acceptable at
/// ingest-time build, never on the query path.
fn max_pairwise_anchors(points: &[Unit3]) -> (usize, usize) {
    let mut best = (0usize, 0usize.min(points.len().saturating_sub(1)));
    let mut best_dist = -1.0_f64;
    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            let d = angular_distance(points[i], points[j]);
            if d > best_dist {
                best_dist = d;
                best = (i, j);
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdsc_types::geometry::{angular_distance, latlon_to_unit};

    fn grid_centers(n_side: usize) -> (Vec<Unit3>, Vec<u64>, Vec<f64>) {
        let mut centers = Vec::new();
        let mut ids = Vec::new();
        let mut radii = Vec::new();
        let mut id = 0u64;
        for i in 0..n_side {
            for j in 0..n_side {
                let lat = -80.0 + i as f64 * (160.0 / n_side as f64);
                let lon = -170.0 + j as f64 * (340.0 / n_side as f64);
                centers.push(latlon_to_unit(lat, lon));
                ids.push(id);
                radii.push(0.001);
                id += 1;
            }
        }
        (centers, ids, radii)
    }

    #[test]
    fn radius_search_finds_nearby_points_and_excludes_far_ones() {
        let (centers, ids, radii) = grid_centers(10);
        let tree = BallTree::build(centers.clone(), ids, &radii, 3_396_000.0, 8);

        let target = centers[0];
        let found = tree.radius_search(target, 0.0, None);
        assert!(found.contains(&0));
    }

    #[test]
    fn radius_search_is_superset_of_brute_force() {
        let (centers, ids, radii) = grid_centers(8);
        let tree = BallTree::build(centers.clone(), ids.clone(), &radii, 3_396_000.0, 4);

        let target = latlon_to_unit(0.0, 0.0);
        let rho = 0.2;
        let found: std::collections::HashSet<u64> =
            tree.radius_search(target, rho, None).into_iter().collect();

        for (i, &c) in centers.iter().enumerate() {
            if angular_distance(target, c) <= rho {
                assert!(found.contains(&ids[i]), "brute-force hit missing from tree result");
            }
        }
    }

    #[test]
    fn empty_tree_returns_no_results() {
        let tree = BallTree::build(Vec::new(), Vec::new(), &[], 3_396_000.0, 16);
        assert!(tree.is_empty());
        assert!(tree.radius_search(latlon_to_unit(0.0, 0.0), 1.0, None).is_empty());
    }

    #[test]
    fn cancelled_search_returns_early() {
        let (centers, ids, radii) = grid_centers(10);
        let tree = BallTree::build(centers, ids, &radii, 3_396_000.0, 4);
        let token = CancellationToken::new();
        token.cancel();
        let found = tree.radius_search(latlon_to_unit(0.0, 0.0), 10.0, Some(&token));
        assert!(found.is_empty());
    }

    #[test]
    fn r_max_rad_is_the_largest_input_radius() {
        let (centers, ids, mut radii) = grid_centers(4);
        radii[3] = 0.5;
        let tree = BallTree::build(centers, ids, &radii, 3_396_000.0, 8);
        assert_eq!(tree.r_max_rad, 0.5);
    }
}
