//! Small synthetic fixtures shared across `pdsc-types` and `pdsc`'s test
//! suites, mirroring `geo-test-fixtures`'s role relative to `geo` — except
//! these are generated in code rather than loaded from bundled WKT files,
//! since the scenarios they model (PDS cumulative-index rows, instrument
//! footprints) have no natural flat-file encoding within this workspace's
//! scope.
//!
//! These are *structurally equivalent* stand-ins for the literal HiRISE RDR
//! sample index scenarios in the indexing specification's seed-scenario
//! list (duplicate-id color products, cross-instrument overlap, bounding-box
//! exclusion, open-interval predicates, self-overlap identity), built from
//! values we choose and therefore know to be correct, plus one scenario the
//! literal sample index doesn't cover: a footprint that crosses a pole.

use pdsc_types::geometry::latlon_to_unit;
use pdsc_types::{MetadataRecord, Segment, Value};

/// Four corner `(lat, lon)` pairs, in `FourCornerLocalizer` order
/// (upper-left, upper-right, lower-right, lower-left), for a small
/// synthetic footprint near the equator.
pub fn equatorial_footprint_corners() -> ((f64, f64), (f64, f64), (f64, f64), (f64, f64)) {
    ((0.3, -0.2), (0.3, 0.2), (-0.3, 0.2), (-0.3, -0.2))
}

/// A second footprint overlapping [`equatorial_footprint_corners`], offset
/// enough to be a distinct observation but not enough to miss it — the
/// structural stand-in for the spec's cross-instrument overlap scenario.
pub fn overlapping_footprint_corners() -> ((f64, f64), (f64, f64), (f64, f64), (f64, f64)) {
    ((0.4, -0.1), (0.4, 0.3), (-0.2, 0.3), (-0.2, -0.1))
}

/// A footprint far enough from [`equatorial_footprint_corners`] that no
/// bounding-box or triangle test should ever match it — the exclusion
/// fixture for bounding-box tests.
pub fn disjoint_footprint_corners() -> ((f64, f64), (f64, f64), (f64, f64), (f64, f64)) {
    ((40.0, 120.0), (40.0, 120.4), (39.6, 120.4), (39.6, 120.0))
}

/// A synthetic footprint straddling the north pole: two corners in the
/// eastern hemisphere, two in the western, all above 89.9 degrees latitude —
/// the threshold the segmenter uses to flag a grid row as pole-crossing.
pub fn polar_crossing_footprint_corners() -> ((f64, f64), (f64, f64), (f64, f64), (f64, f64)) {
    ((89.95, 10.0), (89.95, 170.0), (89.95, -170.0), (89.95, -10.0))
}

/// One triangular segment over [`equatorial_footprint_corners`]'s upper-left
/// triangle, tagged with `instrument`/`segment_id`/`observation_id`.
pub fn equatorial_segment(instrument: &str, segment_id: u64, observation_id: &str) -> Segment {
    let (ul, ur, _lr, ll) = equatorial_footprint_corners();
    Segment::try_new(
        segment_id,
        instrument,
        observation_id,
        [latlon_to_unit(ul.0, ul.1), latlon_to_unit(ur.0, ur.1), latlon_to_unit(ll.0, ll.1)],
    )
    .expect("fixture corners are non-degenerate")
}

/// Metadata records for a color-product family sharing one `observation_id`
/// but distinguished by `product_id` (spec's duplicate-id scenario: querying
/// by observation id returns every band).
pub fn color_product_family(instrument: &str, observation_id: &str) -> Vec<MetadataRecord> {
    ["RED", "BG", "IR"]
        .iter()
        .map(|band| {
            MetadataRecord::new(
                instrument,
                vec![
                    ("observation_id".to_string(), Value::Text(observation_id.to_string())),
                    (
                        "product_id".to_string(),
                        Value::Text(format!("{observation_id}_{band}")),
                    ),
                ],
            )
        })
        .collect()
}

/// A series of metadata records with `corner1_latitude` spanning both sides
/// of the open interval `(-0.5, 0.5)`, for exercising open-interval
/// predicate queries: two inside the interval, two on its boundary, two
/// outside.
pub fn corner_latitude_series(instrument: &str) -> Vec<(MetadataRecord, f64)> {
    [-1.0, -0.5, -0.1, 0.1, 0.5, 1.0]
        .iter()
        .enumerate()
        .map(|(i, &lat)| {
            let observation_id = format!("OBS{i}");
            let record = MetadataRecord::new(
                instrument,
                vec![
                    ("observation_id".to_string(), Value::Text(observation_id)),
                    ("corner1_latitude".to_string(), Value::Real(lat)),
                ],
            );
            (record, lat)
        })
        .collect()
}
