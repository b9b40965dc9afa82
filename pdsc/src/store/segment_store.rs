//! The typed tabular segment store: `(segment_id, observation_id, three
//! lat/lon corner pairs)`, with center/radius recomputed on load rather
//! than persisted (spec §4.5, §6).

use pdsc_types::geometry::latlon_to_unit;
use pdsc_types::{PdscError, PdscResult, Segment};
use rusqlite::Connection;

const CREATE_TABLE: &str = "CREATE TABLE segments (
    segment_id INTEGER PRIMARY KEY,
    observation_id TEXT NOT NULL,
    lat1 REAL NOT NULL, lon1 REAL NOT NULL,
    lat2 REAL NOT NULL, lon2 REAL NOT NULL,
    lat3 REAL NOT NULL, lon3 REAL NOT NULL
)";

/// A `<instrument>_segments.db`-backed store (spec §6).
#[derive(Debug)]
pub struct SegmentStore {
    conn: Connection,
    instrument: String,
}

impl SegmentStore {
    pub fn create(path: &str, instrument: &str) -> PdscResult<Self> {
        let conn = open(path, instrument, "create")?;
        conn.execute(CREATE_TABLE, [])
            .map_err(|e| sql_err(instrument, "create", e))?;
        conn.execute(
            "CREATE INDEX idx_segments_observation_id ON segments (observation_id)",
            [],
        )
        .map_err(|e| sql_err(instrument, "create", e))?;
        Ok(Self {
            conn,
            instrument: instrument.to_string(),
        })
    }

    pub fn open(path: &str, instrument: &str) -> PdscResult<Self> {
        let conn = open(path, instrument, "open")?;
        let count: i64 = conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name='segments'",
                [],
                |row| row.get(0),
            )
            .map_err(|e| sql_err(instrument, "open", e))?;
        if count == 0 {
            return Err(PdscError::IndexCorrupt {
                instrument: instrument.to_string(),
                operation: "open",
                reason: "segments table is missing".to_string(),
            });
        }
        Ok(Self {
            conn,
            instrument: instrument.to_string(),
        })
    }

    pub fn insert(&self, observation_id: &str, segment: &Segment) -> PdscResult<()> {
        let [v1, v2, v3] = segment.vertices;
        let (lat1, lon1) = pdsc_types::geometry::unit_to_latlon(v1);
        let (lat2, lon2) = pdsc_types::geometry::unit_to_latlon(v2);
        let (lat3, lon3) = pdsc_types::geometry::unit_to_latlon(v3);
        self.conn
            .execute(
                "INSERT INTO segments
                    (segment_id, observation_id, lat1, lon1, lat2, lon2, lat3, lon3)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    segment.segment_id as i64,
                    observation_id,
                    lat1,
                    lon1,
                    lat2,
                    lon2,
                    lat3,
                    lon3
                ],
            )
            .map_err(|e| sql_err(&self.instrument, "insert", e))?;
        Ok(())
    }

    /// The segment with the given id, with center/radius recomputed from
    /// its stored corners.
    pub fn segment_by_id(&self, segment_id: u64) -> PdscResult<Segment> {
        let (observation_id, lat1, lon1, lat2, lon2, lat3, lon3): (
            String,
            f64,
            f64,
            f64,
            f64,
            f64,
            f64,
        ) = self
            .conn
            .query_row(
                "SELECT observation_id, lat1, lon1, lat2, lon2, lat3, lon3
                 FROM segments WHERE segment_id = ?1",
                rusqlite::params![segment_id as i64],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                        row.get(6)?,
                    ))
                },
            )
            .map_err(|e| sql_err(&self.instrument, "segment_by_id", e))?;

        let vertices = [
            latlon_to_unit(lat1, lon1),
            latlon_to_unit(lat2, lon2),
            latlon_to_unit(lat3, lon3),
        ];
        Segment::try_new(segment_id, &self.instrument, &observation_id, vertices).map_err(|_| PdscError::IndexCorrupt {
            instrument: self.instrument.clone(),
            operation: "segment_by_id",
            reason: format!("segment {segment_id} failed revalidation on load"),
        })
    }

    /// The observation id owning the given segment.
    pub fn observation_id_for_segment(&self, segment_id: u64) -> PdscResult<String> {
        self.conn
            .query_row(
                "SELECT observation_id FROM segments WHERE segment_id = ?1",
                rusqlite::params![segment_id as i64],
                |row| row.get(0),
            )
            .map_err(|e| sql_err(&self.instrument, "observation_id_for_segment", e))
    }

    /// Every segment belonging to `observation_id`, with center/radius
    /// recomputed from the stored corners (never persisted, spec §4.5).
    pub fn segments_for_observation(&self, observation_id: &str) -> PdscResult<Vec<Segment>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT segment_id, lat1, lon1, lat2, lon2, lat3, lon3
                 FROM segments WHERE observation_id = ?1",
            )
            .map_err(|e| sql_err(&self.instrument, "segments_for_observation", e))?;
        let rows = stmt
            .query_map(rusqlite::params![observation_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, f64>(5)?,
                    row.get::<_, f64>(6)?,
                ))
            })
            .map_err(|e| sql_err(&self.instrument, "segments_for_observation", e))?;

        let mut segments = Vec::new();
        for row in rows {
            let (segment_id, lat1, lon1, lat2, lon2, lat3, lon3) =
                row.map_err(|e| sql_err(&self.instrument, "segments_for_observation", e))?;
            let vertices = [
                latlon_to_unit(lat1, lon1),
                latlon_to_unit(lat2, lon2),
                latlon_to_unit(lat3, lon3),
            ];
            let segment =
                Segment::try_new(segment_id as u64, &self.instrument, observation_id, vertices).map_err(|_| {
                    PdscError::IndexCorrupt {
                        instrument: self.instrument.clone(),
                        operation: "segments_for_observation",
                        reason: format!("segment {segment_id} failed revalidation on load"),
                    }
                })?;
            segments.push(segment);
        }
        if segments.is_empty() {
            return Err(PdscError::UnknownObservation {
                instrument: self.instrument.clone(),
                observation_id: observation_id.to_string(),
                operation: "segments_for_observation",
            });
        }
        Ok(segments)
    }

    /// Iterates every `(observation_id, segment)` pair in the store, in
    /// insertion order, for ball-tree construction.
    pub fn all_segments(&self) -> PdscResult<Vec<(String, Segment)>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT segment_id, observation_id, lat1, lon1, lat2, lon2, lat3, lon3
                 FROM segments ORDER BY segment_id",
            )
            .map_err(|e| sql_err(&self.instrument, "all_segments", e))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, f64>(5)?,
                    row.get::<_, f64>(6)?,
                    row.get::<_, f64>(7)?,
                ))
            })
            .map_err(|e| sql_err(&self.instrument, "all_segments", e))?;

        let mut out = Vec::new();
        for row in rows {
            let (segment_id, observation_id, lat1, lon1, lat2, lon2, lat3, lon3) =
                row.map_err(|e| sql_err(&self.instrument, "all_segments", e))?;
            let vertices = [
                latlon_to_unit(lat1, lon1),
                latlon_to_unit(lat2, lon2),
                latlon_to_unit(lat3, lon3),
            ];
            let segment = Segment::try_new(segment_id as u64, &self.instrument, &observation_id, vertices)
                .map_err(|_| PdscError::IndexCorrupt {
                    instrument: self.instrument.clone(),
                    operation: "all_segments",
                    reason: format!("segment {segment_id} failed revalidation on load"),
                })?;
            out.push((observation_id, segment));
        }
        Ok(out)
    }
}

fn open(path: &str, instrument: &str, operation: &'static str) -> PdscResult<Connection> {
    Connection::open(path).map_err(|e| PdscError::IndexCorrupt {
        instrument: instrument.to_string(),
        operation,
        reason: e.to_string(),
    })
}

fn sql_err(instrument: &str, operation: &'static str, err: rusqlite::Error) -> PdscError {
    PdscError::IndexCorrupt {
        instrument: instrument.to_string(),
        operation,
        reason: err.to_string(),
    }
}
