//! The typed tabular metadata store, keyed by `observation_id`, with
//! secondary indexes and parameter-bound predicate queries (spec §4.4).

use chrono::{DateTime, Utc};
use pdsc_types::{ColumnSchema, ColumnType, MetadataRecord, Operator, PdscError, PdscResult, Predicate, Value};
use rusqlite::{params_from_iter, types::Value as SqlValue, Connection, Row};

/// A `<instrument>_metadata.db`-backed store (spec §6). One table,
/// `metadata`, with one column per entry in `schema` plus secondary
/// indexes for every column marked `indexed`.
#[derive(Debug)]
pub struct MetadataStore {
    conn: Connection,
    instrument: String,
    schema: Vec<ColumnSchema>,
}

impl MetadataStore {
    /// Creates a new, empty store backed by `path`, issuing `CREATE TABLE`
    /// and `CREATE INDEX` statements for `schema`. Column and index names
    /// come only from the caller-supplied schema, never from untrusted
    /// input, so they are safe to interpolate into DDL.
    pub fn create(path: &str, instrument: &str, schema: Vec<ColumnSchema>) -> PdscResult<Self> {
        let conn = open(path, instrument, "create")?;
        let columns_sql: Vec<String> = schema
            .iter()
            .map(|c| format!("\"{}\" {}", c.name, sql_type(c.column_type)))
            .collect();
        let create_table = format!("CREATE TABLE metadata ({})", columns_sql.join(", "));
        conn.execute(&create_table, [])
            .map_err(|e| sql_err(instrument, "create", e))?;

        for col in schema.iter().filter(|c| c.indexed) {
            let stmt = format!(
                "CREATE INDEX \"idx_{name}\" ON metadata (\"{name}\")",
                name = col.name
            );
            conn.execute(&stmt, [])
                .map_err(|e| sql_err(instrument, "create", e))?;
        }

        Ok(Self {
            conn,
            instrument: instrument.to_string(),
            schema,
        })
    }

    /// Opens an existing store, verifying its column set matches `schema`
    /// (an `IndexCorrupt` mismatch otherwise, per spec §4.7's open-time
    /// schema check).
    pub fn open(path: &str, instrument: &str, schema: Vec<ColumnSchema>) -> PdscResult<Self> {
        let conn = open(path, instrument, "open")?;
        let mut stmt = conn
            .prepare("PRAGMA table_info(metadata)")
            .map_err(|e| sql_err(instrument, "open", e))?;
        let existing: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .map_err(|e| sql_err(instrument, "open", e))?
            .collect::<Result<_, _>>()
            .map_err(|e| sql_err(instrument, "open", e))?;
        let expected: Vec<&str> = schema.iter().map(|c| c.name.as_str()).collect();
        if existing.iter().map(String::as_str).ne(expected) {
            return Err(PdscError::IndexCorrupt {
                instrument: instrument.to_string(),
                operation: "open",
                reason: format!(
                    "metadata schema mismatch: found columns {existing:?}, expected {:?}",
                    schema.iter().map(|c| &c.name).collect::<Vec<_>>()
                ),
            });
        }
        drop(stmt);
        Ok(Self {
            conn,
            instrument: instrument.to_string(),
            schema,
        })
    }

    pub fn columns(&self) -> &[ColumnSchema] {
        &self.schema
    }

    pub fn insert(&self, record: &MetadataRecord) -> PdscResult<()> {
        let names: Vec<&str> = record.columns().map(|(k, _)| k).collect();
        let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO metadata ({}) VALUES ({})",
            names
                .iter()
                .map(|n| format!("\"{n}\""))
                .collect::<Vec<_>>()
                .join(", "),
            placeholders.join(", ")
        );
        let values: Vec<SqlValue> = record.columns().map(|(_, v)| to_sql(v)).collect();
        self.conn
            .execute(&sql, params_from_iter(values))
            .map_err(|e| sql_err(&self.instrument, "insert", e))?;
        Ok(())
    }

    /// Looks up every record with the given `observation_id` (spec §4.4:
    /// "the same id may correspond to multiple products").
    pub fn query_by_observation_id(&self, observation_id: &str) -> PdscResult<Vec<MetadataRecord>> {
        let id_column = self
            .schema
            .iter()
            .find(|c| c.is_observation_id)
            .ok_or_else(|| PdscError::BadQuery {
                instrument: self.instrument.clone(),
                operation: "query_by_observation_id",
                reason: "no column is marked as the observation id".to_string(),
            })?;
        let records = self.query(&[Predicate::new(
            id_column.name.clone(),
            Operator::Eq,
            Value::Text(observation_id.to_string()),
        )])?;
        if records.is_empty() {
            return Err(PdscError::UnknownObservation {
                instrument: self.instrument.clone(),
                observation_id: observation_id.to_string(),
                operation: "query_by_observation_id",
            });
        }
        Ok(records)
    }

    /// Runs an AND-combined list of predicates, with every column name
    /// validated against `schema` and every value bound as a parameter
    /// (spec §4.4: never interpolated).
    pub fn query(&self, predicates: &[Predicate]) -> PdscResult<Vec<MetadataRecord>> {
        for p in predicates {
            if !self.schema.iter().any(|c| c.name == p.column) {
                return Err(PdscError::BadQuery {
                    instrument: self.instrument.clone(),
                    operation: "query",
                    reason: format!("unknown column '{}'", p.column),
                });
            }
        }

        let mut sql = String::from("SELECT * FROM metadata");
        let mut values = Vec::with_capacity(predicates.len());
        if !predicates.is_empty() {
            sql.push_str(" WHERE ");
            let clauses: Vec<String> = predicates
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    values.push(to_sql(&p.value));
                    format!("\"{}\" {} ?{}", p.column, p.operator.as_sql(), i + 1)
                })
                .collect();
            sql.push_str(&clauses.join(" AND "));
        }

        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| sql_err(&self.instrument, "query", e))?;
        let schema = self.schema.clone();
        let instrument = self.instrument.clone();
        let rows = stmt
            .query_map(params_from_iter(values), move |row| {
                row_to_record(row, &schema, &instrument)
            })
            .map_err(|e| sql_err(&self.instrument, "query", e))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(|e| sql_err(&self.instrument, "query", e))?);
        }
        Ok(records)
    }
}

fn row_to_record(
    row: &Row<'_>,
    schema: &[ColumnSchema],
    instrument: &str,
) -> rusqlite::Result<MetadataRecord> {
    let mut columns = Vec::with_capacity(schema.len());
    for (i, col) in schema.iter().enumerate() {
        let value = match col.column_type {
            ColumnType::Text => Value::Text(row.get::<_, String>(i)?),
            ColumnType::Integer => Value::Integer(row.get::<_, i64>(i)?),
            ColumnType::Real => Value::Real(row.get::<_, f64>(i)?),
            ColumnType::Timestamp => {
                let raw: String = row.get(i)?;
                let dt: DateTime<Utc> = raw
                    .parse()
                    .map_err(|_| rusqlite::Error::InvalidColumnType(
                        i,
                        col.name.clone(),
                        rusqlite::types::Type::Text,
                    ))?;
                Value::timestamp(dt)
            }
        };
        columns.push((col.name.clone(), value));
    }
    Ok(MetadataRecord::new(instrument, columns))
}

fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Text(s) => SqlValue::Text(s.clone()),
        Value::Integer(i) => SqlValue::Integer(*i),
        Value::Real(r) => SqlValue::Real(*r),
        Value::Timestamp(_) => SqlValue::Text(
            value
                .as_timestamp()
                .expect("Timestamp variant always has a timestamp value")
                .to_rfc3339(),
        ),
    }
}

fn sql_type(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::Text | ColumnType::Timestamp => "TEXT",
        ColumnType::Integer => "INTEGER",
        ColumnType::Real => "REAL",
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
