//! The metadata record model: typed columns, values, and query predicates.
//!
//! A [`MetadataRecord`] is a flat, typed tuple keyed on
//! `(instrument, observation_id)` (spec §3). Columns preserve insertion
//! order, matching the "results preserve insertion order (ingest order)"
//! guarantee in spec §4.4.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four column types a metadata store supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Text,
    Integer,
    Real,
    Timestamp,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ColumnType::Text => "text",
            ColumnType::Integer => "integer",
            ColumnType::Real => "real",
            ColumnType::Timestamp => "timestamp",
        };
        f.write_str(s)
    }
}

/// A typed column value.
///
/// Serializes per spec §9: text/integer/real map to native JSON
/// strings/numbers, and timestamps carry an explicit discriminator so a
/// decoder can round-trip them bit-identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Integer(i64),
    Real(f64),
    Timestamp(DatetimeValue),
}

/// The `{kind: "datetime", value: ISO-8601}` wire representation for
/// timestamp columns (spec §9).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatetimeValue {
    kind: DatetimeKind,
    value: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum DatetimeKind {
    #[serde(rename = "datetime")]
    Datetime,
}

impl Value {
    pub fn timestamp(dt: DateTime<Utc>) -> Self {
        Value::Timestamp(DatetimeValue {
            kind: DatetimeKind::Datetime,
            value: dt,
        })
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            Value::Text(_) => ColumnType::Text,
            Value::Integer(_) => ColumnType::Integer,
            Value::Real(_) => ColumnType::Real,
            Value::Timestamp(_) => ColumnType::Timestamp,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(r) => Some(*r),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(d) => Some(d.value),
            _ => None,
        }
    }
}

/// The column named `observation_id` plus its declared name/type/index
/// status, as described for the metadata store contract in spec §4.4/§6.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub column_type: ColumnType,
    pub indexed: bool,
    pub is_observation_id: bool,
}

/// One predicate operator, per spec §4.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
}

impl Operator {
    /// The SQL operator text used when binding this predicate as a
    /// parameter in a prepared statement. Never interpolated with the
    /// column name or value.
    pub fn as_sql(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Like => "LIKE",
        }
    }
}

/// A single `(column, operator, value)` predicate. Predicates combine with
/// AND (spec §4.4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub column: String,
    pub operator: Operator,
    pub value: Value,
}

impl Predicate {
    pub fn new(column: impl Into<String>, operator: Operator, value: Value) -> Self {
        Predicate {
            column: column.into(),
            operator,
            value,
        }
    }
}

/// A flat, typed metadata record for one observation product.
///
/// Multiple records may share an `observation_id` (spec §4.4: "the same id
/// may correspond to multiple products, e.g. HiRISE color and red").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub instrument: String,
    columns: Vec<(String, Value)>,
}

impl MetadataRecord {
    pub fn new(instrument: impl Into<String>, columns: Vec<(String, Value)>) -> Self {
        MetadataRecord {
            instrument: instrument.into(),
            columns,
        }
    }

    /// Iterate columns in insertion (ingest) order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(k, _)| k == column)
            .map(|(_, v)| v)
    }

    /// The value of whichever column is marked `is_observation_id` in the
    /// instrument's schema.
    pub fn observation_id(&self, schema: &[ColumnSchema]) -> Option<&str> {
        let col = schema.iter().find(|c| c.is_observation_id)?;
        self.get(&col.name)?.as_text()
    }
}
