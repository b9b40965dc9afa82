//! Core data types for PDSC: observations, segments, metadata records, and
//! configuration.
//!
//! This crate mirrors `geo-types`' role relative to `geo` — it owns the
//! plain data and the invariant-checked constructors, and the small amount
//! of vector algebra ([`geometry`]) those constructors need. The algorithm
//! library (localizers, segmenter, stores, the ball tree, the query engine)
//! lives in the `pdsc` crate.

pub mod body;
pub mod config;
pub mod error;
pub mod geometry;
pub mod metadata;
pub mod observation;
pub mod segment;

pub use body::Body;
pub use config::{ColumnSpec, InstrumentConfig, LocalizerFlag, SegmentationConfig};
pub use error::{PdscError, PdscResult};
pub use metadata::{ColumnSchema, ColumnType, MetadataRecord, Operator, Predicate, Value};
pub use observation::Observation;
pub use segment::Segment;
