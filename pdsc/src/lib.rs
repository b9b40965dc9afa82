//! PDSC: a spatial index and query engine over planetary remote-sensing
//! observation footprints.
//!
//! The plain data types and invariant-checked constructors live in
//! `pdsc-types`; this crate is the algorithm library built on top of them —
//! localizers, the segmenter, the typed stores, the ball tree, the query
//! engine, and the per-instrument index and client that compose them.

pub mod balltree;
pub mod cancel;
pub mod client;
pub mod geometry;
pub mod index;
pub mod localize;
pub mod query;
pub mod registry;
pub mod segment;
pub mod store;

pub use cancel::CancellationToken;
pub use index::{Index, IndexBuilder};
pub use query::QueryEngine;
pub use segment::{PoleHandling, Segmenter};
