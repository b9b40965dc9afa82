//! Typed tabular stores backing a persisted index directory (spec §4.4,
//! §4.5, §6).

mod metadata_store;
mod segment_store;

pub use metadata_store::MetadataStore;
pub use segment_store::SegmentStore;
