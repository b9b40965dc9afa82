//! The error taxonomy from which every fallible PDSC operation draws.
//!
//! Geometric primitives never fail; they return "outside"/"degenerate" as
//! plain values. Everything above them — stores, the ball tree, the query
//! engine, the client surface — reports one of the variants below, each
//! carrying an instrument tag, the operation that failed, and a stable
//! `code()` suitable for machine consumption (e.g. an HTTP error body).

use thiserror::Error;

/// All errors returned by this crate and by `pdsc`.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PdscError {
    /// No index directory is registered/open for the requested instrument.
    #[error("[{instrument}] unknown instrument (during {operation})")]
    UnknownInstrument {
        instrument: String,
        operation: &'static str,
    },

    /// The requested observation id was not found in the metadata store.
    #[error("[{instrument}] unknown observation '{observation_id}' (during {operation})")]
    UnknownObservation {
        instrument: String,
        observation_id: String,
        operation: &'static str,
    },

    /// A malformed query: unknown column, invalid operator/value type, or
    /// out-of-range latitude/longitude.
    #[error("[{instrument}] bad query (during {operation}): {reason}")]
    BadQuery {
        instrument: String,
        operation: &'static str,
        reason: String,
    },

    /// A persisted index artifact is missing, truncated, or fails a
    /// schema/checksum check. Fatal to the request that triggered it; does
    /// not poison the process.
    #[error("[{instrument}] index corrupt (during {operation}): {reason}")]
    IndexCorrupt {
        instrument: String,
        operation: &'static str,
        reason: String,
    },

    /// No localizer is registered for the instrument.
    #[error("[{instrument}] no localizer registered (during {operation})")]
    LocalizerUnavailable {
        instrument: String,
        operation: &'static str,
    },

    /// Ingest-only: an observation had zero valid segments after filtering
    /// out degenerate ones.
    #[error("[{instrument}] observation '{observation_id}' has no valid segments")]
    DegenerateSegment {
        instrument: String,
        observation_id: String,
    },

    /// A cooperative cancellation signal fired mid-query.
    #[error("[{instrument}] query cancelled (during {operation})")]
    Cancelled {
        instrument: String,
        operation: &'static str,
    },
}

impl PdscError {
    /// A stable, machine-readable error code, independent of the
    /// human-readable `Display` message.
    pub fn code(&self) -> &'static str {
        match self {
            PdscError::UnknownInstrument { .. } => "unknown_instrument",
            PdscError::UnknownObservation { .. } => "unknown_observation",
            PdscError::BadQuery { .. } => "bad_query",
            PdscError::IndexCorrupt { .. } => "index_corrupt",
            PdscError::LocalizerUnavailable { .. } => "localizer_unavailable",
            PdscError::DegenerateSegment { .. } => "degenerate_segment",
            PdscError::Cancelled { .. } => "cancelled",
        }
    }

    /// The instrument tag carried by every variant.
    pub fn instrument(&self) -> &str {
        match self {
            PdscError::UnknownInstrument { instrument, .. }
            | PdscError::UnknownObservation { instrument, .. }
            | PdscError::BadQuery { instrument, .. }
            | PdscError::IndexCorrupt { instrument, .. }
            | PdscError::LocalizerUnavailable { instrument, .. }
            | PdscError::DegenerateSegment { instrument, .. }
            | PdscError::Cancelled { instrument, .. } => instrument,
        }
    }
}

/// Crate-wide result alias.
pub type PdscResult<T> = std::result::Result<T, PdscError>;
