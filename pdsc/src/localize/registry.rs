use super::Localizer;
use pdsc_types::{MetadataRecord, PdscError, PdscResult};
use std::collections::HashMap;
use std::sync::Arc;

/// A constructor that builds a boxed localizer from an observation's
/// metadata record plus any instrument-specific flags (e.g. `nomap`,
/// `browse`), per spec §4.3's "Registration" paragraph.
pub type LocalizerFactory =
    Arc<dyn Fn(&MetadataRecord) -> PdscResult<Box<dyn Localizer + Send + Sync>> + Send + Sync>;

/// Maps instrument tags to their localizer constructor, the "dynamic
/// per-instrument plugins" table referenced in §9.
///
/// This is a plain lookup table, not a plugin-loading mechanism: the
/// collaborator that parses PDS labels into `InstrumentConfig`/constructor
/// registrations at startup is out of scope here.
#[derive(Default, Clone)]
pub struct Registry {
    factories: HashMap<String, LocalizerFactory>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, instrument: impl Into<String>, factory: LocalizerFactory) {
        self.factories.insert(instrument.into(), factory);
    }

    pub fn is_registered(&self, instrument: &str) -> bool {
        self.factories.contains_key(instrument)
    }

    /// Builds a localizer for `record` using the factory registered for
    /// `instrument`, or `LocalizerUnavailable` if none is registered.
    pub fn make_localizer(
        &self,
        instrument: &str,
        record: &MetadataRecord,
    ) -> PdscResult<Box<dyn Localizer + Send + Sync>> {
        let factory = self
            .factories
            .get(instrument)
            .ok_or_else(|| PdscError::LocalizerUnavailable {
                instrument: instrument.to_string(),
                operation: "make_localizer",
            })?;
        factory(record)
    }
}
