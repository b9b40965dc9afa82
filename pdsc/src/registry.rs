//! The process-wide, frozen-after-init capability registry (spec §9:
//! "dynamic per-instrument plugins ... map to an explicit registration
//! interface keyed by instrument tag").
//!
//! Three capabilities make up the full instrument plugin surface:
//! `make_localizer`, `parse_table`, and `determine_from_label`. Only
//! `make_localizer` is implemented here — PDS table parsing and
//! label-based instrument determination are out-of-scope collaborators
//! (spec §1) — but their contracts are modeled as traits so a collaborator
//! can plug into the same registry shape.

use crate::localize::Registry as LocalizerRegistry;
use pdsc_types::MetadataRecord;

/// Out-of-scope collaborator contract: turns a raw PDS cumulative-index
/// table row into a [`MetadataRecord`]. Implemented by the ingest binary,
/// not by this crate.
pub trait TableParser: Send + Sync {
    fn parse_row(&self, raw_row: &[&str]) -> Option<MetadataRecord>;
}

/// Out-of-scope collaborator contract: identifies which instrument tag a
/// PDS label belongs to. Implemented by the ingest binary, not by this
/// crate.
pub trait LabelDeterminer: Send + Sync {
    fn determine(&self, label_text: &str) -> Option<String>;
}

/// The frozen, process-wide set of per-instrument capabilities. Only
/// `localizers` is populated and consumed by this crate; `table_parsers`
/// and `label_determiners` exist so the same registry value can be handed
/// to collaborators without a second registration mechanism.
#[derive(Default)]
pub struct CapabilityRegistry {
    pub localizers: LocalizerRegistry,
    table_parsers: std::collections::HashMap<String, std::sync::Arc<dyn TableParser>>,
    label_determiners: Vec<std::sync::Arc<dyn LabelDeterminer>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_table_parser(&mut self, instrument: impl Into<String>, parser: std::sync::Arc<dyn TableParser>) {
        self.table_parsers.insert(instrument.into(), parser);
    }

    pub fn register_label_determiner(&mut self, determiner: std::sync::Arc<dyn LabelDeterminer>) {
        self.label_determiners.push(determiner);
    }

    pub fn table_parser(&self, instrument: &str) -> Option<&std::sync::Arc<dyn TableParser>> {
        self.table_parsers.get(instrument)
    }

    pub fn determine_instrument(&self, label_text: &str) -> Option<String> {
        self.label_determiners
            .iter()
            .find_map(|d| d.determine(label_text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysCtx;
    impl LabelDeterminer for AlwaysCtx {
        fn determine(&self, _label_text: &str) -> Option<String> {
            Some("ctx".to_string())
        }
    }

    #[test]
    fn empty_registry_has_no_table_parser() {
        let registry = CapabilityRegistry::new();
        assert!(registry.table_parser("ctx").is_none());
    }

    #[test]
    fn label_determiner_is_consulted_in_registration_order() {
        let mut registry = CapabilityRegistry::new();
        registry.register_label_determiner(std::sync::Arc::new(AlwaysCtx));
        assert_eq!(registry.determine_instrument("anything"), Some("ctx".to_string()));
    }
}
