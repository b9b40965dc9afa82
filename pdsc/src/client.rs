//! The `Client` facade (spec §6) and the LRU cache of opened per-instrument
//! indexes it is built on (spec §5, "Shared resources").

use crate::cancel::CancellationToken;
use crate::index::Index;
use pdsc_types::{ColumnSchema, InstrumentConfig, MetadataRecord, PdscError, PdscResult, Predicate};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Default number of per-instrument index directories held open at once.
pub const DEFAULT_CACHE_CAPACITY: usize = 8;

/// An LRU cache of opened [`Index`] handles, keyed by their directory path.
///
/// Each slot is an `Arc<RwLock<Index>>` so callers can read-share a cached
/// index without holding the cache's own lock; a single `Mutex`-guarded
/// recency queue drives eviction (spec §5: a hand-rolled LRU rather than a
/// cache crate, consistent with a hand-rolled ball tree over an off-the-shelf
/// spatial index).
#[derive(Debug)]
pub struct IndexCache {
    capacity: usize,
    slots: std::sync::Mutex<HashMap<PathBuf, Arc<RwLock<Index>>>>,
    order: std::sync::Mutex<VecDeque<PathBuf>>,
}

impl IndexCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            slots: std::sync::Mutex::new(HashMap::new()),
            order: std::sync::Mutex::new(VecDeque::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the cached index for `dir`, opening and inserting it if
    /// absent, evicting the least-recently-touched slot first if the cache
    /// is full.
    pub fn get_or_open(
        &self,
        dir: &Path,
        instrument: &str,
        schema: Vec<ColumnSchema>,
        body_radius_m: f64,
    ) -> PdscResult<Arc<RwLock<Index>>> {
        let key = dir.to_path_buf();
        if let Some(existing) = self.slots.lock().unwrap().get(&key) {
            self.touch(&key);
            return Ok(Arc::clone(existing));
        }

        let index = Index::open(dir, instrument, schema, body_radius_m)?;
        let handle = Arc::new(RwLock::new(index));

        let mut slots = self.slots.lock().unwrap();
        if let Some(existing) = slots.get(&key) {
            // Another thread opened it first while we were blocked on I/O.
            return Ok(Arc::clone(existing));
        }
        if slots.len() >= self.capacity {
            self.evict_one(&mut slots);
        }
        slots.insert(key.clone(), Arc::clone(&handle));
        drop(slots);
        self.touch(&key);
        log::debug!("opened index cache slot for {instrument} at {}", dir.display());
        Ok(handle)
    }

    fn touch(&self, key: &Path) {
        let mut order = self.order.lock().unwrap();
        order.retain(|k| k != key);
        order.push_back(key.to_path_buf());
    }

    fn evict_one(&self, slots: &mut HashMap<PathBuf, Arc<RwLock<Index>>>) {
        let mut order = self.order.lock().unwrap();
        if let Some(victim) = order.pop_front() {
            slots.remove(&victim);
            log::debug!("evicted index cache slot {}", victim.display());
        }
    }
}

/// Derives a metadata store schema from an [`InstrumentConfig`]'s column
/// mapping, marking the `observation_id` field as indexed and as the
/// identifying column (spec §6's configuration-to-schema mapping).
pub fn schema_from_config(config: &InstrumentConfig) -> Vec<ColumnSchema> {
    config
        .columns
        .iter()
        .map(|c| ColumnSchema {
            name: c.field_name.clone(),
            column_type: c.column_type,
            indexed: c.field_name == "observation_id" || config.index_fields.contains(&c.field_name),
            is_observation_id: c.field_name == "observation_id",
        })
        .collect()
}

/// The host/port pair `Client`'s HTTP server collaborator would bind to,
/// read from `PDSC_SERVER_HOST`/`PDSC_SERVER_PORT` (spec §6). Reading these
/// values is in scope; the server itself is not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddr {
    pub host: String,
    pub port: u16,
}

impl ServerAddr {
    pub const DEFAULT_HOST: &'static str = "127.0.0.1";
    pub const DEFAULT_PORT: u16 = 8080;

    pub fn from_env() -> Self {
        let host = std::env::var("PDSC_SERVER_HOST").unwrap_or_else(|_| Self::DEFAULT_HOST.to_string());
        let port = std::env::var("PDSC_SERVER_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(Self::DEFAULT_PORT);
        Self { host, port }
    }
}

/// The top-level query surface (spec §6): `query_by_observation_id`,
/// `query`, `find_observations_of_latlon`, `find_overlapping_observations`,
/// each opening (or reusing) the relevant per-instrument index directories
/// under `database_dir`.
#[derive(Debug)]
pub struct Client {
    database_dir: PathBuf,
    cache: IndexCache,
}

impl Client {
    pub fn new(database_dir: impl Into<PathBuf>, cache_capacity: usize) -> Self {
        Self {
            database_dir: database_dir.into(),
            cache: IndexCache::new(cache_capacity),
        }
    }

    /// Builds a `Client` rooted at `PDSC_DATABASE_DIR` (spec §6).
    pub fn from_env() -> PdscResult<Self> {
        let dir = std::env::var("PDSC_DATABASE_DIR").map_err(|_| PdscError::BadQuery {
            instrument: "client".to_string(),
            operation: "from_env",
            reason: "PDSC_DATABASE_DIR is not set".to_string(),
        })?;
        Ok(Self::new(dir, DEFAULT_CACHE_CAPACITY))
    }

    fn index_dir(&self, instrument: &str) -> PathBuf {
        self.database_dir.join(instrument)
    }

    fn open(&self, config: &InstrumentConfig) -> PdscResult<Arc<RwLock<Index>>> {
        self.cache.get_or_open(
            &self.index_dir(&config.instrument),
            &config.instrument,
            schema_from_config(config),
            config.body.radius_m,
        )
    }

    pub fn query_by_observation_id(
        &self,
        config: &InstrumentConfig,
        observation_id: &str,
    ) -> PdscResult<Vec<MetadataRecord>> {
        let handle = self.open(config)?;
        let index = handle.read().unwrap();
        index.metadata().query_by_observation_id(observation_id)
    }

    pub fn query(&self, config: &InstrumentConfig, predicates: &[Predicate]) -> PdscResult<Vec<MetadataRecord>> {
        let handle = self.open(config)?;
        let index = handle.read().unwrap();
        index.metadata().query(predicates)
    }

    pub fn find_observations_of_latlon(&self, config: &InstrumentConfig, lat: f64, lon: f64) -> PdscResult<Vec<String>> {
        let handle = self.open(config)?;
        let index = handle.read().unwrap();
        index.query_engine().observations_of_latlon(lat, lon)
    }

    /// Observations of `instrument_b` overlapping `observation_id` in
    /// `instrument_a`'s index.
    pub fn find_overlapping_observations(
        &self,
        config_a: &InstrumentConfig,
        observation_id: &str,
        config_b: &InstrumentConfig,
        cancellation: Option<&CancellationToken>,
    ) -> PdscResult<Vec<String>> {
        let handle_a = self.open(config_a)?;
        let handle_b = self.open(config_b)?;
        let index_a = handle_a.read().unwrap();
        let index_b = handle_b.read().unwrap();
        index_a
            .query_engine()
            .overlap_query(observation_id, &index_b.query_engine(), cancellation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::localize::FourCornerLocalizer;
    use crate::segment::Segmenter;
    use pdsc_types::{Body, ColumnSpec, ColumnType, SegmentationConfig, Value};

    fn config(instrument: &str) -> InstrumentConfig {
        InstrumentConfig {
            instrument: instrument.to_string(),
            body: Body::MARS,
            columns: vec![ColumnSpec {
                pds_column: "PRODUCT_ID".to_string(),
                field_name: "observation_id".to_string(),
                column_type: ColumnType::Text,
            }],
            scale_factors: Default::default(),
            index_fields: Vec::new(),
            segmentation: SegmentationConfig {
                resolution_m: 50_000.0,
                localizer_kwargs: Default::default(),
            },
        }
    }

    fn build_one(dir: &Path, config: &InstrumentConfig) {
        let segmenter = Segmenter::new(config.segmentation.resolution_m, config.body.radius_m);
        let localizer = FourCornerLocalizer::new((1.0, -1.0), (1.0, 1.0), (-1.0, 1.0), (-1.0, -1.0), 100, 100);
        let record = MetadataRecord::new(
            &config.instrument,
            vec![("observation_id".to_string(), Value::Text("OBS1".to_string()))],
        );
        std::fs::create_dir_all(dir.join(&config.instrument)).unwrap();
        let mut index = crate::index::Index::create(
            &dir.join(&config.instrument),
            &config.instrument,
            schema_from_config(config),
            config.body.radius_m,
        )
        .unwrap();
        index
            .ingest_observation(&segmenter, &localizer, "OBS1", 100, 100, record)
            .unwrap();
        index.finish_build(&dir.join(&config.instrument)).unwrap();
    }

    #[test]
    fn client_finds_observation_by_point() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config("ctx");
        build_one(dir.path(), &cfg);

        let client = Client::new(dir.path(), DEFAULT_CACHE_CAPACITY);
        let hits = client.find_observations_of_latlon(&cfg, 0.0, 0.0).unwrap();
        assert_eq!(hits, vec!["OBS1".to_string()]);
    }

    #[test]
    fn cache_evicts_least_recently_used_slot_at_capacity() {
        let dir = tempfile::tempdir().unwrap();
        let cfg_a = config("ctx");
        let cfg_b = config("hirise_rdr");
        build_one(dir.path(), &cfg_a);
        build_one(dir.path(), &cfg_b);

        let client = Client::new(dir.path(), 1);
        client.find_observations_of_latlon(&cfg_a, 0.0, 0.0).unwrap();
        assert_eq!(client.cache.len(), 1);
        client.find_observations_of_latlon(&cfg_b, 0.0, 0.0).unwrap();
        assert_eq!(client.cache.len(), 1);
    }

    #[test]
    fn from_env_without_database_dir_is_bad_query() {
        std::env::remove_var("PDSC_DATABASE_DIR");
        let err = Client::from_env().unwrap_err();
        assert!(matches!(err, PdscError::BadQuery { .. }));
    }

    #[test]
    fn server_addr_from_env_defaults_when_unset() {
        std::env::remove_var("PDSC_SERVER_HOST");
        std::env::remove_var("PDSC_SERVER_PORT");
        let addr = ServerAddr::from_env();
        assert_eq!(addr.host, ServerAddr::DEFAULT_HOST);
        assert_eq!(addr.port, ServerAddr::DEFAULT_PORT);
    }
}
