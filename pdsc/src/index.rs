//! A per-instrument on-disk index directory: the metadata store, segment
//! store, and ball tree for one instrument, opened or built together (spec
//! §6's four-artifact layout).

use crate::balltree::{BallTree, DEFAULT_LEAF_CAPACITY};
use crate::query::QueryEngine;
use crate::segment::Segmenter;
use crate::store::{MetadataStore, SegmentStore};
use pdsc_types::{ColumnSchema, InstrumentConfig, MetadataRecord, PdscError, PdscResult};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

fn metadata_db_path(dir: &Path, instrument: &str) -> PathBuf {
    dir.join(format!("{instrument}_metadata.db"))
}

fn segments_db_path(dir: &Path, instrument: &str) -> PathBuf {
    dir.join(format!("{instrument}_segments.db"))
}

fn tree_path(dir: &Path, instrument: &str) -> PathBuf {
    dir.join(format!("{instrument}_segments.tree"))
}

/// One instrument's complete on-disk index: metadata table, segment table,
/// and the ball tree built over the segment table's centers.
#[derive(Debug)]
pub struct Index {
    instrument: String,
    body_radius_m: f64,
    metadata: MetadataStore,
    segments: SegmentStore,
    tree: BallTree,
}

impl Index {
    /// Opens an existing index directory, validating each artifact
    /// individually; any artifact's corruption surfaces as
    /// [`PdscError::IndexCorrupt`] for that instrument.
    pub fn open(dir: &Path, instrument: &str, schema: Vec<ColumnSchema>, body_radius_m: f64) -> PdscResult<Self> {
        let metadata = MetadataStore::open(
            path_str(&metadata_db_path(dir, instrument), instrument)?,
            instrument,
            schema,
        )?;
        let segments = SegmentStore::open(path_str(&segments_db_path(dir, instrument), instrument)?, instrument)?;
        let tree_file = tree_path(dir, instrument);
        let mut reader = File::open(&tree_file).map_err(|e| PdscError::IndexCorrupt {
            instrument: instrument.to_string(),
            operation: "open",
            reason: format!("opening {}: {e}", tree_file.display()),
        })?;
        let tree = BallTree::read_from(&mut reader).map_err(|e| PdscError::IndexCorrupt {
            instrument: instrument.to_string(),
            operation: "open",
            reason: e.to_string(),
        })?;

        Ok(Self {
            instrument: instrument.to_string(),
            body_radius_m,
            metadata,
            segments,
            tree,
        })
    }

    /// Creates a fresh, empty index directory for `instrument`. Segments and
    /// metadata are added afterward via [`Self::ingest_observation`]; the
    /// ball tree is built once, by [`Self::finish_build`], since it is
    /// bulk-loaded rather than incrementally maintained (spec §4.6).
    pub fn create(dir: &Path, instrument: &str, schema: Vec<ColumnSchema>, body_radius_m: f64) -> PdscResult<Self> {
        let metadata = MetadataStore::create(
            path_str(&metadata_db_path(dir, instrument), instrument)?,
            instrument,
            schema,
        )?;
        let segments = SegmentStore::create(path_str(&segments_db_path(dir, instrument), instrument)?, instrument)?;
        let tree = BallTree::build(Vec::new(), Vec::new(), &[], body_radius_m, DEFAULT_LEAF_CAPACITY);
        Ok(Self {
            instrument: instrument.to_string(),
            body_radius_m,
            metadata,
            segments,
            tree,
        })
    }

    /// Segments one observation's footprint and writes its metadata record
    /// and segments into the respective stores. Does not update the ball
    /// tree; call [`Self::finish_build`] once every observation has been
    /// ingested.
    pub fn ingest_observation(
        &self,
        segmenter: &Segmenter,
        localizer: &dyn crate::localize::Localizer,
        observation_id: &str,
        samples: u32,
        lines: u32,
        metadata: MetadataRecord,
    ) -> PdscResult<()> {
        let segments = segmenter.segment(&self.instrument, observation_id, localizer, samples, lines)?;
        self.metadata.insert(&metadata)?;
        for segment in &segments {
            self.segments.insert(observation_id, segment)?;
        }
        Ok(())
    }

    /// Rebuilds the ball tree from every segment currently in the segment
    /// store, and writes it to `<instrument>_segments.tree` in `dir`.
    pub fn finish_build(&mut self, dir: &Path) -> PdscResult<()> {
        let all = self.segments.all_segments()?;
        let mut centers = Vec::with_capacity(all.len());
        let mut ids = Vec::with_capacity(all.len());
        let mut radii = Vec::with_capacity(all.len());
        for (_, segment) in &all {
            centers.push(segment.center);
            ids.push(segment.segment_id);
            radii.push(segment.radius_rad);
        }
        self.tree = BallTree::build(centers, ids, &radii, self.body_radius_m, DEFAULT_LEAF_CAPACITY);

        let tree_file = tree_path(dir, &self.instrument);
        let mut writer = BufWriter::new(File::create(&tree_file).map_err(|e| PdscError::IndexCorrupt {
            instrument: self.instrument.clone(),
            operation: "finish_build",
            reason: format!("creating {}: {e}", tree_file.display()),
        })?);
        self.tree.write_to(&mut writer).map_err(|e| PdscError::IndexCorrupt {
            instrument: self.instrument.clone(),
            operation: "finish_build",
            reason: e.to_string(),
        })
    }

    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    pub fn segments(&self) -> &SegmentStore {
        &self.segments
    }

    pub fn tree(&self) -> &BallTree {
        &self.tree
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    /// A [`QueryEngine`] borrowing this index's tree and segment store.
    pub fn query_engine(&self) -> QueryEngine<'_> {
        QueryEngine::new(&self.instrument, &self.tree, &self.segments, self.body_radius_m)
    }
}

/// Builds an [`Index`] for every observation described by `config`, walking
/// the caller-supplied observation iterator rather than parsing PDS tables
/// itself (table parsing is an out-of-scope collaborator, spec §1).
pub struct IndexBuilder<'a> {
    config: &'a InstrumentConfig,
    segmenter: Segmenter,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(config: &'a InstrumentConfig) -> Self {
        let segmenter = Segmenter::new(config.segmentation.resolution_m, config.body.radius_m);
        Self { config, segmenter }
    }

    pub fn segmenter(&self) -> &Segmenter {
        &self.segmenter
    }

    /// Builds a fresh index directory at `dir`, invoking `observations` to
    /// obtain each observation's `(localizer, observation_id, samples,
    /// lines, metadata)` tuple. The closure, not this type, is responsible
    /// for turning raw PDS rows into those values.
    pub fn build<I>(&self, dir: &Path, schema: Vec<ColumnSchema>, observations: I) -> PdscResult<Index>
    where
        I: IntoIterator<Item = (Box<dyn crate::localize::Localizer + Send + Sync>, String, u32, u32, MetadataRecord)>,
    {
        let mut index = Index::create(dir, &self.config.instrument, schema, self.config.body.radius_m)?;
        for (localizer, observation_id, samples, lines, metadata) in observations {
            index.ingest_observation(&self.segmenter, localizer.as_ref(), &observation_id, samples, lines, metadata)?;
        }
        index.finish_build(dir)?;
        Ok(index)
    }
}

fn path_str<'a>(path: &'a Path, instrument: &str) -> PdscResult<&'a str> {
    path.to_str().ok_or_else(|| PdscError::IndexCorrupt {
        instrument: instrument.to_string(),
        operation: "open",
        reason: format!("non-UTF-8 path {}", path.display()),
    })
}
