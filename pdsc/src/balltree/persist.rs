//! Binary `.tree` file persistence: a fixed-layout header followed by
//! pre-order node records (spec §6), read and written with `byteorder`
//! rather than a self-describing `serde` format since the layout is a
//! fixed sequence of C-like structs.

use super::{BallTree, Node, NodeKind};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Cursor, Read, Write};
use thiserror::Error;

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum TreeWriteError {
    #[error("writing tree: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum TreeReadError {
    #[error("reading tree: {0}")]
    Io(#[from] io::Error),
    #[error("unsupported tree format version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("tree file truncated or corrupt: {0}")]
    Truncated(String),
}

impl BallTree {
    /// Writes the header (`version`, `n`, `r_max_rad`, `body_radius_m`,
    /// `leaf_capacity`) followed by every node record in pre-order.
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<(), TreeWriteError> {
        w.write_u32::<LittleEndian>(FORMAT_VERSION)?;
        w.write_u64::<LittleEndian>(self.segment_ids.len() as u64)?;
        w.write_f64::<LittleEndian>(self.r_max_rad)?;
        w.write_f64::<LittleEndian>(self.body_radius_m)?;
        w.write_u32::<LittleEndian>(self.leaf_capacity)?;

        for node in &self.nodes {
            w.write_f64::<LittleEndian>(node.center[0])?;
            w.write_f64::<LittleEndian>(node.center[1])?;
            w.write_f64::<LittleEndian>(node.center[2])?;
            w.write_f64::<LittleEndian>(node.radius_rad)?;
            match node.kind {
                NodeKind::Leaf => {
                    let ids = &self.segment_ids[node.start..node.end];
                    w.write_u8(1)?;
                    w.write_u32::<LittleEndian>(ids.len() as u32)?;
                    for &id in ids {
                        w.write_u64::<LittleEndian>(id)?;
                    }
                }
                NodeKind::Branch { left, right } => {
                    w.write_u8(0)?;
                    w.write_u32::<LittleEndian>(2)?;
                    w.write_u64::<LittleEndian>(left as u64)?;
                    w.write_u64::<LittleEndian>(right as u64)?;
                }
            }
        }
        Ok(())
    }

    /// Reads a tree previously written by [`BallTree::write_to`].
    pub fn read_from<R: Read>(r: &mut R) -> Result<Self, TreeReadError> {
        let version = r.read_u32::<LittleEndian>()?;
        if version != FORMAT_VERSION {
            return Err(TreeReadError::UnsupportedVersion {
                found: version,
                expected: FORMAT_VERSION,
            });
        }
        let n = r.read_u64::<LittleEndian>()? as usize;
        let r_max_rad = r.read_f64::<LittleEndian>()?;
        let body_radius_m = r.read_f64::<LittleEndian>()?;
        let leaf_capacity = r.read_u32::<LittleEndian>()?;

        let mut body = Vec::new();
        r.read_to_end(&mut body)?;
        let mut cursor = Cursor::new(body);

        let mut nodes = Vec::new();
        let mut segment_ids = Vec::new();
        while (cursor.position() as usize) < cursor.get_ref().len() {
            let cx = cursor.read_f64::<LittleEndian>()?;
            let cy = cursor.read_f64::<LittleEndian>()?;
            let cz = cursor.read_f64::<LittleEndian>()?;
            let radius_rad = cursor.read_f64::<LittleEndian>()?;
            let is_leaf = cursor.read_u8()?;
            let n_children = cursor.read_u32::<LittleEndian>()?;

            if is_leaf == 1 {
                let start = segment_ids.len();
                for _ in 0..n_children {
                    segment_ids.push(cursor.read_u64::<LittleEndian>()?);
                }
                let end = segment_ids.len();
                nodes.push(Node {
                    center: [cx, cy, cz],
                    radius_rad,
                    start,
                    end,
                    kind: NodeKind::Leaf,
                });
            } else {
                if n_children != 2 {
                    return Err(TreeReadError::Truncated(format!(
                        "branch node with n_children={n_children}, expected 2"
                    )));
                }
                let left = cursor.read_u64::<LittleEndian>()? as usize;
                let right = cursor.read_u64::<LittleEndian>()? as usize;
                nodes.push(Node {
                    center: [cx, cy, cz],
                    radius_rad,
                    start: 0,
                    end: 0,
                    kind: NodeKind::Branch { left, right },
                });
            }
        }

        if segment_ids.len() != n {
            return Err(TreeReadError::Truncated(format!(
                "header declared {n} segments, found {}",
                segment_ids.len()
            )));
        }

        Ok(BallTree {
            nodes,
            segment_ids,
            body_radius_m,
            r_max_rad,
            leaf_capacity,
        })
    }
}
