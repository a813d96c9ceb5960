//! Derived routing graph, persisted wholesale as one framed blob
//!
//! `routing.bin` layout (little-endian):
//!
//! Header (8 bytes):
//!   magic:    u32 = 0x57475242  // "WGRB"
//!   version:  u16 = 1
//!   reserved: u16 = 0
//!
//! Body: bincode-encoded [`Routing`]
//!
//! Footer (8 bytes):
//!   file_crc64: u64  // CRC-64-ISO over header + body

use std::collections::BTreeMap;
use std::fs;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crc::{Crc, CRC_64_GO_ISO};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{ComponentIdx, NodeIdx, Restriction, WayIdx, WayPos, WayProperties};

const MAGIC: u32 = 0x57475242; // "WGRB"
const VERSION: u16 = 1;
const HEADER_SIZE: usize = 8;
const FOOTER_SIZE: usize = 8;

pub const CRC64: Crc<u64> = Crc::<u64>::new(&CRC_64_GO_ISO);

pub const ROUTING_FILE: &str = "routing.bin";

/// In-memory CSR twin of [`crate::store::MmVecVec`]: bucket starts + data,
/// serialized as part of the routing blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VecVec<T> {
    starts: Vec<u64>,
    data: Vec<T>,
}

impl<T> Default for VecVec<T> {
    fn default() -> Self {
        Self {
            starts: vec![0],
            data: vec![],
        }
    }
}

impl<T> VecVec<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.starts.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Opens a new, initially empty bucket at the back.
    pub fn add_back(&mut self) {
        self.starts.push(self.data.len() as u64);
    }

    pub fn push_to_last(&mut self, value: T) {
        self.data.push(value);
        let last = self.starts.len() - 1;
        self.starts[last] = self.data.len() as u64;
    }

    /// Appends a whole bucket.
    pub fn push_bucket(&mut self, values: impl IntoIterator<Item = T>) {
        self.data.extend(values);
        self.starts.push(self.data.len() as u64);
    }

    pub fn bucket(&self, i: usize) -> &[T] {
        let start = self.starts[i] as usize;
        let end = self.starts[i + 1] as usize;
        &self.data[start..end]
    }
}

/// Plain in-memory bit-set, serialized as part of the routing blob.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Bitvec {
    words: Vec<u64>,
}

impl Bitvec {
    pub fn test(&self, idx: u64) -> bool {
        let w = (idx / 64) as usize;
        self.words
            .get(w)
            .is_some_and(|word| word & (1 << (idx % 64)) != 0)
    }

    pub fn set(&mut self, idx: u64) {
        let w = (idx / 64) as usize;
        if w >= self.words.len() {
            self.words.resize(w + 1, 0);
        }
        self.words[w] |= 1 << (idx % 64);
    }

    /// Reserves capacity for `n_bits` addressable bits.
    pub fn resize(&mut self, n_bits: usize) {
        let words = n_bits.div_ceil(64);
        if words > self.words.len() {
            self.words.resize(words, 0);
        }
    }
}

/// The derived routing graph. Written once at the end of a build session,
/// read wholesale when a store is attached read-only.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Routing {
    /// Per way, the ordered graph-node sequence.
    pub way_nodes: VecVec<NodeIdx>,
    /// Per way, the rounded distance in meters between consecutive graph
    /// nodes; one entry fewer than `way_nodes`.
    pub way_node_dist: VecVec<u16>,
    /// Per graph node, the ways touching it.
    pub node_ways: VecVec<WayIdx>,
    /// Per graph node, the node's position inside each touching way,
    /// parallel to `node_ways`.
    pub node_in_way_idx: VecVec<u16>,
    /// Component id per way; `None` until the labeler has run.
    pub way_component: Vec<Option<ComponentIdx>>,
    /// Forbidden transition pairs per junction. Sparse: a node absent from
    /// the map is unrestricted.
    pub node_restrictions: BTreeMap<NodeIdx, Vec<Restriction>>,
    /// Quick membership test for restricted junctions.
    pub node_is_restricted: Bitvec,
    pub way_properties: Vec<WayProperties>,
}

impl Routing {
    pub fn read(dir: &Path) -> Result<Self> {
        let path = dir.join(ROUTING_FILE);
        let bytes = fs::read(&path).map_err(|e| Error::io(&path, e))?;
        if bytes.len() < HEADER_SIZE + FOOTER_SIZE {
            return Err(Error::corrupt(format!(
                "{}: file too short ({} bytes)",
                path.display(),
                bytes.len()
            )));
        }

        let magic = read_u32(&bytes[0..4]);
        if magic != MAGIC {
            return Err(Error::corrupt(format!(
                "{}: bad magic 0x{magic:08x}, expected 0x{MAGIC:08x}",
                path.display()
            )));
        }
        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != VERSION {
            return Err(Error::corrupt(format!(
                "{}: unsupported version {version}",
                path.display()
            )));
        }

        let crc_at = bytes.len() - FOOTER_SIZE;
        let stored_crc = read_u64(&bytes[crc_at..]);
        let computed_crc = CRC64.checksum(&bytes[..crc_at]);
        if stored_crc != computed_crc {
            return Err(Error::corrupt(format!(
                "{}: CRC mismatch, stored {stored_crc:016x}, computed {computed_crc:016x}",
                path.display()
            )));
        }

        bincode::deserialize(&bytes[HEADER_SIZE..crc_at])
            .map_err(|e| Error::corrupt(format!("{}: {e}", path.display())))
    }

    pub fn write(&self, dir: &Path) -> Result<()> {
        let path = dir.join(ROUTING_FILE);
        let payload = bincode::serialize(self)
            .map_err(|e| Error::corrupt(format!("{}: {e}", path.display())))?;

        let mut header = [0u8; HEADER_SIZE];
        header[0..4].copy_from_slice(&MAGIC.to_le_bytes());
        header[4..6].copy_from_slice(&VERSION.to_le_bytes());

        let mut digest = CRC64.digest();
        digest.update(&header);
        digest.update(&payload);
        let file_crc = digest.finalize();

        let mut file = File::create(&path).map_err(|e| Error::io(&path, e))?;
        file.write_all(&header).map_err(|e| Error::io(&path, e))?;
        file.write_all(&payload).map_err(|e| Error::io(&path, e))?;
        file.write_all(&file_crc.to_le_bytes())
            .map_err(|e| Error::io(&path, e))?;
        file.sync_all().map_err(|e| Error::io(&path, e))?;
        Ok(())
    }

    pub fn n_ways(&self) -> usize {
        self.way_nodes.len()
    }

    pub fn n_nodes(&self) -> usize {
        self.node_ways.len()
    }

    pub fn way_component(&self, way: WayIdx) -> Option<ComponentIdx> {
        self.way_component.get(way.0 as usize).copied().flatten()
    }

    /// Forbidden transition pairs at `node`; empty for unrestricted nodes.
    pub fn node_restrictions(&self, node: NodeIdx) -> &[Restriction] {
        self.node_restrictions
            .get(&node)
            .map_or(&[], Vec::as_slice)
    }

    pub fn is_restricted(&self, node: NodeIdx, from: WayPos, to: WayPos) -> bool {
        self.node_is_restricted.test(u64::from(node.0))
            && self
                .node_restrictions(node)
                .contains(&Restriction { from, to })
    }

    /// Rank of `way` among the ways touching `node`; 0 if not found.
    pub fn get_way_pos(&self, node: NodeIdx, way: WayIdx) -> WayPos {
        way_pos(self.node_ways.bucket(node.0 as usize), way)
    }
}

fn read_u32(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

fn read_u64(b: &[u8]) -> u64 {
    u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
}

/// Rank scan over a node's touching-way list; 0 if not found.
pub(crate) fn way_pos(ways_at_node: &[WayIdx], way: WayIdx) -> WayPos {
    ways_at_node
        .iter()
        .position(|&w| w == way)
        .map_or(0, |i| i as WayPos)
}
