//! The way store: every persistent column plus the derived routing graph

use std::path::{Path, PathBuf};
use std::str;

use crate::error::{Error, Result};
use crate::routing::Routing;
use crate::store::{MmBitvec, MmVec, MmVecVec, NodeWayCounter, OpenMode};
use crate::types::{
    NodeIdx, OsmNodeId, OsmWayId, Point, StringIdx, WayIdx, WayProperties, WayStringRef,
};

/// Persistent, memory-mapped way store.
///
/// Read mode attaches every column and reads the routing blob wholesale; its
/// absence or a framing failure is an error. Write mode creates or truncates
/// all columns, starts from an empty [`Routing`] and remembers the directory
/// for the final [`Ways::write_routing`].
pub struct Ways {
    dir: PathBuf,
    mode: OpenMode,
    pub routing: Routing,
    pub node_to_osm: MmVec<OsmNodeId>,
    pub way_osm_idx: MmVec<OsmWayId>,
    pub way_polylines: MmVecVec<Point>,
    pub way_osm_nodes: MmVecVec<OsmNodeId>,
    pub strings: MmVecVec<u8>,
    pub way_names: MmVec<StringIdx>,
    pub way_has_conditional_access_no: MmBitvec,
    pub way_conditional_access_no: MmVec<WayStringRef>,
    pub node_way_counter: NodeWayCounter,
}

impl Ways {
    pub fn open<P: AsRef<Path>>(dir: P, mode: OpenMode) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let routing = match mode {
            OpenMode::Read => Routing::read(&dir)?,
            OpenMode::Write => {
                std::fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
                Routing::default()
            }
        };
        Ok(Self {
            routing,
            node_to_osm: MmVec::open(dir.join("node_to_osm.bin"), mode)?,
            way_osm_idx: MmVec::open(dir.join("way_osm_idx.bin"), mode)?,
            way_polylines: MmVecVec::open(
                dir.join("way_polylines_data.bin"),
                dir.join("way_polylines_index.bin"),
                mode,
            )?,
            way_osm_nodes: MmVecVec::open(
                dir.join("way_osm_nodes_data.bin"),
                dir.join("way_osm_nodes_index.bin"),
                mode,
            )?,
            strings: MmVecVec::open(
                dir.join("strings_data.bin"),
                dir.join("strings_idx.bin"),
                mode,
            )?,
            way_names: MmVec::open(dir.join("way_names.bin"), mode)?,
            way_has_conditional_access_no: MmBitvec::open(
                dir.join("way_has_conditional_access_no.bin"),
                mode,
            )?,
            way_conditional_access_no: MmVec::open(
                dir.join("way_conditional_access_no.bin"),
                mode,
            )?,
            node_way_counter: NodeWayCounter::open(
                dir.join("node_way_counter_once.bin"),
                dir.join("node_way_counter_multi.bin"),
                mode,
            )?,
            dir,
            mode,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    pub fn n_ways(&self) -> usize {
        self.way_osm_idx.len()
    }

    pub fn n_nodes(&self) -> usize {
        self.node_to_osm.len()
    }

    /// Flushes every column file individually. There is no cross-column
    /// transaction; a crash leaves previously-synced columns intact.
    pub fn sync(&mut self) -> Result<()> {
        self.node_to_osm.sync()?;
        self.way_osm_idx.sync()?;
        self.way_polylines.sync()?;
        self.way_osm_nodes.sync()?;
        self.strings.sync()?;
        self.way_names.sync()?;
        self.way_has_conditional_access_no.sync()?;
        self.way_conditional_access_no.sync()?;
        self.node_way_counter.sync()
    }

    /// Single-shot framed write of the routing blob, the end of a write
    /// session.
    pub fn write_routing(&self) -> Result<()> {
        if self.mode != OpenMode::Write {
            return Err(Error::ReadOnly);
        }
        self.routing.write(&self.dir)
    }

    /// Resolves an external node id to its dense graph node id. Absence is
    /// store corruption: the caller only asks for nodes the multiplicity
    /// counter promised to exist.
    pub fn get_node_idx(&self, osm: OsmNodeId) -> Result<NodeIdx> {
        self.node_to_osm
            .as_slice()
            .binary_search(&osm)
            .map(|i| NodeIdx(i as u32))
            .map_err(|_| Error::corrupt(format!("graph node for OSM node {} not found", osm.0)))
    }

    /// Binary search over the (ascending) external way id column.
    pub fn find_way(&self, osm: OsmWayId) -> Option<WayIdx> {
        self.way_osm_idx
            .as_slice()
            .binary_search(&osm)
            .ok()
            .map(|i| WayIdx(i as u32))
    }

    /// A way's conditional access string. `Ok(None)` means no restriction; a
    /// presence bit without a matching association is store corruption.
    pub fn get_access_restriction(&self, way: WayIdx) -> Result<Option<&str>> {
        if !self.way_has_conditional_access_no.test(u64::from(way.0)) {
            return Ok(None);
        }
        let assoc = self.way_conditional_access_no.as_slice();
        let i = assoc
            .binary_search_by_key(&way, |r| r.way)
            .map_err(|_| {
                let osm = self.way_osm_idx.get(way.0 as usize).map_or(0, |w| w.0);
                Error::corrupt(format!(
                    "access restriction for way with access restriction not found, way={osm}"
                ))
            })?;
        let s = self.strings.bucket(assoc[i].string.0 as usize);
        str::from_utf8(s)
            .map(Some)
            .map_err(|e| Error::corrupt(format!("string {} is not UTF-8: {e}", assoc[i].string.0)))
    }

    /// Appends `s` to the shared string pool.
    pub fn add_string(&mut self, s: &str) -> Result<StringIdx> {
        self.strings.add_back()?;
        self.strings.extend_last(s.as_bytes())?;
        Ok(StringIdx(self.strings.len() as u32 - 1))
    }

    /// Associates a conditional access string with a way. Callers add ways in
    /// ascending order, which keeps the association column sorted.
    pub fn set_conditional_access_no(&mut self, way: WayIdx, string: StringIdx) -> Result<()> {
        self.way_has_conditional_access_no.set(u64::from(way.0))?;
        self.way_conditional_access_no
            .push(WayStringRef { way, string })
    }

    /// Load-side helper: appends one raw way (external id, name, external
    /// node sequence and matching points) and counts node multiplicity.
    /// Ways must arrive in ascending external id order.
    pub fn add_way(
        &mut self,
        osm: OsmWayId,
        name: &str,
        nodes: &[OsmNodeId],
        polyline: &[Point],
        properties: WayProperties,
    ) -> Result<WayIdx> {
        if nodes.len() != polyline.len() {
            return Err(Error::corrupt(format!(
                "way {}: {} node ids but {} points",
                osm.0,
                nodes.len(),
                polyline.len()
            )));
        }
        let way = WayIdx(self.n_ways() as u32);
        self.way_osm_idx.push(osm)?;
        self.way_osm_nodes.add_back()?;
        self.way_osm_nodes.extend_last(nodes)?;
        self.way_polylines.add_back()?;
        self.way_polylines.extend_last(polyline)?;
        let name = self.add_string(name)?;
        self.way_names.push(name)?;
        self.routing.way_properties.push(properties);
        for n in nodes {
            self.node_way_counter.add(n.0)?;
        }
        Ok(way)
    }
}
