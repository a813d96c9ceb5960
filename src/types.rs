//! Strongly-typed ids and plain-old-data records shared across the store

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// External node id from the source data. Opaque, not dense, not contiguous.
#[repr(transparent)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
pub struct OsmNodeId(pub u64);

/// External way id from the source data.
#[repr(transparent)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
pub struct OsmWayId(pub u64);

/// Dense 0-based graph node id. A graph node exists iff its external node is
/// referenced by at least two ways.
#[repr(transparent)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
pub struct NodeIdx(pub u32);

/// Dense 0-based way id.
#[repr(transparent)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
pub struct WayIdx(pub u32);

/// Dense component id assigned by the flood-fill labeler.
#[repr(transparent)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
pub struct ComponentIdx(pub u32);

/// Index into the shared string pool.
#[repr(transparent)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
pub struct StringIdx(pub u32);

/// A way's rank among the ways touching a given node.
pub type WayPos = u8;

/// Geographic point, stored directly in the polyline column.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lon: f64,
}

impl Point {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Forbidden transition at a junction, expressed in node-local way slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restriction {
    pub from: WayPos,
    pub to: WayPos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestrictionKind {
    /// The from->to transition through the via node is forbidden.
    No,
    /// No transition through the via node is allowed except from->to.
    Only,
}

/// Externally-resolved turn restriction record, input to
/// [`crate::Ways::add_restrictions`].
#[derive(Debug, Clone, Copy)]
pub struct ResolvedRestriction {
    pub kind: RestrictionKind,
    pub via: NodeIdx,
    pub from: WayIdx,
    pub to: WayIdx,
}

/// Tag-derived per-way flags. `is_big_street` starts from the loader's value
/// and is only ever strengthened by the propagation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WayProperties {
    pub is_big_street: bool,
}

/// Sorted association of a way to its conditional access string.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct WayStringRef {
    pub way: WayIdx,
    pub string: StringIdx,
}
