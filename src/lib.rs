//! waygraph - persistent memory-mapped routing graph store and builder
//!
//! Converts raw road-network survey data (ways as sequences of geo-referenced
//! points keyed by external node ids) into a compact, memory-mapped routing
//! graph, then derives structural metadata on top of it: connected components,
//! per-junction turn restrictions and big-street propagation.
//!
//! The on-disk representation is the in-memory representation: every column is
//! a typed, growable memory-mapped file, and the derived graph is a single
//! framed blob (`routing.bin`) read and written wholesale.

pub mod error;
pub mod geo;
pub mod progress;
pub mod routing;
pub mod store;
pub mod types;
pub mod ways;

mod big_streets;
mod components;
mod connect;
mod restrictions;

pub use error::{Error, Result};
pub use progress::{LogProgress, NoopProgress, ProgressTracker};
pub use routing::Routing;
pub use store::OpenMode;
pub use types::{
    ComponentIdx, NodeIdx, OsmNodeId, OsmWayId, Point, ResolvedRestriction, Restriction,
    RestrictionKind, StringIdx, WayIdx, WayPos, WayProperties,
};
pub use ways::Ways;
