//! Persistent columnar store primitives
//!
//! Every column is an independently growable memory-mapped file; the mapping
//! is the array, so reopening a store deserializes nothing. Columns are
//! flushed individually, there is no cross-column transaction.

mod bitvec;
mod mm_vec;
mod paged;
mod vecvec;

pub use bitvec::{MmBitvec, NodeWayCounter};
pub use mm_vec::MmVec;
pub use paged::MmPagedVecVec;
pub use vecvec::MmVecVec;

/// How a store (or a single column) is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Attach an existing file, fail if absent.
    Read,
    /// Create or truncate.
    Write,
}
