//! Memory-mapped bit-set and the two-tier node multiplicity counter

use std::path::Path;

use crate::error::Result;
use crate::store::{MmVec, OpenMode};

/// Compact bit-set over an [`MmVec<u64>`]. `set` grows the word array on
/// demand; `test` beyond the current capacity is simply `false`.
pub struct MmBitvec {
    words: MmVec<u64>,
}

impl MmBitvec {
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        Ok(Self {
            words: MmVec::open(path, mode)?,
        })
    }

    pub fn test(&self, idx: u64) -> bool {
        let w = (idx / 64) as usize;
        self.words
            .get(w)
            .is_some_and(|word| word & (1 << (idx % 64)) != 0)
    }

    pub fn set(&mut self, idx: u64) -> Result<()> {
        let w = (idx / 64) as usize;
        if w >= self.words.len() {
            self.words.resize(w + 1, 0)?;
        }
        let word = self.words.get(w).unwrap_or(0);
        self.words.set(w, word | (1 << (idx % 64)))
    }

    /// Number of addressable bits (a multiple of 64).
    pub fn capacity_bits(&self) -> u64 {
        self.words.len() as u64 * 64
    }

    pub fn count_ones(&self) -> u64 {
        self.words
            .as_slice()
            .iter()
            .map(|w| u64::from(w.count_ones()))
            .sum()
    }

    /// Calls `f` for every set bit position in strictly ascending order.
    pub fn for_each_set_bit(&self, mut f: impl FnMut(u64)) {
        for (wi, &word) in self.words.as_slice().iter().enumerate() {
            let mut w = word;
            while w != 0 {
                f(wi as u64 * 64 + u64::from(w.trailing_zeros()));
                w &= w - 1;
            }
        }
    }

    pub fn sync(&mut self) -> Result<()> {
        self.words.sync()
    }
}

/// Two-tier multiplicity tracker for external node ids: `once` records the
/// first sighting, `multi` records every id seen at least twice. Iterating
/// `multi` in ascending order is what makes dense graph-node id assignment
/// deterministic.
pub struct NodeWayCounter {
    once: MmBitvec,
    multi: MmBitvec,
}

impl NodeWayCounter {
    pub fn open<P: AsRef<Path>>(once_path: P, multi_path: P, mode: OpenMode) -> Result<Self> {
        Ok(Self {
            once: MmBitvec::open(once_path, mode)?,
            multi: MmBitvec::open(multi_path, mode)?,
        })
    }

    pub fn add(&mut self, id: u64) -> Result<()> {
        if self.once.test(id) {
            self.multi.set(id)
        } else {
            self.once.set(id)
        }
    }

    pub fn is_multi(&self, id: u64) -> bool {
        self.multi.test(id)
    }

    pub fn multi(&self) -> &MmBitvec {
        &self.multi
    }

    pub fn capacity_bits(&self) -> u64 {
        self.once.capacity_bits()
    }

    pub fn sync(&mut self) -> Result<()> {
        self.once.sync()?;
        self.multi.sync()
    }
}
