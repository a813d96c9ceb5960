//! CSR-style paired column: data + bucket-start index

use std::path::Path;

use bytemuck::Pod;

use crate::error::{Error, Result};
use crate::store::{MmVec, OpenMode};

/// An "array of arrays" over two memory-mapped columns: `data` holds every
/// bucket's elements back to back, `index` holds `n + 1` bucket starts.
/// Only the last bucket accepts appends; use [`crate::store::MmPagedVecVec`]
/// when elements arrive for arbitrary buckets.
pub struct MmVecVec<T: Pod> {
    pub data: MmVec<T>,
    pub index: MmVec<u64>,
}

impl<T: Pod> MmVecVec<T> {
    pub fn open<P: AsRef<Path>>(data_path: P, index_path: P, mode: OpenMode) -> Result<Self> {
        let data = MmVec::open(data_path, mode)?;
        let mut index = MmVec::open(index_path, mode)?;
        if mode == OpenMode::Write {
            index.push(0)?;
        } else if index.is_empty() {
            return Err(Error::corrupt(format!(
                "{}: bucket index is empty",
                index.path().display()
            )));
        }
        Ok(Self { data, index })
    }

    pub fn len(&self) -> usize {
        self.index.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Opens a new, initially empty bucket at the back.
    pub fn add_back(&mut self) -> Result<()> {
        self.index.push(self.data.len() as u64)
    }

    pub fn push_to_last(&mut self, value: T) -> Result<()> {
        self.data.push(value)?;
        let last = self.index.len() - 1;
        self.index.set(last, self.data.len() as u64)
    }

    pub fn extend_last(&mut self, values: &[T]) -> Result<()> {
        for &v in values {
            self.data.push(v)?;
        }
        let last = self.index.len() - 1;
        self.index.set(last, self.data.len() as u64)
    }

    pub fn bucket(&self, i: usize) -> &[T] {
        let index = self.index.as_slice();
        let start = index[i] as usize;
        let end = index[i + 1] as usize;
        &self.data.as_slice()[start..end]
    }

    pub fn bucket_len(&self, i: usize) -> usize {
        let index = self.index.as_slice();
        (index[i + 1] - index[i]) as usize
    }

    pub fn sync(&mut self) -> Result<()> {
        self.data.sync()?;
        self.index.sync()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open_write(dir: &Path) -> MmVecVec<u32> {
        MmVecVec::open(
            dir.join("data.bin"),
            dir.join("index.bin"),
            OpenMode::Write,
        )
        .unwrap()
    }

    #[test]
    fn test_buckets_append_order() {
        let dir = tempdir().unwrap();
        let mut v = open_write(dir.path());
        v.add_back().unwrap();
        v.push_to_last(1).unwrap();
        v.push_to_last(2).unwrap();
        v.add_back().unwrap();
        v.add_back().unwrap();
        v.push_to_last(9).unwrap();
        assert_eq!(v.len(), 3);
        assert_eq!(v.bucket(0), &[1, 2]);
        assert_eq!(v.bucket(1), &[] as &[u32]);
        assert_eq!(v.bucket(2), &[9]);
        assert_eq!(v.bucket_len(0), 2);
    }

    #[test]
    fn test_extend_last() {
        let dir = tempdir().unwrap();
        let mut v = open_write(dir.path());
        v.add_back().unwrap();
        v.extend_last(&[4, 5, 6]).unwrap();
        assert_eq!(v.bucket(0), &[4, 5, 6]);
    }

    #[test]
    fn test_sync_reopen() {
        let dir = tempdir().unwrap();
        {
            let mut v = open_write(dir.path());
            v.add_back().unwrap();
            v.extend_last(&[10, 20]).unwrap();
            v.add_back().unwrap();
            v.push_to_last(30).unwrap();
            v.sync().unwrap();
        }
        let r = MmVecVec::<u32>::open(
            dir.path().join("data.bin"),
            dir.path().join("index.bin"),
            OpenMode::Read,
        )
        .unwrap();
        assert_eq!(r.len(), 2);
        assert_eq!(r.bucket(0), &[10, 20]);
        assert_eq!(r.bucket(1), &[30]);
    }
}
