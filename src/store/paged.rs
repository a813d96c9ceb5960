//! Paged bucket structure: append to any bucket without moving the others

use std::fs;
use std::path::Path;

use bytemuck::{Pod, Zeroable};

use crate::error::{Error, Result};
use crate::store::{MmVec, OpenMode};

const FIRST_PAGE_CAP: u16 = 4;

/// Per-bucket page record: where the bucket's storage lives in `data` and how
/// much of it is used.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct PageRec {
    start: u32,
    len: u16,
    cap: u16,
}

/// A bucket structure where every bucket is independently growable. When a
/// bucket outgrows its page, only that bucket's contents relocate to a fresh,
/// doubled page at the end of `data`; all other buckets stay put. Abandoned
/// pages are never reclaimed, which is fine for the write-once staging role
/// this structure plays during graph construction.
pub struct MmPagedVecVec<T: Pod> {
    pages: MmVec<PageRec>,
    data: MmVec<T>,
}

impl<T: Pod> MmPagedVecVec<T> {
    pub fn create<P: AsRef<Path>>(data_path: P, pages_path: P) -> Result<Self> {
        Ok(Self {
            pages: MmVec::open(pages_path, OpenMode::Write)?,
            data: MmVec::open(data_path, OpenMode::Write)?,
        })
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Grows to `n` buckets, the new ones empty. Never shrinks.
    pub fn resize(&mut self, n: usize) -> Result<()> {
        if n > self.pages.len() {
            self.pages.resize(n, PageRec::zeroed())?;
        }
        Ok(())
    }

    pub fn push(&mut self, bucket: usize, value: T) -> Result<()> {
        let mut page = self.pages.get(bucket).ok_or_else(|| {
            Error::corrupt(format!(
                "{}: bucket {bucket} out of range (n = {})",
                self.pages.path().display(),
                self.pages.len()
            ))
        })?;
        if page.len == page.cap {
            page = self.grow_page(page)?;
        }
        self.data
            .set(page.start as usize + page.len as usize, value)?;
        page.len += 1;
        self.pages.set(bucket, page)
    }

    pub fn bucket(&self, bucket: usize) -> &[T] {
        let page = self.pages.as_slice()[bucket];
        &self.data.as_slice()[page.start as usize..page.start as usize + page.len as usize]
    }

    pub fn bucket_len(&self, bucket: usize) -> usize {
        self.pages.as_slice()[bucket].len as usize
    }

    /// Drops the mappings and deletes both backing files. Removal failures
    /// are ignored, the files are build-internal staging state.
    pub fn remove_files(self) {
        let data_path = self.data.path().to_path_buf();
        let pages_path = self.pages.path().to_path_buf();
        drop(self);
        let _ = fs::remove_file(data_path);
        let _ = fs::remove_file(pages_path);
    }

    fn grow_page(&mut self, page: PageRec) -> Result<PageRec> {
        if page.cap == u16::MAX {
            return Err(Error::corrupt(format!(
                "{}: bucket exceeds the maximum page size",
                self.pages.path().display()
            )));
        }
        let new_cap = if page.cap == 0 {
            FIRST_PAGE_CAP
        } else {
            u32::from(page.cap).saturating_mul(2).min(u32::from(u16::MAX)) as u16
        };
        let new_start = self.data.len();
        self.data
            .resize(new_start + new_cap as usize, T::zeroed())?;
        for k in 0..page.len as usize {
            let v = self.data.as_slice()[page.start as usize + k];
            self.data.set(new_start + k, v)?;
        }
        Ok(PageRec {
            start: new_start as u32,
            len: page.len,
            cap: new_cap,
        })
    }
}
