//! Growable memory-mapped typed array

use std::fs::{File, OpenOptions};
use std::marker::PhantomData;
use std::mem;
use std::path::{Path, PathBuf};

use bytemuck::Pod;
use memmap2::{Mmap, MmapMut};

use crate::error::{Error, Result};
use crate::store::OpenMode;

const MIN_CAP: usize = 64;

/// A typed array backed by one memory-mapped file.
///
/// In write mode the file grows geometrically and `sync` truncates it to the
/// exact used length, so after reopening, the file length alone defines the
/// element count. In read mode the file is attached as-is; a length that is
/// not a multiple of the element size is store corruption.
pub struct MmVec<T: Pod> {
    file: File,
    path: PathBuf,
    map: Mapping,
    len: usize,
    _marker: PhantomData<T>,
}

enum Mapping {
    Read(Option<Mmap>),
    Write { map: Option<MmapMut>, cap: usize },
}

impl<T: Pod> MmVec<T> {
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let elem = mem::size_of::<T>();
        match mode {
            OpenMode::Read => {
                let file = File::open(&path).map_err(|e| Error::io(&path, e))?;
                let bytes = file.metadata().map_err(|e| Error::io(&path, e))?.len() as usize;
                if bytes % elem != 0 {
                    return Err(Error::corrupt(format!(
                        "{}: file length {bytes} is not a multiple of element size {elem}",
                        path.display()
                    )));
                }
                let map = if bytes == 0 {
                    None
                } else {
                    Some(unsafe { Mmap::map(&file) }.map_err(|e| Error::io(&path, e))?)
                };
                Ok(Self {
                    file,
                    path,
                    map: Mapping::Read(map),
                    len: bytes / elem,
                    _marker: PhantomData,
                })
            }
            OpenMode::Write => {
                let file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(&path)
                    .map_err(|e| Error::io(&path, e))?;
                Ok(Self {
                    file,
                    path,
                    map: Mapping::Write { map: None, cap: 0 },
                    len: 0,
                    _marker: PhantomData,
                })
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[T] {
        let bytes = self.len * mem::size_of::<T>();
        match &self.map {
            Mapping::Read(Some(m)) => bytemuck::cast_slice(&m[..bytes]),
            Mapping::Write { map: Some(m), .. } => bytemuck::cast_slice(&m[..bytes]),
            _ => &[],
        }
    }

    pub fn get(&self, i: usize) -> Option<T> {
        self.as_slice().get(i).copied()
    }

    pub fn push(&mut self, value: T) -> Result<()> {
        let i = self.len;
        self.reserve(i + 1)?;
        self.slice_mut()[i] = value;
        self.len = i + 1;
        Ok(())
    }

    pub fn set(&mut self, i: usize, value: T) -> Result<()> {
        if i >= self.len {
            return Err(Error::corrupt(format!(
                "{}: index {i} out of bounds (len {})",
                self.path.display(),
                self.len
            )));
        }
        if !matches!(self.map, Mapping::Write { .. }) {
            return Err(Error::ReadOnly);
        }
        self.slice_mut()[i] = value;
        Ok(())
    }

    /// Grows with `fill` or truncates to `new_len` elements.
    pub fn resize(&mut self, new_len: usize, fill: T) -> Result<()> {
        if new_len > self.len {
            self.reserve(new_len)?;
            let old = self.len;
            self.len = new_len;
            self.slice_mut()[old..new_len].fill(fill);
        } else {
            if !matches!(self.map, Mapping::Write { .. }) {
                return Err(Error::ReadOnly);
            }
            self.len = new_len;
        }
        Ok(())
    }

    /// Flushes dirty pages, truncates the file to the used length and remaps.
    /// A no-op in read mode.
    pub fn sync(&mut self) -> Result<()> {
        let Mapping::Write { map, cap } = &mut self.map else {
            return Ok(());
        };
        if let Some(m) = map.as_ref() {
            m.flush().map_err(|e| Error::io(&self.path, e))?;
        }
        // Drop the mapping before shrinking the file under it.
        *map = None;
        *cap = 0;
        let bytes = (self.len * mem::size_of::<T>()) as u64;
        self.file
            .set_len(bytes)
            .map_err(|e| Error::io(&self.path, e))?;
        self.file
            .sync_all()
            .map_err(|e| Error::io(&self.path, e))?;
        if self.len > 0 {
            *map = Some(unsafe { MmapMut::map_mut(&self.file) }.map_err(|e| Error::io(&self.path, e))?);
            *cap = self.len;
        }
        Ok(())
    }

    fn reserve(&mut self, needed: usize) -> Result<()> {
        let Mapping::Write { cap, .. } = &self.map else {
            return Err(Error::ReadOnly);
        };
        if needed <= *cap {
            return Ok(());
        }
        let new_cap = needed.next_power_of_two().max(MIN_CAP);
        self.file
            .set_len((new_cap * mem::size_of::<T>()) as u64)
            .map_err(|e| Error::io(&self.path, e))?;
        let m = unsafe { MmapMut::map_mut(&self.file) }.map_err(|e| Error::io(&self.path, e))?;
        self.map = Mapping::Write {
            map: Some(m),
            cap: new_cap,
        };
        Ok(())
    }

    fn slice_mut(&mut self) -> &mut [T] {
        match &mut self.map {
            Mapping::Write { map: Some(m), .. } => bytemuck::cast_slice_mut(&mut m[..]),
            _ => &mut [],
        }
    }
}
