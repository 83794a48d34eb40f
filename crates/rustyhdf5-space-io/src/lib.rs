//! Byte-store backends for `rustyhdf5-space` transfers.
//!
//! Provides [`FileStore`] for positional file access, [`BaseAddr`] to
//! relocate any store behind a fixed base address, and optionally
//! [`MmapStore`] for memory-mapped files (feature `mmap`).

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

pub use rustyhdf5_space;
use rustyhdf5_space::ByteStore;

/// Positional reads and writes on a [`File`].
///
/// No cursor is shared between calls: every access names its offset.
#[derive(Debug)]
pub struct FileStore {
    file: File,
    path: PathBuf,
}

impl FileStore {
    /// Open an existing file for reading and writing.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        debug!(path = %path.display(), "file store opened");
        Ok(Self { file, path })
    }

    /// Create (or truncate) a file.
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        debug!(path = %path.display(), "file store created");
        Ok(Self { file, path })
    }

    /// Path the store was opened with.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current file length in bytes.
    pub fn len(&self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    pub fn is_empty(&self) -> io::Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Flush file contents and metadata to disk.
    pub fn sync(&self) -> io::Result<()> {
        self.file.sync_all()
    }

    /// Give back the underlying file.
    pub fn into_inner(self) -> File {
        self.file
    }
}

#[cfg(unix)]
impl ByteStore for FileStore {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        use std::os::unix::fs::FileExt;
        self.file.read_exact_at(buf, offset)
    }

    fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<()> {
        use std::os::unix::fs::FileExt;
        self.file.write_all_at(buf, offset)
    }
}

#[cfg(not(unix))]
impl ByteStore for FileStore {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        use std::io::{Read, Seek, SeekFrom};
        let mut f = &self.file;
        f.seek(SeekFrom::Start(offset))?;
        f.read_exact(buf)
    }

    fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<()> {
        use std::io::{Seek, SeekFrom, Write};
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(buf)
    }
}

/// Shifts every access of the inner store by a fixed base address.
///
/// Lets a dataset whose bytes start at `base` be addressed from zero.
#[derive(Debug, Clone)]
pub struct BaseAddr<S> {
    inner: S,
    base: u64,
}

impl<S: ByteStore> BaseAddr<S> {
    /// Wrap `inner` so offset 0 maps to `base`.
    pub fn new(inner: S, base: u64) -> Self {
        Self { inner, base }
    }

    /// Absolute address of offset 0.
    pub fn base(&self) -> u64 {
        self.base
    }

    /// The wrapped store.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Unwrap, discarding the base address.
    pub fn into_inner(self) -> S {
        self.inner
    }

    fn absolute(&self, offset: u64) -> io::Result<u64> {
        self.base.checked_add(offset).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("offset {offset} overflows base address {}", self.base),
            )
        })
    }
}

impl<S: ByteStore> ByteStore for BaseAddr<S> {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        let at = self.absolute(offset)?;
        self.inner.read_at(at, buf)
    }

    fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<()> {
        let at = self.absolute(offset)?;
        self.inner.write_at(at, buf)
    }
}

// ---------------------------------------------------------------------------
// Optional modules
// ---------------------------------------------------------------------------

#[cfg(feature = "mmap")]
pub mod mmap;

#[cfg(feature = "mmap")]
pub use mmap::MmapStore;
