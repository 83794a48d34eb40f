//! Memory-mapped byte store via `memmap2`.

use memmap2::MmapMut;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

use tracing::debug;

use rustyhdf5_space::ByteStore;

/// Writable memory mapping of a file with a fixed length.
///
/// Accesses outside the mapping fail; the store never grows the file.
pub struct MmapStore {
    _file: File,
    mmap: MmapMut,
}

impl MmapStore {
    /// Map an existing file for reading and writing.
    ///
    /// The caller must ensure no other process truncates the file while the
    /// mapping is alive.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Self::from_file(file)
    }

    /// Create a file of `len` zero bytes and map it.
    pub fn create<P: AsRef<Path>>(path: P, len: u64) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len(len)?;
        Self::from_file(file)
    }

    fn from_file(file: File) -> io::Result<Self> {
        // SAFETY: the mapping is owned together with the file handle; the
        // caller is responsible for outside modification of the file.
        let mmap = unsafe { MmapMut::map_mut(&file)? };
        debug!(len = mmap.len(), "file mapped");
        Ok(Self { _file: file, mmap })
    }

    /// Length of the mapping in bytes.
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// Zero-copy view of the mapping.
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap
    }

    /// Flush dirty pages to the file.
    pub fn flush(&self) -> io::Result<()> {
        self.mmap.flush()
    }

    fn range(&self, offset: u64, len: usize) -> io::Result<std::ops::Range<usize>> {
        usize::try_from(offset)
            .ok()
            .and_then(|start| Some(start..start.checked_add(len)?))
            .filter(|r| r.end <= self.mmap.len())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "{len} bytes at offset {offset} exceed the {} byte mapping",
                        self.mmap.len()
                    ),
                )
            })
    }
}

impl std::fmt::Debug for MmapStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MmapStore").field("len", &self.mmap.len()).finish()
    }
}

impl ByteStore for MmapStore {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        let r = self.range(offset, buf.len())?;
        buf.copy_from_slice(&self.mmap[r]);
        Ok(())
    }

    fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<()> {
        let r = self.range(offset, buf.len())?;
        self.mmap[r].copy_from_slice(buf);
        Ok(())
    }
}
