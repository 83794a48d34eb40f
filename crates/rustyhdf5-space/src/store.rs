//! The byte-mover seam between the transfer engine and storage.

use std::io;

/// Positional byte storage that transfers read from and write to.
///
/// Offsets are absolute byte positions. Implementations decide what lies
/// behind them: a buffer, a file, a mapped region.
pub trait ByteStore {
    /// Fill `buf` with the bytes starting at `offset`. Short data is an
    /// error, not a partial read.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()>;

    /// Write all of `buf` starting at `offset`.
    fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<()>;
}

/// In-memory store. Writes past the end grow the buffer, zero-filling any
/// gap, the way a file would.
impl ByteStore for Vec<u8> {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        let start = usize::try_from(offset).map_err(|_| eof(offset, buf.len()))?;
        let end = start
            .checked_add(buf.len())
            .filter(|&e| e <= self.len())
            .ok_or_else(|| eof(offset, buf.len()))?;
        buf.copy_from_slice(&self[start..end]);
        Ok(())
    }

    fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<()> {
        let start = usize::try_from(offset)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "offset exceeds address space"))?;
        let end = start
            .checked_add(buf.len())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "write end overflows"))?;
        if end > self.len() {
            self.resize(end, 0);
        }
        self[start..end].copy_from_slice(buf);
        Ok(())
    }
}

impl<S: ByteStore + ?Sized> ByteStore for &mut S {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        (**self).read_at(offset, buf)
    }

    fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<()> {
        (**self).write_at(offset, buf)
    }
}

impl<S: ByteStore + ?Sized> ByteStore for Box<S> {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        (**self).read_at(offset, buf)
    }

    fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<()> {
        (**self).write_at(offset, buf)
    }
}

fn eof(offset: u64, len: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("read of {len} bytes at offset {offset} is past the end"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_read_write() {
        let mut v: Vec<u8> = vec![0; 4];
        v.write_at(2, &[7, 8, 9]).unwrap();
        assert_eq!(v, vec![0, 0, 7, 8, 9]);
        let mut out = [0u8; 2];
        v.read_at(3, &mut out).unwrap();
        assert_eq!(out, [8, 9]);
    }

    #[test]
    fn vec_read_past_end_fails() {
        let v: Vec<u8> = vec![1, 2, 3];
        let mut out = [0u8; 2];
        let err = v.read_at(2, &mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        assert!(v.read_at(u64::MAX, &mut out).is_err());
    }

    #[test]
    fn write_gap_is_zero_filled() {
        let mut v: Vec<u8> = Vec::new();
        v.write_at(3, &[1]).unwrap();
        assert_eq!(v, vec![0, 0, 0, 1]);
    }

    #[test]
    fn through_references() {
        fn put<S: ByteStore>(mut store: S) {
            store.write_at(0, &[5]).unwrap();
        }
        let mut v: Vec<u8> = vec![0; 2];
        put(&mut v);
        let boxed: Box<dyn ByteStore> = Box::new(v);
        let mut out = [0u8; 1];
        boxed.read_at(0, &mut out).unwrap();
        assert_eq!(out, [5]);
    }
}
