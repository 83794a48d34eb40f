//! Sequence lists: a selection translated into byte runs of a flat buffer.

use tracing::trace;

use crate::error::{Result, SpaceError};
use crate::iter::SelectionIter;
use crate::selection::SelectionKind;

/// One contiguous byte run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sequence {
    /// Byte offset from the start of the extent.
    pub offset: u64,
    /// Length in bytes.
    pub len: usize,
}

impl Sequence {
    /// A run of `len` bytes at `offset`.
    pub fn new(offset: u64, len: usize) -> Self {
        Sequence { offset, len }
    }

    /// One past the last byte.
    pub fn end(&self) -> u64 {
        self.offset + self.len as u64
    }
}

/// A batch of sequences produced by one [`SelectionIter::get_seq_list`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeqList {
    pub seqs: Vec<Sequence>,
    /// Total bytes covered.
    pub nbytes: usize,
    /// Elements consumed from the iterator.
    pub nelem: u64,
}

impl<'a> SelectionIter<'a> {
    /// Produce the next batch of at most `max_sequences` runs covering at
    /// most `max_bytes` bytes. Repeated calls resume where the last one
    /// stopped; an exhausted iterator yields an empty list.
    pub fn get_seq_list(&mut self, max_sequences: usize, max_bytes: usize) -> Result<SeqList> {
        let mut seqs = Vec::new();
        let (nbytes, nelem) = self.get_seq_list_into(max_sequences, max_bytes, &mut seqs)?;
        Ok(SeqList { seqs, nbytes, nelem })
    }

    /// Like [`get_seq_list`](Self::get_seq_list), reusing `seqs`. Returns
    /// `(nbytes, nelem)`.
    pub fn get_seq_list_into(
        &mut self,
        max_sequences: usize,
        max_bytes: usize,
        seqs: &mut Vec<Sequence>,
    ) -> Result<(usize, u64)> {
        seqs.clear();
        if self.elements_left() == 0 {
            return Ok((0, 0));
        }
        let elem_size = self.elem_size();
        if max_sequences == 0 {
            return Err(SpaceError::argument("max_sequences must be non-zero"));
        }
        if max_bytes < elem_size {
            return Err(SpaceError::argument(format!(
                "max_bytes {max_bytes} is smaller than one element ({elem_size} bytes)"
            )));
        }
        // points keep one sequence per element, in insertion order
        let merge = self.kind() != SelectionKind::Points;
        let es = elem_size as u64;
        let mut nbytes = 0usize;
        let mut nelem = 0u64;
        while let Some((start, len)) = self.current_run() {
            let budget = ((max_bytes - nbytes) / elem_size) as u64;
            if budget == 0 {
                break;
            }
            let take = len.min(budget);
            let offset = start * es;
            let bytes = (take * es) as usize;
            match seqs.last_mut() {
                Some(last) if merge && last.end() == offset => last.len += bytes,
                _ => {
                    if seqs.len() == max_sequences {
                        break;
                    }
                    seqs.push(Sequence::new(offset, bytes));
                }
            }
            nbytes += bytes;
            nelem += take;
            self.consume(take);
        }
        trace!(nseq = seqs.len(), nbytes, nelem, "sequence list filled");
        Ok((nbytes, nelem))
    }
}
