//! Conversion paths: per kind-pair gather/scatter functions.
//!
//! A [`Path`] bundles the four functions that move packed element bytes
//! between a selection and an intermediate buffer, one pair for the store
//! side and one for the memory side. Functions are chosen by selection kind:
//! `All` gets a contiguous specialization, everything else walks sequence
//! lists. Paths live in a [`PathCache`], a fixed table indexed by
//! `(file kind, mem kind)`.

use std::fmt;

use tracing::debug;

use crate::dataspace::Dataspace;
use crate::error::{Result, SpaceError, TransferError};
use crate::iter::SelectionIter;
use crate::plist::TransferProps;
use crate::selection::SelectionKind;
use crate::store::ByteStore;

/// Pack selected elements from the store into `out`; returns bytes filled.
pub type GatherFileFn = fn(
    &mut SelectionIter<'_>,
    &dyn ByteStore,
    &mut [u8],
    &TransferProps,
) -> std::result::Result<usize, TransferError>;

/// Unpack `src` into selected elements of the store; returns bytes consumed.
pub type ScatterFileFn = fn(
    &mut SelectionIter<'_>,
    &mut dyn ByteStore,
    &[u8],
    &TransferProps,
) -> std::result::Result<usize, TransferError>;

/// Pack selected elements of `mem` into `out`; returns bytes filled.
pub type GatherMemFn = fn(&mut SelectionIter<'_>, &[u8], &mut [u8], &TransferProps) -> Result<usize>;

/// Unpack `src` into selected elements of `mem`; returns bytes consumed.
pub type ScatterMemFn =
    fn(&mut SelectionIter<'_>, &mut [u8], &[u8], &TransferProps) -> Result<usize>;

/// Gather/scatter functions for one `(file kind, mem kind)` pair.
#[derive(Clone, Copy)]
pub struct Path {
    pub file_kind: SelectionKind,
    pub mem_kind: SelectionKind,
    pub gather_file: GatherFileFn,
    pub scatter_file: ScatterFileFn,
    pub gather_mem: GatherMemFn,
    pub scatter_mem: ScatterMemFn,
    /// Both sides are one contiguous run. Depends on the selections, not
    /// only their kinds, so it is recomputed on every lookup.
    pub direct_possible: bool,
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Path")
            .field("file_kind", &self.file_kind)
            .field("mem_kind", &self.mem_kind)
            .field("direct_possible", &self.direct_possible)
            .finish_non_exhaustive()
    }
}

impl Path {
    fn new(file_kind: SelectionKind, mem_kind: SelectionKind) -> Self {
        let file_contig = file_kind == SelectionKind::All;
        let mem_contig = mem_kind == SelectionKind::All;
        Path {
            file_kind,
            mem_kind,
            gather_file: if file_contig { gather_file_contig } else { gather_file_seq },
            scatter_file: if file_contig { scatter_file_contig } else { scatter_file_seq },
            gather_mem: if mem_contig { gather_mem_contig } else { gather_mem_seq },
            scatter_mem: if mem_contig { scatter_mem_contig } else { scatter_mem_seq },
            direct_possible: false,
        }
    }
}

/// Fixed table of conversion paths. Entries are built on first use and
/// never evicted.
#[derive(Debug, Default)]
pub struct PathCache {
    table: [[Option<Path>; SelectionKind::COUNT]; SelectionKind::COUNT],
    hits: u64,
    misses: u64,
}

impl PathCache {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the path for this pair of dataspaces, building it on a miss.
    /// Returns the path and whether it was a hit.
    pub fn find_or_create_path(&mut self, file_space: &Dataspace, mem_space: &Dataspace) -> (Path, bool) {
        let fk = file_space.selection_kind();
        let mk = mem_space.selection_kind();
        let slot = &mut self.table[fk.index()][mk.index()];
        let hit = slot.is_some();
        let mut path = *slot.get_or_insert_with(|| Path::new(fk, mk));
        if hit {
            self.hits += 1;
        } else {
            self.misses += 1;
            debug!(file = ?fk, mem = ?mk, "conversion path created");
        }
        path.direct_possible = file_space.is_contiguous() && mem_space.is_contiguous();
        (path, hit)
    }

    /// Lookups answered from the table.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Lookups that had to build a path.
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Number of populated entries.
    pub fn len(&self) -> usize {
        self.table.iter().flatten().filter(|p| p.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Walk runs of `it` totalling at most `budget` bytes, calling `visit` with
/// each run's byte offset in the extent, the bytes done so far in this call
/// and the run length. `contiguous` reads runs straight off the cursor;
/// otherwise runs come in sequence-list batches.
fn walk_runs<E>(
    it: &mut SelectionIter<'_>,
    budget: usize,
    props: &TransferProps,
    contiguous: bool,
    mut visit: impl FnMut(u64, usize, usize) -> std::result::Result<(), E>,
) -> std::result::Result<usize, E>
where
    E: From<SpaceError>,
{
    let es = it.elem_size();
    let mut done = 0usize;
    if contiguous {
        while done + es <= budget {
            let Some((start, len)) = it.current_run() else {
                break;
            };
            let take = len.min(((budget - done) / es) as u64);
            let bytes = take as usize * es;
            visit(start * es as u64, done, bytes)?;
            it.consume(take);
            done += bytes;
        }
        return Ok(done);
    }
    let mut seqs = Vec::new();
    while done + es <= budget && it.elements_left() > 0 {
        let batch = (budget - done).min(props.batch_bytes(es));
        it.get_seq_list_into(props.max_sequences.max(1), batch, &mut seqs)?;
        for s in &seqs {
            visit(s.offset, done, s.len)?;
            done += s.len;
        }
    }
    Ok(done)
}

fn io_err(moved: usize) -> impl FnOnce(std::io::Error) -> TransferError {
    move |source| TransferError::Io {
        moved: moved as u64,
        source,
    }
}

fn gather_file_impl(
    it: &mut SelectionIter<'_>,
    store: &dyn ByteStore,
    out: &mut [u8],
    props: &TransferProps,
    contiguous: bool,
) -> std::result::Result<usize, TransferError> {
    walk_runs(it, out.len(), props, contiguous, |offset, done, len| {
        store
            .read_at(offset, &mut out[done..done + len])
            .map_err(io_err(0))
    })
}

fn scatter_file_impl(
    it: &mut SelectionIter<'_>,
    store: &mut dyn ByteStore,
    src: &[u8],
    props: &TransferProps,
    contiguous: bool,
) -> std::result::Result<usize, TransferError> {
    walk_runs(it, src.len(), props, contiguous, |offset, done, len| {
        store
            .write_at(offset, &src[done..done + len])
            .map_err(io_err(done))
    })
}

fn gather_mem_impl(
    it: &mut SelectionIter<'_>,
    mem: &[u8],
    out: &mut [u8],
    props: &TransferProps,
    contiguous: bool,
) -> Result<usize> {
    walk_runs(it, out.len(), props, contiguous, |offset, done, len| {
        let at = offset as usize;
        out[done..done + len].copy_from_slice(&mem[at..at + len]);
        Ok(())
    })
}

fn scatter_mem_impl(
    it: &mut SelectionIter<'_>,
    mem: &mut [u8],
    src: &[u8],
    props: &TransferProps,
    contiguous: bool,
) -> Result<usize> {
    walk_runs(it, src.len(), props, contiguous, |offset, done, len| {
        let at = offset as usize;
        mem[at..at + len].copy_from_slice(&src[done..done + len]);
        Ok(())
    })
}

fn gather_file_contig(
    it: &mut SelectionIter<'_>,
    store: &dyn ByteStore,
    out: &mut [u8],
    props: &TransferProps,
) -> std::result::Result<usize, TransferError> {
    gather_file_impl(it, store, out, props, true)
}

fn gather_file_seq(
    it: &mut SelectionIter<'_>,
    store: &dyn ByteStore,
    out: &mut [u8],
    props: &TransferProps,
) -> std::result::Result<usize, TransferError> {
    gather_file_impl(it, store, out, props, false)
}

fn scatter_file_contig(
    it: &mut SelectionIter<'_>,
    store: &mut dyn ByteStore,
    src: &[u8],
    props: &TransferProps,
) -> std::result::Result<usize, TransferError> {
    scatter_file_impl(it, store, src, props, true)
}

fn scatter_file_seq(
    it: &mut SelectionIter<'_>,
    store: &mut dyn ByteStore,
    src: &[u8],
    props: &TransferProps,
) -> std::result::Result<usize, TransferError> {
    scatter_file_impl(it, store, src, props, false)
}

fn gather_mem_contig(
    it: &mut SelectionIter<'_>,
    mem: &[u8],
    out: &mut [u8],
    props: &TransferProps,
) -> Result<usize> {
    gather_mem_impl(it, mem, out, props, true)
}

fn gather_mem_seq(
    it: &mut SelectionIter<'_>,
    mem: &[u8],
    out: &mut [u8],
    props: &TransferProps,
) -> Result<usize> {
    gather_mem_impl(it, mem, out, props, false)
}

fn scatter_mem_contig(
    it: &mut SelectionIter<'_>,
    mem: &mut [u8],
    src: &[u8],
    props: &TransferProps,
) -> Result<usize> {
    scatter_mem_impl(it, mem, src, props, true)
}

fn scatter_mem_seq(
    it: &mut SelectionIter<'_>,
    mem: &mut [u8],
    src: &[u8],
    props: &TransferProps,
) -> Result<usize> {
    scatter_mem_impl(it, mem, src, props, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataspace::PointOp;
    use crate::hyperslab::SelectOp;

    #[test]
    fn table_fills_once_per_kind_pair() {
        let mut cache = PathCache::new();
        let all = Dataspace::simple(&[8]).unwrap();
        let mut pts = Dataspace::simple(&[8]).unwrap();
        pts.select_elements(PointOp::Set, &[vec![1], vec![3]]).unwrap();

        let (p, hit) = cache.find_or_create_path(&all, &all);
        assert!(!hit);
        assert!(p.direct_possible);
        let (_, hit) = cache.find_or_create_path(&all, &all);
        assert!(hit);
        let (p, hit) = cache.find_or_create_path(&all, &pts);
        assert!(!hit);
        assert!(!p.direct_possible);
        assert_eq!(p.mem_kind, SelectionKind::Points);
        assert_eq!((cache.hits(), cache.misses(), cache.len()), (1, 2, 2));
    }

    #[test]
    fn direct_flag_is_recomputed() {
        let mut cache = PathCache::new();
        let all = Dataspace::simple(&[10]).unwrap();
        let mut h = Dataspace::simple(&[10]).unwrap();
        h.select_block(SelectOp::Set, &[2], &[5]).unwrap();
        assert!(cache.find_or_create_path(&h, &all).0.direct_possible);
        h.select_hyperslab(SelectOp::Set, &[0], Some(&[2]), &[3], None).unwrap();
        let (p, hit) = cache.find_or_create_path(&h, &all);
        assert!(hit);
        assert!(!p.direct_possible);
    }

    #[test]
    fn gather_and_scatter_mem_roundtrip() {
        let mut s = Dataspace::simple(&[6]).unwrap();
        s.select_hyperslab(SelectOp::Set, &[1], Some(&[2]), &[3], None).unwrap();
        let mem: Vec<u8> = (0..6).collect();
        let props = TransferProps::new();
        let path = Path::new(SelectionKind::Hyperslab, SelectionKind::Hyperslab);

        let mut it = SelectionIter::new(&s, 1).unwrap();
        let mut packed = [0u8; 3];
        assert_eq!((path.gather_mem)(&mut it, &mem, &mut packed, &props).unwrap(), 3);
        assert_eq!(packed, [1, 3, 5]);

        let mut dst = [0u8; 6];
        let mut it = SelectionIter::new(&s, 1).unwrap();
        (path.scatter_mem)(&mut it, &mut dst, &packed, &props).unwrap();
        assert_eq!(dst, [0, 1, 0, 3, 0, 5]);
    }

    #[test]
    fn gather_file_respects_out_len() {
        let s = Dataspace::simple(&[8]).unwrap();
        let store: Vec<u8> = (10..18).collect();
        let path = Path::new(SelectionKind::All, SelectionKind::All);
        let props = TransferProps::new();
        let mut it = SelectionIter::new(&s, 2).unwrap();
        let mut out = [0u8; 6];
        assert_eq!((path.gather_file)(&mut it, &store, &mut out, &props).unwrap(), 6);
        assert_eq!(out, [10, 11, 12, 13, 14, 15]);
        assert_eq!(it.elements_left(), 1);
    }
}
