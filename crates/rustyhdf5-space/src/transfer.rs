//! Scatter/gather transfers between a store-side and a memory-side
//! selection.
//!
//! The engine pairs two selections with equal element counts. By default it
//! zips their sequence lists together, issuing one byte move per overlap of
//! the two heads. When both sides are a single contiguous run the whole
//! transfer is one move.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::dataspace::Dataspace;
use crate::error::{Result, SpaceError, TransferError};
use crate::hyperslab::Hyperslab;
use crate::iter::SelectionIter;
use crate::path::{Path, PathCache};
use crate::plist::{Strategy, TransferProps};
use crate::profiling::{DefaultProfiler, TransferProfiler};
use crate::selection::Selection;
use crate::seq::Sequence;
use crate::store::ByteStore;

/// Which way bytes travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Store to memory.
    Read,
    /// Memory to store.
    Write,
}

/// The store and memory buffer of one transfer, tagged by direction.
pub enum TransferIo<'s, 'b> {
    Read {
        store: &'s dyn ByteStore,
        dst: &'b mut [u8],
    },
    Write {
        store: &'s mut dyn ByteStore,
        src: &'b [u8],
    },
}

impl TransferIo<'_, '_> {
    /// Which way the bytes move.
    pub fn direction(&self) -> Direction {
        match self {
            TransferIo::Read { .. } => Direction::Read,
            TransferIo::Write { .. } => Direction::Write,
        }
    }

    fn mem_len(&self) -> usize {
        match self {
            TransferIo::Read { dst, .. } => dst.len(),
            TransferIo::Write { src, .. } => src.len(),
        }
    }

    /// Move `len` bytes between store offset `file_off` and memory offset
    /// `mem_off`.
    fn copy(&mut self, file_off: u64, mem_off: usize, len: usize) -> std::io::Result<()> {
        match self {
            TransferIo::Read { store, dst } => store.read_at(file_off, &mut dst[mem_off..mem_off + len]),
            TransferIo::Write { store, src } => store.write_at(file_off, &src[mem_off..mem_off + len]),
        }
    }
}

/// Runs transfers with a set of properties, a conversion-path cache and a
/// profiler.
pub struct TransferEngine {
    props: TransferProps,
    paths: PathCache,
    profiler: Arc<dyn TransferProfiler>,
}

impl Default for TransferEngine {
    fn default() -> Self {
        TransferEngine {
            props: TransferProps::default(),
            paths: PathCache::new(),
            profiler: Arc::new(DefaultProfiler::new()),
        }
    }
}

impl std::fmt::Debug for TransferEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferEngine")
            .field("props", &self.props)
            .field("paths", &self.paths)
            .finish_non_exhaustive()
    }
}

impl TransferEngine {
    /// Engine with validated properties and a fresh [`DefaultProfiler`].
    pub fn new(props: TransferProps) -> Result<Self> {
        props.validate()?;
        Ok(TransferEngine {
            props,
            ..Default::default()
        })
    }

    /// Replace the profiler.
    pub fn with_profiler(mut self, profiler: Arc<dyn TransferProfiler>) -> Self {
        self.profiler = profiler;
        self
    }

    /// Properties the engine was built with.
    pub fn props(&self) -> &TransferProps {
        &self.props
    }

    /// Cached conversion paths and their hit counts.
    pub fn path_cache(&self) -> &PathCache {
        &self.paths
    }

    /// Read `file_space`'s selection from `store` into `mem_space`'s
    /// selection of `dst`. Returns bytes moved.
    pub fn read(
        &mut self,
        file_space: &Dataspace,
        mem_space: &Dataspace,
        elem_size: usize,
        store: &dyn ByteStore,
        dst: &mut [u8],
    ) -> std::result::Result<u64, TransferError> {
        self.transfer(file_space, mem_space, elem_size, TransferIo::Read { store, dst })
    }

    /// Write `mem_space`'s selection of `src` into `file_space`'s selection
    /// of `store`. Returns bytes moved.
    pub fn write(
        &mut self,
        file_space: &Dataspace,
        mem_space: &Dataspace,
        elem_size: usize,
        store: &mut dyn ByteStore,
        src: &[u8],
    ) -> std::result::Result<u64, TransferError> {
        self.transfer(file_space, mem_space, elem_size, TransferIo::Write { store, src })
    }

    /// Move every selected element between the two sides.
    ///
    /// On an I/O failure the bytes already moved stay moved; the error
    /// reports how many.
    pub fn transfer(
        &mut self,
        file_space: &Dataspace,
        mem_space: &Dataspace,
        elem_size: usize,
        mut io: TransferIo<'_, '_>,
    ) -> std::result::Result<u64, TransferError> {
        check_pair(file_space, mem_space, elem_size)?;
        check_mem_len(mem_space, elem_size, io.mem_len())?;

        let (path, hit) = self.paths.find_or_create_path(file_space, mem_space);
        self.profiler.on_path_lookup(hit);
        if file_space.num_elem() == 0 {
            return Ok(0);
        }

        let direction = io.direction();
        let moved = if self.props.direct && path.direct_possible {
            debug!(?direction, "direct transfer");
            self.profiler.on_direct();
            self.direct(file_space, mem_space, elem_size, &mut io)?
        } else {
            match self.props.strategy {
                Strategy::Zipper => self.zipper(file_space, mem_space, elem_size, &mut io)?,
                Strategy::Buffered => self.buffered(&path, file_space, mem_space, elem_size, io)?,
            }
        };
        match direction {
            Direction::Read => self.profiler.on_read(moved),
            Direction::Write => self.profiler.on_write(moved),
        }
        Ok(moved)
    }

    fn direct(
        &self,
        file_space: &Dataspace,
        mem_space: &Dataspace,
        elem_size: usize,
        io: &mut TransferIo<'_, '_>,
    ) -> std::result::Result<u64, TransferError> {
        let file = single_run(file_space, elem_size)?;
        let mem = single_run(mem_space, elem_size)?;
        io.copy(file.offset, mem.offset as usize, file.len)
            .map_err(|source| TransferError::Io { moved: 0, source })?;
        Ok(file.len as u64)
    }

    fn zipper(
        &self,
        file_space: &Dataspace,
        mem_space: &Dataspace,
        elem_size: usize,
        io: &mut TransferIo<'_, '_>,
    ) -> std::result::Result<u64, TransferError> {
        let max_seq = self.props.max_sequences;
        let max_bytes = self.props.batch_bytes(elem_size);
        let mut file = Cursor::new(SelectionIter::new(file_space, elem_size)?);
        let mut mem = Cursor::new(SelectionIter::new(mem_space, elem_size)?);
        let mut moved = 0u64;
        loop {
            if !file.refill(max_seq, max_bytes, &*self.profiler)? {
                break;
            }
            if !mem.refill(max_seq, max_bytes, &*self.profiler)? {
                break;
            }
            let (f_off, f_left) = file.head();
            let (m_off, m_left) = mem.head();
            let len = f_left.min(m_left);
            io.copy(f_off, m_off as usize, len)
                .map_err(|source| TransferError::Io { moved, source })?;
            moved += len as u64;
            file.take(len);
            mem.take(len);
        }
        Ok(moved)
    }

    fn buffered(
        &self,
        path: &Path,
        file_space: &Dataspace,
        mem_space: &Dataspace,
        elem_size: usize,
        io: TransferIo<'_, '_>,
    ) -> std::result::Result<u64, TransferError> {
        let mut file = SelectionIter::new(file_space, elem_size)?;
        let mut mem = SelectionIter::new(mem_space, elem_size)?;
        let cap = (self.props.buffer_size / elem_size).max(1) * elem_size;
        let mut tconv = Vec::new();
        tconv.try_reserve_exact(cap).map_err(SpaceError::from)?;
        tconv.resize(cap, 0);
        let mut moved = 0u64;
        match io {
            TransferIo::Read { store, dst } => loop {
                let n = (path.gather_file)(&mut file, store, &mut tconv, &self.props)
                    .map_err(|e| offset_moved(e, moved))?;
                if n == 0 {
                    break;
                }
                (path.scatter_mem)(&mut mem, &mut *dst, &tconv[..n], &self.props)?;
                moved += n as u64;
                trace!(n, moved, "buffered read strip");
            },
            TransferIo::Write { store, src } => loop {
                let n = (path.gather_mem)(&mut mem, src, &mut tconv, &self.props)?;
                if n == 0 {
                    break;
                }
                (path.scatter_file)(&mut file, &mut *store, &tconv[..n], &self.props)
                    .map_err(|e| offset_moved(e, moved))?;
                moved += n as u64;
                trace!(n, moved, "buffered write strip");
            },
        }
        Ok(moved)
    }
}

fn offset_moved(e: TransferError, before: u64) -> TransferError {
    match e {
        TransferError::Io { moved, source } => TransferError::Io {
            moved: before + moved,
            source,
        },
        other => other,
    }
}

/// One side of the zipper: a sequence batch and a position in its head.
struct Cursor<'a> {
    it: SelectionIter<'a>,
    seqs: Vec<Sequence>,
    idx: usize,
    done: usize,
}

impl<'a> Cursor<'a> {
    fn new(it: SelectionIter<'a>) -> Self {
        Cursor {
            it,
            seqs: Vec::new(),
            idx: 0,
            done: 0,
        }
    }

    /// Make sure a head sequence is available; false once exhausted.
    fn refill(&mut self, max_seq: usize, max_bytes: usize, profiler: &dyn TransferProfiler) -> Result<bool> {
        if self.idx < self.seqs.len() {
            return Ok(true);
        }
        if self.it.elements_left() == 0 {
            return Ok(false);
        }
        let (nbytes, _) = self.it.get_seq_list_into(max_seq, max_bytes, &mut self.seqs)?;
        self.idx = 0;
        self.done = 0;
        profiler.on_batch(self.seqs.len());
        trace!(nseq = self.seqs.len(), nbytes, "zipper batch");
        Ok(!self.seqs.is_empty())
    }

    /// Offset and remaining length of the head sequence.
    fn head(&self) -> (u64, usize) {
        let s = self.seqs[self.idx];
        (s.offset + self.done as u64, s.len - self.done)
    }

    fn take(&mut self, len: usize) {
        self.done += len;
        if self.done == self.seqs[self.idx].len {
            self.idx += 1;
            self.done = 0;
        }
    }
}

fn check_pair(file_space: &Dataspace, mem_space: &Dataspace, elem_size: usize) -> Result<()> {
    if elem_size == 0 {
        return Err(SpaceError::argument("element size must be non-zero"));
    }
    let (file, mem) = (file_space.num_elem(), mem_space.num_elem());
    if file != mem {
        return Err(SpaceError::CountMismatch { file, mem });
    }
    if !file_space.is_valid() {
        return Err(SpaceError::bounds("file selection lies outside its extent"));
    }
    if !mem_space.is_valid() {
        return Err(SpaceError::bounds("memory selection lies outside its extent"));
    }
    Ok(())
}

fn check_mem_len(mem_space: &Dataspace, elem_size: usize, len: usize) -> Result<()> {
    let need = mem_space
        .extent()
        .num_elements()
        .checked_mul(elem_size as u64)
        .ok_or_else(|| SpaceError::argument("memory extent size overflows u64"))?;
    if (len as u64) < need {
        return Err(SpaceError::argument(format!(
            "memory buffer holds {len} bytes, extent needs {need}"
        )));
    }
    Ok(())
}

fn single_run(space: &Dataspace, elem_size: usize) -> Result<Sequence> {
    let mut it = SelectionIter::new(space, elem_size)?;
    let list = it.get_seq_list(1, usize::MAX)?;
    match list.seqs.as_slice() {
        [s] if it.elements_left() == 0 => Ok(*s),
        _ => Err(SpaceError::argument("selection is not a single contiguous run")),
    }
}

/// Write `fill` (one element) into every selected element of `buf`.
pub fn fill(space: &Dataspace, elem_size: usize, fill: &[u8], buf: &mut [u8]) -> Result<()> {
    if fill.len() != elem_size {
        return Err(SpaceError::argument(format!(
            "fill value is {} bytes, element size is {elem_size}",
            fill.len()
        )));
    }
    check_mem_len(space, elem_size, buf.len())?;
    let mut it = SelectionIter::new(space, elem_size)?;
    let mut seqs = Vec::new();
    while it.elements_left() > 0 {
        it.get_seq_list_into(crate::plist::DEFAULT_MAX_SEQUENCES, usize::MAX, &mut seqs)?;
        for s in &seqs {
            let at = s.offset as usize;
            for elem in buf[at..at + s.len].chunks_exact_mut(elem_size) {
                elem.copy_from_slice(fill);
            }
        }
    }
    Ok(())
}

/// Pack the selected elements of `src` into a dense buffer.
pub fn gather(space: &Dataspace, elem_size: usize, src: &[u8]) -> Result<Vec<u8>> {
    check_mem_len(space, elem_size, src.len())?;
    let mut it = SelectionIter::new(space, elem_size)?;
    let total = usize::try_from(space.num_elem() * elem_size as u64)
        .map_err(|_| SpaceError::Resource("gathered size exceeds address space".into()))?;
    let mut out = Vec::new();
    out.try_reserve_exact(total)?;
    let mut seqs = Vec::new();
    while it.elements_left() > 0 {
        it.get_seq_list_into(crate::plist::DEFAULT_MAX_SEQUENCES, usize::MAX, &mut seqs)?;
        for s in &seqs {
            let at = s.offset as usize;
            out.extend_from_slice(&src[at..at + s.len]);
        }
    }
    Ok(out)
}

/// Unpack the dense buffer `packed` into the selected elements of `dst`.
pub fn scatter(space: &Dataspace, elem_size: usize, packed: &[u8], dst: &mut [u8]) -> Result<()> {
    check_mem_len(space, elem_size, dst.len())?;
    let mut it = SelectionIter::new(space, elem_size)?;
    let need = space.num_elem() * elem_size as u64;
    if packed.len() as u64 != need {
        return Err(SpaceError::argument(format!(
            "packed buffer holds {} bytes, selection needs {need}",
            packed.len()
        )));
    }
    let mut seqs = Vec::new();
    let mut done = 0usize;
    while it.elements_left() > 0 {
        it.get_seq_list_into(crate::plist::DEFAULT_MAX_SEQUENCES, usize::MAX, &mut seqs)?;
        for s in &seqs {
            let at = s.offset as usize;
            dst[at..at + s.len].copy_from_slice(&packed[done..done + s.len]);
            done += s.len;
        }
    }
    Ok(())
}

/// Do `a` and `b` select the same shape, up to translation?
///
/// Selections of different rank never match. Offsets are ignored, so an
/// offset that moves a selection out of its extent does not affect the
/// answer. Blocks are compared in lock step: each pair must have equal extents and the same position relative
/// to the first block of its side.
pub fn shape_same(a: &Dataspace, b: &Dataspace) -> bool {
    if a.rank() != b.rank() || a.num_elem() != b.num_elem() {
        return false;
    }
    if a.num_elem() == 0 {
        return true;
    }
    match (a.selection(), b.selection()) {
        (Selection::All, Selection::All) => return a.dims() == b.dims(),
        (
            Selection::Hyperslab(Hyperslab::Regular(ra)),
            Selection::Hyperslab(Hyperslab::Regular(rb)),
        ) => {
            return ra
                .dims()
                .iter()
                .zip(rb.dims())
                .all(|(x, y)| (x.stride, x.count, x.block) == (y.stride, y.count, y.block));
        }
        _ => {}
    }
    let (Ok(mut ia), Ok(mut ib)) = (
        SelectionIter::untranslated(a, 1),
        SelectionIter::untranslated(b, 1),
    ) else {
        return false;
    };
    let mut base: Option<(Vec<i64>, Vec<i64>)> = None;
    loop {
        match (ia.next_block(), ib.next_block()) {
            (None, None) => return true,
            (Some(x), Some(y)) => {
                let (ax, by) = base.get_or_insert_with(|| (x.start.clone(), y.start.clone()));
                for d in 0..x.rank() {
                    if !same_span((x.start[d], x.end[d]), (y.start[d], y.end[d]))
                        || !same_span((ax[d], x.start[d]), (by[d], y.start[d]))
                    {
                        return false;
                    }
                }
            }
            _ => return false,
        }
    }
}

/// `p.1 - p.0 == q.1 - q.0`, false when either difference overflows.
fn same_span(p: (i64, i64), q: (i64, i64)) -> bool {
    match (p.1.checked_sub(p.0), q.1.checked_sub(q.0)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
