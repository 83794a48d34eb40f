//! Walking a selection in row-major order.
//!
//! A [`SelectionIter`] borrows its dataspace, so the selection cannot change
//! while an iterator is live. Internally the walk is a stream of *runs*:
//! maximal stretches of elements that are contiguous in the extent as far as
//! the current cursor can see. Sequence lists (see [`crate::seq`]) are built
//! by merging and truncating those runs.

use crate::dataspace::Dataspace;
use crate::error::{Result, SpaceError};
use crate::hyperslab::region::Sweep;
use crate::hyperslab::{odometer_step, HyperDim, Hyperslab, Node, RegionList};
use crate::selection::{Selection, SelectionKind};

/// Iterator over the elements of a selection.
#[derive(Debug)]
pub struct SelectionIter<'a> {
    space: &'a Dataspace,
    elem_size: usize,
    /// Translation applied to every coordinate; zero for untranslated walks.
    offset: Vec<i64>,
    strides: Vec<u64>,
    total: u64,
    left: u64,
    cursor: Cursor,
    next_block: u64,
    block_order: Option<Vec<usize>>,
}

#[derive(Debug)]
enum Cursor {
    Done,
    All { pos: u64 },
    Points { idx: usize },
    Regular(RegularCursor),
    Irregular(RowCursor),
}

/// Odometer over a regular hyperslab. Dimensions after `inner` are fully
/// selected and folded into it, so one run covers whole rows or planes.
#[derive(Debug)]
struct RegularCursor {
    /// Normalized descriptor with the offset folded into `start`.
    dims: Vec<HyperDim>,
    inner: usize,
    /// Position within `0..count*block` for each dimension before `inner`.
    grid: Vec<u64>,
    /// Element position along `inner`, trailing dimensions included.
    pos: u64,
}

/// Row walk over an irregular hyperslab. A row fixes every coordinate but
/// the fastest one.
#[derive(Debug)]
struct RowCursor {
    row: Vec<i64>,
    /// Inclusive intervals of the fastest dimension in this row, sorted.
    runs: Vec<(i64, i64)>,
    idx: usize,
    pos: u64,
    /// Nodes covering `row[0]`.
    sweep: Sweep,
}

impl<'a> SelectionIter<'a> {
    /// Start iterating `space`'s selection with elements of `elem_size` bytes.
    pub fn new(space: &'a Dataspace, elem_size: usize) -> Result<Self> {
        if !space.is_valid() {
            return Err(SpaceError::bounds(
                "selection plus offset lies outside the extent",
            ));
        }
        Self::build(space, elem_size, space.offset().to_vec())
    }

    /// Walk the selection as stored, ignoring the offset. Unlike
    /// [`new`](Self::new) this works on a selection that the offset pushes
    /// out of the extent; coordinates stay where the selection put them.
    pub(crate) fn untranslated(space: &'a Dataspace, elem_size: usize) -> Result<Self> {
        Self::build(space, elem_size, vec![0; space.rank()])
    }

    fn build(space: &'a Dataspace, elem_size: usize, offset: Vec<i64>) -> Result<Self> {
        if elem_size == 0 {
            return Err(SpaceError::argument("element size must be non-zero"));
        }
        space
            .extent()
            .num_elements()
            .checked_mul(elem_size as u64)
            .ok_or_else(|| SpaceError::argument("extent size in bytes overflows u64"))?;
        let total = space.num_elem();
        let mut it = SelectionIter {
            space,
            elem_size,
            offset,
            strides: space.extent().strides(),
            total,
            left: total,
            cursor: Cursor::Done,
            next_block: 0,
            block_order: None,
        };
        it.cursor = it.start_cursor();
        Ok(it)
    }

    fn start_cursor(&self) -> Cursor {
        if self.total == 0 {
            return Cursor::Done;
        }
        let offset = &self.offset;
        match self.space.selection() {
            Selection::None => Cursor::Done,
            Selection::All => Cursor::All { pos: 0 },
            Selection::Points(_) => Cursor::Points { idx: 0 },
            Selection::Hyperslab(Hyperslab::Regular(r)) => {
                let dims: Vec<HyperDim> = r
                    .dims()
                    .iter()
                    .zip(offset)
                    .map(|(h, &off)| HyperDim {
                        start: h.start + off,
                        ..*h
                    })
                    .collect();
                let extent = self.space.dims();
                let full = |d: usize| {
                    let h = &dims[d];
                    h.start == 0 && h.count == 1 && h.block == extent[d]
                };
                let inner = (0..dims.len()).rev().find(|&d| !full(d)).unwrap_or(0);
                Cursor::Regular(RegularCursor {
                    grid: vec![0; inner],
                    dims,
                    inner,
                    pos: 0,
                })
            }
            Selection::Hyperslab(Hyperslab::Irregular(list)) => {
                let mut sweep = Sweep::default();
                match first_row(list, &mut sweep) {
                    Some(row) => Cursor::Irregular(RowCursor {
                        runs: row_runs(list, &row, &sweep),
                        row,
                        idx: 0,
                        pos: 0,
                        sweep,
                    }),
                    None => Cursor::Done,
                }
            }
        }
    }

    /// Element size in bytes given at construction.
    pub fn elem_size(&self) -> usize {
        self.elem_size
    }

    /// Kind of the selection being walked.
    pub fn kind(&self) -> SelectionKind {
        self.space.selection_kind()
    }

    /// Number of selected elements in total.
    pub fn num_elem(&self) -> u64 {
        self.total
    }

    /// Elements not yet consumed.
    pub fn elements_left(&self) -> u64 {
        self.left
    }

    /// Row-major element index of `coords` (selection space) after adding
    /// the offset.
    fn linear(&self, coords: impl Iterator<Item = i64>) -> u64 {
        coords
            .zip(&self.offset)
            .zip(&self.strides)
            .map(|((c, &off), &s)| (c + off) as u64 * s)
            .sum()
    }

    /// The run under the cursor: first element index in the extent and the
    /// number of elements left in the run.
    pub(crate) fn current_run(&self) -> Option<(u64, u64)> {
        if self.left == 0 {
            return None;
        }
        match &self.cursor {
            Cursor::Done => None,
            Cursor::All { pos } => Some((*pos, self.total - pos)),
            Cursor::Points { idx } => {
                let Selection::Points(p) = self.space.selection() else {
                    return None;
                };
                Some((self.linear(p.point(*idx).iter().copied()), 1))
            }
            Cursor::Regular(c) => {
                let tail = self.strides[c.inner];
                let h = &c.dims[c.inner];
                let span = h.block * tail;
                let b = c.pos / span;
                let within = c.pos % span;
                let mut start = (h.start as u64 + b * h.stride) * tail + within;
                for d in 0..c.inner {
                    let g = &c.dims[d];
                    let k = c.grid[d];
                    let coord = g.start as u64 + (k / g.block) * g.stride + k % g.block;
                    start += coord * self.strides[d];
                }
                Some((start, span - within))
            }
            Cursor::Irregular(c) => {
                let (lo, hi) = c.runs[c.idx];
                let fastest = lo + c.pos as i64;
                let start = self.linear(c.row.iter().copied().chain(std::iter::once(fastest)));
                Some((start, (hi - lo) as u64 + 1 - c.pos))
            }
        }
    }

    /// Move past `n` elements of the current run.
    pub(crate) fn consume(&mut self, n: u64) {
        debug_assert!(n > 0 && n <= self.left);
        self.left -= n;
        if self.left == 0 {
            self.cursor = Cursor::Done;
            return;
        }
        let space = self.space;
        let strides = &self.strides;
        match &mut self.cursor {
            Cursor::Done => {}
            Cursor::All { pos } => *pos += n,
            Cursor::Points { idx } => *idx += n as usize,
            Cursor::Regular(c) => {
                c.pos += n;
                let h = &c.dims[c.inner];
                if c.pos == h.count * h.block * strides[c.inner] {
                    c.pos = 0;
                    let dims = &c.dims;
                    odometer_step(&mut c.grid, |d| dims[d].count * dims[d].block);
                }
            }
            Cursor::Irregular(c) => {
                c.pos += n;
                let (lo, hi) = c.runs[c.idx];
                if c.pos < (hi - lo) as u64 + 1 {
                    return;
                }
                c.pos = 0;
                c.idx += 1;
                if c.idx < c.runs.len() {
                    return;
                }
                let Selection::Hyperslab(Hyperslab::Irregular(list)) = space.selection() else {
                    return;
                };
                let Some(row) = next_row(list, &c.row, &mut c.sweep) else {
                    self.cursor = Cursor::Done;
                    return;
                };
                c.runs = row_runs(list, &row, &c.sweep);
                c.row = row;
                c.idx = 0;
            }
        }
    }

    /// Skip `n` elements.
    ///
    /// # Panics
    ///
    /// If fewer than `n` elements are left.
    pub fn advance(&mut self, mut n: u64) {
        assert!(
            n <= self.left,
            "advance by {n} past the end of the selection ({} left)",
            self.left
        );
        while n > 0 {
            let Some((_, len)) = self.current_run() else {
                break;
            };
            let take = len.min(n);
            self.consume(take);
            n -= take;
        }
    }

    /// Extent coordinates (offset applied) of the next element.
    pub fn coords(&self) -> Option<Vec<u64>> {
        let (start, _) = self.current_run()?;
        Some(self.space.extent().unravel(start))
    }

    /// Next block of the selection, offset applied. Independent of the
    /// element cursor.
    pub fn next_block(&mut self) -> Option<Node> {
        let i = self.next_block;
        let space = self.space;
        let offset = &self.offset;
        let block = match space.selection() {
            Selection::None => None,
            Selection::All => (i == 0 && self.total > 0).then(|| {
                let end = space.dims().iter().map(|&d| d as i64 - 1).collect();
                Node::new(vec![0; space.rank()], end)
            }),
            Selection::Points(p) => (i < p.len() as u64).then(|| {
                let pt = p.point(i as usize);
                translate(Node::new(pt.to_vec(), pt.to_vec()), offset)
            }),
            Selection::Hyperslab(Hyperslab::Regular(r)) => (i < r.nblocks()).then(|| {
                let mut grid = vec![0u64; r.rank()];
                let mut rest = i;
                for d in (0..r.rank()).rev() {
                    let count = r.dims()[d].count;
                    grid[d] = rest % count;
                    rest /= count;
                }
                translate(r.block_at(&grid), offset)
            }),
            Selection::Hyperslab(Hyperslab::Irregular(list)) => {
                let order = self.block_order.get_or_insert_with(|| list.row_major_order());
                order
                    .get(i as usize)
                    .map(|&n| translate(list.nodes()[n].clone(), offset))
            }
        };
        if block.is_some() {
            self.next_block += 1;
        }
        block
    }

    /// Rewind both the element and the block cursor.
    pub fn reset(&mut self) {
        self.left = self.total;
        self.cursor = self.start_cursor();
        self.next_block = 0;
    }
}

fn translate(mut node: Node, offset: &[i64]) -> Node {
    for d in 0..node.rank() {
        node.start[d] = node.start[d].saturating_add(offset[d]);
        node.end[d] = node.end[d].saturating_add(offset[d]);
    }
    node
}

fn first_row(list: &RegionList, sweep: &mut Sweep) -> Option<Vec<i64>> {
    if list.is_empty() {
        return None;
    }
    if list.rank() == 1 {
        return Some(Vec::new());
    }
    seek_row(list, sweep, &vec![i64::MIN; list.rank() - 1])
}

/// The covered row that follows `row` in lexicographic order.
fn next_row(list: &RegionList, row: &[i64], sweep: &mut Sweep) -> Option<Vec<i64>> {
    let (last, prefix) = row.split_last()?;
    let mut from = prefix.to_vec();
    from.push(last.checked_add(1)?);
    seek_row(list, sweep, &from)
}

/// Smallest covered row `>= from` in lexicographic order. Rows are sought
/// in increasing order, so the sweep over dimension 0 only moves forward.
fn seek_row(list: &RegionList, sweep: &mut Sweep, from: &[i64]) -> Option<Vec<i64>> {
    let mut x = *from.first()?;
    let mut tight = true;
    loop {
        sweep.advance_to(list, x);
        if sweep.active().is_empty() {
            x = sweep.next_start(list)?;
            tight = false;
            continue;
        }
        let mut row = Vec::with_capacity(from.len());
        row.push(x);
        if seek_dim(list, sweep.active(), 1, from, tight && x == from[0], &mut row) {
            return Some(row);
        }
        // an unconstrained tail always finds a row
        if !tight {
            return None;
        }
        x = x.checked_add(1)?;
        tight = false;
    }
}

/// Pick coordinate `d` of the row. `tight` means every earlier coordinate
/// equals `from`, so this one may not go below `from[d]`. Once a coordinate
/// exceeds its bound the rest of the row is unconstrained and the first
/// covered value always succeeds, so at most two values are tried per level.
fn seek_dim(
    list: &RegionList,
    candidates: &[usize],
    d: usize,
    from: &[i64],
    tight: bool,
    row: &mut Vec<i64>,
) -> bool {
    if d == from.len() {
        return !candidates.is_empty();
    }
    let nodes = list.nodes();
    let mut lower = tight.then(|| from[d]);
    while let Some(x) = smallest_covered(list, candidates, d, lower) {
        let covering: Vec<usize> = candidates
            .iter()
            .copied()
            .filter(|&i| nodes[i].start[d] <= x && x <= nodes[i].end[d])
            .collect();
        let still_tight = tight && x == from[d];
        row.push(x);
        if seek_dim(list, &covering, d + 1, from, still_tight, row) {
            return true;
        }
        row.pop();
        if !still_tight {
            return false;
        }
        match x.checked_add(1) {
            Some(next) => lower = Some(next),
            None => return false,
        }
    }
    false
}

fn smallest_covered(list: &RegionList, candidates: &[usize], d: usize, lower: Option<i64>) -> Option<i64> {
    let nodes = list.nodes();
    candidates
        .iter()
        .filter_map(|&i| {
            let n = &nodes[i];
            match lower {
                Some(l) if n.end[d] < l => None,
                Some(l) => Some(n.start[d].max(l)),
                None => Some(n.start[d]),
            }
        })
        .min()
}

/// Fastest-dimension intervals of the nodes covering `row`, sorted. `sweep`
/// must sit at `row[0]`.
fn row_runs(list: &RegionList, row: &[i64], sweep: &Sweep) -> Vec<(i64, i64)> {
    let fastest = list.rank() - 1;
    let covers = |i: &usize| {
        let n = &list.nodes()[*i];
        row.iter()
            .enumerate()
            .all(|(d, &x)| n.start[d] <= x && x <= n.end[d])
    };
    let candidates: Vec<usize> = if row.is_empty() {
        (0..list.len()).collect()
    } else {
        sweep.active().to_vec()
    };
    let mut runs: Vec<(i64, i64)> = candidates
        .into_iter()
        .filter(covers)
        .map(|i| {
            let n = &list.nodes()[i];
            (n.start[fastest], n.end[fastest])
        })
        .collect();
    runs.sort_unstable();
    runs
}
