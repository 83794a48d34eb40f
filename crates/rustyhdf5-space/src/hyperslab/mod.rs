//! Hyperslab selections.
//!
//! A hyperslab is held in exactly one of two forms:
//!
//! - [`RegularHyperslab`]: one `(start, stride, count, block)` descriptor per
//!   dimension, as produced by a single `select_hyperslab(Set, ..)` call.
//! - [`RegionList`]: an explicit list of disjoint rectangular nodes, needed
//!   as soon as two regions are combined.
//!
//! Combining always goes through the node form; see [`clip`].

pub(crate) mod clip;
pub mod region;

pub use region::{Bound, Node, RegionList};

use crate::error::{Result, SpaceError};
use crate::extent::MAX_RANK;

/// How a new hyperslab combines with the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectOp {
    /// Replace the selection.
    Set,
    /// Union.
    Or,
    /// Intersection.
    And,
    /// Symmetric difference.
    Xor,
    /// Current selection minus the new region.
    NotB,
    /// New region minus the current selection.
    NotA,
}

/// Per-dimension hyperslab parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HyperDim {
    pub start: i64,
    pub stride: u64,
    pub count: u64,
    pub block: u64,
}

impl HyperDim {
    /// A descriptor exactly as given; see [`normalized`](Self::normalized).
    pub fn new(start: i64, stride: u64, count: u64, block: u64) -> Self {
        HyperDim {
            start,
            stride,
            count,
            block,
        }
    }

    /// A single run of `len` elements starting at `start`.
    pub fn contiguous(start: i64, len: u64) -> Self {
        HyperDim::new(start, 1, 1, len)
    }

    /// Collapse `stride == block` into one block, and drop a meaningless
    /// stride when there is only one block.
    pub fn normalized(self) -> Self {
        if self.stride == self.block {
            HyperDim::new(self.start, 1, 1, self.count * self.block)
        } else if self.count == 1 {
            HyperDim::new(self.start, 1, 1, self.block)
        } else {
            self
        }
    }

    /// Selected coordinates along this dimension.
    pub fn num_elem(&self) -> u64 {
        self.count * self.block
    }

    /// Last selected coordinate.
    pub fn last(&self) -> i64 {
        self.start + (self.stride * (self.count - 1) + self.block - 1) as i64
    }

    /// First coordinate of block `b`.
    pub fn block_start(&self, b: u64) -> i64 {
        self.start + (b * self.stride) as i64
    }
}

/// Single strided grid of blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegularHyperslab {
    dims: Vec<HyperDim>,
    /// Parameters as the caller supplied them.
    app: Vec<HyperDim>,
    num_elem: u64,
}

impl RegularHyperslab {
    /// Validate and normalize caller parameters. `Ok(None)` means the
    /// request selects nothing (`count` or `block` is zero somewhere).
    pub fn new(app: Vec<HyperDim>) -> Result<Option<Self>> {
        if app.is_empty() || app.len() > MAX_RANK {
            return Err(SpaceError::argument(format!(
                "hyperslab rank must be 1..={MAX_RANK}, got {}",
                app.len()
            )));
        }
        for (d, h) in app.iter().enumerate() {
            if h.stride == 0 {
                return Err(SpaceError::argument(format!("stride in dimension {d} is zero")));
            }
        }
        if app.iter().any(|h| h.count == 0 || h.block == 0) {
            return Ok(None);
        }
        let mut num_elem: u64 = 1;
        for (d, h) in app.iter().enumerate() {
            if h.count > 1 && h.stride < h.block {
                return Err(SpaceError::OverlappingBlocks {
                    dim: d,
                    stride: h.stride,
                    block: h.block,
                });
            }
            let span = (h.stride as i128) * (h.count as i128 - 1) + h.block as i128 - 1;
            let last = h.start as i128 + span;
            if span > i64::MAX as i128 || last > i64::MAX as i128 {
                return Err(SpaceError::argument(format!(
                    "hyperslab in dimension {d} extends past the coordinate range"
                )));
            }
            num_elem = h
                .count
                .checked_mul(h.block)
                .and_then(|n| num_elem.checked_mul(n))
                .ok_or_else(|| SpaceError::argument("hyperslab element count overflows u64"))?;
        }
        let dims = app.iter().map(|h| h.normalized()).collect();
        Ok(Some(RegularHyperslab {
            dims,
            app,
            num_elem,
        }))
    }

    /// Regular descriptor of one inclusive block.
    pub(crate) fn from_node(node: &Node) -> Self {
        let dims: Vec<HyperDim> = node
            .start
            .iter()
            .zip(&node.end)
            .map(|(&s, &e)| HyperDim::contiguous(s, (e - s) as u64 + 1))
            .collect();
        RegularHyperslab {
            app: dims.clone(),
            num_elem: node.volume(),
            dims,
        }
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Normalized descriptor.
    pub fn dims(&self) -> &[HyperDim] {
        &self.dims
    }

    /// Descriptor as originally requested.
    pub fn app_dims(&self) -> &[HyperDim] {
        &self.app
    }

    /// Product of `count * block` over all dimensions.
    pub fn num_elem(&self) -> u64 {
        self.num_elem
    }

    /// Number of blocks in the grid.
    pub fn nblocks(&self) -> u64 {
        self.dims.iter().map(|h| h.count).product()
    }

    /// Does the grid hold exactly one block?
    pub fn is_single_block(&self) -> bool {
        self.dims.iter().all(|h| h.count == 1)
    }

    /// The block at grid position `grid` (one block index per dimension).
    pub fn block_at(&self, grid: &[u64]) -> Node {
        let start: Vec<i64> = self
            .dims
            .iter()
            .zip(grid)
            .map(|(h, &b)| h.block_start(b))
            .collect();
        let end = start
            .iter()
            .zip(&self.dims)
            .map(|(&s, h)| s + h.block as i64 - 1)
            .collect();
        Node::new(start, end)
    }

    /// First and last selected coordinate per dimension.
    pub fn bounds(&self) -> (Vec<i64>, Vec<i64>) {
        (
            self.dims.iter().map(|h| h.start).collect(),
            self.dims.iter().map(HyperDim::last).collect(),
        )
    }

    /// All blocks in grid order (slowest dimension first).
    pub fn blocks(&self) -> Result<Vec<Node>> {
        let n = usize::try_from(self.nblocks())
            .map_err(|_| SpaceError::Resource("block count exceeds address space".into()))?;
        let mut out = Vec::new();
        out.try_reserve_exact(n)?;
        let mut grid = vec![0u64; self.rank()];
        for _ in 0..n {
            out.push(self.block_at(&grid));
            odometer_step(&mut grid, |d| self.dims[d].count);
        }
        Ok(out)
    }

    /// Expand into an equivalent node list, one node per block.
    pub fn to_region_list(&self) -> Result<RegionList> {
        Ok(RegionList::from_disjoint(self.rank(), self.blocks()?))
    }

    pub(crate) fn shift(&mut self, delta: &[i64]) {
        for (h, &dl) in self.dims.iter_mut().zip(delta) {
            h.start -= dl;
        }
        for (h, &dl) in self.app.iter_mut().zip(delta) {
            h.start -= dl;
        }
    }

    /// Does any selected block touch `block`?
    pub fn intersects_block(&self, block: &Node) -> bool {
        self.dims.iter().enumerate().all(|(d, h)| {
            let (lo, hi) = (block.start[d], block.end[d]);
            if hi < h.start || lo > h.last() {
                return false;
            }
            // first block whose end reaches lo
            let rel = (lo - h.start).max(0) as u64;
            let mut b = rel / h.stride;
            if b < h.count && h.block_start(b) + h.block as i64 - 1 < lo {
                b += 1;
            }
            b < h.count && h.block_start(b) <= hi
        })
    }
}

/// Advance a row-major multi-index; returns `false` once it wraps to zero.
pub(crate) fn odometer_step(idx: &mut [u64], limit: impl Fn(usize) -> u64) -> bool {
    for d in (0..idx.len()).rev() {
        idx[d] += 1;
        if idx[d] < limit(d) {
            return true;
        }
        idx[d] = 0;
    }
    false
}

/// Hyperslab selection in one of its two representations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hyperslab {
    Regular(RegularHyperslab),
    Irregular(RegionList),
}

impl Hyperslab {
    /// Number of dimensions, whichever form is held.
    pub fn rank(&self) -> usize {
        match self {
            Hyperslab::Regular(r) => r.rank(),
            Hyperslab::Irregular(l) => l.rank(),
        }
    }

    /// Selected elements, whichever form is held.
    pub fn num_elem(&self) -> u64 {
        match self {
            Hyperslab::Regular(r) => r.num_elem(),
            Hyperslab::Irregular(l) => l.num_elem(),
        }
    }

    /// Is the descriptor form held?
    pub fn is_regular(&self) -> bool {
        matches!(self, Hyperslab::Regular(_))
    }

    /// Bounding box; `None` for an empty node list.
    pub fn bounds(&self) -> Option<(Vec<i64>, Vec<i64>)> {
        match self {
            Hyperslab::Regular(r) => Some(r.bounds()),
            Hyperslab::Irregular(l) => l.bounds(),
        }
    }

    /// Grid blocks for the regular form, nodes for the irregular one.
    pub fn nblocks(&self) -> u64 {
        match self {
            Hyperslab::Regular(r) => r.nblocks(),
            Hyperslab::Irregular(l) => l.len() as u64,
        }
    }

    /// Blocks in row-major order of their start corners.
    pub fn blocks(&self) -> Result<Vec<Node>> {
        match self {
            Hyperslab::Regular(r) => r.blocks(),
            Hyperslab::Irregular(l) => Ok(l
                .row_major_order()
                .into_iter()
                .map(|i| l.nodes()[i].clone())
                .collect()),
        }
    }

    /// Node form of this hyperslab, materializing a regular grid.
    pub fn to_region_list(&self) -> Result<RegionList> {
        match self {
            Hyperslab::Regular(r) => r.to_region_list(),
            Hyperslab::Irregular(l) => Ok(l.clone()),
        }
    }

    /// Regular descriptor when one describes the selection exactly.
    pub fn regular_descriptor(&self) -> Option<Vec<HyperDim>> {
        match self {
            Hyperslab::Regular(r) => Some(r.dims().to_vec()),
            Hyperslab::Irregular(l) if l.len() == 1 => {
                Some(RegularHyperslab::from_node(&l.nodes()[0]).dims)
            }
            Hyperslab::Irregular(_) => None,
        }
    }

    /// Does any selected element fall inside `block`?
    pub fn intersects_block(&self, block: &Node) -> bool {
        match self {
            Hyperslab::Regular(r) => r.intersects_block(block),
            Hyperslab::Irregular(l) => l.intersects_block(block),
        }
    }

    pub(crate) fn shift(&mut self, delta: &[i64]) {
        match self {
            Hyperslab::Regular(r) => r.shift(delta),
            Hyperslab::Irregular(l) => l.shift(delta),
        }
    }
}
