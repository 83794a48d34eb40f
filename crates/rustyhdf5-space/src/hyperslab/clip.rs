//! Clipping rectangles against each other, and the set algebra built on it.
//!
//! Every operation here takes pairwise-disjoint inputs and produces a
//! pairwise-disjoint [`RegionList`]. Adjacent nodes are never merged.

use super::region::{Node, RegionList};
use super::SelectOp;

/// How a candidate interval `[new_lo, new_hi]` sits relative to an existing
/// one `[old_lo, old_hi]` in a single dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Overlap {
    NoOverlap,
    /// Candidate sticks out on both sides.
    OverlapBoth,
    /// Candidate sticks out below only.
    OverlapLower,
    /// Candidate sticks out above only.
    OverlapUpper,
    /// Candidate lies inside.
    Within,
}

pub(crate) fn classify(new_lo: i64, new_hi: i64, old_lo: i64, old_hi: i64) -> Overlap {
    if new_hi < old_lo || new_lo > old_hi {
        Overlap::NoOverlap
    } else if new_lo < old_lo && new_hi > old_hi {
        Overlap::OverlapBoth
    } else if new_lo < old_lo {
        Overlap::OverlapLower
    } else if new_hi > old_hi {
        Overlap::OverlapUpper
    } else {
        Overlap::Within
    }
}

/// Push onto `out` the parts of `piece` that lie outside `hole`.
///
/// Dimensions are processed slowest first: each one splits off the slab(s)
/// sticking out of `hole` and narrows the remaining core to the overlap.
/// Once every dimension is narrowed the core is inside `hole` and dropped.
pub(crate) fn subtract(piece: &Node, hole: &Node, out: &mut Vec<Node>) {
    if !piece.intersects(hole) {
        out.push(piece.clone());
        return;
    }
    let mut core = piece.clone();
    for d in 0..core.rank() {
        let (lo, hi) = (hole.start[d], hole.end[d]);
        match classify(core.start[d], core.end[d], lo, hi) {
            Overlap::NoOverlap => {
                out.push(core);
                return;
            }
            Overlap::OverlapBoth => {
                out.push(slab(&core, d, core.start[d], lo - 1));
                out.push(slab(&core, d, hi + 1, core.end[d]));
                core.start[d] = lo;
                core.end[d] = hi;
            }
            Overlap::OverlapLower => {
                out.push(slab(&core, d, core.start[d], lo - 1));
                core.start[d] = lo;
            }
            Overlap::OverlapUpper => {
                out.push(slab(&core, d, hi + 1, core.end[d]));
                core.end[d] = hi;
            }
            Overlap::Within => {}
        }
    }
}

fn slab(core: &Node, dim: usize, lo: i64, hi: i64) -> Node {
    let mut n = core.clone();
    n.start[dim] = lo;
    n.end[dim] = hi;
    n
}

/// `a ∪ b`: nodes of `a`, then the clipped remainders of `b`.
pub(crate) fn union(a: &RegionList, b: &RegionList) -> RegionList {
    let mut out = a.clone();
    for n in b.nodes() {
        out.add(n.clone());
    }
    out
}

/// `a ∩ b`.
pub(crate) fn intersection(a: &RegionList, b: &RegionList) -> RegionList {
    let mut nodes = Vec::new();
    for x in a.nodes() {
        for y in b.nodes() {
            if let Some(i) = x.intersection(y) {
                nodes.push(i);
            }
        }
    }
    RegionList::from_disjoint(a.rank(), nodes)
}

fn difference_nodes(a: &RegionList, b: &RegionList, nodes: &mut Vec<Node>) {
    let mut pending = Vec::new();
    let mut scratch = Vec::new();
    for x in a.nodes() {
        pending.clear();
        pending.push(x.clone());
        for hole in b.nodes() {
            if pending.is_empty() {
                break;
            }
            scratch.clear();
            for piece in pending.drain(..) {
                subtract(&piece, hole, &mut scratch);
            }
            std::mem::swap(&mut pending, &mut scratch);
        }
        nodes.append(&mut pending);
    }
}

/// `a \ b`.
pub(crate) fn difference(a: &RegionList, b: &RegionList) -> RegionList {
    let mut nodes = Vec::new();
    difference_nodes(a, b, &mut nodes);
    RegionList::from_disjoint(a.rank(), nodes)
}

/// `(a \ b) ∪ (b \ a)`.
pub(crate) fn symmetric_difference(a: &RegionList, b: &RegionList) -> RegionList {
    let mut nodes = Vec::new();
    difference_nodes(a, b, &mut nodes);
    difference_nodes(b, a, &mut nodes);
    RegionList::from_disjoint(a.rank(), nodes)
}

/// Apply `op` with `existing` on the left and `new` on the right.
pub(crate) fn combine(existing: &RegionList, new: &RegionList, op: SelectOp) -> RegionList {
    match op {
        SelectOp::Set => new.clone(),
        SelectOp::Or => union(existing, new),
        SelectOp::And => intersection(existing, new),
        SelectOp::Xor => symmetric_difference(existing, new),
        SelectOp::NotB => difference(existing, new),
        SelectOp::NotA => difference(new, existing),
    }
}
