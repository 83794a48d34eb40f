//! Irregular hyperslabs: an explicit list of disjoint rectangular nodes.
//!
//! Nodes live in an arena (`Vec<Node>`) owned by the [`RegionList`]. For
//! every dimension two sorted boundary arrays record the low and the high
//! edge of each node together with the node's arena index, so "which nodes
//! cover coordinate `x` in dimension `d`" is a pair of binary searches.

use super::clip;

/// One rectangular region with inclusive bounds in every dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Node {
    pub start: Vec<i64>,
    pub end: Vec<i64>,
}

impl Node {
    /// Inclusive `start..=end` in every dimension.
    pub fn new(start: Vec<i64>, end: Vec<i64>) -> Self {
        debug_assert_eq!(start.len(), end.len());
        debug_assert!(start.iter().zip(&end).all(|(s, e)| s <= e));
        Node { start, end }
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.start.len()
    }

    /// Number of elements covered.
    pub fn volume(&self) -> u64 {
        self.start
            .iter()
            .zip(&self.end)
            .map(|(&s, &e)| (e - s) as u64 + 1)
            .product()
    }

    /// Overlap in every dimension.
    pub fn intersects(&self, other: &Node) -> bool {
        self.start
            .iter()
            .zip(&self.end)
            .zip(other.start.iter().zip(&other.end))
            .all(|((&s0, &e0), (&s1, &e1))| s0 <= e1 && s1 <= e0)
    }

    /// The overlapping part of two nodes, if any.
    pub fn intersection(&self, other: &Node) -> Option<Node> {
        if !self.intersects(other) {
            return None;
        }
        let start = self
            .start
            .iter()
            .zip(&other.start)
            .map(|(&a, &b)| a.max(b))
            .collect();
        let end = self
            .end
            .iter()
            .zip(&other.end)
            .map(|(&a, &b)| a.min(b))
            .collect();
        Some(Node { start, end })
    }

    /// Is the point `coords` inside the node?
    pub fn contains(&self, coords: &[i64]) -> bool {
        coords
            .iter()
            .zip(self.start.iter().zip(&self.end))
            .all(|(&c, (&s, &e))| s <= c && c <= e)
    }

    pub(crate) fn shift(&mut self, delta: &[i64]) {
        for d in 0..self.rank() {
            self.start[d] -= delta[d];
            self.end[d] -= delta[d];
        }
    }
}

/// Boundary-array entry: an edge coordinate and the arena index of its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bound {
    pub bound: i64,
    pub node: usize,
}

/// Nodes whose dimension-0 projection covers a coordinate that only moves
/// forward. Nodes enter in low-edge order and leave once passed, so a full
/// walk touches each node a bounded number of times.
#[derive(Debug, Clone, Default)]
pub(crate) struct Sweep {
    at: Option<i64>,
    next: usize,
    active: Vec<usize>,
}

impl Sweep {
    /// Move to coordinate `x`, which must not be below the previous one.
    pub(crate) fn advance_to(&mut self, list: &RegionList, x: i64) {
        debug_assert!(self.at.map_or(true, |at| at <= x));
        let lo = list.lo_bounds(0);
        while let Some(b) = lo.get(self.next).filter(|b| b.bound <= x) {
            self.active.push(b.node);
            self.next += 1;
        }
        let nodes = list.nodes();
        self.active.retain(|&i| nodes[i].end[0] >= x);
        self.at = Some(x);
    }

    /// Arena indices of the nodes covering the current coordinate.
    pub(crate) fn active(&self) -> &[usize] {
        &self.active
    }

    /// Low edge of the next node still to enter.
    pub(crate) fn next_start(&self, list: &RegionList) -> Option<i64> {
        list.lo_bounds(0).get(self.next).map(|b| b.bound)
    }
}

/// Disjoint node list with per-dimension boundary arrays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionList {
    rank: usize,
    nodes: Vec<Node>,
    lo_bounds: Vec<Vec<Bound>>,
    hi_bounds: Vec<Vec<Bound>>,
    num_elem: u64,
}

impl RegionList {
    /// An empty list of the given rank.
    pub fn new(rank: usize) -> Self {
        RegionList {
            rank,
            nodes: Vec::new(),
            lo_bounds: vec![Vec::new(); rank],
            hi_bounds: vec![Vec::new(); rank],
            num_elem: 0,
        }
    }

    /// Build from nodes already known to be pairwise disjoint; boundary
    /// arrays are sorted once instead of per insertion.
    pub(crate) fn from_disjoint(rank: usize, nodes: Vec<Node>) -> Self {
        let mut lo_bounds = vec![Vec::with_capacity(nodes.len()); rank];
        let mut hi_bounds = vec![Vec::with_capacity(nodes.len()); rank];
        let mut num_elem = 0u64;
        for (i, n) in nodes.iter().enumerate() {
            for d in 0..rank {
                lo_bounds[d].push(Bound { bound: n.start[d], node: i });
                hi_bounds[d].push(Bound { bound: n.end[d], node: i });
            }
            num_elem += n.volume();
        }
        for d in 0..rank {
            lo_bounds[d].sort_unstable();
            hi_bounds[d].sort_unstable();
        }
        RegionList {
            rank,
            nodes,
            lo_bounds,
            hi_bounds,
            num_elem,
        }
    }

    /// Number of dimensions of every node.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// The node arena, in insertion order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Selected elements, kept up to date on every insertion.
    pub fn num_elem(&self) -> u64 {
        self.num_elem
    }

    /// Sorted low edges of all nodes in dimension `dim`.
    pub fn lo_bounds(&self, dim: usize) -> &[Bound] {
        &self.lo_bounds[dim]
    }

    /// Sorted high edges of all nodes in dimension `dim`.
    pub fn hi_bounds(&self, dim: usize) -> &[Bound] {
        &self.hi_bounds[dim]
    }

    /// Append a node that overlaps none of the existing ones.
    pub(crate) fn push_disjoint(&mut self, node: Node) {
        let idx = self.nodes.len();
        for d in 0..self.rank {
            let lo = Bound { bound: node.start[d], node: idx };
            let at = self.lo_bounds[d].partition_point(|b| *b < lo);
            self.lo_bounds[d].insert(at, lo);
            let hi = Bound { bound: node.end[d], node: idx };
            let at = self.hi_bounds[d].partition_point(|b| *b < hi);
            self.hi_bounds[d].insert(at, hi);
        }
        self.num_elem += node.volume();
        self.nodes.push(node);
    }

    /// Union `node` into the list. Parts already covered are clipped away;
    /// the surviving pieces are appended. Returns the number of elements
    /// actually added.
    pub fn add(&mut self, node: Node) -> u64 {
        debug_assert_eq!(node.rank(), self.rank);
        let mut pending = vec![node];
        let mut scratch = Vec::new();
        for hole in &self.nodes {
            if pending.is_empty() {
                break;
            }
            scratch.clear();
            for piece in pending.drain(..) {
                clip::subtract(&piece, hole, &mut scratch);
            }
            std::mem::swap(&mut pending, &mut scratch);
        }
        let mut added = 0;
        for piece in pending {
            added += piece.volume();
            self.push_disjoint(piece);
        }
        added
    }

    /// Arena indices of nodes whose projection on `dim` contains `x`.
    pub fn nodes_at(&self, dim: usize, x: i64) -> Vec<usize> {
        let lo = &self.lo_bounds[dim];
        let hi = &self.hi_bounds[dim];
        // lo[..n_lo] start at or before x; hi[first_hi..] end at or after x
        let n_lo = lo.partition_point(|b| b.bound <= x);
        let first_hi = hi.partition_point(|b| b.bound < x);
        let mut found: Vec<usize> = if n_lo <= hi.len() - first_hi {
            lo[..n_lo]
                .iter()
                .filter(|b| self.nodes[b.node].end[dim] >= x)
                .map(|b| b.node)
                .collect()
        } else {
            hi[first_hi..]
                .iter()
                .filter(|b| self.nodes[b.node].start[dim] <= x)
                .map(|b| b.node)
                .collect()
        };
        found.sort_unstable();
        found
    }

    /// Bounding box, read off the ends of the boundary arrays.
    pub fn bounds(&self) -> Option<(Vec<i64>, Vec<i64>)> {
        if self.nodes.is_empty() {
            return None;
        }
        let lo = self.lo_bounds.iter().map(|b| b[0].bound).collect();
        let hi = self
            .hi_bounds
            .iter()
            .map(|b| b[b.len() - 1].bound)
            .collect();
        Some((lo, hi))
    }

    /// Node indices ordered by their start corner, slowest dimension first.
    pub fn row_major_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.nodes.len()).collect();
        order.sort_by(|&a, &b| self.nodes[a].start.cmp(&self.nodes[b].start));
        order
    }

    /// Translate every node by `-delta`.
    pub(crate) fn shift(&mut self, delta: &[i64]) {
        for n in &mut self.nodes {
            n.shift(delta);
        }
        for d in 0..self.rank {
            for b in self.lo_bounds[d].iter_mut().chain(self.hi_bounds[d].iter_mut()) {
                b.bound -= delta[d];
            }
        }
    }

    /// Does any node touch the inclusive block `[start, end]`?
    pub fn intersects_block(&self, block: &Node) -> bool {
        let lo = &self.lo_bounds[0];
        let hi = &self.hi_bounds[0];
        // lo[..n_lo] start at or before the block ends; hi[first_hi..] end
        // at or after it starts
        let n_lo = lo.partition_point(|b| b.bound <= block.end[0]);
        let first_hi = hi.partition_point(|b| b.bound < block.start[0]);
        let side = if n_lo <= hi.len() - first_hi {
            &lo[..n_lo]
        } else {
            &hi[first_hi..]
        };
        side.iter().any(|b| self.nodes[b.node].intersects(block))
    }

    /// Check the structural invariants: nodes pairwise disjoint, element
    /// count equal to the summed volumes, boundary arrays sorted and
    /// consistent with the arena. Quadratic; meant for tests.
    pub fn verify(&self) -> bool {
        let volume: u64 = self.nodes.iter().map(Node::volume).sum();
        if volume != self.num_elem {
            return false;
        }
        for (i, a) in self.nodes.iter().enumerate() {
            if a.rank() != self.rank {
                return false;
            }
            if self.nodes[i + 1..].iter().any(|b| a.intersects(b)) {
                return false;
            }
        }
        for d in 0..self.rank {
            let (lo, hi) = (&self.lo_bounds[d], &self.hi_bounds[d]);
            if lo.len() != self.nodes.len() || hi.len() != self.nodes.len() {
                return false;
            }
            if lo.windows(2).any(|w| w[0] > w[1]) || hi.windows(2).any(|w| w[0] > w[1]) {
                return false;
            }
            if lo.iter().any(|b| self.nodes[b.node].start[d] != b.bound)
                || hi.iter().any(|b| self.nodes[b.node].end[d] != b.bound)
            {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(start: &[i64], end: &[i64]) -> Node {
        Node::new(start.to_vec(), end.to_vec())
    }

    #[test]
    fn node_geometry() {
        let a = node(&[0, 0], &[3, 4]);
        let b = node(&[2, 4], &[5, 9]);
        assert_eq!(a.volume(), 20);
        assert!(a.intersects(&b));
        assert_eq!(a.intersection(&b), Some(node(&[2, 4], &[3, 4])));
        assert!(!a.intersects(&node(&[4, 0], &[4, 0])));
        assert!(a.contains(&[3, 4]));
        assert!(!a.contains(&[3, 5]));
    }

    #[test]
    fn push_keeps_bounds_sorted() {
        let mut list = RegionList::new(1);
        list.push_disjoint(node(&[10], &[14]));
        list.push_disjoint(node(&[0], &[4]));
        list.push_disjoint(node(&[20], &[20]));
        assert_eq!(list.num_elem(), 11);
        let lo: Vec<i64> = list.lo_bounds(0).iter().map(|b| b.bound).collect();
        assert_eq!(lo, vec![0, 10, 20]);
        assert_eq!(list.lo_bounds(0)[0].node, 1);
        assert!(list.verify());
        assert_eq!(list.bounds(), Some((vec![0], vec![20])));
    }

    #[test]
    fn add_clips_overlap() {
        let mut list = RegionList::new(2);
        assert_eq!(list.add(node(&[0, 0], &[3, 3])), 16);
        // overlaps the 2x2 corner [2..3, 2..3]
        assert_eq!(list.add(node(&[2, 2], &[5, 5])), 12);
        assert_eq!(list.num_elem(), 28);
        assert!(list.verify());
        // fully covered: nothing added
        assert_eq!(list.add(node(&[1, 1], &[2, 2])), 0);
        assert_eq!(list.num_elem(), 28);
    }

    #[test]
    fn nodes_at_uses_both_edges() {
        let list = RegionList::from_disjoint(
            2,
            vec![
                node(&[0, 0], &[1, 9]),
                node(&[2, 0], &[4, 3]),
                node(&[2, 5], &[6, 6]),
                node(&[8, 0], &[8, 0]),
            ],
        );
        assert_eq!(list.nodes_at(0, 0), vec![0]);
        assert_eq!(list.nodes_at(0, 3), vec![1, 2]);
        assert_eq!(list.nodes_at(0, 5), vec![2]);
        assert!(list.nodes_at(0, 7).is_empty());
        assert_eq!(list.nodes_at(1, 0), vec![0, 1, 3]);
    }

    #[test]
    fn sweep_tracks_covering_nodes() {
        let list = RegionList::from_disjoint(
            2,
            vec![
                node(&[0, 0], &[1, 9]),
                node(&[2, 0], &[4, 3]),
                node(&[2, 5], &[6, 6]),
                node(&[8, 0], &[8, 0]),
            ],
        );
        let mut sweep = Sweep::default();
        sweep.advance_to(&list, i64::MIN);
        assert!(sweep.active().is_empty());
        assert_eq!(sweep.next_start(&list), Some(0));
        sweep.advance_to(&list, 1);
        assert_eq!(sweep.active(), &[0]);
        sweep.advance_to(&list, 3);
        let mut active = sweep.active().to_vec();
        active.sort_unstable();
        assert_eq!(active, vec![1, 2]);
        sweep.advance_to(&list, 5);
        assert_eq!(sweep.active(), &[2]);
        sweep.advance_to(&list, 7);
        assert!(sweep.active().is_empty());
        assert_eq!(sweep.next_start(&list), Some(8));
        sweep.advance_to(&list, 9);
        assert!(sweep.active().is_empty());
        assert_eq!(sweep.next_start(&list), None);
    }

    #[test]
    fn shift_moves_nodes_and_bounds() {
        let mut list = RegionList::from_disjoint(1, vec![node(&[5], &[7]), node(&[10], &[10])]);
        list.shift(&[5]);
        assert_eq!(list.nodes()[0], node(&[0], &[2]));
        assert_eq!(list.bounds(), Some((vec![0], vec![5])));
        assert!(list.verify());
    }

    #[test]
    fn row_major_order_sorts_by_start() {
        let list = RegionList::from_disjoint(
            2,
            vec![node(&[3, 0], &[3, 1]), node(&[0, 5], &[0, 6]), node(&[0, 0], &[0, 1])],
        );
        assert_eq!(list.row_major_order(), vec![2, 1, 0]);
    }

    #[test]
    fn intersects_block_query() {
        let list = RegionList::from_disjoint(2, vec![node(&[0, 0], &[1, 1]), node(&[5, 5], &[6, 6])]);
        assert!(list.intersects_block(&node(&[1, 1], &[3, 3])));
        assert!(!list.intersects_block(&node(&[2, 2], &[4, 4])));
        assert!(list.intersects_block(&node(&[6, 0], &[9, 5])));
    }
}
