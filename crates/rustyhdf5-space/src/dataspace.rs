//! Dataspaces: an extent plus the selection made within it.

use tracing::debug;

use crate::error::{Result, SpaceError};
use crate::extent::Extent;
use crate::hyperslab::{clip, HyperDim, Hyperslab, Node, RegionList, RegularHyperslab, SelectOp};
use crate::iter::SelectionIter;
use crate::points::PointList;
use crate::selection::{Selection, SelectionKind};

/// How new points combine with an existing point selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointOp {
    /// Replace the selection.
    Set,
    /// Add after the existing points.
    Append,
    /// Add before the existing points.
    Prepend,
}

/// An extent, the selection within it, and a per-dimension offset that
/// shifts point and hyperslab selections at use time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataspace {
    extent: Extent,
    selection: Selection,
    offset: Vec<i64>,
}

impl Dataspace {
    /// A dataspace over `extent` with everything selected.
    pub fn new(extent: Extent) -> Self {
        let rank = extent.rank();
        Dataspace {
            extent,
            selection: Selection::All,
            offset: vec![0; rank],
        }
    }

    /// A simple extent of `dims` with everything selected.
    pub fn simple(dims: &[u64]) -> Result<Self> {
        Ok(Self::new(Extent::simple(dims)?))
    }

    /// A scalar dataspace holding one element.
    pub fn scalar() -> Self {
        Self::new(Extent::scalar())
    }

    /// A null dataspace; nothing can be selected.
    pub fn null() -> Self {
        Self::new(Extent::null())
    }

    pub(crate) fn from_parts(extent: Extent, selection: Selection) -> Self {
        let mut space = Self::new(extent);
        space.selection = selection;
        space
    }

    /// The shape the selection lives in.
    pub fn extent(&self) -> &Extent {
        &self.extent
    }

    /// Rank of the extent.
    pub fn rank(&self) -> usize {
        self.extent.rank()
    }

    /// Current dimension sizes.
    pub fn dims(&self) -> &[u64] {
        self.extent.dims()
    }

    /// The current selection, without offset.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Kind of the current selection.
    pub fn selection_kind(&self) -> SelectionKind {
        self.selection.kind()
    }

    /// Number of selected elements.
    pub fn num_elem(&self) -> u64 {
        self.selection.num_elements(&self.extent)
    }

    fn require_simple(&self, what: &str) -> Result<()> {
        if !self.extent.is_simple() {
            return Err(SpaceError::unsupported(format!(
                "{what} requires a simple extent, have {:?}",
                self.extent.class()
            )));
        }
        Ok(())
    }

    fn check_rank(&self, got: usize) -> Result<()> {
        if got != self.rank() {
            return Err(SpaceError::RankMismatch {
                expected: self.rank(),
                got,
            });
        }
        Ok(())
    }

    fn set_selection(&mut self, selection: Selection) {
        debug!(
            kind = ?selection.kind(),
            num_elem = selection.num_elements(&self.extent),
            "selection changed"
        );
        self.selection = selection;
    }

    /// Select every element of the extent.
    pub fn select_all(&mut self) {
        self.set_selection(Selection::All);
    }

    /// Clear the selection.
    pub fn select_none(&mut self) {
        self.set_selection(Selection::None);
    }

    /// Select individual points. `Append` and `Prepend` extend an existing
    /// point selection; on any other selection they behave like `Set`.
    pub fn select_elements(&mut self, op: PointOp, points: &[Vec<u64>]) -> Result<()> {
        self.require_simple("point selection")?;
        let list = PointList::new(self.rank(), points)?;
        match (op, &mut self.selection) {
            (PointOp::Append, Selection::Points(cur)) => cur.append(list)?,
            (PointOp::Prepend, Selection::Points(cur)) => cur.prepend(list)?,
            _ => {
                self.set_selection(Selection::Points(list));
                return Ok(());
            }
        }
        debug!(op = ?op, num_elem = self.num_elem(), "points added");
        Ok(())
    }

    /// Combine a strided block pattern with the current selection.
    ///
    /// `stride` and `block` default to all ones.
    pub fn select_hyperslab(
        &mut self,
        op: SelectOp,
        start: &[u64],
        stride: Option<&[u64]>,
        count: &[u64],
        block: Option<&[u64]>,
    ) -> Result<()> {
        let region = self.build_regular(start, stride, count, block)?;
        let selection = self.apply_region(op, region)?;
        self.set_selection(selection);
        Ok(())
    }

    /// Combine the single inclusive block `[start, end]` with the current
    /// selection.
    pub fn select_block(&mut self, op: SelectOp, start: &[u64], end: &[u64]) -> Result<()> {
        self.check_rank(end.len())?;
        let mut count = Vec::with_capacity(end.len());
        for (d, (&s, &e)) in start.iter().zip(end).enumerate() {
            if e < s {
                return Err(SpaceError::argument(format!(
                    "block end {e} precedes start {s} in dimension {d}"
                )));
            }
            count.push(e - s + 1);
        }
        self.select_hyperslab(op, start, None, &count, None)
    }

    /// Like [`select_hyperslab`](Self::select_hyperslab) but returns a new
    /// dataspace and leaves `self` untouched.
    pub fn combine_hyperslab(
        &self,
        op: SelectOp,
        start: &[u64],
        stride: Option<&[u64]>,
        count: &[u64],
        block: Option<&[u64]>,
    ) -> Result<Dataspace> {
        let mut out = self.clone();
        out.select_hyperslab(op, start, stride, count, block)?;
        Ok(out)
    }

    fn build_regular(
        &self,
        start: &[u64],
        stride: Option<&[u64]>,
        count: &[u64],
        block: Option<&[u64]>,
    ) -> Result<Option<RegularHyperslab>> {
        self.require_simple("hyperslab selection")?;
        let rank = self.rank();
        self.check_rank(start.len())?;
        self.check_rank(count.len())?;
        if let Some(s) = stride {
            self.check_rank(s.len())?;
        }
        if let Some(b) = block {
            self.check_rank(b.len())?;
        }
        let mut app = Vec::with_capacity(rank);
        for d in 0..rank {
            let s = i64::try_from(start[d]).map_err(|_| {
                SpaceError::argument(format!("start {} in dimension {d} is too large", start[d]))
            })?;
            app.push(HyperDim::new(
                s,
                stride.map_or(1, |v| v[d]),
                count[d],
                block.map_or(1, |v| v[d]),
            ));
        }
        RegularHyperslab::new(app)
    }

    fn apply_region(&self, op: SelectOp, new: Option<RegularHyperslab>) -> Result<Selection> {
        let install = |new: Option<RegularHyperslab>| match new {
            Some(r) => Selection::Hyperslab(Hyperslab::Regular(r)),
            None => Selection::None,
        };
        match (op, &self.selection) {
            (SelectOp::Set, _) => Ok(install(new)),
            (_, Selection::Points(_)) => Err(SpaceError::unsupported(format!(
                "hyperslab operation {op:?} on a point selection"
            ))),
            (SelectOp::Or | SelectOp::Xor | SelectOp::NotA, Selection::None) => Ok(install(new)),
            (SelectOp::And | SelectOp::NotB, Selection::None) => Ok(Selection::None),
            (SelectOp::Or, Selection::All) => Ok(Selection::All),
            (SelectOp::And, Selection::All) => Ok(install(new)),
            (SelectOp::NotA, Selection::All) => Ok(Selection::None),
            (_, Selection::All) => {
                let existing = self.all_region();
                combine_regions(&existing, new.as_ref(), self.rank(), op)
            }
            (_, Selection::Hyperslab(h)) => {
                let existing = h.to_region_list()?;
                combine_regions(&existing, new.as_ref(), self.rank(), op)
            }
        }
    }

    /// The whole extent as one node.
    fn all_region(&self) -> RegionList {
        let rank = self.rank();
        if self.extent.num_elements() == 0 {
            return RegionList::new(rank);
        }
        let end = self.dims().iter().map(|&d| d as i64 - 1).collect();
        RegionList::from_disjoint(rank, vec![Node::new(vec![0; rank], end)])
    }

    /// Combine with another dataspace's hyperslab selection in place.
    pub fn modify_select(&mut self, op: SelectOp, other: &Dataspace) -> Result<()> {
        let (Selection::Hyperslab(a), Selection::Hyperslab(b)) = (&self.selection, &other.selection)
        else {
            return Err(SpaceError::unsupported(
                "selection combination requires hyperslab selections on both sides",
            ));
        };
        self.check_rank(other.rank())?;
        let selection = if op == SelectOp::Set {
            other.selection.clone()
        } else {
            let b = b.to_region_list()?;
            region_selection(clip::combine(&a.to_region_list()?, &b, op))
        };
        self.set_selection(selection);
        Ok(())
    }

    /// Like [`modify_select`](Self::modify_select) but returns a new dataspace.
    pub fn combine_select(&self, op: SelectOp, other: &Dataspace) -> Result<Dataspace> {
        let mut out = self.clone();
        out.modify_select(op, other)?;
        Ok(out)
    }

    /// Per-dimension offset added to the selection on access.
    pub fn offset(&self) -> &[i64] {
        &self.offset
    }

    /// Set the use-time offset. Ignored by `All` and `None` selections.
    pub fn set_offset(&mut self, offset: &[i64]) -> Result<()> {
        self.check_rank(offset.len())?;
        self.offset.copy_from_slice(offset);
        Ok(())
    }

    /// Permanently subtract `shift` from every selected coordinate.
    pub fn adjust(&mut self, shift: &[i64]) -> Result<()> {
        self.check_rank(shift.len())?;
        if let Some((lo, _)) = self.raw_bounds() {
            for (d, (&l, &s)) in lo.iter().zip(shift).enumerate() {
                if l.checked_sub(s).map_or(true, |v| v < 0) {
                    return Err(SpaceError::bounds(format!(
                        "adjusting dimension {d} by {s} moves the selection below zero"
                    )));
                }
            }
        }
        self.selection.shift(shift);
        Ok(())
    }

    fn raw_bounds(&self) -> Option<(Vec<i64>, Vec<i64>)> {
        match self.selection {
            Selection::Points(_) | Selection::Hyperslab(_) => self.selection.bounds(&self.extent),
            Selection::None | Selection::All => None,
        }
    }

    fn offset_applies(&self) -> bool {
        matches!(self.selection, Selection::Points(_) | Selection::Hyperslab(_))
    }

    /// Bounding box of the selection with the offset applied, or `None`
    /// when nothing is selected.
    pub fn bounds(&self) -> Option<(Vec<i64>, Vec<i64>)> {
        let (mut lo, mut hi) = self.selection.bounds(&self.extent)?;
        if self.offset_applies() {
            for d in 0..lo.len() {
                lo[d] = lo[d].saturating_add(self.offset[d]);
                hi[d] = hi[d].saturating_add(self.offset[d]);
            }
        }
        Some((lo, hi))
    }

    /// Does every selected coordinate, plus offset, lie inside the extent?
    pub fn is_valid(&self) -> bool {
        let Some((lo, hi)) = self.raw_bounds() else {
            return true;
        };
        if !self.extent.is_simple() || lo.len() != self.rank() {
            return false;
        }
        (0..self.rank()).all(|d| {
            match (lo[d].checked_add(self.offset[d]), hi[d].checked_add(self.offset[d])) {
                (Some(l), Some(h)) => l >= 0 && h >= 0 && (h as u64) < self.dims()[d],
                _ => false,
            }
        })
    }

    fn hyperslab(&self) -> Result<&Hyperslab> {
        match &self.selection {
            Selection::Hyperslab(h) => Ok(h),
            other => Err(SpaceError::unsupported(format!(
                "expected a hyperslab selection, have {:?}",
                other.kind()
            ))),
        }
    }

    fn points(&self) -> Result<&PointList> {
        match &self.selection {
            Selection::Points(p) => Ok(p),
            other => Err(SpaceError::unsupported(format!(
                "expected a point selection, have {:?}",
                other.kind()
            ))),
        }
    }

    /// Number of blocks in a hyperslab selection.
    pub fn hyper_nblocks(&self) -> Result<u64> {
        Ok(self.hyperslab()?.nblocks())
    }

    /// Blocks in row-major order of their start corners, offset not applied.
    pub fn hyper_blocklist(&self) -> Result<Vec<Node>> {
        self.hyperslab()?.blocks()
    }

    /// Number of points in a point selection.
    pub fn elem_npoints(&self) -> Result<usize> {
        Ok(self.points()?.len())
    }

    /// Points in insertion order, offset not applied.
    pub fn elem_pointlist(&self) -> Result<Vec<Vec<i64>>> {
        Ok(self.points()?.iter().map(|p| p.to_vec()).collect())
    }

    /// Is the selection a hyperslab held in descriptor form?
    pub fn is_regular_hyperslab(&self) -> bool {
        matches!(&self.selection, Selection::Hyperslab(h) if h.regular_descriptor().is_some())
    }

    /// Descriptor of a regular hyperslab, as the caller supplied it.
    pub fn regular_hyperslab(&self) -> Result<Vec<HyperDim>> {
        match self.hyperslab()? {
            Hyperslab::Regular(r) => Ok(r.app_dims().to_vec()),
            h => h
                .regular_descriptor()
                .ok_or_else(|| SpaceError::unsupported("hyperslab selection is not regular")),
        }
    }

    /// Does the selection map to one contiguous run of the extent?
    pub fn is_contiguous(&self) -> bool {
        let n = self.num_elem();
        if n == 0 {
            return false;
        }
        match &self.selection {
            Selection::None => false,
            Selection::All => true,
            Selection::Points(p) => p.len() == 1,
            Selection::Hyperslab(_) => {
                let Ok(mut it) = SelectionIter::new(self, 1) else {
                    return false;
                };
                it.get_seq_list(1, usize::MAX).map_or(false, |s| s.nelem == n)
            }
        }
    }

    /// Is the selection a single block?
    pub fn is_single(&self) -> bool {
        match &self.selection {
            Selection::None => false,
            Selection::All => self.extent.num_elements() > 0,
            Selection::Points(p) => p.len() == 1,
            Selection::Hyperslab(h) => h.nblocks() == 1,
        }
    }

    /// Does any selected element, offset applied, fall inside the inclusive
    /// block `[start, end]`?
    pub fn intersect_block(&self, start: &[u64], end: &[u64]) -> Result<bool> {
        self.check_rank(start.len())?;
        self.check_rank(end.len())?;
        let mut lo = Vec::with_capacity(start.len());
        let mut hi = Vec::with_capacity(end.len());
        for d in 0..start.len() {
            if end[d] < start[d] {
                return Err(SpaceError::argument(format!(
                    "block end {} precedes start {} in dimension {d}",
                    end[d], start[d]
                )));
            }
            let shift = if self.offset_applies() { self.offset[d] } else { 0 };
            let s = i64::try_from(start[d]).unwrap_or(i64::MAX);
            let e = i64::try_from(end[d]).unwrap_or(i64::MAX);
            lo.push(s.saturating_sub(shift));
            hi.push(e.saturating_sub(shift));
        }
        Ok(self.selection.intersects_block(&self.extent, &Node::new(lo, hi)))
    }

    /// Grow the extent. The selection is kept as is.
    pub fn extend(&mut self, new_dims: &[u64]) -> Result<()> {
        self.extent.extend(new_dims)?;
        debug!(dims = ?self.extent.dims(), "extent extended");
        Ok(())
    }

    /// Change the extent's current size. Shrinking below the selection's
    /// bounding box is rejected.
    pub fn set_extent(&mut self, new_dims: &[u64]) -> Result<()> {
        self.require_simple("set_extent")?;
        self.check_rank(new_dims.len())?;
        if let Some((_, hi)) = self.raw_bounds() {
            for (d, (&h, &n)) in hi.iter().zip(new_dims).enumerate() {
                if h >= 0 && h as u64 >= n {
                    return Err(SpaceError::bounds(format!(
                        "dimension {d} of size {n} would cut the selection at {h}"
                    )));
                }
            }
        }
        self.extent.resize(new_dims)?;
        debug!(dims = ?self.extent.dims(), "extent resized");
        Ok(())
    }

    /// Copy `other`'s extent. A rank change resets the selection to all
    /// and clears the offset.
    pub fn extent_copy(&mut self, other: &Dataspace) {
        let rank_changed = other.rank() != self.rank();
        self.extent = other.extent.clone();
        if rank_changed {
            self.selection = Selection::All;
            self.offset = vec![0; self.rank()];
        }
    }

    /// Do both selections have the same shape, up to translation?
    pub fn shape_same(&self, other: &Dataspace) -> bool {
        crate::transfer::shape_same(self, other)
    }
}

fn combine_regions(
    existing: &RegionList,
    new: Option<&RegularHyperslab>,
    rank: usize,
    op: SelectOp,
) -> Result<Selection> {
    let new = match new {
        Some(r) => r.to_region_list()?,
        None => RegionList::new(rank),
    };
    Ok(region_selection(clip::combine(existing, &new, op)))
}

fn region_selection(list: RegionList) -> Selection {
    if list.num_elem() == 0 {
        Selection::None
    } else {
        Selection::Hyperslab(Hyperslab::Irregular(list))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    fn space(dims: &[u64]) -> Dataspace {
        Dataspace::simple(dims).unwrap()
    }

    #[test]
    fn new_selects_all() {
        let s = space(&[10, 10]);
        assert_eq!(s.selection_kind(), SelectionKind::All);
        assert_eq!(s.num_elem(), 100);
        assert_eq!(s.offset(), &[0, 0]);
        assert_eq!(Dataspace::scalar().num_elem(), 1);
        assert_eq!(Dataspace::null().num_elem(), 0);
    }

    #[test]
    fn hyperslab_set_is_regular_and_normalized() {
        let mut s = space(&[12]);
        s.select_hyperslab(SelectOp::Set, &[0], Some(&[2]), &[3], Some(&[2]))
            .unwrap();
        assert!(s.is_regular_hyperslab());
        assert_eq!(s.num_elem(), 6);
        assert_eq!(s.regular_hyperslab().unwrap(), vec![HyperDim::new(0, 2, 3, 2)]);
        assert!(s.is_contiguous());
        assert!(s.is_single());
    }

    #[test]
    fn hyperslab_argument_errors_leave_space_unchanged() {
        let mut s = space(&[10, 10]);
        let before = s.clone();
        let err = s
            .select_hyperslab(SelectOp::Set, &[0], None, &[1, 1], None)
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Argument);
        let err = s
            .select_hyperslab(SelectOp::Set, &[0, 0], Some(&[0, 1]), &[1, 1], None)
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Argument);
        let err = s
            .select_hyperslab(SelectOp::Set, &[0, 0], Some(&[1, 1]), &[2, 1], Some(&[2, 1]))
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Bounds);
        assert_eq!(s, before);
    }

    #[test]
    fn empty_count_selects_none() {
        let mut s = space(&[10]);
        s.select_hyperslab(SelectOp::Set, &[2], None, &[0], None).unwrap();
        assert_eq!(s.selection_kind(), SelectionKind::None);
    }

    #[test]
    fn or_builds_irregular_list() {
        let mut s = space(&[20]);
        s.select_hyperslab(SelectOp::Set, &[0], None, &[5], None).unwrap();
        s.select_hyperslab(SelectOp::Or, &[10], None, &[5], None).unwrap();
        assert!(!s.is_regular_hyperslab());
        assert_eq!(s.hyper_nblocks().unwrap(), 2);
        assert_eq!(s.num_elem(), 10);
        assert!(!s.is_contiguous());
        let blocks = s.hyper_blocklist().unwrap();
        assert_eq!(blocks[0], Node::new(vec![0], vec![4]));
        assert_eq!(blocks[1], Node::new(vec![10], vec![14]));
    }

    #[test]
    fn adjacent_or_stays_contiguous() {
        let mut s = space(&[20]);
        s.select_block(SelectOp::Set, &[0], &[4]).unwrap();
        s.select_block(SelectOp::Or, &[5], &[9]).unwrap();
        assert_eq!(s.hyper_nblocks().unwrap(), 2);
        assert!(s.is_contiguous());
        assert!(!s.is_single());
    }

    #[test]
    fn ops_on_none_and_all() {
        let mut s = space(&[10]);
        s.select_none();
        s.select_hyperslab(SelectOp::And, &[0], None, &[3], None).unwrap();
        assert_eq!(s.selection_kind(), SelectionKind::None);
        s.select_hyperslab(SelectOp::Xor, &[0], None, &[3], None).unwrap();
        assert_eq!(s.num_elem(), 3);

        s.select_all();
        s.select_hyperslab(SelectOp::Or, &[0], None, &[3], None).unwrap();
        assert_eq!(s.selection_kind(), SelectionKind::All);
        s.select_hyperslab(SelectOp::NotB, &[0], None, &[3], None).unwrap();
        assert_eq!(s.num_elem(), 7);
        assert_eq!(s.bounds(), Some((vec![3], vec![9])));

        s.select_all();
        s.select_hyperslab(SelectOp::NotA, &[0], None, &[3], None).unwrap();
        assert_eq!(s.selection_kind(), SelectionKind::None);
    }

    #[test]
    fn and_to_empty_becomes_none() {
        let mut s = space(&[10]);
        s.select_block(SelectOp::Set, &[0], &[2]).unwrap();
        s.select_block(SelectOp::And, &[5], &[6]).unwrap();
        assert_eq!(s.selection_kind(), SelectionKind::None);
    }

    #[test]
    fn hyperslab_op_on_points_unsupported() {
        let mut s = space(&[10]);
        s.select_elements(PointOp::Set, &[vec![1]]).unwrap();
        let err = s
            .select_hyperslab(SelectOp::Or, &[0], None, &[2], None)
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Unsupported);
        s.select_hyperslab(SelectOp::Set, &[0], None, &[2], None).unwrap();
        assert_eq!(s.selection_kind(), SelectionKind::Hyperslab);
    }

    #[test]
    fn point_append_prepend() {
        let mut s = space(&[10, 10]);
        s.select_elements(PointOp::Set, &[vec![2, 3]]).unwrap();
        s.select_elements(PointOp::Append, &[vec![5, 5]]).unwrap();
        s.select_elements(PointOp::Prepend, &[vec![1, 1]]).unwrap();
        assert_eq!(
            s.elem_pointlist().unwrap(),
            vec![vec![1, 1], vec![2, 3], vec![5, 5]]
        );
        // append on a non-point selection acts as set
        s.select_all();
        s.select_elements(PointOp::Append, &[vec![0, 0]]).unwrap();
        assert_eq!(s.elem_npoints().unwrap(), 1);
        assert!(s.is_single());
    }

    #[test]
    fn point_errors() {
        let mut s = space(&[10, 10]);
        assert!(matches!(
            s.select_elements(PointOp::Set, &[]),
            Err(SpaceError::Argument(_))
        ));
        assert_eq!(
            s.select_elements(PointOp::Set, &[vec![1]]).unwrap_err(),
            SpaceError::RankMismatch { expected: 2, got: 1 }
        );
        assert_eq!(s.selection_kind(), SelectionKind::All);
        let mut scalar = Dataspace::scalar();
        assert_eq!(
            scalar.select_elements(PointOp::Set, &[vec![]]).unwrap_err().category(),
            ErrorCategory::Unsupported
        );
    }

    #[test]
    fn offset_and_validity() {
        let mut s = space(&[10]);
        s.select_block(SelectOp::Set, &[5], &[8]).unwrap();
        assert!(s.is_valid());
        s.set_offset(&[1]).unwrap();
        assert!(s.is_valid());
        assert_eq!(s.bounds(), Some((vec![6], vec![9])));
        s.set_offset(&[2]).unwrap();
        assert!(!s.is_valid());
        s.set_offset(&[-6]).unwrap();
        assert!(!s.is_valid());
        assert!(s.set_offset(&[0, 0]).is_err());
        // all ignores the offset
        s.select_all();
        s.set_offset(&[3]).unwrap();
        assert!(s.is_valid());
        assert_eq!(s.bounds(), Some((vec![0], vec![9])));
    }

    #[test]
    fn adjust_moves_selection() {
        let mut s = space(&[10, 10]);
        s.select_block(SelectOp::Set, &[2, 3], &[4, 5]).unwrap();
        s.adjust(&[2, 1]).unwrap();
        assert_eq!(s.bounds(), Some((vec![0, 2], vec![2, 4])));
        assert_eq!(s.adjust(&[1, 0]).unwrap_err().category(), ErrorCategory::Bounds);
    }

    #[test]
    fn intersect_block_with_offset() {
        let mut s = space(&[10]);
        s.select_block(SelectOp::Set, &[2], &[3]).unwrap();
        assert!(s.intersect_block(&[3], &[5]).unwrap());
        assert!(!s.intersect_block(&[4], &[5]).unwrap());
        s.set_offset(&[2]).unwrap();
        assert!(s.intersect_block(&[4], &[5]).unwrap());
        assert!(s.intersect_block(&[5], &[4]).is_err());
    }

    #[test]
    fn modify_and_combine_select() {
        let mut a = space(&[10]);
        a.select_block(SelectOp::Set, &[0], &[5]).unwrap();
        let mut b = space(&[10]);
        b.select_block(SelectOp::Set, &[3], &[8]).unwrap();
        let c = a.combine_select(SelectOp::And, &b).unwrap();
        assert_eq!(c.bounds(), Some((vec![3], vec![5])));
        assert_eq!(a.num_elem(), 6);
        a.modify_select(SelectOp::Xor, &b).unwrap();
        assert_eq!(a.num_elem(), 6);
        let all = space(&[10]);
        assert_eq!(
            a.modify_select(SelectOp::Or, &all).unwrap_err().category(),
            ErrorCategory::Unsupported
        );
    }

    #[test]
    fn combine_hyperslab_does_not_mutate() {
        let s = space(&[10]);
        let t = s
            .combine_hyperslab(SelectOp::Set, &[1], None, &[2], None)
            .unwrap();
        assert_eq!(s.selection_kind(), SelectionKind::All);
        assert_eq!(t.num_elem(), 2);
    }

    #[test]
    fn extent_changes() {
        let ext = Extent::simple_with_max(&[4], &[crate::extent::UNLIMITED]).unwrap();
        let mut s = Dataspace::new(ext);
        s.select_block(SelectOp::Set, &[1], &[3]).unwrap();
        s.extend(&[8]).unwrap();
        assert_eq!(s.dims(), &[8]);
        assert!(s.extend(&[6]).is_err());
        s.set_extent(&[5]).unwrap();
        assert_eq!(
            s.set_extent(&[3]).unwrap_err().category(),
            ErrorCategory::Bounds
        );
        let mut t = space(&[3, 3]);
        t.extent_copy(&s);
        assert_eq!(t.dims(), &[5]);
        assert_eq!(t.selection_kind(), SelectionKind::All);
    }

    #[test]
    fn clone_is_deep() {
        let mut a = space(&[10]);
        a.select_block(SelectOp::Set, &[0], &[1]).unwrap();
        let b = a.clone();
        a.select_block(SelectOp::Or, &[5], &[6]).unwrap();
        assert_eq!(b.num_elem(), 2);
        assert_eq!(a.num_elem(), 4);
    }
}
