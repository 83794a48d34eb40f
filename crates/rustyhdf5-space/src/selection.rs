//! Selections: which elements of an extent take part in I/O.
//!
//! A [`Selection`] is one of four kinds. `All` and `None` carry no data and
//! follow the extent they are applied to; point and hyperslab selections
//! carry their own coordinates.

use crate::extent::Extent;
use crate::hyperslab::{Hyperslab, Node};
use crate::points::PointList;

/// Selection kind. The discriminant is also the serialized tag and the
/// index used by the conversion-path table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum SelectionKind {
    None = 0,
    Points = 1,
    Hyperslab = 2,
    All = 3,
}

impl SelectionKind {
    /// Number of kinds.
    pub const COUNT: usize = 4;

    /// Row or column of this kind in a 4x4 kind table.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Kind for an encoded tag.
    pub fn from_u32(tag: u32) -> Option<Self> {
        match tag {
            0 => Some(SelectionKind::None),
            1 => Some(SelectionKind::Points),
            2 => Some(SelectionKind::Hyperslab),
            3 => Some(SelectionKind::All),
            _ => None,
        }
    }
}

/// A selection describing which elements of an extent to access.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    /// Select no elements.
    None,

    /// Select every element of the current extent.
    #[default]
    All,

    /// Individual points, in I/O order.
    Points(PointList),

    /// Rectangular blocks, regular or irregular.
    Hyperslab(Hyperslab),
}

impl Selection {
    /// Which variant is held.
    pub fn kind(&self) -> SelectionKind {
        match self {
            Selection::None => SelectionKind::None,
            Selection::All => SelectionKind::All,
            Selection::Points(_) => SelectionKind::Points,
            Selection::Hyperslab(_) => SelectionKind::Hyperslab,
        }
    }

    /// Number of selected elements within `extent`.
    pub fn num_elements(&self, extent: &Extent) -> u64 {
        match self {
            Selection::None => 0,
            Selection::All => extent.num_elements(),
            Selection::Points(p) => p.len() as u64,
            Selection::Hyperslab(h) => h.num_elem(),
        }
    }

    /// Rank carried by the selection itself; `All` and `None` have none.
    pub fn rank(&self) -> Option<usize> {
        match self {
            Selection::None | Selection::All => None,
            Selection::Points(p) => Some(p.rank()),
            Selection::Hyperslab(h) => Some(h.rank()),
        }
    }

    /// Bounding box of the selected coordinates, ignoring any offset.
    /// `None` when nothing is selected.
    pub fn bounds(&self, extent: &Extent) -> Option<(Vec<i64>, Vec<i64>)> {
        match self {
            Selection::None => None,
            Selection::All => {
                if extent.num_elements() == 0 {
                    return None;
                }
                Some((
                    vec![0; extent.rank()],
                    extent.dims().iter().map(|&d| d as i64 - 1).collect(),
                ))
            }
            Selection::Points(p) => Some(p.bounds()),
            Selection::Hyperslab(h) => h.bounds(),
        }
    }

    /// Does any selected element fall inside `block`? Coordinates of
    /// `block` are in selection space (offset already removed).
    pub fn intersects_block(&self, extent: &Extent, block: &Node) -> bool {
        match self {
            Selection::None => false,
            Selection::All => {
                extent.num_elements() > 0
                    && block
                        .start
                        .iter()
                        .zip(&block.end)
                        .zip(extent.dims())
                        .all(|((&s, &e), &d)| e >= 0 && s < d as i64)
            }
            Selection::Points(p) => p.iter().any(|pt| block.contains(pt)),
            Selection::Hyperslab(h) => h.intersects_block(block),
        }
    }

    /// Subtract `delta` from every selected coordinate.
    pub(crate) fn shift(&mut self, delta: &[i64]) {
        match self {
            Selection::None | Selection::All => {}
            Selection::Points(p) => p.shift(delta),
            Selection::Hyperslab(h) => h.shift(delta),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hyperslab::{HyperDim, RegularHyperslab};

    #[test]
    fn kind_tags() {
        for k in [
            SelectionKind::None,
            SelectionKind::Points,
            SelectionKind::Hyperslab,
            SelectionKind::All,
        ] {
            assert_eq!(SelectionKind::from_u32(k as u32), Some(k));
        }
        assert_eq!(SelectionKind::from_u32(4), None);
        assert_eq!(Selection::default().kind(), SelectionKind::All);
    }

    #[test]
    fn num_elements_by_kind() {
        let ext = Extent::simple(&[10, 10]).unwrap();
        assert_eq!(Selection::All.num_elements(&ext), 100);
        assert_eq!(Selection::None.num_elements(&ext), 0);
        let pts = PointList::new(2, &[vec![1, 1], vec![2, 2]]).unwrap();
        assert_eq!(Selection::Points(pts).num_elements(&ext), 2);
        let r = RegularHyperslab::new(vec![HyperDim::new(0, 2, 5, 1), HyperDim::new(0, 2, 5, 1)])
            .unwrap()
            .unwrap();
        let sel = Selection::Hyperslab(Hyperslab::Regular(r));
        assert_eq!(sel.num_elements(&ext), 25);
        assert_eq!(sel.rank(), Some(2));
    }

    #[test]
    fn all_bounds_and_block_test() {
        let ext = Extent::simple(&[4, 6]).unwrap();
        assert_eq!(Selection::All.bounds(&ext), Some((vec![0, 0], vec![3, 5])));
        assert!(Selection::All.intersects_block(&ext, &Node::new(vec![3, 5], vec![9, 9])));
        assert!(!Selection::All.intersects_block(&ext, &Node::new(vec![4, 0], vec![9, 9])));
        assert!(!Selection::None.intersects_block(&ext, &Node::new(vec![0, 0], vec![1, 1])));
    }
}
