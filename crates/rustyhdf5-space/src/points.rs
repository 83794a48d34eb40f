//! Point selections: an ordered list of coordinate tuples.

use crate::error::{Result, SpaceError};

/// Ordered coordinate tuples, stored flat (`rank` values per point).
///
/// Order is the I/O order. Duplicates are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointList {
    rank: usize,
    coords: Vec<i64>,
}

impl PointList {
    /// Build from caller points, checking rank and coordinate range.
    pub fn new(rank: usize, points: &[Vec<u64>]) -> Result<Self> {
        if points.is_empty() {
            return Err(SpaceError::argument("point list is empty"));
        }
        let mut coords = Vec::new();
        coords.try_reserve_exact(points.len() * rank)?;
        for p in points {
            if p.len() != rank {
                return Err(SpaceError::RankMismatch {
                    expected: rank,
                    got: p.len(),
                });
            }
            for &c in p {
                let c = i64::try_from(c)
                    .map_err(|_| SpaceError::argument(format!("point coordinate {c} is too large")))?;
                coords.push(c);
            }
        }
        Ok(PointList { rank, coords })
    }

    /// Build from already-validated flat coordinates.
    pub(crate) fn from_flat(rank: usize, coords: Vec<i64>) -> Self {
        debug_assert!(rank > 0 && coords.len() % rank == 0);
        PointList { rank, coords }
    }

    /// Coordinates per point.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.coords.len() / self.rank
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Coordinates of point `i`.
    pub fn point(&self, i: usize) -> &[i64] {
        &self.coords[i * self.rank..(i + 1) * self.rank]
    }

    /// Points in insertion order, one slice each.
    pub fn iter(&self) -> impl Iterator<Item = &[i64]> + '_ {
        self.coords.chunks_exact(self.rank)
    }

    /// Add `other` after the existing points.
    pub fn append(&mut self, other: PointList) -> Result<()> {
        self.check_rank(&other)?;
        self.coords.try_reserve(other.coords.len())?;
        self.coords.extend_from_slice(&other.coords);
        Ok(())
    }

    /// Add `other` before the existing points.
    pub fn prepend(&mut self, other: PointList) -> Result<()> {
        self.check_rank(&other)?;
        let mut coords = Vec::new();
        coords.try_reserve_exact(self.coords.len() + other.coords.len())?;
        coords.extend_from_slice(&other.coords);
        coords.extend_from_slice(&self.coords);
        self.coords = coords;
        Ok(())
    }

    fn check_rank(&self, other: &PointList) -> Result<()> {
        if other.rank != self.rank {
            return Err(SpaceError::RankMismatch {
                expected: self.rank,
                got: other.rank,
            });
        }
        Ok(())
    }

    /// Bounding box over all points.
    pub fn bounds(&self) -> (Vec<i64>, Vec<i64>) {
        let mut lo = vec![i64::MAX; self.rank];
        let mut hi = vec![i64::MIN; self.rank];
        for p in self.iter() {
            for d in 0..self.rank {
                lo[d] = lo[d].min(p[d]);
                hi[d] = hi[d].max(p[d]);
            }
        }
        (lo, hi)
    }

    pub(crate) fn shift(&mut self, delta: &[i64]) {
        for p in self.coords.chunks_exact_mut(self.rank) {
            for (c, &dl) in p.iter_mut().zip(delta) {
                *c -= dl;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(v: &[&[u64]]) -> Vec<Vec<u64>> {
        v.iter().map(|p| p.to_vec()).collect()
    }

    #[test]
    fn build_and_index() {
        let l = PointList::new(2, &pts(&[&[2, 3], &[5, 5], &[1, 1]])).unwrap();
        assert_eq!(l.len(), 3);
        assert_eq!(l.point(1), &[5, 5]);
        assert_eq!(l.bounds(), (vec![1, 1], vec![5, 5]));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(PointList::new(2, &[]), Err(SpaceError::Argument(_))));
        assert_eq!(
            PointList::new(2, &pts(&[&[1, 2, 3]])).unwrap_err(),
            SpaceError::RankMismatch { expected: 2, got: 3 }
        );
        assert!(PointList::new(1, &pts(&[&[u64::MAX]])).is_err());
    }

    #[test]
    fn append_and_prepend_keep_order() {
        let mut l = PointList::new(1, &pts(&[&[4]])).unwrap();
        l.append(PointList::new(1, &pts(&[&[7], &[7]])).unwrap()).unwrap();
        l.prepend(PointList::new(1, &pts(&[&[0]])).unwrap()).unwrap();
        let order: Vec<i64> = l.iter().map(|p| p[0]).collect();
        assert_eq!(order, vec![0, 4, 7, 7]);
    }

    #[test]
    fn shift_subtracts() {
        let mut l = PointList::new(2, &pts(&[&[3, 4]])).unwrap();
        l.shift(&[1, 4]);
        assert_eq!(l.point(0), &[2, 0]);
    }
}
