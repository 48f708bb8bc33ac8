// specfft - A distributed multi-dimensional FFT engine with a spectral Poisson solver
// Copyright (C) 2021 Julian Jeggle, Raphael Wittkowski

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Cell-centered integer hyper-rectangles (at most 3 dimensions).

use crate::error::{EngineError, EngineResult};

/// A closed integer box `[lo, hi]` in at most 3 dimensions.
///
/// Internally every box always carries three components; axes beyond the
/// logical `ndim` are fixed at `lo = hi = 0` (length 1), which lets every
/// geometric operation — intersection, iteration, transposition under an
/// [`IndexTransform`](super::IndexTransform) — treat all three axes
/// uniformly instead of branching on `ndim`. `ndim` itself is kept purely
/// as the caller-facing "how many axes are real" annotation (used by
/// shape-precondition checks such as "the real domain has `length(0) >
/// 1`").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexBox {
    lo: [i64; 3],
    hi: [i64; 3],
    ndim: usize,
}

impl IndexBox {
    /// Build a box, checking `lo <= hi` componentwise over all three axes.
    pub fn new(lo: [i64; 3], hi: [i64; 3], ndim: usize) -> EngineResult<Self> {
        if ndim == 0 || ndim > 3 {
            return Err(EngineError::invalid_domain(
                "IndexBox",
                "new",
                None,
                format!("ndim must be in 1..=3, got {}", ndim),
            ));
        }
        for d in 0..3 {
            if lo[d] > hi[d] {
                return Err(EngineError::invalid_domain(
                    "IndexBox",
                    "new",
                    Some(d),
                    format!("lo ({}) > hi ({})", lo[d], hi[d]),
                ));
            }
        }
        Ok(IndexBox { lo, hi, ndim })
    }

    /// Construct the "real" domain box `[0, n0-1] x [0, n1-1] x [0, n2-1]`.
    ///
    /// `dims` beyond `ndim` are ignored (fixed to length 1); the invariant
    /// `length(0) > 1` is checked by callers that need it, not every box
    /// needs it (e.g. spectral domains along a batch axis may be length 1).
    pub fn from_dims(dims: [i64; 3], ndim: usize) -> EngineResult<Self> {
        if ndim == 0 || ndim > 3 {
            return Err(EngineError::invalid_domain(
                "IndexBox",
                "from_dims",
                None,
                format!("ndim must be in 1..=3, got {}", ndim),
            ));
        }
        let mut hi = [0i64; 3];
        for d in 0..ndim {
            if dims[d] < 1 {
                return Err(EngineError::invalid_domain(
                    "IndexBox",
                    "from_dims",
                    Some(d),
                    format!("length must be >= 1, got {}", dims[d]),
                ));
            }
            hi[d] = dims[d] - 1;
        }
        IndexBox::new([0, 0, 0], hi, ndim)
    }

    pub fn ndim(&self) -> usize {
        self.ndim
    }

    pub fn lo(&self) -> [i64; 3] {
        self.lo
    }

    pub fn hi(&self) -> [i64; 3] {
        self.hi
    }

    /// Number of cells along axis `d`.
    pub fn length(&self, d: usize) -> i64 {
        self.hi[d] - self.lo[d] + 1
    }

    /// Total cell count (product of all three per-axis lengths).
    pub fn volume(&self) -> i64 {
        (0..3).map(|d| self.length(d)).product()
    }

    /// `true` iff `self` has `lo = 0` in every meaningful axis.
    pub fn is_zero_based(&self) -> bool {
        (0..self.ndim).all(|d| self.lo[d] == 0)
    }

    /// Non-empty intersection of two boxes, if any.
    pub fn intersect(&self, other: &IndexBox) -> Option<IndexBox> {
        let mut lo = [0i64; 3];
        let mut hi = [0i64; 3];
        for d in 0..3 {
            lo[d] = self.lo[d].max(other.lo[d]);
            hi[d] = self.hi[d].min(other.hi[d]);
            if lo[d] > hi[d] {
                return None;
            }
        }
        Some(IndexBox {
            lo,
            hi,
            ndim: self.ndim.max(other.ndim),
        })
    }

    /// Iterate every cell of this box in row-major (z slowest, x fastest) order.
    pub fn iter_cells(&self) -> impl Iterator<Item = [i64; 3]> + '_ {
        let lo = self.lo;
        let nz = self.length(2);
        let ny = self.length(1);
        let nx = self.length(0);
        (0..nz).flat_map(move |iz| {
            (0..ny).flat_map(move |iy| {
                (0..nx).map(move |ix| [lo[0] + ix, lo[1] + iy, lo[2] + iz])
            })
        })
    }

    /// `true` iff `p` lies within this box on all three axes.
    pub fn contains(&self, p: &[i64; 3]) -> bool {
        (0..3).all(|d| p[d] >= self.lo[d] && p[d] <= self.hi[d])
    }

    /// Row-major (x fastest) linear offset of cell `p` within this box's
    /// own local storage, or `None` if `p` falls outside the box.
    pub fn local_linear_index(&self, p: &[i64; 3]) -> Option<usize> {
        if !self.contains(p) {
            return None;
        }
        let nx = self.length(0);
        let ny = self.length(1);
        let ix = p[0] - self.lo[0];
        let iy = p[1] - self.lo[1];
        let iz = p[2] - self.lo[2];
        Some((ix + nx * (iy + ny * iz)) as usize)
    }

    /// Apply `t` to both corners of this box, yielding the image box in
    /// the transformed coordinate space. Valid because every
    /// `IndexTransform` is a pure axis permutation (no reflection), so
    /// componentwise ordering of the transformed corners is preserved.
    pub fn transform(&self, t: super::IndexTransform) -> IndexBox {
        IndexBox {
            lo: t.apply(self.lo),
            hi: t.apply(self.hi),
            ndim: self.ndim,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::IndexTransform;

    #[test]
    fn rejects_lo_greater_than_hi() {
        let err = IndexBox::new([0, 0, 0], [-1, 0, 0], 2).unwrap_err();
        assert!(matches!(err, EngineError::InvalidDomain { .. }));
    }

    #[test]
    fn volume_and_length_3d() {
        let b = IndexBox::from_dims([4, 5, 6], 3).unwrap();
        assert_eq!(b.length(0), 4);
        assert_eq!(b.length(1), 5);
        assert_eq!(b.length(2), 6);
        assert_eq!(b.volume(), 120);
    }

    #[test]
    fn length_beyond_ndim_is_one() {
        let b = IndexBox::from_dims([8, 1, 1], 1).unwrap();
        assert_eq!(b.length(0), 8);
        assert_eq!(b.length(1), 1);
        assert_eq!(b.length(2), 1);
        assert_eq!(b.volume(), 8);
    }

    #[test]
    fn intersect_overlapping_boxes() {
        let a = IndexBox::new([0, 0, 0], [3, 3, 0], 2).unwrap();
        let b = IndexBox::new([2, 2, 0], [5, 5, 0], 2).unwrap();
        let i = a.intersect(&b).unwrap();
        assert_eq!(i.lo(), [2, 2, 0]);
        assert_eq!(i.hi(), [3, 3, 0]);
    }

    #[test]
    fn intersect_disjoint_boxes_is_none() {
        let a = IndexBox::new([0, 0, 0], [1, 1, 0], 2).unwrap();
        let b = IndexBox::new([5, 5, 0], [6, 6, 0], 2).unwrap();
        assert!(a.intersect(&b).is_none());
    }

    #[test]
    fn iter_cells_visits_every_point_once() {
        let b = IndexBox::from_dims([2, 3, 1], 2).unwrap();
        let cells: Vec<_> = b.iter_cells().collect();
        assert_eq!(cells.len(), 6);
        assert!(cells.contains(&[0, 2, 0]));
        assert!(cells.contains(&[1, 0, 0]));
    }

    #[test]
    fn local_linear_index_is_row_major_x_fastest() {
        let b = IndexBox::from_dims([3, 2, 1], 2).unwrap();
        assert_eq!(b.local_linear_index(&[0, 0, 0]), Some(0));
        assert_eq!(b.local_linear_index(&[1, 0, 0]), Some(1));
        assert_eq!(b.local_linear_index(&[0, 1, 0]), Some(3));
        assert_eq!(b.local_linear_index(&[5, 0, 0]), None);
    }

    #[test]
    fn transform_swap01_permutes_corners() {
        let b = IndexBox::new([0, 0, 0], [3, 7, 0], 2).unwrap();
        let t = b.transform(IndexTransform::Swap01);
        assert_eq!(t.lo(), [0, 0, 0]);
        assert_eq!(t.hi(), [7, 3, 0]);
    }
}
