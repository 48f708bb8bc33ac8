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

//! `BoxArray`: an ordered, disjoint cover of a domain by [`IndexBox`]es.
//! `RankMap`: the total function from box id to owning rank.

use super::IndexBox;
use crate::error::{EngineError, EngineResult};

/// Ordered sequence of disjoint boxes; position in the vector is the
/// global box id.
#[derive(Debug, Clone)]
pub struct BoxArray {
    boxes: Vec<IndexBox>,
}

impl BoxArray {
    pub fn new(boxes: Vec<IndexBox>) -> Self {
        BoxArray { boxes }
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn get(&self, box_id: usize) -> &IndexBox {
        &self.boxes[box_id]
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &IndexBox)> {
        self.boxes.iter().enumerate()
    }

    pub fn as_slice(&self) -> &[IndexBox] {
        &self.boxes
    }
}

/// Total function `box id -> rank`.
///
/// The engines only ever construct the *iota* map (box `i` owned by rank
/// `i`), so that the first `K` ranks each own exactly one box, but the
/// type keeps the general shape so a caller-supplied map is rejected with
/// a distinct, legible error instead of silently misbehaving.
#[derive(Debug, Clone)]
pub struct RankMap {
    box_to_rank: Vec<usize>,
}

impl RankMap {
    /// The map used by every engine in this crate: box `i` -> rank `i`.
    pub fn iota(num_boxes: usize) -> Self {
        RankMap {
            box_to_rank: (0..num_boxes).collect(),
        }
    }

    pub fn from_vec(box_to_rank: Vec<usize>) -> Self {
        RankMap { box_to_rank }
    }

    pub fn rank_of(&self, box_id: usize) -> usize {
        self.box_to_rank[box_id]
    }

    pub fn len(&self) -> usize {
        self.box_to_rank.len()
    }

    pub fn is_empty(&self) -> bool {
        self.box_to_rank.is_empty()
    }

    /// Validate that the number of boxes does not exceed the world size.
    pub fn validate(&self, world_size: usize) -> EngineResult<()> {
        if self.box_to_rank.len() > world_size {
            return Err(EngineError::invalid_domain(
                "RankMap",
                "validate",
                None,
                format!(
                    "box count {} exceeds world size {}",
                    self.box_to_rank.len(),
                    world_size
                ),
            ));
        }
        Ok(())
    }

    pub fn is_iota(&self) -> bool {
        self.box_to_rank.iter().enumerate().all(|(i, &r)| i == r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::IndexBox;

    #[test]
    fn iota_map_is_identity() {
        let m = RankMap::iota(4);
        for i in 0..4 {
            assert_eq!(m.rank_of(i), i);
        }
        assert!(m.is_iota());
    }

    #[test]
    fn validate_rejects_too_many_boxes_for_world() {
        let m = RankMap::iota(8);
        assert!(m.validate(8).is_ok());
        assert!(m.validate(4).is_err());
    }

    #[test]
    fn box_array_preserves_order() {
        let b0 = IndexBox::from_dims([4, 4, 1], 2).unwrap();
        let b1 = IndexBox::new([4, 0, 0], [7, 3, 0], 2).unwrap();
        let ba = BoxArray::new(vec![b0, b1]);
        assert_eq!(ba.len(), 2);
        assert_eq!(ba.get(0).lo(), [0, 0, 0]);
        assert_eq!(ba.get(1).lo(), [4, 0, 0]);
    }
}
