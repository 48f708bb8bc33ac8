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

//! Precomputed communication metadata for a pencil redistribution.

use crate::geometry::{BoxArray, IndexBox, IndexTransform};

/// One (src box, dst box) overlap, expressed as a box in *destination*
/// coordinates. At execute time every cell of `overlap` is walked and its
/// source cell recovered via `transform.apply_inverse`.
#[derive(Debug, Clone, Copy)]
pub struct CopyDescriptor {
    pub src_box_id: usize,
    pub dst_box_id: usize,
    pub overlap: IndexBox,
}

/// The full set of copy descriptors for one redistribution.
#[derive(Debug, Clone)]
pub struct CommMetadata {
    descriptors: Vec<CopyDescriptor>,
}

impl CommMetadata {
    /// Build metadata for redistributing `src` (under `src_boxes`) into
    /// `dst` (under `dst_boxes`) via `transform`.
    ///
    /// For every destination box, every source box is mapped forward
    /// through `transform` into destination coordinate space and
    /// intersected with the destination box; each non-empty intersection
    /// becomes one descriptor. Box-id order (dst outer, src inner) makes
    /// the resulting order deterministic, matching the invariant that
    /// exactly one tuple is produced per covered destination cell.
    pub fn build(dst_boxes: &BoxArray, src_boxes: &BoxArray, transform: IndexTransform) -> Self {
        let mut descriptors = Vec::new();
        for (dst_id, dst_box) in dst_boxes.iter() {
            for (src_id, src_box) in src_boxes.iter() {
                let src_image = src_box.transform(transform);
                if let Some(overlap) = src_image.intersect(dst_box) {
                    descriptors.push(CopyDescriptor {
                        src_box_id: src_id,
                        dst_box_id: dst_id,
                        overlap,
                    });
                }
            }
        }
        CommMetadata { descriptors }
    }

    pub fn descriptors(&self) -> &[CopyDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::IndexBox;

    #[test]
    fn identity_transform_pairs_each_box_with_itself() {
        let b0 = IndexBox::from_dims([4, 4, 1], 2).unwrap();
        let boxes = BoxArray::new(vec![b0]);
        let meta = CommMetadata::build(&boxes, &boxes, IndexTransform::Identity);
        assert_eq!(meta.len(), 1);
        assert_eq!(meta.descriptors()[0].overlap.volume(), 16);
    }

    #[test]
    fn swap01_produces_full_coverage_single_box() {
        let b0 = IndexBox::from_dims([4, 6, 1], 2).unwrap();
        let dst = IndexBox::from_dims([6, 4, 1], 2).unwrap();
        let src_boxes = BoxArray::new(vec![b0]);
        let dst_boxes = BoxArray::new(vec![dst]);
        let meta = CommMetadata::build(&dst_boxes, &src_boxes, IndexTransform::Swap01);
        assert_eq!(meta.len(), 1);
        assert_eq!(meta.descriptors()[0].overlap.volume(), 24);
    }
}
