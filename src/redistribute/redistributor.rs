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

//! Executes a pencil redistribution described by [`CommMetadata`].

use log::trace;

use crate::array::DistributedArray;
use crate::geometry::IndexTransform;

use super::CommMetadata;

/// Moves data so that, for every destination cell `p`,
/// `dst(p) = src(transform.apply_inverse(p))`.
///
/// Collective, synchronous on return: every descriptor is fully applied
/// before this call returns. Values are copied verbatim element-wise —
/// no conjugation, matching the index-transform contract (the transform
/// only rewrites indices).
pub fn parallel_copy<T, D, S>(
    dst: &mut D,
    src: &S,
    meta: &CommMetadata,
    transform: IndexTransform,
) where
    T: Copy,
    D: DistributedArray<T>,
    S: DistributedArray<T>,
{
    trace!(
        "redistribute: {} descriptors, transform {:?}",
        meta.len(),
        transform
    );
    for d in meta.descriptors() {
        let src_box = *src.box_array().get(d.src_box_id);
        let dst_box = *dst.box_array().get(d.dst_box_id);
        for cell in d.overlap.iter_cells() {
            let src_cell = transform.apply_inverse(cell);
            let src_idx = match src_box.local_linear_index(&src_cell) {
                Some(i) => i,
                None => continue,
            };
            let dst_idx = match dst_box.local_linear_index(&cell) {
                Some(i) => i,
                None => continue,
            };
            let value = src.data(d.src_box_id)[src_idx];
            dst.data_mut(d.dst_box_id)[dst_idx] = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::LocalDistArray;
    use crate::geometry::{BoxArray, IndexBox, RankMap};

    #[test]
    fn swap01_transposes_a_4x4x4_cube() {
        let dims = IndexBox::from_dims([4, 4, 4], 3).unwrap();
        let src_boxes = BoxArray::new(vec![dims]);
        let dst_boxes = BoxArray::new(vec![dims]);

        let mut src: LocalDistArray<f64> =
            LocalDistArray::define(src_boxes.clone(), RankMap::iota(1)).unwrap();
        for cell in dims.iter_cells() {
            let idx = dims.local_linear_index(&cell).unwrap();
            let (i, j, k) = (cell[0], cell[1], cell[2]);
            src.data_mut(0)[idx] = (100 * i + 10 * j + k) as f64;
        }

        let mut dst: LocalDistArray<f64> =
            LocalDistArray::define(dst_boxes.clone(), RankMap::iota(1)).unwrap();
        let meta = CommMetadata::build(&dst_boxes, &src_boxes, IndexTransform::Swap01);
        parallel_copy(&mut dst, &src, &meta, IndexTransform::Swap01);

        for cell in dims.iter_cells() {
            let idx = dims.local_linear_index(&cell).unwrap();
            let (i, j, k) = (cell[0], cell[1], cell[2]);
            let expected = (100 * j + 10 * i + k) as f64;
            assert_eq!(dst.data(0)[idx], expected);
        }
    }
}
