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

//! Splits a rectangular domain into subboxes for a pencil decomposition.

use super::{BoxArray, IndexBox};
use crate::error::{EngineError, EngineResult};

/// Splits `domain` into at most `n_pieces` subboxes.
///
/// `keep_dims[d] = true` forbids splitting along axis `d` (the axis the
/// next transform phase needs contiguous and local). Ties are broken by
/// preferring to split higher dims first; exact volume balancing is not
/// attempted, since vendor 1-D FFTs tolerate varying batch counts across
/// boxes.
pub fn decompose(
    domain: &IndexBox,
    n_pieces: usize,
    keep_dims: [bool; 3],
) -> EngineResult<BoxArray> {
    if n_pieces < 1 {
        return Err(EngineError::invalid_domain(
            "DomainDecomposer",
            "decompose",
            None,
            format!("n_pieces must be >= 1, got {}", n_pieces),
        ));
    }
    let ndim = domain.ndim();
    let splittable: Vec<usize> = (0..ndim).filter(|&d| !keep_dims[d]).collect();
    if splittable.is_empty() {
        return Err(EngineError::invalid_domain(
            "DomainDecomposer",
            "decompose",
            None,
            "every dimension is locked against splitting".to_string(),
        ));
    }
    if n_pieces == 1 {
        return Ok(BoxArray::new(vec![*domain]));
    }

    // Prefer splitting higher dims first.
    let mut split_axes = splittable.clone();
    split_axes.sort_unstable_by(|a, b| b.cmp(a));

    // Greedily assign pieces-per-axis starting from the highest splittable
    // axis, bounded by that axis's own length, to approximately balance
    // box volumes without requiring an exact factorization of n_pieces.
    let mut pieces_per_axis = vec![1usize; split_axes.len()];
    let mut remaining = n_pieces;
    for (idx, &axis) in split_axes.iter().enumerate() {
        let axis_len = domain.length(axis).max(1) as usize;
        let others_left = split_axes.len() - idx - 1;
        let take = if others_left == 0 {
            remaining.min(axis_len)
        } else {
            // Leave at least 1 piece per remaining axis.
            remaining.min(axis_len).max(1)
        };
        pieces_per_axis[idx] = take.max(1);
        remaining = crate::helpers::ceil_div(remaining.max(1), pieces_per_axis[idx]);
    }

    let mut boxes = vec![*domain];
    for (idx, &axis) in split_axes.iter().enumerate() {
        let pieces = pieces_per_axis[idx];
        if pieces <= 1 {
            continue;
        }
        let mut next = Vec::with_capacity(boxes.len() * pieces);
        for b in &boxes {
            next.extend(split_box_along_axis(b, axis, pieces)?);
        }
        boxes = next;
    }

    Ok(BoxArray::new(boxes))
}

fn split_box_along_axis(
    b: &IndexBox,
    axis: usize,
    pieces: usize,
) -> EngineResult<Vec<IndexBox>> {
    let len = b.length(axis);
    let pieces = (pieces as i64).min(len.max(1)) as usize;
    if pieces <= 1 {
        return Ok(vec![*b]);
    }
    let base = len / pieces as i64;
    let extra = len % pieces as i64;
    let mut out = Vec::with_capacity(pieces);
    let mut cursor = b.lo()[axis];
    for p in 0..pieces {
        let this_len = base + if (p as i64) < extra { 1 } else { 0 };
        if this_len == 0 {
            continue;
        }
        let mut lo = b.lo();
        let mut hi = b.hi();
        lo[axis] = cursor;
        hi[axis] = cursor + this_len - 1;
        out.push(IndexBox::new(lo, hi, b.ndim())?);
        cursor += this_len;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_piece_returns_whole_domain() {
        let d = IndexBox::from_dims([8, 8, 1], 2).unwrap();
        let ba = decompose(&d, 1, [false, false, false]).unwrap();
        assert_eq!(ba.len(), 1);
        assert_eq!(ba.get(0).volume(), 64);
    }

    #[test]
    fn keeps_locked_axis_undivided() {
        let d = IndexBox::from_dims([8, 8, 1], 2).unwrap();
        // axis 0 locked: every piece must keep the full x-extent local.
        let ba = decompose(&d, 4, [true, false, false]).unwrap();
        for (_, b) in ba.iter() {
            assert_eq!(b.length(0), 8);
        }
    }

    #[test]
    fn covers_domain_without_overlap() {
        let d = IndexBox::from_dims([10, 1, 1], 1).unwrap();
        let ba = decompose(&d, 3, [false, false, false]).unwrap();
        let mut covered = vec![false; 10];
        for (_, b) in ba.iter() {
            for c in b.iter_cells() {
                let x = c[0] as usize;
                assert!(!covered[x], "cell {} covered twice", x);
                covered[x] = true;
            }
        }
        assert!(covered.iter().all(|&c| c));
    }

    #[test]
    fn rejects_zero_pieces() {
        let d = IndexBox::from_dims([4, 4, 1], 2).unwrap();
        assert!(decompose(&d, 0, [false, false, false]).is_err());
    }

    #[test]
    fn rejects_all_dims_locked() {
        let d = IndexBox::from_dims([4, 4, 1], 2).unwrap();
        assert!(decompose(&d, 4, [true, true, true]).is_err());
    }
}
