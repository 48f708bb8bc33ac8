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

//! Index-space rewrites used by the redistributor, as value objects.

/// One of the four index-space rewrites used to drive a pencil
/// transposition, applied element-wise to `(i,j,k)` triples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexTransform {
    Identity,
    /// `(i,j,k) -> (j,i,k)`
    Swap01,
    /// `(i,j,k) -> (k,j,i)`
    Swap02,
    /// `(i,j,k) -> (k,i,j)`: takes (x,y,z) into (z,x,y)
    RotateForward,
    /// `(i,j,k) -> (j,k,i)`: inverse of `RotateForward`
    RotateBackward,
}

impl IndexTransform {
    /// Apply the forward mapping.
    pub fn apply(&self, p: [i64; 3]) -> [i64; 3] {
        match self {
            IndexTransform::Identity => p,
            IndexTransform::Swap01 => [p[1], p[0], p[2]],
            IndexTransform::Swap02 => [p[2], p[1], p[0]],
            IndexTransform::RotateForward => [p[2], p[0], p[1]],
            IndexTransform::RotateBackward => [p[1], p[2], p[0]],
        }
    }

    /// The inverse mapping, itself an `IndexTransform`.
    pub fn inverse(&self) -> IndexTransform {
        match self {
            IndexTransform::Identity => IndexTransform::Identity,
            // Swap01 and Swap02 are involutions.
            IndexTransform::Swap01 => IndexTransform::Swap01,
            IndexTransform::Swap02 => IndexTransform::Swap02,
            IndexTransform::RotateForward => IndexTransform::RotateBackward,
            IndexTransform::RotateBackward => IndexTransform::RotateForward,
        }
    }

    /// Apply the inverse mapping directly (used by the redistributor to
    /// walk from destination cells back to source cells).
    pub fn apply_inverse(&self, p: [i64; 3]) -> [i64; 3] {
        self.inverse().apply(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap01_is_its_own_inverse() {
        let p = [1, 2, 3];
        let q = IndexTransform::Swap01.apply(p);
        assert_eq!(q, [2, 1, 3]);
        assert_eq!(IndexTransform::Swap01.apply_inverse(q), p);
    }

    #[test]
    fn swap02_swaps_first_and_last() {
        assert_eq!(IndexTransform::Swap02.apply([1, 2, 3]), [3, 2, 1]);
    }

    #[test]
    fn rotate_forward_and_backward_are_mutual_inverses() {
        let p = [1, 2, 3];
        let fwd = IndexTransform::RotateForward.apply(p);
        assert_eq!(fwd, [3, 1, 2]);
        assert_eq!(IndexTransform::RotateBackward.apply(fwd), p);
        let bwd = IndexTransform::RotateBackward.apply(p);
        assert_eq!(IndexTransform::RotateForward.apply(bwd), p);
    }

    #[test]
    fn identity_is_involution() {
        let p = [4, 5, 6];
        assert_eq!(IndexTransform::Identity.apply(p), p);
        assert_eq!(IndexTransform::Identity.apply_inverse(p), p);
    }
}
