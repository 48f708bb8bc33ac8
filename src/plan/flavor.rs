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

//! Kernel flavor selection: which 1-D transform an axis runs, derived
//! from its boundary condition pair.

use crate::error::{EngineError, EngineResult};

/// One endpoint condition of an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Periodic,
    Even,
    Odd,
}

/// The boundary pair `(lo, hi)` for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisBoundary {
    pub lo: Boundary,
    pub hi: Boundary,
}

impl AxisBoundary {
    pub fn periodic() -> Self {
        AxisBoundary {
            lo: Boundary::Periodic,
            hi: Boundary::Periodic,
        }
    }

    pub fn new(lo: Boundary, hi: Boundary) -> EngineResult<Self> {
        if (lo == Boundary::Periodic) != (hi == Boundary::Periodic) {
            return Err(EngineError::invalid_boundary(
                "AxisBoundary",
                "new",
                None,
                "one endpoint is periodic while the other is not".to_string(),
            ));
        }
        Ok(AxisBoundary { lo, hi })
    }

    pub fn is_periodic(&self) -> bool {
        self.lo == Boundary::Periodic
    }

    /// The real-to-real variant implied by a non-periodic pair.
    pub fn real_real_variant(&self) -> Option<RealRealVariant> {
        match (self.lo, self.hi) {
            (Boundary::Even, Boundary::Even) => Some(RealRealVariant::Dct2),
            (Boundary::Odd, Boundary::Odd) => Some(RealRealVariant::Dst2),
            (Boundary::Even, Boundary::Odd) => Some(RealRealVariant::Dct4),
            (Boundary::Odd, Boundary::Even) => Some(RealRealVariant::Dst4),
            (Boundary::Periodic, Boundary::Periodic) => None,
            _ => None,
        }
    }
}

/// Direction of a transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Which DCT/DST variant an r2r axis uses. `Dct4`/`Dst4` are self-inverse
/// up to scaling, so their forward and backward plans share a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealRealVariant {
    /// (even, even): DCT-II forward, DCT-III backward.
    Dct2,
    /// (odd, odd): DST-II forward, DST-III backward.
    Dst2,
    /// (even, odd): DCT-IV, self-inverse up to scaling.
    Dct4,
    /// (odd, even): DST-IV, self-inverse up to scaling.
    Dst4,
}

impl RealRealVariant {
    pub fn is_self_inverse(&self) -> bool {
        matches!(self, RealRealVariant::Dct4 | RealRealVariant::Dst4)
    }
}

/// The overall flavor a `PlanCache` entry is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelFlavor {
    R2c,
    C2c,
    R2r(RealRealVariant),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mixed_periodicity() {
        assert!(AxisBoundary::new(Boundary::Periodic, Boundary::Even).is_err());
    }

    #[test]
    fn even_even_is_dct2() {
        let bc = AxisBoundary::new(Boundary::Even, Boundary::Even).unwrap();
        assert_eq!(bc.real_real_variant(), Some(RealRealVariant::Dct2));
    }

    #[test]
    fn odd_even_is_self_inverse_dst4() {
        let bc = AxisBoundary::new(Boundary::Odd, Boundary::Even).unwrap();
        let v = bc.real_real_variant().unwrap();
        assert_eq!(v, RealRealVariant::Dst4);
        assert!(v.is_self_inverse());
    }
}
