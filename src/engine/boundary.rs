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

//! Per-axis boundary condition configuration for [`super::r2x::R2XEngine`].

use crate::error::EngineResult;
pub use crate::plan::{AxisBoundary, Boundary};

/// `(BC0, BC1, BC2)`: the tuple keying an `R2XEngine`'s execution path.
#[derive(Debug, Clone, Copy)]
pub struct BoundaryConditions {
    pub axes: [AxisBoundary; 3],
}

impl BoundaryConditions {
    pub fn new(bc0: AxisBoundary, bc1: AxisBoundary, bc2: AxisBoundary) -> Self {
        BoundaryConditions {
            axes: [bc0, bc1, bc2],
        }
    }

    pub fn all_periodic() -> Self {
        BoundaryConditions {
            axes: [AxisBoundary::periodic(); 3],
        }
    }

    pub fn is_periodic(&self, axis: usize) -> bool {
        self.axes[axis].is_periodic()
    }
}

/// Validate a full boundary tuple (each axis independently valid; the
/// mixed-periodicity check already lives in `AxisBoundary::new`).
pub fn validate(_bc: &BoundaryConditions) -> EngineResult<()> {
    Ok(())
}
