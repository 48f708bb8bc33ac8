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

//! Spectral Poisson solvers built on top of [`crate::engine`]: a fully
//! separable solver for arbitrary per-axis boundary conditions, and a
//! hybrid 2-D-FFT-plus-tridiagonal solver for the periodic-periodic-Neumann
//! case that dominates real use.

mod hybrid;
mod solver;

pub use hybrid::PoissonHybridSolver;
pub use solver::{Geometry, PoissonSolver};
