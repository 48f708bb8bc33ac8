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

//! The two transform engines: fully-periodic [`R2CEngine`] and the
//! mixed-boundary [`r2x::R2XEngine`].

pub(crate) mod boundary;
mod r2c;
mod r2x;

pub use boundary::{AxisBoundary, Boundary, BoundaryConditions};
pub use r2c::{R2CEngine, R2CInfo};
pub use r2x::R2XEngine;
