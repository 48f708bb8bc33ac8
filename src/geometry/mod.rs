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

//! The domain model: index boxes, box arrays, rank maps, index
//! transforms, and the decomposer that turns a domain into a `BoxArray`.

mod box_array;
mod decompose;
mod index_box;
mod transform;

pub use box_array::{BoxArray, RankMap};
pub use decompose::decompose;
pub use index_box::IndexBox;
pub use transform::IndexTransform;
