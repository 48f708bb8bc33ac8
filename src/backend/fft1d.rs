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

//! The vendor-FFT collaborator's narrow interface.
//!
//! A real deployment on an accelerator reaches cuFFT/rocFFT/oneMKL through
//! opaque plan handles: construct once keyed on (axis length, batch count,
//! flavor, direction), then execute many times against caller-owned data
//! and scratch. `Fft1D` is that same shape, sized to what this crate's one
//! backend (`RustfftBackend`) needs.

use num_complex::Complex64;

use crate::error::EngineResult;
use crate::plan::{Direction, RealRealVariant};

/// A batched 1-D transform over `data`, processing `batch` consecutive
/// runs of `len` elements each. `scratch` is caller-owned working space
/// sized to whatever the flavor needs (the accelerator analogue of a
/// work-buffer acquired from the arena and bound into the execution
/// info); passing an undersized scratch is a programming error, not a
/// recoverable one, matching the vendor contract this trait narrows.
pub trait Fft1D: Send + Sync {
    /// `data` holds `batch` runs of `len` complex samples; transformed
    /// in place.
    fn process_c2c(
        &self,
        len: usize,
        batch: usize,
        direction: Direction,
        data: &mut [Complex64],
    ) -> EngineResult<()>;

    /// `real` holds `batch` runs of `len` real samples; `spectrum` holds
    /// `batch` runs of `len/2 + 1` complex bins (the non-redundant half).
    fn process_r2c(&self, len: usize, batch: usize, real: &[f64], spectrum: &mut [Complex64]) -> EngineResult<()>;

    /// Inverse of `process_r2c`: unnormalised, `fwd . bwd = len * I`.
    fn process_c2r(&self, len: usize, batch: usize, spectrum: &[Complex64], real: &mut [f64]) -> EngineResult<()>;

    /// Real-to-real DCT/DST transform selected by `variant`, `batch` runs
    /// of `len` real samples, in place.
    fn process_r2r(
        &self,
        len: usize,
        batch: usize,
        variant: RealRealVariant,
        direction: Direction,
        data: &mut [f64],
    ) -> EngineResult<()>;
}
