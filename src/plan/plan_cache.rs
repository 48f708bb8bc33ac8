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

//! Per-axis handle on the vendor 1-D batched transform.

use std::sync::Arc;

use log::debug;
use num_complex::Complex64;

use crate::backend::Fft1D;
use crate::error::EngineResult;

use super::{Direction, KernelFlavor, RealRealVariant};

/// Encodes whether an axis's forward and backward plans are the same
/// handle: a vendor backend (or a self-inverse r2r variant) may legally
/// collapse forward and backward into one plan, and destruction must
/// then happen once. `RustfftBackend` never owns a persistent native
/// handle per axis (its own internal plan cache is keyed by length), so
/// for this crate the tag records aliasing *intent* rather than gating
/// an actual destructor call — the shape is kept this way so a future
/// backend that does own native handles slots in without changing
/// `PlanCache`'s public shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanPair {
    Owned,
    SharedWith,
    Separate,
}

/// One axis's transform configuration: length, batch count, and flavor.
/// Built once at engine construction, invoked many times per
/// forward/backward call.
pub struct PlanCache {
    axis_len: usize,
    batch: usize,
    flavor: KernelFlavor,
    pair: PlanPair,
}

impl PlanCache {
    pub fn new(axis_len: usize, batch: usize, flavor: KernelFlavor) -> Self {
        let pair = match flavor {
            KernelFlavor::R2r(v) if v.is_self_inverse() => PlanPair::Owned,
            _ => PlanPair::Separate,
        };
        debug!(
            "plan cache: axis_len={} batch={} flavor={:?} pair={:?}",
            axis_len, batch, flavor, pair
        );
        PlanCache {
            axis_len,
            batch,
            flavor,
            pair,
        }
    }

    pub fn flavor(&self) -> KernelFlavor {
        self.flavor
    }

    pub fn pair(&self) -> PlanPair {
        self.pair
    }

    pub fn compute_r2c(
        &self,
        backend: &Arc<dyn Fft1D>,
        real: &[f64],
        spectrum: &mut [Complex64],
    ) -> EngineResult<()> {
        backend.process_r2c(self.axis_len, self.batch, real, spectrum)
    }

    pub fn compute_c2r(
        &self,
        backend: &Arc<dyn Fft1D>,
        spectrum: &[Complex64],
        real: &mut [f64],
    ) -> EngineResult<()> {
        backend.process_c2r(self.axis_len, self.batch, spectrum, real)
    }

    pub fn compute_c2c(
        &self,
        backend: &Arc<dyn Fft1D>,
        direction: Direction,
        data: &mut [Complex64],
    ) -> EngineResult<()> {
        backend.process_c2c(self.axis_len, self.batch, direction, data)
    }

    pub fn compute_r2r(
        &self,
        backend: &Arc<dyn Fft1D>,
        variant: RealRealVariant,
        direction: Direction,
        data: &mut [f64],
    ) -> EngineResult<()> {
        backend.process_r2r(self.axis_len, self.batch, variant, direction, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_inverse_r2r_variant_reports_owned_pair() {
        let pc = PlanCache::new(8, 4, KernelFlavor::R2r(RealRealVariant::Dct4));
        assert_eq!(pc.pair(), PlanPair::Owned);
    }

    #[test]
    fn r2c_reports_separate_pair() {
        let pc = PlanCache::new(8, 4, KernelFlavor::R2c);
        assert_eq!(pc.pair(), PlanPair::Separate);
    }
}
