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

//! The fully-periodic real-to-complex engine.

use std::sync::Arc;

use log::debug;
use num_complex::Complex64;

use crate::array::{DistributedArray, LocalDistArray};
use crate::backend::{Fft1D, RustfftBackend};
use crate::error::{EngineError, EngineResult};
use crate::geometry::{BoxArray, IndexBox, IndexTransform, RankMap};
use crate::plan::{Direction, KernelFlavor, PlanCache};
use crate::redistribute::{parallel_copy, CommMetadata};

/// Construction options for [`R2CEngine`].
#[derive(Debug, Clone, Copy, Default)]
pub struct R2CInfo {
    /// On a 3-D domain, treat axis 2 as an independent batch axis: no
    /// transform and no redistribution along z.
    pub batch_mode: bool,
}

/// Orchestrates a 1-D/2-D/3-D fully periodic real-to-complex transform.
///
/// Internally the transform axis is always local axis 0 of whichever
/// box is live: the x-phase plan runs directly on `rx`/`cx` (domain
/// order already has x as axis 0); each redistribution brings the next
/// axis to local position 0 so the following plan needs no special
/// casing for "which axis am I local in".
pub struct R2CEngine {
    domain: IndexBox,
    info: R2CInfo,
    do_y: bool,
    do_z: bool,
    backend: Arc<dyn Fft1D>,

    s_x: IndexBox,
    s_y: IndexBox,
    s_z: IndexBox,

    meta_x_to_y: Option<CommMetadata>,
    meta_y_to_x: Option<CommMetadata>,
    meta_y_to_z: Option<CommMetadata>,
    meta_z_to_y: Option<CommMetadata>,

    plan_x: PlanCache,
    plan_y: Option<PlanCache>,
    plan_z: Option<PlanCache>,
}

impl R2CEngine {
    /// `domain` must have `lo = 0`; `N0` must be `> 1`; in the 3-D
    /// non-batch case `N1 > 1` whenever `N2 > 1` (so the y-phase is
    /// always meaningful before a z-phase is attempted).
    pub fn new(domain: IndexBox, info: R2CInfo) -> EngineResult<Self> {
        if !domain.is_zero_based() {
            return Err(EngineError::invalid_domain(
                "R2CEngine",
                "new",
                None,
                "domain must have lo = 0".to_string(),
            ));
        }
        let n0 = domain.length(0);
        let n1 = domain.length(1);
        let n2 = domain.length(2);
        if n0 <= 1 {
            return Err(EngineError::invalid_domain(
                "R2CEngine",
                "new",
                Some(0),
                format!("N0 must be > 1, got {}", n0),
            ));
        }
        if !info.batch_mode && n2 > 1 && n1 <= 1 {
            return Err(EngineError::invalid_domain(
                "R2CEngine",
                "new",
                Some(1),
                "N1 must be > 1 when N2 > 1 and batch_mode is false".to_string(),
            ));
        }

        let do_y = n1 > 1;
        let do_z = n2 > 1 && !info.batch_mode;
        let half = n0 / 2 + 1;

        let s_x = IndexBox::new([0, 0, 0], [half - 1, n1 - 1, n2 - 1], domain.ndim())?;
        let s_y = IndexBox::new([0, 0, 0], [n1 - 1, half - 1, n2 - 1], domain.ndim())?;
        let s_z = IndexBox::new([0, 0, 0], [n2 - 1, half - 1, n1 - 1], domain.ndim())?;

        let (meta_x_to_y, meta_y_to_x) = if do_y {
            let sx_boxes = BoxArray::new(vec![s_x]);
            let sy_boxes = BoxArray::new(vec![s_y]);
            (
                Some(CommMetadata::build(&sy_boxes, &sx_boxes, IndexTransform::Swap01)),
                Some(CommMetadata::build(&sx_boxes, &sy_boxes, IndexTransform::Swap01)),
            )
        } else {
            (None, None)
        };
        let (meta_y_to_z, meta_z_to_y) = if do_z {
            let sy_boxes = BoxArray::new(vec![s_y]);
            let sz_boxes = BoxArray::new(vec![s_z]);
            (
                Some(CommMetadata::build(&sz_boxes, &sy_boxes, IndexTransform::Swap02)),
                Some(CommMetadata::build(&sy_boxes, &sz_boxes, IndexTransform::Swap02)),
            )
        } else {
            (None, None)
        };

        let plan_x = PlanCache::new(n0 as usize, (s_x.volume() / half) as usize, KernelFlavor::R2c);
        let plan_y = if do_y {
            Some(PlanCache::new(
                n1 as usize,
                (s_y.volume() / n1) as usize,
                KernelFlavor::C2c,
            ))
        } else {
            None
        };
        let plan_z = if do_z {
            Some(PlanCache::new(
                n2 as usize,
                (s_z.volume() / n2) as usize,
                KernelFlavor::C2c,
            ))
        } else {
            None
        };

        debug!(
            "R2CEngine::new: domain=({},{},{}) do_y={} do_z={} batch_mode={}",
            n0, n1, n2, do_y, do_z, info.batch_mode
        );

        Ok(R2CEngine {
            domain,
            info,
            do_y,
            do_z,
            backend: Arc::new(RustfftBackend::new()),
            s_x,
            s_y,
            s_z,
            meta_x_to_y,
            meta_y_to_x,
            meta_y_to_z,
            meta_z_to_y,
            plan_x,
            plan_y,
            plan_z,
        })
    }

    fn half(&self) -> i64 {
        self.s_x.length(0)
    }

    /// Box of whichever array is the live terminus of the forward chain.
    fn final_box(&self) -> IndexBox {
        if self.do_z {
            self.s_z
        } else if self.do_y {
            self.s_y
        } else {
            self.s_x
        }
    }

    /// How the stored axes of `final_box` map back to canonical (x,y,z).
    pub fn axis_permutation(&self) -> Vec<usize> {
        if self.do_z {
            vec![2, 0, 1]
        } else if self.do_y {
            vec![1, 0, 2]
        } else {
            vec![0, 1, 2]
        }
    }

    /// `(BoxArray, RankMap)` of the spectral domain in canonical (x,y,z)
    /// order. `s_x`'s shape already *is* the canonical spectral domain
    /// by definition, independent of which internal permutation the
    /// live data currently sits in.
    pub fn get_spectral_layout(&self) -> (BoxArray, RankMap) {
        (BoxArray::new(vec![self.s_x]), RankMap::iota(1))
    }

    /// Run the forward transform, leaving the result in the engine's
    /// internal (possibly permuted) layout; returns that layout's box
    /// and a clone of its data for inspection/testing.
    fn run_forward(&self, input: &[f64]) -> EngineResult<LocalDistArray<Complex64>> {
        let mut rx: LocalDistArray<f64> =
            LocalDistArray::define(BoxArray::new(vec![self.domain]), RankMap::iota(1))?;
        rx.data_mut(0).copy_from_slice(input);

        let half = self.half();
        let mut cx: LocalDistArray<Complex64> =
            LocalDistArray::define(BoxArray::new(vec![self.s_x]), RankMap::iota(1))?;
        self.plan_x
            .compute_r2c(&self.backend, rx.data(0), cx.data_mut(0))?;
        let _ = half;

        if !self.do_y {
            return Ok(cx);
        }
        let mut cy: LocalDistArray<Complex64> =
            LocalDistArray::define(BoxArray::new(vec![self.s_y]), RankMap::iota(1))?;
        parallel_copy(
            &mut cy,
            &cx,
            self.meta_x_to_y.as_ref().unwrap(),
            IndexTransform::Swap01,
        );
        self.plan_y.as_ref().unwrap().compute_c2c(
            &self.backend,
            Direction::Forward,
            cy.data_mut(0),
        )?;

        if !self.do_z {
            return Ok(cy);
        }
        let mut cz: LocalDistArray<Complex64> =
            LocalDistArray::define(BoxArray::new(vec![self.s_z]), RankMap::iota(1))?;
        parallel_copy(
            &mut cz,
            &cy,
            self.meta_y_to_z.as_ref().unwrap(),
            IndexTransform::Swap02,
        );
        self.plan_z.as_ref().unwrap().compute_c2c(
            &self.backend,
            Direction::Forward,
            cz.data_mut(0),
        )?;
        Ok(cz)
    }

    fn run_backward(&self, mut spectral: LocalDistArray<Complex64>, out: &mut [f64]) -> EngineResult<()> {
        if self.do_z {
            self.plan_z.as_ref().unwrap().compute_c2c(
                &self.backend,
                Direction::Backward,
                spectral.data_mut(0),
            )?;
            let mut cy: LocalDistArray<Complex64> =
                LocalDistArray::define(BoxArray::new(vec![self.s_y]), RankMap::iota(1))?;
            parallel_copy(
                &mut cy,
                &spectral,
                self.meta_z_to_y.as_ref().unwrap(),
                IndexTransform::Swap02,
            );
            spectral = cy;
        }
        if self.do_y {
            self.plan_y.as_ref().unwrap().compute_c2c(
                &self.backend,
                Direction::Backward,
                spectral.data_mut(0),
            )?;
            let mut cx: LocalDistArray<Complex64> =
                LocalDistArray::define(BoxArray::new(vec![self.s_x]), RankMap::iota(1))?;
            parallel_copy(
                &mut cx,
                &spectral,
                self.meta_y_to_x.as_ref().unwrap(),
                IndexTransform::Swap01,
            );
            spectral = cx;
        }
        let mut rx: LocalDistArray<f64> =
            LocalDistArray::define(BoxArray::new(vec![self.domain]), RankMap::iota(1))?;
        self.plan_x
            .compute_c2r(&self.backend, spectral.data(0), rx.data_mut(0))?;
        out.copy_from_slice(rx.data(0));
        Ok(())
    }

    /// `backward(forward(x)) = N0*N1*N2 * x` elementwise (unnormalised
    /// FFTW convention, carried through every phase untouched).
    pub fn forward(&self, input: &[f64]) -> EngineResult<Vec<Complex64>> {
        Ok(self.run_forward(input)?.data(0).to_vec())
    }

    pub fn backward(&self, spectral: &[Complex64], out: &mut [f64]) -> EngineResult<()> {
        let mut dist: LocalDistArray<Complex64> =
            LocalDistArray::define(BoxArray::new(vec![self.final_box()]), RankMap::iota(1))?;
        dist.data_mut(0).copy_from_slice(spectral);
        self.run_backward(dist, out)
    }

    /// Runs forward, invokes `post_fwd(i, j, k, value)` once per spectral
    /// cell in canonical (x,y,z) order, then runs backward. No external
    /// redistribution happens for the callback: it reads the internal
    /// (possibly permuted) layout directly, translating indices back to
    /// canonical order via [`Self::axis_permutation`].
    ///
    /// Rejected when the engine was constructed with `batch_mode: true`:
    /// the batch axis is never redistributed, so there is no meaningful
    /// single (x,y,z) ordering to hand the callback a z-index for.
    /// Callers needing per-batch spectral access should go through
    /// [`Self::forward_into_layout`]/[`Self::backward_from_layout`]
    /// instead, the way `PoissonHybridSolver` does.
    pub fn forward_then_backward(
        &self,
        input: &[f64],
        out: &mut [f64],
        mut post_fwd: impl FnMut(i64, i64, i64, Complex64) -> Complex64,
    ) -> EngineResult<()> {
        if self.info.batch_mode {
            return Err(EngineError::invalid_domain(
                "R2CEngine",
                "forward_then_backward",
                None,
                "batch_mode forbids a post-forward callback; use forward_into_layout/backward_from_layout instead".to_string(),
            ));
        }
        let mut spectral = self.run_forward(input)?;
        let perm = self.axis_permutation();
        let fb = self.final_box();
        let values: Vec<(usize, Complex64)> = fb
            .iter_cells()
            .map(|cell| {
                let idx = fb.local_linear_index(&cell).unwrap();
                let mut canonical = [0i64; 3];
                for (stored_axis, &canon_axis) in perm.iter().enumerate() {
                    canonical[canon_axis] = cell[stored_axis];
                }
                (idx, post_fwd(canonical[0], canonical[1], canonical[2], spectral.data(0)[idx]))
            })
            .collect();
        for (idx, v) in values {
            spectral.data_mut(0)[idx] = v;
        }
        self.run_backward(spectral, out)
    }

    /// Runs forward, then redistributes the internal spectral array to
    /// `out_layout` (must match one of `s_x`/`s_y`/`s_z`'s shape).
    pub fn forward_into_layout(
        &self,
        input: &[f64],
        out_spectral: &mut LocalDistArray<Complex64>,
    ) -> EngineResult<()> {
        let spectral = self.run_forward(input)?;
        let transform = self.to_canonical_transform();
        let meta = CommMetadata::build(out_spectral.box_array(), spectral.box_array(), transform);
        parallel_copy(out_spectral, &spectral, &meta, transform);
        Ok(())
    }

    /// The transform taking the internal (possibly permuted) spectral
    /// layout into the canonical `s_x`-shaped layout.
    fn to_canonical_transform(&self) -> IndexTransform {
        if self.final_box() == self.s_z {
            IndexTransform::RotateBackward
        } else if self.final_box() == self.s_y {
            IndexTransform::Swap01
        } else {
            IndexTransform::Identity
        }
    }

    /// Inverse of [`Self::forward_into_layout`]'s redistribution step:
    /// takes a spectral array in the canonical `s_x`-shaped layout,
    /// redistributes it into the engine's internal layout, then runs
    /// `backward` (used by `PoissonHybridSolver`, whose user-visible
    /// spectral array is canonically ordered).
    pub fn backward_from_layout(
        &self,
        spectral_canonical: &LocalDistArray<Complex64>,
        out: &mut [f64],
    ) -> EngineResult<()> {
        let transform = self.to_canonical_transform().inverse();
        let mut internal: LocalDistArray<Complex64> =
            LocalDistArray::define(BoxArray::new(vec![self.final_box()]), RankMap::iota(1))?;
        let meta = CommMetadata::build(internal.box_array(), spectral_canonical.box_array(), transform);
        parallel_copy(&mut internal, spectral_canonical, &meta, transform);
        self.run_backward(internal, out)
    }

    pub fn info(&self) -> R2CInfo {
        self.info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn s1_single_axis_round_trip_and_bins() {
        let domain = IndexBox::from_dims([8, 1, 1], 1).unwrap();
        let engine = R2CEngine::new(domain, R2CInfo::default()).unwrap();
        let rhs: Vec<f64> = (0..8).map(|i| (2.0 * PI * i as f64 / 8.0).cos()).collect();
        let spectrum = engine.forward(&rhs).unwrap();
        for (k, c) in spectrum.iter().enumerate() {
            if k == 1 {
                assert!((c.norm() - 4.0).abs() < 1e-8, "bin 1 norm {}", c.norm());
            } else {
                assert!(c.norm() < 1e-8, "bin {} should be ~0, got {}", k, c.norm());
            }
        }
        let mut back = vec![0.0; 8];
        engine.backward(&spectrum, &mut back).unwrap();
        for (a, b) in rhs.iter().zip(back.iter()) {
            assert!((a * 8.0 - b).abs() < 1e-8);
        }
    }

    #[test]
    fn s6_batch_mode_reports_permutation_1_0_2() {
        let domain = IndexBox::from_dims([8, 8, 4], 3).unwrap();
        let engine = R2CEngine::new(domain, R2CInfo { batch_mode: true }).unwrap();
        assert_eq!(engine.axis_permutation(), vec![1, 0, 2]);
    }

    #[test]
    fn batch_mode_rejects_post_forward_callback() {
        let domain = IndexBox::from_dims([8, 8, 4], 3).unwrap();
        let engine = R2CEngine::new(domain, R2CInfo { batch_mode: true }).unwrap();
        let input = vec![0.0; 8 * 8 * 4];
        let mut out = vec![0.0; 8 * 8 * 4];
        assert!(engine
            .forward_then_backward(&input, &mut out, |_, _, _, v| v)
            .is_err());
    }

    #[test]
    fn rejects_non_zero_based_domain() {
        let domain = IndexBox::new([1, 0, 0], [8, 0, 0], 1).unwrap();
        assert!(R2CEngine::new(domain, R2CInfo::default()).is_err());
    }
}
