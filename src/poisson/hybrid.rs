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

//! 3-D periodic x periodic x Neumann Poisson solve: a 2-D FFT in the
//! periodic plane plus a per-column tridiagonal solve along z.

use std::f64::consts::PI;

use num_complex::Complex64;

use crate::array::{DistributedArray, LocalDistArray};
use crate::engine::{R2CEngine, R2CInfo};
use crate::error::{EngineError, EngineResult};
use crate::geometry::{BoxArray, RankMap};

use super::solver::Geometry;

/// Solves `∇²φ = ρ` on a domain periodic in x and y, Neumann in z.
pub struct PoissonHybridSolver {
    geom: Geometry,
    engine: R2CEngine,
}

impl PoissonHybridSolver {
    pub fn new(geom: Geometry) -> EngineResult<Self> {
        if geom.delta[2] == 0.0 {
            return Err(EngineError::invalid_domain(
                "PoissonHybridSolver",
                "new",
                Some(2),
                "delta z must be nonzero".to_string(),
            ));
        }
        let engine = R2CEngine::new(geom.domain, R2CInfo { batch_mode: true })?;
        Ok(PoissonHybridSolver { geom, engine })
    }

    pub fn solve(&self, rhs: &[f64], soln: &mut [f64]) -> EngineResult<()> {
        let (layout_boxes, layout_ranks) = self.engine.get_spectral_layout();
        let mut spmf: LocalDistArray<Complex64> =
            LocalDistArray::define(layout_boxes, layout_ranks)?;
        self.engine.forward_into_layout(rhs, &mut spmf)?;

        let n0 = self.geom.domain.length(0);
        let n1 = self.geom.domain.length(1);
        let n2 = self.geom.domain.length(2);
        let half = n0 / 2 + 1;
        let dx = self.geom.delta[0];
        let dy = self.geom.delta[1];
        let dz = self.geom.delta[2];
        let layout_box = *spmf.box_array().get(0);

        for i in 0..half {
            for j in 0..n1 {
                let alpha = 2.0 * PI * i as f64 / n0 as f64;
                let jp = if j >= n1 / 2 { n1 - j } else { j };
                let beta = 2.0 * PI * jp as f64 / n1 as f64;
                let lambda_xy =
                    (2.0 / (dx * dx)) * (alpha.cos() - 1.0) + (2.0 / (dy * dy)) * (beta.cos() - 1.0);

                let mut a = vec![0.0f64; n2 as usize];
                let mut b = vec![0.0f64; n2 as usize];
                let mut c = vec![0.0f64; n2 as usize];
                for k in 0..n2 as usize {
                    let a_k = if k == 0 { 0.0 } else { 2.0 / (dz * (dz + dz)) };
                    let c_k = if k + 1 == n2 as usize {
                        0.0
                    } else {
                        2.0 / (dz * (dz + dz))
                    };
                    a[k] = a_k;
                    c[k] = c_k;
                    b[k] = lambda_xy - a_k - c_k;
                }
                if i == 0 && j == 0 {
                    // Gauge fix: remove the constant-mode null space.
                    b[(n2 - 1) as usize] *= 2.0;
                }

                let mut column: Vec<Complex64> = (0..n2)
                    .map(|k| {
                        let cell = [i, j, k];
                        let idx = layout_box.local_linear_index(&cell).unwrap();
                        spmf.data(0)[idx]
                    })
                    .collect();

                thomas_solve(&a, &b, &c, &mut column);

                let scale = 1.0 / (n0 as f64 * n1 as f64);
                for k in 0..n2 {
                    let cell = [i, j, k];
                    let idx = layout_box.local_linear_index(&cell).unwrap();
                    spmf.data_mut(0)[idx] = column[k as usize] * scale;
                }
            }
        }

        self.engine.backward_from_layout(&spmf, soln)
    }
}

/// Thomas (tridiagonal) elimination: forward sweep of pivots into a
/// scratch row, then back-substitution. `a`/`c` are the sub/super
/// diagonals, `b` the main diagonal; `rhs` holds the right-hand side on
/// entry and the solution on return.
fn thomas_solve(a: &[f64], b: &[f64], c: &[f64], rhs: &mut [Complex64]) {
    let n = b.len();
    let mut cp = vec![0.0f64; n];
    let mut dp = vec![Complex64::new(0.0, 0.0); n];

    cp[0] = c[0] / b[0];
    dp[0] = rhs[0] / b[0];
    for k in 1..n {
        let m = b[k] - a[k] * cp[k - 1];
        cp[k] = c[k] / m;
        dp[k] = (rhs[k] - dp[k - 1] * a[k]) / m;
    }

    rhs[n - 1] = dp[n - 1];
    for k in (0..n - 1).rev() {
        rhs[k] = dp[k] - cp[k] * rhs[k + 1];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::IndexBox;

    #[test]
    fn s4_cosine_rhs_produces_separable_solution() {
        let domain = IndexBox::from_dims([4, 4, 4], 3).unwrap();
        let geom = Geometry {
            domain,
            delta: [1.0, 1.0, 1.0],
        };
        let solver = PoissonHybridSolver::new(geom).unwrap();

        let mut rhs = vec![0.0; 64];
        let mut mean = 0.0;
        let vals: Vec<f64> = (0..4)
            .map(|k| (PI * (k as f64 + 0.5) / 4.0).cos())
            .collect();
        for &v in &vals {
            mean += v / 4.0;
        }
        for k in 0..4usize {
            for j in 0..4usize {
                for i in 0..4usize {
                    rhs[i + 4 * (j + 4 * k)] = vals[k] - mean;
                }
            }
        }
        let mut soln = vec![0.0; 64];
        solver.solve(&rhs, &mut soln).unwrap();

        // No xy-variation: every (i,j) column at fixed k should agree.
        for k in 0..4usize {
            let base = soln[0 + 4 * (0 + 4 * k)];
            for j in 0..4usize {
                for i in 0..4usize {
                    let v = soln[i + 4 * (j + 4 * k)];
                    assert!((v - base).abs() < 1e-6, "xy-variation at k={}", k);
                }
            }
        }
    }

    #[test]
    fn rejects_zero_delta_z() {
        let domain = IndexBox::from_dims([4, 4, 4], 3).unwrap();
        let geom = Geometry {
            domain,
            delta: [1.0, 1.0, 0.0],
        };
        assert!(PoissonHybridSolver::new(geom).is_err());
    }
}
