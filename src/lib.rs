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

//! A distributed multi-dimensional FFT engine with a spectral Poisson
//! solver, built on a block-distributed Cartesian grid abstraction.
//!
//! Two transform engines cover the two families of boundary condition:
//! [`R2CEngine`] for domains periodic on every axis, and [`R2XEngine`]
//! for domains mixing periodic axes with Neumann/Dirichlet axes (handled
//! as DCT/DST variants). [`PoissonSolver`] inverts a separable Laplacian
//! on top of `R2XEngine`'s spectral layout for the general case;
//! [`PoissonHybridSolver`] specializes the common periodic-periodic-Neumann
//! case to a 2-D FFT plus a per-column tridiagonal solve.
//!
//! Usage
//! -----
//! ```
//! use specfft::{PoissonSolver, Geometry, BoundaryConditions, IndexBox};
//!
//! let domain = IndexBox::from_dims([4, 4, 4], 3).unwrap();
//! let geom = Geometry { domain, delta: [1.0, 1.0, 1.0] };
//! let bc = BoundaryConditions::all_periodic();
//! let solver = PoissonSolver::new(geom, bc).unwrap();
//!
//! let rhs = vec![0.0; 64];
//! let mut soln = vec![0.0; 64];
//! solver.solve(&rhs, &mut soln).unwrap();
//! ```
//!
//! Execute-time faults (a vendor plan failing mid-pipeline) are not
//! representable as a `Result` a caller could recover from without
//! leaving a collective redistribution half-applied, so they abort via
//! [`error::EngineError::abort`] rather than being returned; only
//! construction-time validation produces a `Result`. See [`error`] for
//! the fallible-vs-fatal split.

mod array;
mod backend;
mod engine;
mod error;
mod geometry;
mod helpers;
mod plan;
mod poisson;
mod redistribute;

pub use array::{Arena, DistributedArray, LocalDistArray};
pub use backend::{Fft1D, RustfftBackend};
pub use engine::{AxisBoundary, Boundary, BoundaryConditions, R2CEngine, R2CInfo, R2XEngine};
pub use error::{Axis, EngineError, EngineResult};
pub use geometry::{decompose, BoxArray, IndexBox, IndexTransform, RankMap};
pub use plan::{Direction, KernelFlavor, PlanCache, PlanPair, RealRealVariant};
pub use poisson::{Geometry, PoissonHybridSolver, PoissonSolver};
pub use redistribute::{parallel_copy, CommMetadata, CopyDescriptor};
