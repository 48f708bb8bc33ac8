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

//! A single owned buffer that hands out a real-typed or complex-typed view
//! of itself on demand.
//!
//! A transform's real-space and spectral-space buffers alias the same
//! storage: a single raw buffer with two or three typed views onto
//! disjoint byte spans. Rather than storing raw `u8`s (whose alignment an
//! allocator is not contractually bound to give us for `Complex64`), the
//! buffer is backed by `f64` directly, which already satisfies both
//! `f64`'s and `Complex64`'s alignment requirement (a `Complex64` is two
//! adjacent `f64`s). `as_real_mut`/`as_complex_mut` each borrow
//! `&mut self`, so the borrow checker enforces that only one typed view
//! is live at a time — the invariant is upheld by the type system, not
//! merely by convention.
//!
//! In debug builds, each checkout also records which view is live so a
//! phase boundary can assert the expected view is the one in use.

use std::cell::Cell;
use std::mem::size_of;

use num_complex::Complex64;

use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArenaView {
    None,
    Real,
    Complex,
}

/// An owned buffer large enough to back either a real or a complex typed
/// view, but never both live at once.
pub struct Arena {
    buffer: Vec<f64>,
    last_view: Cell<ArenaView>,
}

impl Arena {
    /// Allocate an arena capable of holding `max_elems_f64` `f64`s (or,
    /// equivalently, `max_elems_f64 / 2` `Complex64`s).
    pub fn alloc(
        component: &'static str,
        operation: &'static str,
        max_elems_f64: usize,
    ) -> EngineResult<Self> {
        let mut buffer = Vec::new();
        buffer.try_reserve_exact(max_elems_f64).map_err(|_| {
            EngineError::out_of_memory(component, operation, max_elems_f64 * size_of::<f64>())
        })?;
        buffer.resize(max_elems_f64, 0.0);
        Ok(Arena {
            buffer,
            last_view: Cell::new(ArenaView::None),
        })
    }

    pub fn capacity_f64(&self) -> usize {
        self.buffer.len()
    }

    pub fn capacity_complex(&self) -> usize {
        self.buffer.len() / 2
    }

    /// Borrow `len` elements of the buffer as real data.
    pub fn as_real_mut(&mut self, len: usize) -> &mut [f64] {
        assert!(
            len <= self.buffer.len(),
            "arena real view of {} exceeds capacity {}",
            len,
            self.buffer.len()
        );
        self.last_view.set(ArenaView::Real);
        &mut self.buffer[..len]
    }

    /// Borrow `len` elements of the buffer as complex data.
    pub fn as_complex_mut(&mut self, len: usize) -> &mut [Complex64] {
        assert!(
            len * 2 <= self.buffer.len(),
            "arena complex view of {} exceeds capacity {} f64s",
            len,
            self.buffer.len()
        );
        self.last_view.set(ArenaView::Complex);
        // SAFETY: `Complex64` is `#[repr(C)]` equivalent to `[f64; 2]` (two
        // adjacent f64 components), so a `*mut f64` slice of length `2*len`
        // reinterpreted as `*mut Complex64` of length `len` is valid and
        // properly aligned (f64's alignment already satisfies Complex64's).
        // `&mut self` above guarantees no other view of this buffer is
        // simultaneously borrowed.
        unsafe {
            std::slice::from_raw_parts_mut(self.buffer.as_mut_ptr() as *mut Complex64, len)
        }
    }

    /// Debug-only: assert the most recent checkout matches `expected`.
    pub(crate) fn debug_assert_last_view(&self, expected: ArenaView) {
        debug_assert_eq!(
            self.last_view.get(),
            expected,
            "arena phase-boundary contract violated"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_and_complex_views_share_storage() {
        let mut arena = Arena::alloc("Arena", "test", 8).unwrap();
        {
            let real = arena.as_real_mut(8);
            for (i, x) in real.iter_mut().enumerate() {
                *x = i as f64;
            }
        }
        let complex = arena.as_complex_mut(4);
        // Two adjacent f64s (0,1) become the real/imag parts of complex[0].
        assert_eq!(complex[0].re, 0.0);
        assert_eq!(complex[0].im, 1.0);
        assert_eq!(complex[3].re, 6.0);
        assert_eq!(complex[3].im, 7.0);
    }

    #[test]
    fn out_of_memory_is_reported_not_panicked() {
        // A request this large cannot be satisfied; try_reserve_exact
        // should fail cleanly rather than aborting the process.
        let res = Arena::alloc("Arena", "test", usize::MAX / 4);
        assert!(res.is_err());
    }
}
