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

//! Error kinds surfaced by construction-time and execute-time validation.
//!
//! Both paths return `Result<_, EngineError>`; [`EngineError::abort`] is
//! available for a caller that needs to turn a fault into a formatted,
//! unrecoverable panic at a true collective barrier, but nothing in this
//! crate calls it itself.

/// Which axis an error refers to, when applicable.
pub type Axis = Option<usize>;

/// Errors produced while building or validating engine state.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// A domain, box, or decomposition violated a shape precondition.
    #[error("invalid domain in {component}::{operation} (axis {axis:?}): {detail}")]
    InvalidDomain {
        component: &'static str,
        operation: &'static str,
        axis: Axis,
        detail: String,
    },

    /// One endpoint of an axis is periodic while the other is not.
    #[error("invalid boundary in {component}::{operation} (axis {axis:?}): {detail}")]
    InvalidBoundary {
        component: &'static str,
        operation: &'static str,
        axis: Axis,
        detail: String,
    },

    /// A vendor transform failed to construct or execute.
    #[error("backend failure in {component}::{operation} (axis {axis:?}): {detail}")]
    BackendFailure {
        component: &'static str,
        operation: &'static str,
        axis: Axis,
        detail: String,
    },

    /// An arena allocation could not be satisfied.
    #[error("out of memory in {component}::{operation}: requested {requested_bytes} bytes")]
    OutOfMemory {
        component: &'static str,
        operation: &'static str,
        requested_bytes: usize,
    },
}

impl EngineError {
    pub fn invalid_domain(
        component: &'static str,
        operation: &'static str,
        axis: Axis,
        detail: impl Into<String>,
    ) -> Self {
        EngineError::InvalidDomain {
            component,
            operation,
            axis,
            detail: detail.into(),
        }
    }

    pub fn invalid_boundary(
        component: &'static str,
        operation: &'static str,
        axis: Axis,
        detail: impl Into<String>,
    ) -> Self {
        EngineError::InvalidBoundary {
            component,
            operation,
            axis,
            detail: detail.into(),
        }
    }

    pub fn backend_failure(
        component: &'static str,
        operation: &'static str,
        axis: Axis,
        detail: impl Into<String>,
    ) -> Self {
        EngineError::BackendFailure {
            component,
            operation,
            axis,
            detail: detail.into(),
        }
    }

    pub fn out_of_memory(
        component: &'static str,
        operation: &'static str,
        requested_bytes: usize,
    ) -> Self {
        EngineError::OutOfMemory {
            component,
            operation,
            requested_bytes,
        }
    }

    /// Abort the process with this error's structured message.
    ///
    /// Used at points where a fault cannot be recovered from without
    /// leaving a collective half-applied (execute-time backend faults
    /// encountered mid-pipeline).
    pub fn abort(&self) -> ! {
        panic!("{}", self);
    }
}

/// Result alias used throughout construction-time code paths.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_component_operation_axis() {
        let e = EngineError::invalid_domain("DomainDecomposer", "decompose", Some(1), "n_pieces < 1");
        let msg = e.to_string();
        assert!(msg.contains("DomainDecomposer"));
        assert!(msg.contains("decompose"));
        assert!(msg.contains("1"));
        assert!(msg.contains("n_pieces < 1"));
    }

    #[test]
    fn out_of_memory_reports_requested_bytes() {
        let e = EngineError::out_of_memory("Arena", "alloc", 4096);
        assert!(e.to_string().contains("4096"));
    }
}
