// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use workload::StoreError;
use workload_domain::DomainError;

/// Errors that prevent a step run from being carried out or recorded.
///
/// Failures of individual records, and of a step's preconditions, are not
/// errors: they are reported in the step's outcome and migration record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationError {
    /// No step has the requested name.
    UnknownStep(String),
    /// The ordering policy name is not recognised.
    UnknownOrderingPolicy(String),
    /// A run attempted an invalid status transition.
    InvalidTransition(DomainError),
    /// The migration record could not be written.
    Store(StoreError),
}

impl std::fmt::Display for MigrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownStep(name) => write!(f, "Unknown migration step: {name}"),
            Self::UnknownOrderingPolicy(name) => {
                write!(f, "Unknown ordering policy '{name}', expected 'enforce' or 'warn'")
            }
            Self::InvalidTransition(err) => write!(f, "Invalid migration run: {err}"),
            Self::Store(err) => write!(f, "Failed to record migration: {err}"),
        }
    }
}

impl std::error::Error for MigrationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidTransition(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::UnknownStep(_) | Self::UnknownOrderingPolicy(_) => None,
        }
    }
}

impl From<DomainError> for MigrationError {
    fn from(err: DomainError) -> Self {
        Self::InvalidTransition(err)
    }
}

impl From<StoreError> for MigrationError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}
