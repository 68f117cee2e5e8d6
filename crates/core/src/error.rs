// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::store::StoreError;
use workload_domain::DomainError;

/// Errors returned by workload operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Input was malformed; nothing was written.
    Validation(DomainError),
    /// The entity does not exist, is deleted, or belongs to another
    /// organisation.
    NotFound {
        /// The kind of entity looked up.
        entity: &'static str,
        /// The identifier looked up.
        id: String,
    },
    /// A uniqueness rule would be broken.
    Conflict(DomainError),
    /// A structural precondition does not hold.
    Integrity(String),
    /// The entity store failed.
    Store(StoreError),
}

impl CoreError {
    pub(crate) fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "Validation failed: {err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} '{id}' not found"),
            Self::Conflict(err) => write!(f, "Conflict: {err}"),
            Self::Integrity(msg) => write!(f, "Integrity violation: {msg}"),
            Self::Store(err) => write!(f, "Store error: {err}"),
        }
    }
}

impl std::error::Error for CoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Validation(err) | Self::Conflict(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::NotFound { .. } | Self::Integrity(_) => None,
        }
    }
}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        if err.is_conflict() {
            Self::Conflict(err)
        } else {
            Self::Validation(err)
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Store(StoreError::from(err))
    }
}
