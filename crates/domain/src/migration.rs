// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::ids::OrganisationId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;

/// Status of a single migration step run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationStatus {
    Pending,
    Running,
    Completed,
    CompletedWithErrors,
    Failed,
}

impl MigrationStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::CompletedWithErrors => "completed_with_errors",
            Self::Failed => "failed",
        }
    }

    /// Checks if a transition from this status to another is valid.
    ///
    /// Valid transitions are:
    /// - `Pending` → `Running`
    /// - `Pending` → `Failed` (a precondition failed before any work)
    /// - `Running` → `Completed`, `CompletedWithErrors`, or `Failed`
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Running | Self::Failed)
                | (
                    Self::Running,
                    Self::Completed | Self::CompletedWithErrors | Self::Failed
                )
        )
    }

    /// Returns whether the run has finished.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::CompletedWithErrors | Self::Failed
        )
    }

    /// Returns whether a later step may build on a run with this status.
    #[must_use]
    pub const fn satisfies_ordering(&self) -> bool {
        matches!(self, Self::Completed | Self::CompletedWithErrors)
    }

    /// Validates a transition.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidMigrationTransition` if the transition is
    /// not permitted.
    pub fn transition_to(self, target: Self) -> Result<Self, DomainError> {
        if self.can_transition_to(target) {
            Ok(target)
        } else {
            Err(DomainError::InvalidMigrationTransition {
                from: self.as_str().to_string(),
                to: target.as_str().to_string(),
            })
        }
    }
}

impl FromStr for MigrationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "completed_with_errors" => Ok(Self::CompletedWithErrors),
            "failed" => Ok(Self::Failed),
            _ => Err(DomainError::InvalidMigrationStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for MigrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single record that a migration step could not transform.
///
/// Collected into the step's details; never raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationStepError {
    pub step: String,
    pub record_id: String,
    pub message: String,
}

impl std::fmt::Display for MigrationStepError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.step, self.record_id, self.message)
    }
}

/// Counts and errors accumulated by a step run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationDetails {
    /// Records found in the pre-migration shape.
    pub records_total: usize,
    /// Records transformed and committed.
    pub records_processed: usize,
    pub errors: Vec<MigrationStepError>,
}

impl MigrationDetails {
    /// Derives the terminal status of a run that executed.
    ///
    /// A run in which every candidate failed is `Failed`.
    #[must_use]
    pub fn final_status(&self) -> MigrationStatus {
        if self.errors.is_empty() {
            MigrationStatus::Completed
        } else if self.records_processed == 0 {
            MigrationStatus::Failed
        } else {
            MigrationStatus::CompletedWithErrors
        }
    }
}

/// The durable record of one migration step run for one organisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    pub name: String,
    pub version: u32,
    pub organisation_id: OrganisationId,
    pub status: MigrationStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub applied_at: OffsetDateTime,
    pub duration_ms: u64,
    pub details: MigrationDetails,
}
