// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Data migrations that evolve stored documents to the current shape.
//!
//! Each step finds the documents still in its source shape and migrates them
//! one commit at a time. A record that cannot be migrated is reported in the
//! step's results and never stops the rest. Re-running a step that has
//! completed finds nothing left to do.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod config;
mod error;
mod orchestrator;
mod step;
mod steps;

#[cfg(test)]
mod tests;

pub use config::{OrchestratorConfig, OrderingPolicy};
pub use error::MigrationError;
pub use orchestrator::{MigrationOrchestrator, StepOutcome};
pub use step::MigrationStep;
pub use steps::{
    AllocationAcademicYear, InstanceAcademicYear, InstanceCapacity, ProfileStructure,
};
