// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

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

mod allocation;
mod command;
mod error;
mod import;
mod manager;
mod memory;
mod observer;
mod repository;
mod store;
mod transition;

#[cfg(test)]
mod tests;

pub use allocation::{
    RecalculationSummary, assign, conflict_report, recalculate_year, unassign,
};
pub use command::{
    AllocationRequest, InstanceDefaults, NewAcademicYear, NewCohort, NewLecturer, NewModule,
};
pub use error::CoreError;
pub use import::{ImportReport, ImportRowResult, import_lecturers};
pub use manager::{
    CascadeSummary, Profile, RolloverEntry, RolloverOutcome, RolloverReport,
    activate_academic_year, cascade_delete_profile, copy_forward, create_academic_year,
    create_cohort, create_lecturer, create_module, find_instance, load_profile,
    register_organisation, rollover_year, update_instance_hours, upsert_instance,
};
pub use memory::MemoryStore;
pub use observer::{InvalidationHub, ObservedStore, QueryKey, SubscriptionId, affected_keys};
pub use repository::{
    Entity, find, from_document, load_all, require, require_active_organisation, to_body,
};
pub use store::{
    Collection, Document, DocumentKey, EntityStore, StoreError, Visibility, WriteBatch, WriteOp,
};
pub use transition::{Context, Transition};
