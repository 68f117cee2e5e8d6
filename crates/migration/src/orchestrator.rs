// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::config::{OrchestratorConfig, OrderingPolicy};
use crate::error::MigrationError;
use crate::step::MigrationStep;
use crate::steps::{
    AllocationAcademicYear, InstanceAcademicYear, InstanceCapacity, ProfileStructure,
};
use std::time::Instant;
use time::OffsetDateTime;
use tracing::{debug, info, warn};
use workload::{
    CoreError, Document, EntityStore, WriteBatch, WriteOp, require_active_organisation,
};
use workload_audit::{Action, Actor, AuditEvent, AuditSubject, Cause, StateSnapshot};
use workload_domain::{
    MigrationDetails, MigrationRecord, MigrationStatus, MigrationStepError, OrganisationId,
};

/// The result of one step run, as recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub name: String,
    pub status: MigrationStatus,
    /// Whether later steps may build on this run.
    pub success: bool,
    pub records_processed: usize,
    pub records_total: usize,
    pub errors: Vec<MigrationStepError>,
    pub duration_ms: u64,
}

impl StepOutcome {
    fn from_record(record: &MigrationRecord) -> Self {
        Self {
            name: record.name.clone(),
            status: record.status,
            success: record.status.satisfies_ordering(),
            records_processed: record.details.records_processed,
            records_total: record.details.records_total,
            errors: record.details.errors.clone(),
            duration_ms: record.duration_ms,
        }
    }

    /// Summary such as `3/4 succeeded`.
    #[must_use]
    pub fn tally(&self) -> String {
        format!("{}/{} succeeded", self.records_processed, self.records_total)
    }
}

/// Runs migration steps in their fixed order and records every run.
pub struct MigrationOrchestrator {
    config: OrchestratorConfig,
    steps: Vec<Box<dyn MigrationStep>>,
    actor: Actor,
}

impl std::fmt::Debug for MigrationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationOrchestrator")
            .field("config", &self.config)
            .field("steps", &Self::sequence())
            .finish_non_exhaustive()
    }
}

impl Default for MigrationOrchestrator {
    fn default() -> Self {
        Self::new(OrchestratorConfig::default())
    }
}

impl MigrationOrchestrator {
    #[must_use]
    pub fn new(config: OrchestratorConfig) -> Self {
        Self {
            config,
            steps: vec![
                Box::new(ProfileStructure),
                Box::new(InstanceAcademicYear),
                Box::new(AllocationAcademicYear),
                Box::new(InstanceCapacity),
            ],
            actor: Actor::new(String::from("workload-migration"), String::from("migration")),
        }
    }

    /// Step names in the order they must run.
    #[must_use]
    pub const fn sequence() -> [&'static str; 4] {
        [
            ProfileStructure::NAME,
            InstanceAcademicYear::NAME,
            AllocationAcademicYear::NAME,
            InstanceCapacity::NAME,
        ]
    }

    /// The steps in order.
    pub fn steps(&self) -> impl Iterator<Item = &dyn MigrationStep> {
        self.steps.iter().map(|step| &**step as &dyn MigrationStep)
    }

    #[must_use]
    pub const fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Runs one step for an organisation and records the run.
    ///
    /// A run whose preconditions fail is recorded as `failed` without
    /// touching any document. Otherwise every candidate is migrated in its
    /// own commit and failures are collected in the outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if the step name is unknown or the migration record
    /// cannot be written.
    pub fn run_step(
        &self,
        store: &mut dyn EntityStore,
        organisation_id: &OrganisationId,
        name: &str,
    ) -> Result<StepOutcome, MigrationError> {
        let (position, step) = self
            .steps()
            .enumerate()
            .find(|(_, step)| step.name() == name)
            .ok_or_else(|| MigrationError::UnknownStep(name.to_string()))?;

        let started: Instant = Instant::now();
        let applied_at: OffsetDateTime = OffsetDateTime::now_utc();
        let pending: MigrationStatus = MigrationStatus::Pending;
        let mut details: MigrationDetails = MigrationDetails::default();

        let status: MigrationStatus = match self.check_run(store, organisation_id, position, step)
        {
            Err(err) => {
                warn!(
                    organisation_id = %organisation_id,
                    step = step.name(),
                    error = %err,
                    "Migration step cannot run"
                );
                details.errors.push(step_error(step, organisation_id.as_str(), &err));
                pending.transition_to(MigrationStatus::Failed)?
            }
            Ok(()) => {
                let running: MigrationStatus = pending.transition_to(MigrationStatus::Running)?;
                match self.execute(store, organisation_id, step, &mut details) {
                    Ok(()) => running.transition_to(details.final_status())?,
                    Err(err) => {
                        details.errors.push(step_error(step, organisation_id.as_str(), &err));
                        running.transition_to(MigrationStatus::Failed)?
                    }
                }
            }
        };

        let record: MigrationRecord = MigrationRecord {
            name: step.name().to_string(),
            version: step.version(),
            organisation_id: organisation_id.clone(),
            status,
            applied_at,
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            details,
        };
        let outcome: StepOutcome = StepOutcome::from_record(&record);

        let mut batch: WriteBatch = WriteBatch::new();
        batch.migration_record(record);
        store.commit(batch)?;

        info!(
            organisation_id = %organisation_id,
            step = %outcome.name,
            status = %outcome.status,
            processed = outcome.records_processed,
            total = outcome.records_total,
            errors = outcome.errors.len(),
            duration_ms = outcome.duration_ms,
            "Migration step finished: {}",
            outcome.tally()
        );
        Ok(outcome)
    }

    /// Runs every step in order, stopping after the first failed run.
    ///
    /// Steps that completed before a failure stay applied.
    ///
    /// # Errors
    ///
    /// Returns an error if a migration record cannot be written.
    pub fn run_all(
        &self,
        store: &mut dyn EntityStore,
        organisation_id: &OrganisationId,
    ) -> Result<Vec<StepOutcome>, MigrationError> {
        let mut outcomes: Vec<StepOutcome> = Vec::new();
        for name in Self::sequence() {
            let outcome: StepOutcome = self.run_step(store, organisation_id, name)?;
            let failed: bool = outcome.status == MigrationStatus::Failed;
            outcomes.push(outcome);
            if failed {
                warn!(
                    organisation_id = %organisation_id,
                    step = name,
                    "Stopping after failed step"
                );
                break;
            }
        }
        Ok(outcomes)
    }

    fn check_run(
        &self,
        store: &mut dyn EntityStore,
        organisation_id: &OrganisationId,
        position: usize,
        step: &dyn MigrationStep,
    ) -> Result<(), CoreError> {
        require_active_organisation(store, organisation_id)?;
        self.check_ordering(store, organisation_id, position, step)?;
        step.check_preconditions(store, organisation_id)
    }

    fn check_ordering(
        &self,
        store: &mut dyn EntityStore,
        organisation_id: &OrganisationId,
        position: usize,
        step: &dyn MigrationStep,
    ) -> Result<(), CoreError> {
        let records: Vec<MigrationRecord> = store.migration_records(organisation_id)?;
        let missing: Vec<&str> = Self::sequence()
            .into_iter()
            .take(position)
            .filter(|name| {
                !records
                    .iter()
                    .any(|record| record.name == *name && record.status.satisfies_ordering())
            })
            .collect();
        if missing.is_empty() {
            return Ok(());
        }

        match self.config.ordering {
            OrderingPolicy::Enforce => Err(CoreError::Integrity(format!(
                "step '{}' requires {} to have completed first",
                step.name(),
                missing.join(", ")
            ))),
            OrderingPolicy::Warn => {
                warn!(
                    organisation_id = %organisation_id,
                    step = step.name(),
                    missing = %missing.join(", "),
                    "Running migration step out of order"
                );
                Ok(())
            }
        }
    }

    fn execute(
        &self,
        store: &mut dyn EntityStore,
        organisation_id: &OrganisationId,
        step: &dyn MigrationStep,
        details: &mut MigrationDetails,
    ) -> Result<(), CoreError> {
        let candidates: Vec<Document> = step.candidates(store, organisation_id)?;
        details.records_total = candidates.len();
        debug!(
            organisation_id = %organisation_id,
            step = step.name(),
            candidates = candidates.len(),
            "Found migration candidates"
        );

        for document in &candidates {
            match self.migrate_one(store, organisation_id, step, document) {
                Ok(()) => {
                    details.records_processed += 1;
                    debug!(step = step.name(), record_id = %document.id, "Migrated record");
                }
                Err(err) => {
                    warn!(
                        step = step.name(),
                        record_id = %document.id,
                        error = %err,
                        "Failed to migrate record"
                    );
                    details.errors.push(step_error(step, &document.id, &err));
                }
            }
        }
        Ok(())
    }

    /// Migrates one document and commits it with its audit event.
    fn migrate_one(
        &self,
        store: &mut dyn EntityStore,
        organisation_id: &OrganisationId,
        step: &dyn MigrationStep,
        document: &Document,
    ) -> Result<(), CoreError> {
        let mut batch: WriteBatch = step.migrate(store, organisation_id, document)?;

        let after: serde_json::Value = batch
            .ops()
            .iter()
            .find_map(|op| match op {
                WriteOp::Update { key, body }
                    if key.collection == document.collection && key.id == document.id =>
                {
                    Some(body.clone())
                }
                _ => None,
            })
            .unwrap_or(serde_json::Value::Null);

        batch.audit(AuditEvent::new(
            AuditSubject::new(organisation_id, document.collection.as_str(), &document.id),
            self.actor.clone(),
            Cause::new(
                format!("migration:{}", step.name()),
                step.description().to_string(),
            ),
            Action::new(
                String::from("MigrateRecord"),
                Some(format!("{} v{}", step.name(), step.version())),
            ),
            StateSnapshot::new(document.body.clone()),
            StateSnapshot::new(after),
        ));
        store.commit(batch)?;
        Ok(())
    }
}

fn step_error(step: &dyn MigrationStep, record_id: &str, err: &CoreError) -> MigrationStepError {
    MigrationStepError {
        step: step.name().to_string(),
        record_id: record_id.to_string(),
        message: err.to_string(),
    }
}
