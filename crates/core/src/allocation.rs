// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The allocation write path.
//!
//! Every allocation write re-reads the organisation's allocations, runs the
//! conflict gate against that fresh read, and commits the allocation
//! together with the recomputed hours and capacity of every instance it
//! touches. A lecturer instance's teaching and admin hours are the sums of
//! its live module and admin allocations; a module instance's teaching
//! hours are the sum of live allocations on that module in its year.

use crate::command::AllocationRequest;
use crate::error::CoreError;
use crate::manager::find_instance;
use crate::repository::{Entity, find, load_all, require, require_active_organisation, to_body};
use crate::store::{Collection, EntityStore, WriteBatch};
use crate::transition::{Context, Transition};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};
use workload_audit::{Action, AuditEvent, StateSnapshot};
use workload_domain::{
    AcademicYear, AcademicYearId, Allocation, AllocationId, AllocationKind, CapacityStatus,
    ConflictGroup, DomainError, Instance, InstanceId, ModuleProfile, Organisation,
    OrganisationId, ProfileId, ProfileKind, StatusChange, check_before_commit, detect_conflicts,
    validate_allocation,
};

/// Creates an allocation, or replaces the one named by `request.id`.
///
/// # Errors
///
/// Returns an error if:
/// - The organisation is missing or inactive
/// - The module, academic year, assignee, or edited allocation is missing
/// - The assignee is not a lecturer instance in the allocation's year
/// - The slot is already held by a different assignee (`CoreError::Conflict`)
pub fn assign<S: EntityStore + ?Sized>(
    store: &mut S,
    ctx: &Context,
    request: &AllocationRequest,
) -> Result<Transition<Allocation>, CoreError> {
    let org: &OrganisationId = &ctx.organisation_id;
    require_active_organisation(store, org)?;
    let modules: Vec<ModuleProfile> = load_all(store, org)?;

    let (subject_key, groupable): (String, bool) = match request.kind {
        AllocationKind::Module => {
            let code: String = ModuleProfile::normalize_code(&request.subject_key);
            let module: &ModuleProfile = modules
                .iter()
                .find(|module| module.code == code)
                .ok_or_else(|| CoreError::not_found("module", code.clone()))?;
            (module.code.clone(), module.groupable)
        }
        AllocationKind::Admin => (request.subject_key.trim().to_string(), false),
    };

    let allocation: Allocation = Allocation {
        id: request.id.clone().unwrap_or_else(AllocationId::generate),
        organisation_id: org.clone(),
        kind: request.kind,
        subject_key,
        academic_year_id: request.academic_year_id.clone(),
        semester: request.semester,
        group_number: request.group_number,
        groupable,
        assignee_instance_id: request.assignee_instance_id.clone(),
        hours: request.hours,
    };
    validate_allocation(&allocation)?;
    require::<AcademicYear, S>(store, org, allocation.academic_year_id.as_str())?;

    let assignee: Instance = require(store, org, allocation.assignee_instance_id.as_str())?;
    if assignee.profile_kind != ProfileKind::Lecturer {
        return Err(DomainError::InvalidAssignee(format!(
            "instance {} is not a lecturer instance",
            assignee.id
        ))
        .into());
    }
    if assignee.academic_year_id != allocation.academic_year_id {
        return Err(DomainError::InvalidAssignee(format!(
            "instance {} belongs to academic year {}, not {}",
            assignee.id, assignee.academic_year_id, allocation.academic_year_id
        ))
        .into());
    }

    let previous: Option<Allocation> = match &request.id {
        Some(id) => Some(require(store, org, id.as_str())?),
        None => None,
    };

    // Fresh read immediately before the gate.
    let current: Vec<Allocation> = load_all(store, org)?;
    check_before_commit(&allocation, &current)?;

    let mut after: Vec<Allocation> = current
        .into_iter()
        .filter(|existing| existing.id != allocation.id)
        .collect();
    after.push(allocation.clone());

    let mut touched: Vec<&Allocation> = vec![&allocation];
    touched.extend(previous.as_ref());

    let mut batch: WriteBatch = WriteBatch::new();
    if previous.is_some() {
        batch.update(allocation.key(), to_body(&allocation)?);
    } else {
        batch.insert(allocation.key(), to_body(&allocation)?);
    }
    let status_changes: Vec<StatusChange> =
        rollup_touched(store, org, &touched, &modules, &after, &mut batch)?;

    let audit_event: AuditEvent = ctx.audit(
        Collection::Allocations.as_str(),
        allocation.id.as_str(),
        Action::new(
            String::from(if previous.is_some() {
                "UpdateAllocation"
            } else {
                "CreateAllocation"
            }),
            Some(format!(
                "{} {} {}h to instance {}",
                allocation.subject_key,
                allocation.semester,
                allocation.hours,
                allocation.assignee_instance_id
            )),
        ),
        previous
            .as_ref()
            .map_or_else(|| Ok(StateSnapshot::empty()), StateSnapshot::of)?,
        StateSnapshot::of(&allocation)?,
    );
    batch.audit(audit_event.clone());
    store.commit(batch)?;

    info!(
        organisation_id = %org,
        allocation_id = %allocation.id,
        subject_key = %allocation.subject_key,
        assignee = %allocation.assignee_instance_id,
        status_changes = status_changes.len(),
        "Committed allocation"
    );
    Ok(Transition::written(allocation, audit_event).with_status_changes(status_changes))
}

/// Soft-deletes an allocation and recomputes the instances it counted
/// toward.
///
/// # Errors
///
/// Returns `CoreError::NotFound` if the allocation is missing or already
/// deleted.
pub fn unassign<S: EntityStore + ?Sized>(
    store: &mut S,
    ctx: &Context,
    allocation_id: &AllocationId,
) -> Result<Transition<AllocationId>, CoreError> {
    let org: &OrganisationId = &ctx.organisation_id;
    require_active_organisation(store, org)?;

    let allocation: Allocation = require(store, org, allocation_id.as_str())?;
    let modules: Vec<ModuleProfile> = load_all(store, org)?;
    let after: Vec<Allocation> = load_all::<Allocation, S>(store, org)?
        .into_iter()
        .filter(|existing| &existing.id != allocation_id)
        .collect();

    let mut batch: WriteBatch = WriteBatch::new();
    batch.soft_delete(allocation.key());
    let status_changes: Vec<StatusChange> =
        rollup_touched(store, org, &[&allocation], &modules, &after, &mut batch)?;

    let audit_event: AuditEvent = ctx.audit(
        Collection::Allocations.as_str(),
        allocation_id.as_str(),
        Action::new(String::from("DeleteAllocation"), None),
        StateSnapshot::of(&allocation)?,
        StateSnapshot::empty(),
    );
    batch.audit(audit_event.clone());
    store.commit(batch)?;

    info!(organisation_id = %org, allocation_id = %allocation_id, "Deleted allocation");
    Ok(Transition::written(allocation.id, audit_event).with_status_changes(status_changes))
}

/// Counts from a year recalculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecalculationSummary {
    pub instances_checked: usize,
    pub instances_updated: usize,
}

/// Re-derives allocated hours and capacity for every instance in a year.
///
/// Only instances whose stored figures differ are written. When nothing
/// differs, nothing is committed.
///
/// # Errors
///
/// Returns an error if the organisation or year is missing or the commit
/// fails.
pub fn recalculate_year<S: EntityStore + ?Sized>(
    store: &mut S,
    ctx: &Context,
    academic_year_id: &AcademicYearId,
) -> Result<Transition<RecalculationSummary>, CoreError> {
    let org: &OrganisationId = &ctx.organisation_id;
    require_active_organisation(store, org)?;
    let year: AcademicYear = require(store, org, academic_year_id.as_str())?;

    let modules: Vec<ModuleProfile> = load_all(store, org)?;
    let allocations: Vec<Allocation> = load_all(store, org)?;
    let rollup: Rollup<'_> = Rollup::new(&modules, &allocations);
    let instances: Vec<Instance> = load_all::<Instance, S>(store, org)?
        .into_iter()
        .filter(|instance| &instance.academic_year_id == academic_year_id)
        .collect();

    let mut batch: WriteBatch = WriteBatch::new();
    let mut status_changes: Vec<StatusChange> = Vec::new();
    let mut updated: Vec<String> = Vec::new();
    for mut instance in instances.iter().cloned() {
        let stored: Instance = instance.clone();
        let change: Option<StatusChange> = rollup.apply(&mut instance);
        if instance != stored {
            batch.update(instance.key(), to_body(&instance)?);
            updated.push(instance.id.to_string());
            status_changes.extend(change);
        }
    }

    let summary: RecalculationSummary = RecalculationSummary {
        instances_checked: instances.len(),
        instances_updated: updated.len(),
    };
    if batch.is_empty() {
        debug!(
            organisation_id = %org,
            academic_year_id = %academic_year_id,
            "No instances needed recalculation"
        );
        return Ok(Transition::unchanged(summary));
    }

    let audit_event: AuditEvent = ctx.audit(
        Collection::AcademicYears.as_str(),
        academic_year_id.as_str(),
        Action::new(
            String::from("RecalculateYear"),
            Some(format!(
                "Recalculated {} of {} instances in {}: {}",
                summary.instances_updated,
                summary.instances_checked,
                year.name,
                updated.join(", ")
            )),
        ),
        StateSnapshot::empty(),
        StateSnapshot::empty(),
    );
    batch.audit(audit_event.clone());
    store.commit(batch)?;

    info!(
        organisation_id = %org,
        academic_year_id = %academic_year_id,
        checked = summary.instances_checked,
        updated = summary.instances_updated,
        status_changes = status_changes.len(),
        "Recalculated academic year"
    );
    Ok(Transition::written(summary, audit_event).with_status_changes(status_changes))
}

/// Reports every contested slot in an academic year.
///
/// Read-only; nothing is written.
///
/// # Errors
///
/// Returns `CoreError::NotFound` if the organisation or year is missing.
pub fn conflict_report<S: EntityStore + ?Sized>(
    store: &mut S,
    organisation_id: &OrganisationId,
    academic_year_id: &AcademicYearId,
) -> Result<Vec<ConflictGroup>, CoreError> {
    require::<Organisation, S>(store, organisation_id, organisation_id.as_str())?;
    require::<AcademicYear, S>(store, organisation_id, academic_year_id.as_str())?;

    let allocations: Vec<Allocation> = load_all::<Allocation, S>(store, organisation_id)?
        .into_iter()
        .filter(|allocation| &allocation.academic_year_id == academic_year_id)
        .collect();
    Ok(detect_conflicts(&allocations))
}

/// Derives the allocation-fed hours of instances from a set of allocations.
struct Rollup<'a> {
    module_codes: HashMap<&'a ProfileId, &'a str>,
    allocations: &'a [Allocation],
}

impl<'a> Rollup<'a> {
    fn new(modules: &'a [ModuleProfile], allocations: &'a [Allocation]) -> Self {
        Self {
            module_codes: modules
                .iter()
                .map(|module| (&module.id, module.code.as_str()))
                .collect(),
            allocations,
        }
    }

    /// Sets teaching and admin hours from the allocations, refreshes
    /// capacity, and reports a status change.
    fn apply(&self, instance: &mut Instance) -> Option<StatusChange> {
        let previous: CapacityStatus = instance.capacity.status;
        let (teaching, admin): (f64, f64) = match instance.profile_kind {
            ProfileKind::Lecturer => self
                .allocations
                .iter()
                .filter(|a| a.assignee_instance_id == instance.id)
                .fold((0.0, 0.0), |(teaching, admin), a| match a.kind {
                    AllocationKind::Module => (teaching + a.hours, admin),
                    AllocationKind::Admin => (teaching, admin + a.hours),
                }),
            ProfileKind::Module => {
                let code: Option<&str> = self.module_codes.get(&instance.profile_id).copied();
                let teaching: f64 = self
                    .allocations
                    .iter()
                    .filter(|a| {
                        a.kind == AllocationKind::Module
                            && Some(a.subject_key.as_str()) == code
                            && a.academic_year_id == instance.academic_year_id
                    })
                    .map(|a| a.hours)
                    .sum();
                (teaching, 0.0)
            }
        };

        instance.hours.teaching = teaching;
        instance.hours.admin = admin;
        instance.refresh_capacity();
        StatusChange::between(&instance.id, previous, instance.capacity.status)
    }
}

/// Recomputes every instance the touched allocations count toward and adds
/// the updates to `batch`.
///
/// `after` is the full set of live allocations as they will be once the
/// batch commits. Instances the batch already deletes are left alone.
pub(crate) fn rollup_touched<S: EntityStore + ?Sized>(
    store: &mut S,
    org: &OrganisationId,
    touched: &[&Allocation],
    modules: &[ModuleProfile],
    after: &[Allocation],
    batch: &mut WriteBatch,
) -> Result<Vec<StatusChange>, CoreError> {
    let mut instance_ids: BTreeSet<InstanceId> = BTreeSet::new();
    for allocation in touched {
        instance_ids.insert(allocation.assignee_instance_id.clone());
        if allocation.kind != AllocationKind::Module {
            continue;
        }
        let Some(module) = modules.iter().find(|m| m.code == allocation.subject_key) else {
            continue;
        };
        let module_instance: Option<Instance> =
            find_instance(store, org, &module.id, &allocation.academic_year_id)?;
        instance_ids.extend(module_instance.map(|instance| instance.id));
    }

    let rollup: Rollup<'_> = Rollup::new(modules, after);
    let mut status_changes: Vec<StatusChange> = Vec::new();
    for instance_id in instance_ids {
        // A deleted instance no longer tracks hours.
        let Some(mut instance) = find::<Instance, S>(store, org, instance_id.as_str())? else {
            continue;
        };
        if batch.deletes(&instance.key()) {
            continue;
        }
        status_changes.extend(rollup.apply(&mut instance));
        batch.update(instance.key(), to_body(&instance)?);
    }
    Ok(status_changes)
}
