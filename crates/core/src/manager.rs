// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Profile, instance, and academic year management.
//!
//! A profile is the durable identity of a lecturer or module. An instance is
//! that profile's record for one academic year. At most one live instance
//! exists per `(profile, academic year)` pair, and a new year's instance
//! always starts with zero allocated hours.

use crate::allocation::rollup_touched;
use crate::command::{InstanceDefaults, NewAcademicYear, NewCohort, NewLecturer, NewModule};
use crate::error::CoreError;
use crate::repository::{Entity, find, load_all, require, require_active_organisation, to_body};
use crate::store::{Collection, DocumentKey, EntityStore, WriteBatch};
use crate::transition::{Context, Transition};
use std::collections::HashSet;
use tracing::{debug, info, warn};
use workload_audit::{Action, Actor, AuditEvent, AuditSubject, Cause, StateSnapshot};
use workload_domain::{
    AcademicYear, AcademicYearId, Allocation, CapacityStatus, Cohort, CohortId, DomainError,
    Instance, InstanceId, LecturerProfile, ModuleProfile, Organisation, OrganisationId, ProfileId,
    ProfileKind, Semester, StatusChange, validate_academic_year, validate_cohort, validate_hours,
    validate_lecturer_profile, validate_module_code_unique, validate_module_profile,
    validate_single_active_year,
};

/// A durable profile of either kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Profile {
    Lecturer(LecturerProfile),
    Module(ModuleProfile),
}

impl Profile {
    #[must_use]
    pub const fn id(&self) -> &ProfileId {
        match self {
            Self::Lecturer(lecturer) => &lecturer.id,
            Self::Module(module) => &module.id,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ProfileKind {
        match self {
            Self::Lecturer(_) => ProfileKind::Lecturer,
            Self::Module(_) => ProfileKind::Module,
        }
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        match self {
            Self::Lecturer(lecturer) => lecturer.is_active,
            Self::Module(module) => module.is_active,
        }
    }

    /// Contract hours a new instance starts with: the lecturer's contract or
    /// the module's delivery requirement.
    #[must_use]
    pub const fn default_contract_hours(&self) -> f64 {
        match self {
            Self::Lecturer(lecturer) => lecturer.contract_hours,
            Self::Module(module) => module.delivery_hours,
        }
    }

    /// Availability a new instance starts with. Modules declare none.
    #[must_use]
    pub fn default_semesters(&self) -> Vec<Semester> {
        match self {
            Self::Lecturer(lecturer) => lecturer.available_semesters.clone(),
            Self::Module(_) => Vec::new(),
        }
    }

    fn key(&self) -> DocumentKey {
        match self {
            Self::Lecturer(lecturer) => lecturer.key(),
            Self::Module(module) => module.key(),
        }
    }

    fn snapshot(&self) -> Result<StateSnapshot, serde_json::Error> {
        match self {
            Self::Lecturer(lecturer) => StateSnapshot::of(lecturer),
            Self::Module(module) => StateSnapshot::of(module),
        }
    }
}

/// Loads a live profile of either kind.
///
/// # Errors
///
/// Returns `CoreError::NotFound` if no live lecturer or module has the id.
pub fn load_profile<S: EntityStore + ?Sized>(
    store: &mut S,
    organisation_id: &OrganisationId,
    profile_id: &ProfileId,
) -> Result<Profile, CoreError> {
    if let Some(lecturer) = find::<LecturerProfile, S>(store, organisation_id, profile_id.as_str())?
    {
        return Ok(Profile::Lecturer(lecturer));
    }
    if let Some(module) = find::<ModuleProfile, S>(store, organisation_id, profile_id.as_str())? {
        return Ok(Profile::Module(module));
    }
    Err(CoreError::not_found("profile", profile_id.as_str()))
}

/// Finds the live instance of a profile in an academic year.
///
/// # Errors
///
/// Returns an error if the store fails.
pub fn find_instance<S: EntityStore + ?Sized>(
    store: &mut S,
    organisation_id: &OrganisationId,
    profile_id: &ProfileId,
    academic_year_id: &AcademicYearId,
) -> Result<Option<Instance>, CoreError> {
    Ok(load_all::<Instance, S>(store, organisation_id)?
        .into_iter()
        .find(|instance| {
            &instance.profile_id == profile_id && &instance.academic_year_id == academic_year_id
        }))
}

/// Registers a tenant organisation.
///
/// Registering an id that already exists writes nothing.
///
/// # Errors
///
/// Returns an error if the name is empty or the store fails.
pub fn register_organisation<S: EntityStore + ?Sized>(
    store: &mut S,
    organisation_id: &OrganisationId,
    name: &str,
    actor: Actor,
    cause: Cause,
) -> Result<Transition<OrganisationId>, CoreError> {
    if name.trim().is_empty() {
        return Err(DomainError::MissingField {
            entity: "organisation",
            field: "name",
        }
        .into());
    }

    if find::<Organisation, S>(store, organisation_id, organisation_id.as_str())?.is_some() {
        debug!(organisation_id = %organisation_id, "Organisation already registered");
        return Ok(Transition::unchanged(organisation_id.clone()));
    }

    let organisation: Organisation = Organisation {
        id: organisation_id.clone(),
        name: name.trim().to_string(),
        is_active: true,
    };
    let audit_event: AuditEvent = AuditEvent::new(
        AuditSubject::new(
            organisation_id,
            Collection::Organisations.as_str(),
            organisation_id.as_str(),
        ),
        actor,
        cause,
        Action::new(String::from("RegisterOrganisation"), None),
        StateSnapshot::empty(),
        StateSnapshot::of(&organisation)?,
    );

    let mut batch: WriteBatch = WriteBatch::new();
    batch
        .insert(organisation.key(), to_body(&organisation)?)
        .audit(audit_event.clone());
    store.commit(batch)?;

    info!(organisation_id = %organisation_id, "Registered organisation");
    Ok(Transition::written(organisation.id, audit_event))
}

/// Ensures a profile has an instance in an academic year.
///
/// If a live instance already exists its id is returned and nothing is
/// written. Otherwise an instance is created with every allocated-hour
/// field at zero, taking contract hours and availability from `defaults`
/// or, where absent, from the profile.
///
/// # Errors
///
/// Returns an error if:
/// - The organisation is missing or inactive
/// - The profile or academic year is missing or deleted
/// - The contract hours are invalid
pub fn upsert_instance<S: EntityStore + ?Sized>(
    store: &mut S,
    ctx: &Context,
    profile_id: &ProfileId,
    academic_year_id: &AcademicYearId,
    defaults: &InstanceDefaults,
) -> Result<Transition<InstanceId>, CoreError> {
    let org: &OrganisationId = &ctx.organisation_id;
    require_active_organisation(store, org)?;

    let profile: Profile = load_profile(store, org, profile_id)?;
    require::<AcademicYear, S>(store, org, academic_year_id.as_str())?;

    if let Some(existing) = find_instance(store, org, profile_id, academic_year_id)? {
        debug!(
            profile_id = %profile_id,
            academic_year_id = %academic_year_id,
            instance_id = %existing.id,
            "Instance already exists"
        );
        return Ok(Transition::unchanged(existing.id));
    }

    let contract_hours: f64 = defaults
        .contract_hours
        .unwrap_or_else(|| profile.default_contract_hours());
    validate_hours("contract_hours", contract_hours)?;
    let available_semesters: Vec<Semester> = defaults
        .available_semesters
        .clone()
        .unwrap_or_else(|| profile.default_semesters());

    let instance: Instance = Instance::zeroed(
        org.clone(),
        profile_id.clone(),
        profile.kind(),
        academic_year_id.clone(),
        contract_hours,
        available_semesters,
    );

    let audit_event: AuditEvent = ctx.audit(
        Collection::Instances.as_str(),
        instance.id.as_str(),
        Action::new(
            String::from("UpsertInstance"),
            Some(format!(
                "Created {} instance for profile {profile_id} in academic year {academic_year_id}",
                profile.kind().as_str()
            )),
        ),
        StateSnapshot::empty(),
        StateSnapshot::of(&instance)?,
    );

    let mut batch: WriteBatch = WriteBatch::new();
    batch
        .insert(instance.key(), to_body(&instance)?)
        .audit(audit_event.clone());
    store.commit(batch)?;

    info!(
        organisation_id = %org,
        profile_id = %profile_id,
        academic_year_id = %academic_year_id,
        instance_id = %instance.id,
        "Created instance"
    );
    Ok(Transition::written(instance.id, audit_event))
}

/// Creates the target year's instance for the profile behind an existing
/// instance.
///
/// The new instance takes its contract and availability from the profile's
/// current defaults. Hours allocated in the previous year are never carried
/// over. An existing target instance is returned unchanged.
///
/// # Errors
///
/// Returns an error if the previous instance, its profile, or the target
/// year is missing.
pub fn copy_forward<S: EntityStore + ?Sized>(
    store: &mut S,
    ctx: &Context,
    previous_instance_id: &InstanceId,
    target_year_id: &AcademicYearId,
) -> Result<Transition<InstanceId>, CoreError> {
    require_active_organisation(store, &ctx.organisation_id)?;
    let previous: Instance = require(
        store,
        &ctx.organisation_id,
        previous_instance_id.as_str(),
    )?;

    upsert_instance(
        store,
        ctx,
        &previous.profile_id,
        target_year_id,
        &InstanceDefaults::default(),
    )
}

/// The instance a profile ended up with after a rollover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolloverOutcome {
    pub instance_id: InstanceId,
    /// `false` when the instance already existed.
    pub created: bool,
}

/// The rollover result for one profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolloverEntry {
    pub profile_id: ProfileId,
    pub outcome: Result<RolloverOutcome, CoreError>,
}

/// Per-profile results of a year rollover.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RolloverReport {
    pub entries: Vec<RolloverEntry>,
}

impl RolloverReport {
    /// Number of instances newly created.
    #[must_use]
    pub fn created(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(&entry.outcome, Ok(outcome) if outcome.created))
            .count()
    }

    /// Number of profiles whose rollover failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.outcome.is_err())
            .count()
    }
}

/// Copies every active profile with an instance in `from_year` forward into
/// `to_year`.
///
/// Each profile is committed separately; a failure for one never blocks the
/// rest. Inactive and deleted profiles are skipped.
///
/// # Errors
///
/// Returns an error only if the organisation or either year is missing, or
/// the source instances cannot be read.
pub fn rollover_year<S: EntityStore + ?Sized>(
    store: &mut S,
    ctx: &Context,
    from_year: &AcademicYearId,
    to_year: &AcademicYearId,
) -> Result<RolloverReport, CoreError> {
    let org: &OrganisationId = &ctx.organisation_id;
    require_active_organisation(store, org)?;
    require::<AcademicYear, S>(store, org, from_year.as_str())?;
    require::<AcademicYear, S>(store, org, to_year.as_str())?;

    let sources: Vec<Instance> = load_all::<Instance, S>(store, org)?
        .into_iter()
        .filter(|instance| &instance.academic_year_id == from_year)
        .collect();

    let mut report: RolloverReport = RolloverReport::default();
    for source in sources {
        match load_profile(store, org, &source.profile_id) {
            Ok(profile) if !profile.is_active() => {
                debug!(profile_id = %source.profile_id, "Skipping inactive profile");
                continue;
            }
            Ok(_) => {}
            Err(CoreError::NotFound { .. }) => {
                debug!(profile_id = %source.profile_id, "Skipping deleted profile");
                continue;
            }
            Err(err) => {
                report.entries.push(RolloverEntry {
                    profile_id: source.profile_id,
                    outcome: Err(err),
                });
                continue;
            }
        }

        let outcome: Result<RolloverOutcome, CoreError> =
            copy_forward(store, ctx, &source.id, to_year).map(|transition| RolloverOutcome {
                created: transition.wrote(),
                instance_id: transition.value,
            });
        if let Err(err) = &outcome {
            warn!(profile_id = %source.profile_id, error = %err, "Rollover failed for profile");
        }
        report.entries.push(RolloverEntry {
            profile_id: source.profile_id,
            outcome,
        });
    }

    info!(
        organisation_id = %org,
        from_year = %from_year,
        to_year = %to_year,
        profiles = report.entries.len(),
        created = report.created(),
        failed = report.failed(),
        "Rolled over academic year"
    );
    Ok(report)
}

/// What a cascading profile delete removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeSummary {
    pub profile_id: ProfileId,
    pub instances_deleted: usize,
    pub allocations_deleted: usize,
}

/// Soft-deletes a profile, every instance of it, and every allocation
/// assigned to those instances.
///
/// Module instances the deleted allocations counted toward are recomputed
/// from the allocations that remain. Everything is committed in one batch
/// with one audit event, so either all of it is marked deleted or none of
/// it is.
///
/// # Errors
///
/// Returns `CoreError::NotFound` if the profile is missing or already
/// deleted, or an error if the commit fails.
pub fn cascade_delete_profile<S: EntityStore + ?Sized>(
    store: &mut S,
    ctx: &Context,
    profile_id: &ProfileId,
) -> Result<Transition<CascadeSummary>, CoreError> {
    let org: &OrganisationId = &ctx.organisation_id;
    require_active_organisation(store, org)?;
    let profile: Profile = load_profile(store, org, profile_id)?;

    let instances: Vec<Instance> = load_all::<Instance, S>(store, org)?
        .into_iter()
        .filter(|instance| &instance.profile_id == profile_id)
        .collect();
    let instance_ids: HashSet<&InstanceId> = instances.iter().map(|i| &i.id).collect();
    let allocations: Vec<Allocation> = load_all::<Allocation, S>(store, org)?
        .into_iter()
        .filter(|allocation| instance_ids.contains(&allocation.assignee_instance_id))
        .collect();

    let summary: CascadeSummary = CascadeSummary {
        profile_id: profile_id.clone(),
        instances_deleted: instances.len(),
        allocations_deleted: allocations.len(),
    };

    let audit_event: AuditEvent = ctx.audit(
        profile.key().collection.as_str(),
        profile_id.as_str(),
        Action::new(
            String::from("CascadeDeleteProfile"),
            Some(format!(
                "Deleted {} profile with {} instances and {} allocations",
                profile.kind().as_str(),
                summary.instances_deleted,
                summary.allocations_deleted
            )),
        ),
        profile.snapshot()?,
        StateSnapshot::empty(),
    );

    let mut batch: WriteBatch = WriteBatch::new();
    batch.soft_delete(profile.key());
    for instance in &instances {
        batch.soft_delete(instance.key());
    }
    for allocation in &allocations {
        batch.soft_delete(allocation.key());
    }

    let modules: Vec<ModuleProfile> = load_all(store, org)?;
    let after: Vec<Allocation> = load_all::<Allocation, S>(store, org)?
        .into_iter()
        .filter(|allocation| !instance_ids.contains(&allocation.assignee_instance_id))
        .collect();
    let touched: Vec<&Allocation> = allocations.iter().collect();
    let status_changes: Vec<StatusChange> =
        rollup_touched(store, org, &touched, &modules, &after, &mut batch)?;

    batch.audit(audit_event.clone());
    store.commit(batch)?;

    info!(
        organisation_id = %org,
        profile_id = %profile_id,
        instances = summary.instances_deleted,
        allocations = summary.allocations_deleted,
        "Cascade-deleted profile"
    );
    Ok(Transition::written(summary, audit_event).with_status_changes(status_changes))
}

/// Creates a lecturer profile.
///
/// # Errors
///
/// Returns `CoreError::Validation` if any field is invalid.
pub fn create_lecturer<S: EntityStore + ?Sized>(
    store: &mut S,
    ctx: &Context,
    request: &NewLecturer,
) -> Result<Transition<ProfileId>, CoreError> {
    let org: &OrganisationId = &ctx.organisation_id;
    require_active_organisation(store, org)?;

    let mut available_semesters: Vec<Semester> = request.available_semesters.clone();
    available_semesters.sort_unstable();
    available_semesters.dedup();

    let lecturer: LecturerProfile = LecturerProfile {
        id: ProfileId::generate(),
        organisation_id: org.clone(),
        name: request.name.trim().to_string(),
        email: request.email.trim().to_string(),
        fte: request.fte,
        contract_hours: request.contract_hours,
        available_semesters,
        is_active: true,
    };
    validate_lecturer_profile(&lecturer)?;

    let audit_event: AuditEvent = ctx.audit(
        Collection::LecturerProfiles.as_str(),
        lecturer.id.as_str(),
        Action::new(String::from("CreateLecturer"), None),
        StateSnapshot::empty(),
        StateSnapshot::of(&lecturer)?,
    );

    let mut batch: WriteBatch = WriteBatch::new();
    batch
        .insert(lecturer.key(), to_body(&lecturer)?)
        .audit(audit_event.clone());
    store.commit(batch)?;

    debug!(organisation_id = %org, profile_id = %lecturer.id, "Created lecturer");
    Ok(Transition::written(lecturer.id, audit_event))
}

/// Creates a module profile.
///
/// # Errors
///
/// Returns `CoreError::Validation` if any field is invalid and
/// `CoreError::Conflict` if a live module already uses the code.
pub fn create_module<S: EntityStore + ?Sized>(
    store: &mut S,
    ctx: &Context,
    request: &NewModule,
) -> Result<Transition<ProfileId>, CoreError> {
    let org: &OrganisationId = &ctx.organisation_id;
    require_active_organisation(store, org)?;

    let module: ModuleProfile = ModuleProfile {
        id: ProfileId::generate(),
        organisation_id: org.clone(),
        code: ModuleProfile::normalize_code(&request.code),
        title: request.title.trim().to_string(),
        credits: request.credits,
        delivery_hours: request.delivery_hours,
        groupable: request.groupable,
        is_active: true,
    };
    validate_module_profile(&module)?;
    let existing: Vec<ModuleProfile> = load_all(store, org)?;
    validate_module_code_unique(&module, &existing)?;

    let audit_event: AuditEvent = ctx.audit(
        Collection::ModuleProfiles.as_str(),
        module.id.as_str(),
        Action::new(
            String::from("CreateModule"),
            Some(format!("Created module {}", module.code)),
        ),
        StateSnapshot::empty(),
        StateSnapshot::of(&module)?,
    );

    let mut batch: WriteBatch = WriteBatch::new();
    batch
        .insert(module.key(), to_body(&module)?)
        .audit(audit_event.clone());
    store.commit(batch)?;

    info!(organisation_id = %org, profile_id = %module.id, code = %module.code, "Created module");
    Ok(Transition::written(module.id, audit_event))
}

/// Sets the directly edited research and other hours of an instance.
///
/// Capacity is recomputed in the same write. A status change is reported
/// when the stored status differs from the new one.
///
/// # Errors
///
/// Returns `CoreError::Validation` for negative or non-finite hours and
/// `CoreError::NotFound` if the instance is missing.
pub fn update_instance_hours<S: EntityStore + ?Sized>(
    store: &mut S,
    ctx: &Context,
    instance_id: &InstanceId,
    research: f64,
    other: f64,
) -> Result<Transition<Instance>, CoreError> {
    let org: &OrganisationId = &ctx.organisation_id;
    require_active_organisation(store, org)?;
    validate_hours("research", research)?;
    validate_hours("other", other)?;

    let mut instance: Instance = require(store, org, instance_id.as_str())?;
    let before: StateSnapshot = StateSnapshot::of(&instance)?;
    let previous_status: CapacityStatus = instance.capacity.status;

    instance.hours.research = research;
    instance.hours.other = other;
    instance.refresh_capacity();

    let status_changes: Vec<StatusChange> =
        StatusChange::between(&instance.id, previous_status, instance.capacity.status)
            .into_iter()
            .collect();

    let audit_event: AuditEvent = ctx.audit(
        Collection::Instances.as_str(),
        instance.id.as_str(),
        Action::new(
            String::from("UpdateInstanceHours"),
            Some(format!("research={research}, other={other}")),
        ),
        before,
        StateSnapshot::of(&instance)?,
    );

    let mut batch: WriteBatch = WriteBatch::new();
    batch
        .update(instance.key(), to_body(&instance)?)
        .audit(audit_event.clone());
    store.commit(batch)?;

    debug!(
        instance_id = %instance.id,
        total_allocated = instance.capacity.total_allocated,
        status = %instance.capacity.status,
        "Updated instance hours"
    );
    Ok(Transition::written(instance, audit_event).with_status_changes(status_changes))
}

/// Creates an academic year.
///
/// # Errors
///
/// Returns `CoreError::Validation` if the dates are invalid or the year is
/// requested active while another year is active.
pub fn create_academic_year<S: EntityStore + ?Sized>(
    store: &mut S,
    ctx: &Context,
    request: &NewAcademicYear,
) -> Result<Transition<AcademicYearId>, CoreError> {
    let org: &OrganisationId = &ctx.organisation_id;
    require_active_organisation(store, org)?;

    let year: AcademicYear = AcademicYear {
        id: AcademicYearId::generate(),
        organisation_id: org.clone(),
        name: request.name.trim().to_string(),
        start_date: request.start_date,
        end_date: request.end_date,
        is_active: request.is_active,
        is_staging: request.is_staging,
    };
    validate_academic_year(&year)?;
    let existing: Vec<AcademicYear> = load_all(store, org)?;
    validate_single_active_year(&year, &existing)?;

    let audit_event: AuditEvent = ctx.audit(
        Collection::AcademicYears.as_str(),
        year.id.as_str(),
        Action::new(
            String::from("CreateAcademicYear"),
            Some(format!("Created academic year {}", year.name)),
        ),
        StateSnapshot::empty(),
        StateSnapshot::of(&year)?,
    );

    let mut batch: WriteBatch = WriteBatch::new();
    batch
        .insert(year.key(), to_body(&year)?)
        .audit(audit_event.clone());
    store.commit(batch)?;

    info!(
        organisation_id = %org,
        academic_year_id = %year.id,
        name = %year.name,
        "Created academic year"
    );
    Ok(Transition::written(year.id, audit_event))
}

/// Makes an academic year the organisation's only active year.
///
/// Any previously active year is deactivated in the same batch. Activating
/// the year that is already active writes nothing.
///
/// # Errors
///
/// Returns `CoreError::NotFound` if the year is missing.
pub fn activate_academic_year<S: EntityStore + ?Sized>(
    store: &mut S,
    ctx: &Context,
    academic_year_id: &AcademicYearId,
) -> Result<Transition<AcademicYearId>, CoreError> {
    let org: &OrganisationId = &ctx.organisation_id;
    require_active_organisation(store, org)?;

    let mut year: AcademicYear = require(store, org, academic_year_id.as_str())?;
    if year.is_active {
        return Ok(Transition::unchanged(year.id));
    }
    let before: StateSnapshot = StateSnapshot::of(&year)?;

    let mut batch: WriteBatch = WriteBatch::new();
    let mut deactivated: Vec<String> = Vec::new();
    for mut other in load_all::<AcademicYear, S>(store, org)? {
        if other.is_active && other.id != year.id {
            other.is_active = false;
            batch.update(other.key(), to_body(&other)?);
            deactivated.push(other.id.to_string());
        }
    }

    year.is_active = true;
    let audit_event: AuditEvent = ctx.audit(
        Collection::AcademicYears.as_str(),
        year.id.as_str(),
        Action::new(
            String::from("ActivateAcademicYear"),
            Some(if deactivated.is_empty() {
                format!("Activated academic year {}", year.name)
            } else {
                format!(
                    "Activated academic year {}, deactivated {}",
                    year.name,
                    deactivated.join(", ")
                )
            }),
        ),
        before,
        StateSnapshot::of(&year)?,
    );
    batch
        .update(year.key(), to_body(&year)?)
        .audit(audit_event.clone());
    store.commit(batch)?;

    info!(organisation_id = %org, academic_year_id = %year.id, "Activated academic year");
    Ok(Transition::written(year.id, audit_event))
}

/// Creates a cohort.
///
/// # Errors
///
/// Returns `CoreError::Validation` if the dates are invalid and
/// `CoreError::NotFound` if the referenced academic year is missing.
pub fn create_cohort<S: EntityStore + ?Sized>(
    store: &mut S,
    ctx: &Context,
    request: &NewCohort,
) -> Result<Transition<CohortId>, CoreError> {
    let org: &OrganisationId = &ctx.organisation_id;
    require_active_organisation(store, org)?;

    let cohort: Cohort = Cohort {
        id: CohortId::generate(),
        organisation_id: org.clone(),
        name: request.name.trim().to_string(),
        academic_year_id: request.academic_year_id.clone(),
        start_date: request.start_date,
        end_date: request.end_date,
    };
    validate_cohort(&cohort)?;
    if let Some(year_id) = &cohort.academic_year_id {
        require::<AcademicYear, S>(store, org, year_id.as_str())?;
    }

    let audit_event: AuditEvent = ctx.audit(
        Collection::Cohorts.as_str(),
        cohort.id.as_str(),
        Action::new(String::from("CreateCohort"), None),
        StateSnapshot::empty(),
        StateSnapshot::of(&cohort)?,
    );

    let mut batch: WriteBatch = WriteBatch::new();
    batch
        .insert(cohort.key(), to_body(&cohort)?)
        .audit(audit_event.clone());
    store.commit(batch)?;

    debug!(organisation_id = %org, cohort_id = %cohort.id, "Created cohort");
    Ok(Transition::written(cohort.id, audit_event))
}
