// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{
    AllocationRequest, Context, InstanceDefaults, MemoryStore, NewAcademicYear, NewLecturer,
    NewModule, create_academic_year, create_lecturer, create_module, register_organisation,
    upsert_instance,
};
use time::macros::date;
use workload_audit::{Actor, Cause};
use workload_domain::{
    AcademicYearId, AllocationKind, InstanceId, OrganisationId, ProfileId, Semester,
};

pub fn create_test_actor() -> Actor {
    Actor::new(String::from("planner-123"), String::from("user"))
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("req-456"), String::from("Planner request"))
}

pub fn create_test_context(organisation_id: &OrganisationId) -> Context {
    Context::new(
        organisation_id.clone(),
        create_test_actor(),
        create_test_cause(),
    )
}

pub fn lecturer_request(name: &str, contract_hours: f64) -> NewLecturer {
    NewLecturer {
        name: name.to_string(),
        email: format!("{}@example.ac.uk", name.to_lowercase().replace(' ', ".")),
        fte: 1.0,
        contract_hours,
        available_semesters: vec![Semester::Spring, Semester::Autumn],
    }
}

pub fn module_request(code: &str, groupable: bool) -> NewModule {
    NewModule {
        code: code.to_string(),
        title: format!("Module {code}"),
        credits: 20,
        delivery_hours: 60.0,
        groupable,
    }
}

pub fn year_request(name: &str, start_year: i32, is_active: bool) -> NewAcademicYear {
    let start: time::Date = date!(2025 - 09 - 01)
        .replace_year(start_year)
        .unwrap();
    let end: time::Date = date!(2026 - 08 - 31)
        .replace_year(start_year + 1)
        .unwrap();
    NewAcademicYear {
        name: name.to_string(),
        start_date: start,
        end_date: end,
        is_active,
        is_staging: false,
    }
}

/// An organisation with one active academic year.
pub struct Fixture {
    pub store: MemoryStore,
    pub org: OrganisationId,
    pub ctx: Context,
    pub year_id: AcademicYearId,
}

impl Fixture {
    pub fn new() -> Self {
        Self::for_organisation("org-1")
    }

    pub fn for_organisation(id: &str) -> Self {
        let mut store: MemoryStore = MemoryStore::new();
        let org: OrganisationId = OrganisationId::new(id);
        register_organisation(
            &mut store,
            &org,
            "Test University",
            create_test_actor(),
            create_test_cause(),
        )
        .unwrap();
        let ctx: Context = create_test_context(&org);
        let year_id: AcademicYearId =
            create_academic_year(&mut store, &ctx, &year_request("2025/26", 2025, true))
                .unwrap()
                .value;
        Self {
            store,
            org,
            ctx,
            year_id,
        }
    }

    /// Creates a lecturer and its instance in the fixture year.
    pub fn lecturer(&mut self, name: &str, contract_hours: f64) -> (ProfileId, InstanceId) {
        let profile_id: ProfileId =
            create_lecturer(&mut self.store, &self.ctx, &lecturer_request(name, contract_hours))
                .unwrap()
                .value;
        let instance_id: InstanceId = upsert_instance(
            &mut self.store,
            &self.ctx,
            &profile_id,
            &self.year_id,
            &InstanceDefaults::default(),
        )
        .unwrap()
        .value;
        (profile_id, instance_id)
    }

    /// Creates a module and its instance in the fixture year.
    pub fn module(&mut self, code: &str, groupable: bool) -> (ProfileId, InstanceId) {
        let profile_id: ProfileId =
            create_module(&mut self.store, &self.ctx, &module_request(code, groupable))
                .unwrap()
                .value;
        let instance_id: InstanceId = upsert_instance(
            &mut self.store,
            &self.ctx,
            &profile_id,
            &self.year_id,
            &InstanceDefaults::default(),
        )
        .unwrap()
        .value;
        (profile_id, instance_id)
    }

    pub fn module_allocation(
        &self,
        code: &str,
        semester: Semester,
        group_number: u16,
        assignee: &InstanceId,
        hours: f64,
    ) -> AllocationRequest {
        AllocationRequest {
            id: None,
            kind: AllocationKind::Module,
            subject_key: code.to_string(),
            academic_year_id: self.year_id.clone(),
            semester,
            group_number,
            assignee_instance_id: assignee.clone(),
            hours,
        }
    }

    pub fn admin_allocation(
        &self,
        category: &str,
        assignee: &InstanceId,
        hours: f64,
    ) -> AllocationRequest {
        AllocationRequest {
            id: None,
            kind: AllocationKind::Admin,
            subject_key: category.to_string(),
            academic_year_id: self.year_id.clone(),
            semester: Semester::Autumn,
            group_number: 1,
            assignee_instance_id: assignee.clone(),
            hours,
        }
    }
}
