// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde_json::{Value, json};
use time::macros::date;
use workload::{
    Collection, Context, DocumentKey, EntityStore, MemoryStore, NewAcademicYear, WriteBatch,
    create_academic_year, register_organisation,
};
use workload_audit::{Actor, Cause};
use workload_domain::{AcademicYearId, OrganisationId};

pub struct Seeded {
    pub store: MemoryStore,
    pub org: OrganisationId,
    pub year_id: AcademicYearId,
}

pub fn create_test_context(org: &OrganisationId) -> Context {
    Context::new(
        org.clone(),
        Actor::new(String::from("planner-123"), String::from("user")),
        Cause::new(String::from("req-456"), String::from("Planner request")),
    )
}

/// An organisation with one academic year, active or not.
pub fn seeded(active_year: bool) -> Seeded {
    let mut store: MemoryStore = MemoryStore::new();
    let org: OrganisationId = OrganisationId::new("org-1");
    register_organisation(
        &mut store,
        &org,
        "Test University",
        Actor::system("seed"),
        Cause::new(String::from("seed"), String::from("Test setup")),
    )
    .unwrap();
    let year_id: AcademicYearId = create_academic_year(
        &mut store,
        &create_test_context(&org),
        &NewAcademicYear {
            name: String::from("2025/26"),
            start_date: date!(2025 - 09 - 01),
            end_date: date!(2026 - 08 - 31),
            is_active: active_year,
            is_staging: false,
        },
    )
    .unwrap()
    .value;
    Seeded {
        store,
        org,
        year_id,
    }
}

pub fn insert_raw(
    store: &mut MemoryStore,
    org: &OrganisationId,
    collection: Collection,
    id: &str,
    body: Value,
) {
    let mut batch: WriteBatch = WriteBatch::new();
    batch.insert(DocumentKey::new(collection, org, id), body);
    store.commit(batch).unwrap();
}

pub fn legacy_lecturer(
    name: &str,
    email: &str,
    contract_hours: f64,
    teaching: f64,
    admin: f64,
) -> Value {
    json!({
        "name": name,
        "email": email,
        "fte": 1.0,
        "contract_hours": contract_hours,
        "available_semesters": ["spring", "autumn"],
        "teaching_hours": teaching,
        "admin_hours": admin,
    })
}

pub fn legacy_module(code: &str, delivery_hours: f64) -> Value {
    json!({
        "code": code,
        "title": format!("Module {code}"),
        "credits": 20,
        "delivery_hours": delivery_hours,
        "groupable": false,
    })
}

/// An allocation in its shape from before academic years were recorded on
/// allocations.
pub fn legacy_allocation(org: &OrganisationId, id: &str, assignee: &str, hours: f64) -> Value {
    json!({
        "id": id,
        "organisation_id": org.as_str(),
        "kind": "module",
        "subject_key": "CS101",
        "semester": "autumn",
        "group_number": 1,
        "groupable": false,
        "assignee_instance_id": assignee,
        "hours": hours,
    })
}
