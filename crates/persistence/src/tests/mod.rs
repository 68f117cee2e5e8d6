// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod initialization_tests;
mod store_tests;

use serde_json::json;
use workload::{Collection, DocumentKey, EntityStore, WriteBatch};
use workload_audit::{Action, Actor, AuditEvent, AuditSubject, Cause, StateSnapshot};
use workload_domain::OrganisationId;

use crate::SqliteStore;

pub fn create_test_store() -> SqliteStore {
    SqliteStore::new_in_memory().expect("in-memory store")
}

pub fn cohort_key(org: &OrganisationId, id: &str) -> DocumentKey {
    DocumentKey::new(Collection::Cohorts, org, id)
}

pub fn create_test_event(org: &OrganisationId, action: &str) -> AuditEvent {
    AuditEvent::new(
        AuditSubject::new(org, "cohorts", "c-1"),
        Actor::new(String::from("planner-123"), String::from("user")),
        Cause::new(String::from("req-456"), String::from("Planner request")),
        Action::new(action.to_string(), None),
        StateSnapshot::empty(),
        StateSnapshot::new(json!({"name": "Year 1"})),
    )
}

/// Inserts a cohort-shaped document in its own commit.
pub fn seed_cohort(store: &mut SqliteStore, org: &OrganisationId, id: &str) {
    let mut batch: WriteBatch = WriteBatch::new();
    batch.insert(cohort_key(org, id), json!({"name": id}));
    store.commit(batch).unwrap();
}
