// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::{cohort_key, create_test_event, create_test_store, seed_cohort};
use crate::SqliteStore;
use serde_json::json;
use time::OffsetDateTime;
use workload::{Collection, Document, EntityStore, StoreError, Visibility, WriteBatch};
use workload_audit::AuditEvent;
use workload_domain::{
    MigrationDetails, MigrationRecord, MigrationStatus, MigrationStepError, OrganisationId,
};

#[test]
fn test_inserted_document_round_trips() {
    let mut store: SqliteStore = create_test_store();
    let org: OrganisationId = OrganisationId::new("org-1");
    let mut batch: WriteBatch = WriteBatch::new();
    batch.insert(
        cohort_key(&org, "c-1"),
        json!({"name": "Year 1", "size": 120, "tags": ["ft"]}),
    );
    store.commit(batch).unwrap();

    let doc: Document = store
        .get(&org, Collection::Cohorts, "c-1", Visibility::Active)
        .unwrap()
        .unwrap();

    assert_eq!(doc.collection, Collection::Cohorts);
    assert_eq!(doc.organisation_id, org);
    assert_eq!(doc.body["size"], json!(120));
    assert_eq!(doc.created_at, doc.updated_at);
    assert!(!doc.is_deleted());
}

#[test]
fn test_rejected_batch_rolls_back() {
    let mut store: SqliteStore = create_test_store();
    let org: OrganisationId = OrganisationId::new("org-1");
    let mut batch: WriteBatch = WriteBatch::new();
    batch
        .insert(cohort_key(&org, "c-1"), json!({"name": "a"}))
        .audit(create_test_event(&org, "CreateCohort"))
        .update(cohort_key(&org, "missing"), json!({"name": "b"}));

    let result: Result<(), StoreError> = store.commit(batch);

    assert!(matches!(result, Err(StoreError::MissingDocument { .. })));
    assert!(
        store
            .scan(&org, Collection::Cohorts, Visibility::IncludeDeleted)
            .unwrap()
            .is_empty()
    );
    assert!(store.audit_events(&org).unwrap().is_empty());
}

#[test]
fn test_duplicate_id_is_rejected_across_commits() {
    let mut store: SqliteStore = create_test_store();
    let org: OrganisationId = OrganisationId::new("org-1");
    seed_cohort(&mut store, &org, "c-1");

    let mut batch: WriteBatch = WriteBatch::new();
    batch.insert(cohort_key(&org, "c-1"), json!({}));

    assert!(matches!(
        store.commit(batch),
        Err(StoreError::DuplicateId { .. })
    ));
}

#[test]
fn test_duplicate_id_is_rejected_within_batch() {
    let mut store: SqliteStore = create_test_store();
    let org: OrganisationId = OrganisationId::new("org-1");
    let mut batch: WriteBatch = WriteBatch::new();
    batch
        .insert(cohort_key(&org, "c-1"), json!({}))
        .insert(cohort_key(&org, "c-1"), json!({}));

    assert!(matches!(
        store.commit(batch),
        Err(StoreError::DuplicateId { .. })
    ));
    assert!(
        store
            .get(&org, Collection::Cohorts, "c-1", Visibility::IncludeDeleted)
            .unwrap()
            .is_none()
    );
}

#[test]
fn test_non_object_body_is_malformed() {
    let mut store: SqliteStore = create_test_store();
    let org: OrganisationId = OrganisationId::new("org-1");
    let mut batch: WriteBatch = WriteBatch::new();
    batch.insert(cohort_key(&org, "c-1"), json!([1, 2, 3]));

    assert!(matches!(
        store.commit(batch),
        Err(StoreError::Malformed { .. })
    ));
}

#[test]
fn test_other_organisation_cannot_read_or_write() {
    let mut store: SqliteStore = create_test_store();
    let owner: OrganisationId = OrganisationId::new("org-1");
    let other: OrganisationId = OrganisationId::new("org-2");
    seed_cohort(&mut store, &owner, "c-1");

    assert!(
        store
            .get(&other, Collection::Cohorts, "c-1", Visibility::IncludeDeleted)
            .unwrap()
            .is_none()
    );
    assert!(
        store
            .scan(&other, Collection::Cohorts, Visibility::IncludeDeleted)
            .unwrap()
            .is_empty()
    );

    let mut batch: WriteBatch = WriteBatch::new();
    batch.update(cohort_key(&other, "c-1"), json!({"name": "stolen"}));
    assert!(matches!(
        store.commit(batch),
        Err(StoreError::MissingDocument { .. })
    ));
}

#[test]
fn test_same_id_in_two_organisations_is_independent() {
    let mut store: SqliteStore = create_test_store();
    let owner: OrganisationId = OrganisationId::new("org-1");
    let other: OrganisationId = OrganisationId::new("org-2");
    seed_cohort(&mut store, &owner, "1");

    let mut batch: WriteBatch = WriteBatch::new();
    batch
        .insert(cohort_key(&other, "1"), json!({"name": "theirs"}))
        .update(cohort_key(&other, "1"), json!({"name": "renamed"}));
    store.commit(batch).unwrap();

    let mine: Document = store
        .get(&owner, Collection::Cohorts, "1", Visibility::Active)
        .unwrap()
        .unwrap();
    assert_eq!(mine.str_field("name"), Some("1"));
    let theirs: Document = store
        .get(&other, Collection::Cohorts, "1", Visibility::Active)
        .unwrap()
        .unwrap();
    assert_eq!(theirs.str_field("name"), Some("renamed"));
}

#[test]
fn test_soft_delete_hides_document_and_keeps_first_timestamp() {
    let mut store: SqliteStore = create_test_store();
    let org: OrganisationId = OrganisationId::new("org-1");
    seed_cohort(&mut store, &org, "c-1");
    seed_cohort(&mut store, &org, "c-2");

    let mut batch: WriteBatch = WriteBatch::new();
    batch.soft_delete(cohort_key(&org, "c-1"));
    store.commit(batch).unwrap();
    let first_deleted: OffsetDateTime = store
        .get(&org, Collection::Cohorts, "c-1", Visibility::IncludeDeleted)
        .unwrap()
        .unwrap()
        .deleted_at
        .unwrap();

    let mut again: WriteBatch = WriteBatch::new();
    again.soft_delete(cohort_key(&org, "c-1"));
    store.commit(again).unwrap();

    let active: Vec<Document> = store
        .scan(&org, Collection::Cohorts, Visibility::Active)
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, "c-2");
    let deleted: Document = store
        .get(&org, Collection::Cohorts, "c-1", Visibility::IncludeDeleted)
        .unwrap()
        .unwrap();
    assert_eq!(deleted.deleted_at, Some(first_deleted));
    assert!(
        store
            .get(&org, Collection::Cohorts, "c-1", Visibility::Active)
            .unwrap()
            .is_none()
    );
}

#[test]
fn test_scan_preserves_insertion_order() {
    let mut store: SqliteStore = create_test_store();
    let org: OrganisationId = OrganisationId::new("org-1");
    for id in ["zeta", "alpha", "mid"] {
        seed_cohort(&mut store, &org, id);
    }

    let ids: Vec<String> = store
        .scan(&org, Collection::Cohorts, Visibility::Active)
        .unwrap()
        .into_iter()
        .map(|doc| doc.id)
        .collect();

    assert_eq!(ids, vec!["zeta", "alpha", "mid"]);
}

#[test]
fn test_update_replaces_body() {
    let mut store: SqliteStore = create_test_store();
    let org: OrganisationId = OrganisationId::new("org-1");
    seed_cohort(&mut store, &org, "c-1");

    let mut batch: WriteBatch = WriteBatch::new();
    batch.update(cohort_key(&org, "c-1"), json!({"name": "renamed"}));
    store.commit(batch).unwrap();

    let doc: Document = store
        .get(&org, Collection::Cohorts, "c-1", Visibility::Active)
        .unwrap()
        .unwrap();
    assert_eq!(doc.str_field("name"), Some("renamed"));
    assert!(doc.updated_at >= doc.created_at);
}

#[test]
fn test_audit_events_receive_increasing_ids_per_organisation() {
    let mut store: SqliteStore = create_test_store();
    let org: OrganisationId = OrganisationId::new("org-1");
    let other: OrganisationId = OrganisationId::new("org-2");
    let mut batch: WriteBatch = WriteBatch::new();
    batch
        .audit(create_test_event(&org, "First"))
        .audit(create_test_event(&other, "Elsewhere"))
        .audit(create_test_event(&org, "Second"));
    store.commit(batch).unwrap();

    let events: Vec<AuditEvent> = store.audit_events(&org).unwrap();

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].action.name, "First");
    assert_eq!(events[1].action.name, "Second");
    let first: i64 = events[0].event_id.unwrap();
    let second: i64 = events[1].event_id.unwrap();
    assert!(first < second);
    assert_eq!(events[1].after.data, json!({"name": "Year 1"}));
}

#[test]
fn test_migration_records_round_trip() {
    let mut store: SqliteStore = create_test_store();
    let org: OrganisationId = OrganisationId::new("org-1");
    let record: MigrationRecord = MigrationRecord {
        name: String::from("profile_structure"),
        version: 1,
        organisation_id: org.clone(),
        status: MigrationStatus::CompletedWithErrors,
        applied_at: OffsetDateTime::now_utc(),
        duration_ms: 12,
        details: MigrationDetails {
            records_total: 3,
            records_processed: 2,
            errors: vec![MigrationStepError {
                step: String::from("profile_structure"),
                record_id: String::from("lec-3"),
                message: String::from("missing email"),
            }],
        },
    };
    let mut batch: WriteBatch = WriteBatch::new();
    batch.migration_record(record.clone());
    store.commit(batch).unwrap();

    assert_eq!(store.migration_records(&org).unwrap(), vec![record]);
    assert!(
        store
            .migration_records(&OrganisationId::new("org-2"))
            .unwrap()
            .is_empty()
    );
}
