// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::helpers::{Fixture, lecturer_request};
use crate::{
    Collection, DocumentKey, EntityStore, MemoryStore, ObservedStore, QueryKey, SubscriptionId,
    WriteBatch, affected_keys, create_lecturer,
};
use serde_json::json;
use std::sync::{Arc, Mutex};
use workload_domain::{AcademicYearId, OrganisationId, ProfileKind};

type Seen = Arc<Mutex<Vec<QueryKey>>>;

fn recorder(seen: &Seen) -> impl Fn(&QueryKey) + Send + 'static {
    let seen: Seen = Arc::clone(seen);
    move |key: &QueryKey| seen.lock().unwrap().push(key.clone())
}

fn observed_fixture() -> (ObservedStore<MemoryStore>, Fixture) {
    let mut fixture: Fixture = Fixture::new();
    let store: MemoryStore = std::mem::take(&mut fixture.store);
    (ObservedStore::new(store), fixture)
}

#[test]
fn test_instance_write_derives_year_scoped_key() {
    let org: OrganisationId = OrganisationId::new("org-1");
    let mut batch: WriteBatch = WriteBatch::new();
    batch.insert(
        DocumentKey::new(Collection::Instances, &org, "i-1"),
        json!({"academic_year_id": "ay-1"}),
    );

    let keys: Vec<QueryKey> = affected_keys(&batch);

    assert_eq!(
        keys,
        vec![QueryKey::Instances {
            organisation_id: org,
            academic_year_id: Some(AcademicYearId::new("ay-1")),
        }]
    );
}

#[test]
fn test_year_scoped_views_match_by_year() {
    let org: OrganisationId = OrganisationId::new("org-1");
    let view = |year: Option<&str>| QueryKey::Allocations {
        organisation_id: org.clone(),
        academic_year_id: year.map(AcademicYearId::new),
    };

    assert!(view(Some("ay-1")).is_affected_by(&view(Some("ay-1"))));
    assert!(!view(Some("ay-1")).is_affected_by(&view(Some("ay-2"))));
    assert!(view(None).is_affected_by(&view(Some("ay-2"))));
    assert!(view(Some("ay-1")).is_affected_by(&view(None)));
}

#[test]
fn test_subscribers_are_notified_after_commit() {
    let (mut store, fixture) = observed_fixture();
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let profiles: QueryKey = QueryKey::Profiles {
        organisation_id: fixture.org.clone(),
        kind: ProfileKind::Lecturer,
    };
    store.hub_mut().subscribe(profiles.clone(), recorder(&seen));

    create_lecturer(&mut store, &fixture.ctx, &lecturer_request("Ada Lovelace", 40.0)).unwrap();

    assert_eq!(seen.lock().unwrap().as_slice(), &[profiles]);
}

#[test]
fn test_rejected_commit_notifies_nobody() {
    let (mut store, fixture) = observed_fixture();
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    store
        .hub_mut()
        .subscribe(QueryKey::Cohorts(fixture.org.clone()), recorder(&seen));

    let mut batch: WriteBatch = WriteBatch::new();
    batch.update(
        DocumentKey::new(Collection::Cohorts, &fixture.org, "missing"),
        json!({}),
    );
    assert!(store.commit(batch).is_err());

    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn test_unsubscribed_observer_is_not_called() {
    let (mut store, fixture) = observed_fixture();
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let id: SubscriptionId = store.hub_mut().subscribe(
        QueryKey::Profiles {
            organisation_id: fixture.org.clone(),
            kind: ProfileKind::Lecturer,
        },
        recorder(&seen),
    );

    assert!(store.hub_mut().unsubscribe(id));
    assert!(!store.hub_mut().unsubscribe(id));
    create_lecturer(&mut store, &fixture.ctx, &lecturer_request("Ada Lovelace", 40.0)).unwrap();

    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn test_moving_allocation_notifies_previous_year() {
    let (mut store, fixture) = observed_fixture();
    let key: DocumentKey = DocumentKey::new(Collection::Allocations, &fixture.org, "a-1");
    let mut batch: WriteBatch = WriteBatch::new();
    batch.insert(key.clone(), json!({"academic_year_id": "ay-1"}));
    store.commit(batch).unwrap();
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let old_year: QueryKey = QueryKey::Allocations {
        organisation_id: fixture.org.clone(),
        academic_year_id: Some(AcademicYearId::new("ay-1")),
    };
    store.hub_mut().subscribe(old_year.clone(), recorder(&seen));

    let mut batch: WriteBatch = WriteBatch::new();
    batch.update(key, json!({"academic_year_id": "ay-2"}));
    store.commit(batch).unwrap();

    assert_eq!(seen.lock().unwrap().as_slice(), &[old_year]);
}
