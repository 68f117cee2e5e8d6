// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::{create_test_store, seed_cohort};
use crate::{PersistenceError, SqliteStore};
use workload::{Collection, EntityStore, Visibility};
use workload_domain::OrganisationId;

#[test]
fn test_store_initialization() {
    let result: Result<SqliteStore, PersistenceError> = SqliteStore::new_in_memory();
    assert!(result.is_ok());
}

#[test]
fn test_in_memory_stores_are_isolated() {
    let org: OrganisationId = OrganisationId::new("org-1");
    let mut first: SqliteStore = create_test_store();
    let mut second: SqliteStore = create_test_store();

    seed_cohort(&mut first, &org, "c-1");

    assert_eq!(
        first
            .scan(&org, Collection::Cohorts, Visibility::Active)
            .unwrap()
            .len(),
        1
    );
    assert!(
        second
            .scan(&org, Collection::Cohorts, Visibility::Active)
            .unwrap()
            .is_empty()
    );
}

#[test]
fn test_file_store_survives_reopen() {
    let path: std::path::PathBuf =
        std::env::temp_dir().join(format!("workload-reopen-{}.db", std::process::id()));
    let _ = std::fs::remove_file(&path);
    let org: OrganisationId = OrganisationId::new("org-1");

    {
        let mut store: SqliteStore = SqliteStore::open(&path).unwrap();
        seed_cohort(&mut store, &org, "c-1");
    }

    let mut reopened: SqliteStore = SqliteStore::open(&path).unwrap();
    let ids: Vec<String> = reopened
        .scan(&org, Collection::Cohorts, Visibility::Active)
        .unwrap()
        .into_iter()
        .map(|doc| doc.id)
        .collect();
    assert_eq!(ids, vec![String::from("c-1")]);

    drop(reopened);
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
    }
}
