// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use crate::{Args, Command};
use clap::Parser;
use workload::{EntityStore, load_all};
use workload_domain::{LecturerProfile, MigrationStatus, OrganisationId};
use workload_migration::OrderingPolicy;
use workload_persistence::SqliteStore;

fn parse(args: &[&str]) -> Args {
    Args::try_parse_from(std::iter::once("workload").chain(args.iter().copied())).unwrap()
}

#[test]
fn test_migrate_defaults_to_full_run_with_enforced_ordering() {
    let args: Args = parse(&["migrate", "--org", "org-1"]);

    assert!(args.database.is_none());
    assert!(matches!(
        args.command,
        Command::Migrate {
            step: None,
            ordering: OrderingPolicy::Enforce,
            ..
        }
    ));
}

#[test]
fn test_migrate_accepts_step_and_warn_ordering() {
    let args: Args = parse(&[
        "--database",
        "workload.db",
        "migrate",
        "--org",
        "org-1",
        "--step",
        "instance_capacity",
        "--ordering",
        "warn",
    ]);

    assert_eq!(
        args.database.as_deref(),
        Some(std::path::Path::new("workload.db"))
    );
    match args.command {
        Command::Migrate { step, ordering, .. } => {
            assert_eq!(step.as_deref(), Some("instance_capacity"));
            assert_eq!(ordering, OrderingPolicy::Warn);
        }
        other => panic!("expected migrate, got {other:?}"),
    }
}

#[test]
fn test_unknown_ordering_is_rejected() {
    let result = Args::try_parse_from([
        "workload", "migrate", "--org", "org-1", "--ordering", "sometimes",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_conflicts_requires_year() {
    let result = Args::try_parse_from(["workload", "conflicts", "--org", "org-1"]);
    assert!(result.is_err());
}

#[test]
fn test_register_import_and_history_against_store() {
    let mut store: SqliteStore = SqliteStore::new_in_memory().unwrap();
    let org: OrganisationId = OrganisationId::new("org-1");
    let file: std::path::PathBuf =
        std::env::temp_dir().join(format!("workload-import-{}.json", std::process::id()));
    std::fs::write(
        &file,
        r#"[
            {"name": "Ada Lovelace", "email": "ada@example.ac.uk", "fte": 1.0,
             "contract_hours": 40.0, "available_semesters": ["autumn"]},
            {"name": "", "email": "nobody@example.ac.uk", "fte": 1.0,
             "contract_hours": 40.0, "available_semesters": []}
        ]"#,
    )
    .unwrap();

    parse(&["register", "--org", "org-1", "--name", "Test University"])
        .command
        .run(&mut store)
        .unwrap();
    parse(&["import", "--org", "org-1", "--file", file.to_str().unwrap()])
        .command
        .run(&mut store)
        .unwrap();
    let _ = std::fs::remove_file(&file);

    let lecturers: Vec<LecturerProfile> = load_all(&mut store, &org).unwrap();
    assert_eq!(lecturers.len(), 1);

    // Nothing to split, then no active year to assign; the run stops there.
    parse(&["migrate", "--org", "org-1"])
        .command
        .run(&mut store)
        .unwrap();
    let statuses: Vec<MigrationStatus> = store
        .migration_records(&org)
        .unwrap()
        .iter()
        .map(|record| record.status)
        .collect();
    assert_eq!(
        statuses,
        vec![MigrationStatus::Completed, MigrationStatus::Failed]
    );
    parse(&["history", "--org", "org-1"])
        .command
        .run(&mut store)
        .unwrap();
}

#[test]
fn test_unknown_step_is_an_error() {
    let mut store: SqliteStore = SqliteStore::new_in_memory().unwrap();
    parse(&["register", "--org", "org-1", "--name", "Test University"])
        .command
        .run(&mut store)
        .unwrap();

    let result = parse(&["migrate", "--org", "org-1", "--step", "reticulate_splines"])
        .command
        .run(&mut store);

    assert!(result.is_err());
}
