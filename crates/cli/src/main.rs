// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! # workload
//!
//! Operator command line for a workload store: registers organisations,
//! imports lecturers, runs data migrations, and reports on slot conflicts
//! and capacity drift.
//!
//! Without `--database` the commands run against a throwaway in-memory
//! store.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use color_eyre::Result;
use color_eyre::eyre::Context as _;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_log::AsTrace;
use tracing_subscriber::EnvFilter;
use workload::{
    Context, EntityStore, ImportReport, NewLecturer, RecalculationSummary, Transition,
    conflict_report, import_lecturers, recalculate_year, register_organisation,
};
use workload_audit::{Actor, Cause};
use workload_domain::{AcademicYearId, ConflictGroup, MigrationRecord, OrganisationId};
use workload_migration::{MigrationOrchestrator, OrchestratorConfig, OrderingPolicy, StepOutcome};
use workload_persistence::SqliteStore;

#[cfg(test)]
mod tests;

const ACTOR_ID: &str = "workload-cli";

fn main() -> Result<()> {
    color_eyre::install()?;
    let args: Args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(args.log_level().into())
                .from_env_lossy(),
        )
        .without_time()
        .init();

    match args.run() {
        Ok(()) => (),
        Err(err) => {
            tracing::error!("{err:#}");
            std::process::exit(1);
        }
    }
    Ok(())
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses an in-memory database.
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,
}

impl Args {
    fn run(self) -> Result<()> {
        let mut store: SqliteStore = self.open_store()?;
        self.command.run(&mut store)
    }

    fn open_store(&self) -> Result<SqliteStore> {
        self.database.as_deref().map_or_else(
            || {
                info!("Using in-memory database");
                Ok(SqliteStore::new_in_memory()?)
            },
            |path| {
                info!(path = %path.display(), "Using file-based database");
                SqliteStore::open(path)
                    .wrap_err_with(|| format!("failed to open database {}", path.display()))
            },
        )
    }

    fn log_level(&self) -> LevelFilter {
        self.verbosity.log_level_filter().as_trace()
    }
}

#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// Register an organisation, or confirm it exists
    Register {
        #[arg(long)]
        org: String,
        #[arg(long)]
        name: String,
    },

    /// Import lecturers from a JSON array file
    #[command(visible_alias = "i")]
    Import {
        #[arg(long)]
        org: String,
        #[arg(long)]
        file: PathBuf,
    },

    /// Run one migration step, or every step in order
    #[command(visible_alias = "m")]
    Migrate {
        #[arg(long)]
        org: String,
        /// Step name; omit to run the full sequence
        #[arg(long)]
        step: Option<String>,
        /// What to do when a step runs before its predecessor succeeded
        #[arg(long, default_value = "enforce")]
        ordering: OrderingPolicy,
    },

    /// List migration steps in run order
    Steps,

    /// Show migration records for an organisation
    History {
        #[arg(long)]
        org: String,
    },

    /// Report allocation slots held by more than one assignee
    #[command(visible_alias = "c")]
    Conflicts {
        #[arg(long)]
        org: String,
        #[arg(long)]
        year: String,
    },

    /// Re-derive hours and capacity for every instance in a year
    #[command(visible_alias = "r")]
    Recalculate {
        #[arg(long)]
        org: String,
        #[arg(long)]
        year: String,
    },
}

impl Command {
    fn run(self, store: &mut dyn EntityStore) -> Result<()> {
        match self {
            Self::Register { org, name } => register(store, &OrganisationId::new(&org), &name),
            Self::Import { org, file } => import(store, &OrganisationId::new(&org), &file),
            Self::Migrate {
                org,
                step,
                ordering,
            } => migrate(store, &OrganisationId::new(&org), step.as_deref(), ordering),
            Self::Steps => {
                steps();
                Ok(())
            }
            Self::History { org } => history(store, &OrganisationId::new(&org)),
            Self::Conflicts { org, year } => conflicts(
                store,
                &OrganisationId::new(&org),
                &AcademicYearId::new(&year),
            ),
            Self::Recalculate { org, year } => recalculate(
                store,
                &OrganisationId::new(&org),
                &AcademicYearId::new(&year),
            ),
        }
    }
}

fn cli_context(organisation_id: &OrganisationId, cause: &str, description: &str) -> Context {
    Context::new(
        organisation_id.clone(),
        Actor::system(ACTOR_ID),
        Cause::new(cause.to_string(), description.to_string()),
    )
}

fn register(store: &mut dyn EntityStore, org: &OrganisationId, name: &str) -> Result<()> {
    register_organisation(
        store,
        org,
        name,
        Actor::system(ACTOR_ID),
        Cause::new(String::from("cli:register"), String::from("Register organisation")),
    )?;
    println!("organisation {org} registered");
    Ok(())
}

fn import(store: &mut dyn EntityStore, org: &OrganisationId, file: &Path) -> Result<()> {
    let raw: String = std::fs::read_to_string(file)
        .wrap_err_with(|| format!("failed to read {}", file.display()))?;
    let rows: Vec<NewLecturer> = serde_json::from_str(&raw)
        .wrap_err_with(|| format!("{} is not a JSON array of lecturers", file.display()))?;

    let ctx: Context = cli_context(org, "cli:import", "Bulk lecturer import");
    let report: ImportReport = import_lecturers(store, &ctx, &rows)?;
    for row in &report.rows {
        match &row.outcome {
            Ok(profile_id) => println!("row {}: created {profile_id}", row.index),
            Err(message) => println!("row {}: skipped ({message})", row.index),
        }
    }
    println!("{}/{} succeeded", report.succeeded(), report.rows.len());
    Ok(())
}

fn migrate(
    store: &mut dyn EntityStore,
    org: &OrganisationId,
    step: Option<&str>,
    ordering: OrderingPolicy,
) -> Result<()> {
    let orchestrator: MigrationOrchestrator =
        MigrationOrchestrator::new(OrchestratorConfig { ordering });
    let outcomes: Vec<StepOutcome> = match step {
        Some(name) => vec![orchestrator.run_step(store, org, name)?],
        None => orchestrator.run_all(store, org)?,
    };

    for outcome in &outcomes {
        println!(
            "{:<26} {:<22} {} ({} ms)",
            outcome.name,
            outcome.status.as_str(),
            outcome.tally(),
            outcome.duration_ms
        );
        for error in &outcome.errors {
            println!("  {error}");
        }
    }
    Ok(())
}

fn steps() {
    let orchestrator: MigrationOrchestrator = MigrationOrchestrator::default();
    for (position, step) in orchestrator.steps().enumerate() {
        println!(
            "{}. {} (v{}): {}",
            position + 1,
            step.name(),
            step.version(),
            step.description()
        );
    }
}

fn history(store: &mut dyn EntityStore, org: &OrganisationId) -> Result<()> {
    let records: Vec<MigrationRecord> = store.migration_records(org)?;
    if records.is_empty() {
        println!("no migrations recorded for {org}");
    }
    for record in &records {
        println!(
            "{} {:<26} v{} {:<22} {}/{} processed, {} errors",
            record.applied_at,
            record.name,
            record.version,
            record.status.as_str(),
            record.details.records_processed,
            record.details.records_total,
            record.details.errors.len()
        );
    }
    Ok(())
}

fn conflicts(
    store: &mut dyn EntityStore,
    org: &OrganisationId,
    year: &AcademicYearId,
) -> Result<()> {
    let groups: Vec<ConflictGroup> = conflict_report(store, org, year)?;
    if groups.is_empty() {
        println!("no conflicts in {year}");
    }
    for group in &groups {
        let group_label: String = group
            .key
            .group
            .map_or_else(|| String::from("all groups"), |number| format!("group {number}"));
        let ids: Vec<String> = group
            .allocation_ids()
            .iter()
            .map(ToString::to_string)
            .collect();
        println!(
            "{} {} {group_label}: {}",
            group.key.subject_key,
            group.key.semester,
            ids.join(", ")
        );
    }
    Ok(())
}

fn recalculate(
    store: &mut dyn EntityStore,
    org: &OrganisationId,
    year: &AcademicYearId,
) -> Result<()> {
    let ctx: Context = cli_context(org, "cli:recalculate", "Recalculate capacity");
    let result: Transition<RecalculationSummary> = recalculate_year(store, &ctx, year)?;
    println!(
        "{} instances checked, {} updated",
        result.value.instances_checked, result.value.instances_updated
    );
    Ok(())
}
