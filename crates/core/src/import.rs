// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Bulk lecturer import.

use crate::command::NewLecturer;
use crate::error::CoreError;
use crate::manager::create_lecturer;
use crate::repository::require_active_organisation;
use crate::store::EntityStore;
use crate::transition::Context;
use tracing::{info, warn};
use workload_domain::ProfileId;

/// The outcome of importing one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRowResult {
    /// Zero-based position of the row in the input.
    pub index: usize,
    pub outcome: Result<ProfileId, String>,
}

/// Per-row results of a bulk import, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub rows: Vec<ImportRowResult>,
}

impl ImportReport {
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.rows.iter().filter(|row| row.outcome.is_ok()).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.rows.len() - self.succeeded()
    }
}

/// Creates one lecturer per row, each in its own commit.
///
/// An invalid row is reported and skipped; it never prevents the remaining
/// rows from being imported.
///
/// # Errors
///
/// Returns an error only if the organisation is missing or inactive.
pub fn import_lecturers<S: EntityStore + ?Sized>(
    store: &mut S,
    ctx: &Context,
    rows: &[NewLecturer],
) -> Result<ImportReport, CoreError> {
    require_active_organisation(store, &ctx.organisation_id)?;

    let mut report: ImportReport = ImportReport::default();
    for (index, row) in rows.iter().enumerate() {
        let outcome: Result<ProfileId, String> = create_lecturer(store, ctx, row)
            .map(|transition| transition.value)
            .map_err(|err| err.to_string());
        if let Err(message) = &outcome {
            warn!(index, error = %message, "Skipping invalid lecturer row");
        }
        report.rows.push(ImportRowResult { index, outcome });
    }

    info!(
        organisation_id = %ctx.organisation_id,
        rows = report.rows.len(),
        succeeded = report.succeeded(),
        failed = report.failed(),
        "Imported lecturers"
    );
    Ok(report)
}
