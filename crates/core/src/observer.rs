// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Change notifications for cached views.
//!
//! Notifications are informational only: they say which view may be stale,
//! never what changed. Consumers re-read through the store. Observers are
//! notified after a successful commit and never for a rejected one.

use crate::store::{
    Collection, Document, EntityStore, StoreError, Visibility, WriteBatch, WriteOp,
};
use tracing::debug;
use workload_audit::AuditEvent;
use workload_domain::{AcademicYearId, MigrationRecord, OrganisationId, ProfileKind};

/// Identifies a view a consumer may hold.
///
/// A year of `None` covers every year of the organisation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Organisation(OrganisationId),
    AcademicYears(OrganisationId),
    Cohorts(OrganisationId),
    Profiles {
        organisation_id: OrganisationId,
        kind: ProfileKind,
    },
    Instances {
        organisation_id: OrganisationId,
        academic_year_id: Option<AcademicYearId>,
    },
    Allocations {
        organisation_id: OrganisationId,
        academic_year_id: Option<AcademicYearId>,
    },
    LegacyRecords(OrganisationId),
    AuditLog(OrganisationId),
    MigrationRecords(OrganisationId),
}

impl QueryKey {
    /// Returns whether a change to `changed` may make this view stale.
    ///
    /// A year-scoped view is affected by a change in its year and by a
    /// change whose year is unknown.
    #[must_use]
    pub fn is_affected_by(&self, changed: &Self) -> bool {
        match (self, changed) {
            (
                Self::Instances {
                    organisation_id: org,
                    academic_year_id: year,
                },
                Self::Instances {
                    organisation_id: changed_org,
                    academic_year_id: changed_year,
                },
            )
            | (
                Self::Allocations {
                    organisation_id: org,
                    academic_year_id: year,
                },
                Self::Allocations {
                    organisation_id: changed_org,
                    academic_year_id: changed_year,
                },
            ) => {
                org == changed_org
                    && (year.is_none() || changed_year.is_none() || year == changed_year)
            }
            _ => self == changed,
        }
    }

    fn for_write(
        collection: Collection,
        organisation_id: &OrganisationId,
        body: Option<&serde_json::Value>,
    ) -> Self {
        let org: OrganisationId = organisation_id.clone();
        let year: Option<AcademicYearId> = body
            .and_then(|body| body.get("academic_year_id"))
            .and_then(serde_json::Value::as_str)
            .map(AcademicYearId::new);
        match collection {
            Collection::Organisations => Self::Organisation(org),
            Collection::AcademicYears => Self::AcademicYears(org),
            Collection::Cohorts => Self::Cohorts(org),
            Collection::LecturerProfiles => Self::Profiles {
                organisation_id: org,
                kind: ProfileKind::Lecturer,
            },
            Collection::ModuleProfiles => Self::Profiles {
                organisation_id: org,
                kind: ProfileKind::Module,
            },
            Collection::Instances => Self::Instances {
                organisation_id: org,
                academic_year_id: year,
            },
            Collection::Allocations => Self::Allocations {
                organisation_id: org,
                academic_year_id: year,
            },
            Collection::LegacyLecturers | Collection::LegacyModules => Self::LegacyRecords(org),
        }
    }
}

/// Derives the views a batch may make stale, without duplicates.
#[must_use]
pub fn affected_keys(batch: &WriteBatch) -> Vec<QueryKey> {
    let mut keys: Vec<QueryKey> = Vec::new();
    for op in batch.ops() {
        let key: QueryKey = match op {
            WriteOp::Insert { key, body } | WriteOp::Update { key, body } => {
                QueryKey::for_write(key.collection, &key.organisation_id, Some(body))
            }
            WriteOp::SoftDelete { key } => {
                QueryKey::for_write(key.collection, &key.organisation_id, None)
            }
            WriteOp::AppendAudit(event) => QueryKey::AuditLog(event.organisation_id().clone()),
            WriteOp::RecordMigration(record) => {
                QueryKey::MigrationRecords(record.organisation_id.clone())
            }
        };
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

/// Handle returned by [`InvalidationHub::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn Fn(&QueryKey) + Send>;

/// Registry of view subscriptions.
#[derive(Default)]
pub struct InvalidationHub {
    next_id: u64,
    subscriptions: Vec<(SubscriptionId, QueryKey, Callback)>,
}

impl std::fmt::Debug for InvalidationHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvalidationHub")
            .field("subscriptions", &self.subscriptions.len())
            .finish_non_exhaustive()
    }
}

impl InvalidationHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `observer` to be called with the changed key whenever a
    /// committed change may make `key` stale.
    pub fn subscribe<F>(&mut self, key: QueryKey, observer: F) -> SubscriptionId
    where
        F: Fn(&QueryKey) + Send + 'static,
    {
        self.next_id += 1;
        let id: SubscriptionId = SubscriptionId(self.next_id);
        self.subscriptions.push((id, key, Box::new(observer)));
        id
    }

    /// Removes a subscription. Returns whether it existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before: usize = self.subscriptions.len();
        self.subscriptions.retain(|(existing, _, _)| *existing != id);
        self.subscriptions.len() != before
    }

    /// Notifies every subscriber whose view is affected by `changed`.
    pub fn publish(&self, changed: &[QueryKey]) {
        for key in changed {
            let mut receivers: usize = 0;
            for (_, subscribed, observer) in &self.subscriptions {
                if subscribed.is_affected_by(key) {
                    observer(key);
                    receivers += 1;
                }
            }
            debug!(?key, receivers, "Published invalidation");
        }
    }
}

/// An [`EntityStore`] that notifies subscribers after each successful
/// commit.
#[derive(Debug)]
pub struct ObservedStore<S> {
    inner: S,
    hub: InvalidationHub,
}

impl<S: EntityStore> ObservedStore<S> {
    #[must_use]
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            hub: InvalidationHub::new(),
        }
    }

    pub const fn hub_mut(&mut self) -> &mut InvalidationHub {
        &mut self.hub
    }

    #[must_use]
    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Views of the years that updated documents are moving out of.
    fn previous_keys(&mut self, batch: &WriteBatch) -> Result<Vec<QueryKey>, StoreError> {
        let mut keys: Vec<QueryKey> = Vec::new();
        for op in batch.ops() {
            let WriteOp::Update { key, .. } = op else {
                continue;
            };
            if !matches!(key.collection, Collection::Instances | Collection::Allocations) {
                continue;
            }
            let previous: Option<Document> = self.inner.get(
                &key.organisation_id,
                key.collection,
                &key.id,
                Visibility::IncludeDeleted,
            )?;
            if let Some(previous) = previous {
                keys.push(QueryKey::for_write(
                    key.collection,
                    &key.organisation_id,
                    Some(&previous.body),
                ));
            }
        }
        Ok(keys)
    }
}

impl<S: EntityStore> EntityStore for ObservedStore<S> {
    fn get(
        &mut self,
        organisation_id: &OrganisationId,
        collection: Collection,
        id: &str,
        visibility: Visibility,
    ) -> Result<Option<Document>, StoreError> {
        self.inner.get(organisation_id, collection, id, visibility)
    }

    fn scan(
        &mut self,
        organisation_id: &OrganisationId,
        collection: Collection,
        visibility: Visibility,
    ) -> Result<Vec<Document>, StoreError> {
        self.inner.scan(organisation_id, collection, visibility)
    }

    fn commit(&mut self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut keys: Vec<QueryKey> = affected_keys(&batch);
        for key in self.previous_keys(&batch)? {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        self.inner.commit(batch)?;
        self.hub.publish(&keys);
        Ok(())
    }

    fn audit_events(
        &mut self,
        organisation_id: &OrganisationId,
    ) -> Result<Vec<AuditEvent>, StoreError> {
        self.inner.audit_events(organisation_id)
    }

    fn migration_records(
        &mut self,
        organisation_id: &OrganisationId,
    ) -> Result<Vec<MigrationRecord>, StoreError> {
        self.inner.migration_records(organisation_id)
    }
}
