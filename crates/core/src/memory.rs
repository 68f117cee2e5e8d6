// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! In-memory entity store.

use crate::store::{
    Collection, Document, DocumentKey, EntityStore, StoreError, Visibility, WriteBatch, WriteOp,
};
use std::collections::{HashMap, HashSet};
use time::OffsetDateTime;
use tracing::debug;
use workload_audit::AuditEvent;
use workload_domain::{MigrationRecord, OrganisationId};

/// An [`EntityStore`] held entirely in memory.
///
/// A batch is checked in full before any of it is applied, so a rejected
/// commit leaves the store untouched.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Vec<Document>,
    index: HashMap<DocumentKey, usize>,
    audit: Vec<AuditEvent>,
    migrations: Vec<MigrationRecord>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn find(&self, key: &DocumentKey) -> Option<&Document> {
        self.index
            .get(key)
            .and_then(|position| self.documents.get(*position))
    }

    fn check(&self, batch: &WriteBatch) -> Result<(), StoreError> {
        // Keys inserted earlier in the same batch.
        let mut pending: HashSet<&DocumentKey> = HashSet::new();

        for op in batch.ops() {
            match op {
                WriteOp::Insert { key, body } => {
                    ensure_object(key, body)?;
                    if self.index.contains_key(key) || !pending.insert(key) {
                        return Err(StoreError::DuplicateId {
                            collection: key.collection,
                            id: key.id.clone(),
                        });
                    }
                }
                WriteOp::Update { key, body } => {
                    ensure_object(key, body)?;
                    self.check_existing(key, &pending)?;
                }
                WriteOp::SoftDelete { key } => {
                    self.check_existing(key, &pending)?;
                }
                WriteOp::AppendAudit(_) | WriteOp::RecordMigration(_) => {}
            }
        }
        Ok(())
    }

    fn check_existing(
        &self,
        key: &DocumentKey,
        pending: &HashSet<&DocumentKey>,
    ) -> Result<(), StoreError> {
        if self.index.contains_key(key) || pending.contains(key) {
            Ok(())
        } else {
            Err(StoreError::MissingDocument {
                collection: key.collection,
                id: key.id.clone(),
            })
        }
    }

    fn apply(&mut self, op: WriteOp, now: OffsetDateTime) {
        match op {
            WriteOp::Insert { key, body } => {
                self.index.insert(key.clone(), self.documents.len());
                self.documents.push(Document {
                    id: key.id,
                    collection: key.collection,
                    organisation_id: key.organisation_id,
                    body,
                    created_at: now,
                    updated_at: now,
                    deleted_at: None,
                });
            }
            WriteOp::Update { key, body } => {
                if let Some(doc) = self.document_mut(&key) {
                    doc.body = body;
                    doc.updated_at = now;
                }
            }
            WriteOp::SoftDelete { key } => {
                if let Some(doc) = self.document_mut(&key) {
                    doc.deleted_at.get_or_insert(now);
                    doc.updated_at = now;
                }
            }
            WriteOp::AppendAudit(event) => {
                let event_id: i64 = i64::try_from(self.audit.len()).unwrap_or(i64::MAX) + 1;
                self.audit.push((*event).with_event_id(event_id));
            }
            WriteOp::RecordMigration(record) => self.migrations.push(record),
        }
    }

    fn document_mut(&mut self, key: &DocumentKey) -> Option<&mut Document> {
        let position: usize = *self.index.get(key)?;
        self.documents.get_mut(position)
    }
}

fn ensure_object(key: &DocumentKey, body: &serde_json::Value) -> Result<(), StoreError> {
    if body.is_object() {
        Ok(())
    } else {
        Err(StoreError::Malformed {
            collection: key.collection,
            id: key.id.clone(),
            message: String::from("document body must be a JSON object"),
        })
    }
}

impl EntityStore for MemoryStore {
    fn get(
        &mut self,
        organisation_id: &OrganisationId,
        collection: Collection,
        id: &str,
        visibility: Visibility,
    ) -> Result<Option<Document>, StoreError> {
        let key: DocumentKey = DocumentKey::new(collection, organisation_id, id);
        Ok(self
            .find(&key)
            .filter(|doc| doc.is_visible(visibility))
            .cloned())
    }

    fn scan(
        &mut self,
        organisation_id: &OrganisationId,
        collection: Collection,
        visibility: Visibility,
    ) -> Result<Vec<Document>, StoreError> {
        Ok(self
            .documents
            .iter()
            .filter(|doc| {
                doc.collection == collection
                    && &doc.organisation_id == organisation_id
                    && doc.is_visible(visibility)
            })
            .cloned()
            .collect())
    }

    fn commit(&mut self, batch: WriteBatch) -> Result<(), StoreError> {
        self.check(&batch)?;
        let now: OffsetDateTime = OffsetDateTime::now_utc();
        let op_count: usize = batch.len();
        for op in batch.into_ops() {
            self.apply(op, now);
        }
        debug!(op_count, "Committed batch to memory store");
        Ok(())
    }

    fn audit_events(
        &mut self,
        organisation_id: &OrganisationId,
    ) -> Result<Vec<AuditEvent>, StoreError> {
        Ok(self
            .audit
            .iter()
            .filter(|event| event.organisation_id() == organisation_id)
            .cloned()
            .collect())
    }

    fn migration_records(
        &mut self,
        organisation_id: &OrganisationId,
    ) -> Result<Vec<MigrationRecord>, StoreError> {
        Ok(self
            .migrations
            .iter()
            .filter(|record| &record.organisation_id == organisation_id)
            .cloned()
            .collect())
    }
}
