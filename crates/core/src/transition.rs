// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use workload_audit::{Action, Actor, AuditEvent, AuditSubject, Cause, StateSnapshot};
use workload_domain::{OrganisationId, StatusChange};

/// Who is acting, why, and on which organisation.
///
/// Every mutating operation takes a context explicitly; there is no ambient
/// current organisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub organisation_id: OrganisationId,
    pub actor: Actor,
    pub cause: Cause,
}

impl Context {
    #[must_use]
    pub const fn new(organisation_id: OrganisationId, actor: Actor, cause: Cause) -> Self {
        Self {
            organisation_id,
            actor,
            cause,
        }
    }

    /// Builds the audit event for a change to one entity in this context.
    #[must_use]
    pub fn audit(
        &self,
        entity_type: &str,
        entity_id: &str,
        action: Action,
        before: StateSnapshot,
        after: StateSnapshot,
    ) -> AuditEvent {
        AuditEvent::new(
            AuditSubject::new(&self.organisation_id, entity_type, entity_id),
            self.actor.clone(),
            self.cause.clone(),
            action,
            before,
            after,
        )
    }
}

/// The result of a successful mutation.
///
/// Transitions are atomic: everything they describe was committed in one
/// batch, or nothing was.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<T> {
    /// The value produced by the operation.
    pub value: T,
    /// The audit event committed with the change. `None` when the operation
    /// found nothing to do and wrote nothing.
    pub audit_event: Option<AuditEvent>,
    /// Capacity status changes caused by the operation, for external
    /// consumers.
    pub status_changes: Vec<StatusChange>,
}

impl<T> Transition<T> {
    #[must_use]
    pub const fn written(value: T, audit_event: AuditEvent) -> Self {
        Self {
            value,
            audit_event: Some(audit_event),
            status_changes: Vec::new(),
        }
    }

    #[must_use]
    pub const fn unchanged(value: T) -> Self {
        Self {
            value,
            audit_event: None,
            status_changes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_status_changes(mut self, status_changes: Vec<StatusChange>) -> Self {
        self.status_changes = status_changes;
        self
    }

    /// Returns whether the operation committed anything.
    #[must_use]
    pub const fn wrote(&self) -> bool {
        self.audit_event.is_some()
    }
}
