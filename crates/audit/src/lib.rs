// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use workload_domain::OrganisationId;

#[cfg(test)]
mod tests;

/// Represents the entity performing an action.
///
/// An actor is any identifiable entity that initiates a state change.
/// This could be a planner, a system process, or a migration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// The unique identifier for this actor.
    pub id: String,
    /// The type of actor (e.g., "user", "system", "migration").
    pub actor_type: String,
}

impl Actor {
    /// Creates a new Actor.
    ///
    /// # Arguments
    ///
    /// * `id` - The unique identifier for this actor
    /// * `actor_type` - The type of actor
    #[must_use]
    pub const fn new(id: String, actor_type: String) -> Self {
        Self { id, actor_type }
    }

    /// Creates an actor for an automated process.
    #[must_use]
    pub fn system(id: &str) -> Self {
        Self::new(id.to_string(), String::from("system"))
    }
}

/// Represents the reason or trigger for an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cause {
    /// A unique identifier for this cause (e.g., request ID, migration step).
    pub id: String,
    /// A description of the cause.
    pub description: String,
}

impl Cause {
    /// Creates a new Cause.
    #[must_use]
    pub const fn new(id: String, description: String) -> Self {
        Self { id, description }
    }
}

/// Represents the specific action performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// The name of the action (e.g., "`UpsertInstance`", "`CascadeDeleteProfile`").
    pub name: String,
    /// Optional additional details about the action.
    pub details: Option<String>,
}

impl Action {
    /// Creates a new Action.
    #[must_use]
    pub const fn new(name: String, details: Option<String>) -> Self {
        Self { name, details }
    }
}

/// A JSON snapshot of an entity before or after a change.
///
/// An absent entity (before a create, after a hard removal) is `null`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateSnapshot {
    pub data: serde_json::Value,
}

impl StateSnapshot {
    /// Creates a new `StateSnapshot`.
    #[must_use]
    pub const fn new(data: serde_json::Value) -> Self {
        Self { data }
    }

    /// Snapshot of an entity that does not exist.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            data: serde_json::Value::Null,
        }
    }

    /// Serializes a value into a snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented as JSON.
    pub fn of<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::to_value(value)?))
    }

    /// Returns whether this snapshot describes an absent entity.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_null()
    }
}

/// Identifies the entity an audit event is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSubject {
    pub organisation_id: OrganisationId,
    /// The entity collection (e.g., "instances", "lecturer_profiles").
    pub entity_type: String,
    pub entity_id: String,
}

impl AuditSubject {
    #[must_use]
    pub fn new(organisation_id: &OrganisationId, entity_type: &str, entity_id: &str) -> Self {
        Self {
            organisation_id: organisation_id.clone(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
        }
    }
}

/// An immutable audit event representing a state transition.
///
/// Every successful mutation produces exactly one audit event, committed in
/// the same batch as the mutation. Audit events are never updated or removed
/// and capture:
/// - Which entity changed, and in which organisation (subject)
/// - Who performed the action (actor)
/// - Why it was performed (cause)
/// - What action was performed (action)
/// - The entity before and after the change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Assigned by the store when the event is appended.
    pub event_id: Option<i64>,
    pub subject: AuditSubject,
    pub actor: Actor,
    pub cause: Cause,
    pub action: Action,
    pub before: StateSnapshot,
    pub after: StateSnapshot,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl AuditEvent {
    /// Creates a new `AuditEvent` stamped with the current time.
    #[must_use]
    pub fn new(
        subject: AuditSubject,
        actor: Actor,
        cause: Cause,
        action: Action,
        before: StateSnapshot,
        after: StateSnapshot,
    ) -> Self {
        Self {
            event_id: None,
            subject,
            actor,
            cause,
            action,
            before,
            after,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    /// Returns the organisation this event belongs to.
    #[must_use]
    pub const fn organisation_id(&self) -> &OrganisationId {
        &self.subject.organisation_id
    }

    /// Returns a copy of this event carrying the store-assigned id.
    #[must_use]
    pub fn with_event_id(mut self, event_id: i64) -> Self {
        self.event_id = Some(event_id);
        self
    }
}
