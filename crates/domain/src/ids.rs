// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Typed identifiers for persisted entities.
//!
//! Identifiers are opaque strings. Freshly created entities receive a UUID v4;
//! identifiers carried over from legacy documents are preserved verbatim.

use serde::{Deserialize, Serialize};

/// Defines a string-backed identifier newtype.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps an existing identifier value.
            #[must_use]
            pub fn new(value: &str) -> Self {
                Self(value.to_string())
            }

            /// Generates a fresh, random identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// Returns the identifier value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }
    };
}

string_id!(
    /// Identifies a tenant organisation.
    OrganisationId
);
string_id!(
    /// Identifies an academic year.
    AcademicYearId
);
string_id!(
    /// Identifies a durable lecturer or module profile.
    ProfileId
);
string_id!(
    /// Identifies a year-scoped instance of a profile.
    InstanceId
);
string_id!(
    /// Identifies a module or admin allocation.
    AllocationId
);
string_id!(
    /// Identifies a student cohort.
    CohortId
);
