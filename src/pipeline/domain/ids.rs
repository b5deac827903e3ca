//! Identifier newtypes for the pipeline domain.
//!
//! Each identifier wraps a UUID so stage, lead, comment, follow-up task, and
//! user identifiers cannot be mixed up at call sites.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the wrapped UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl AsRef<Uuid> for $name {
            fn as_ref(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_identifier!(
    /// Unique identifier for a pipeline stage (kanban column).
    StageId
);

uuid_identifier!(
    /// Unique identifier for a lead record.
    LeadId
);

uuid_identifier!(
    /// Unique identifier for a lead comment.
    CommentId
);

uuid_identifier!(
    /// Unique identifier for a follow-up task.
    FollowUpTaskId
);

uuid_identifier!(
    /// Identifier of an already-authenticated caller (seller, admin, or
    /// operator).
    UserId
);
