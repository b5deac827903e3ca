//! Append-only lead comments.

use super::{CommentId, LeadId, ParseCommentKindError, PipelineDomainError, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trimmed, non-empty comment text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentBody(String);

impl CommentBody {
    /// Creates a validated comment body.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineDomainError::EmptyCommentBody`] when the value is
    /// empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, PipelineDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PipelineDomainError::EmptyCommentBody);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the body as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommentBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who produced a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentKind {
    /// Written by a person.
    User,
    /// Written by an automated process on behalf of a user.
    System,
}

impl CommentKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::System => "system",
        }
    }
}

impl TryFrom<&str> for CommentKind {
    type Error = ParseCommentKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "system" => Ok(Self::System),
            _ => Err(ParseCommentKindError(value.to_owned())),
        }
    }
}

/// Immutable comment attached to a lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    id: CommentId,
    lead_id: LeadId,
    author_id: UserId,
    body: CommentBody,
    kind: CommentKind,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedCommentData {
    /// Persisted comment identifier.
    pub id: CommentId,
    /// Persisted lead reference.
    pub lead_id: LeadId,
    /// Persisted author.
    pub author_id: UserId,
    /// Persisted text.
    pub body: CommentBody,
    /// Persisted kind.
    pub kind: CommentKind,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Creates a comment written by `author_id`.
    #[must_use]
    pub fn new(lead_id: LeadId, author_id: UserId, body: CommentBody, clock: &impl Clock) -> Self {
        Self::with_kind(lead_id, author_id, body, CommentKind::User, clock)
    }

    /// Creates a system comment attributed to `author_id`.
    #[must_use]
    pub fn system(
        lead_id: LeadId,
        author_id: UserId,
        body: CommentBody,
        clock: &impl Clock,
    ) -> Self {
        Self::with_kind(lead_id, author_id, body, CommentKind::System, clock)
    }

    fn with_kind(
        lead_id: LeadId,
        author_id: UserId,
        body: CommentBody,
        kind: CommentKind,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: CommentId::new(),
            lead_id,
            author_id,
            body,
            kind,
            created_at: clock.utc(),
        }
    }

    /// Reconstructs a comment from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedCommentData) -> Self {
        Self {
            id: data.id,
            lead_id: data.lead_id,
            author_id: data.author_id,
            body: data.body,
            kind: data.kind,
            created_at: data.created_at,
        }
    }

    /// Returns the comment identifier.
    #[must_use]
    pub const fn id(&self) -> CommentId {
        self.id
    }

    /// Returns the lead the comment belongs to.
    #[must_use]
    pub const fn lead_id(&self) -> LeadId {
        self.lead_id
    }

    /// Returns the author.
    #[must_use]
    pub const fn author_id(&self) -> UserId {
        self.author_id
    }

    /// Returns the comment text.
    #[must_use]
    pub const fn body(&self) -> &CommentBody {
        &self.body
    }

    /// Returns the comment kind.
    #[must_use]
    pub const fn kind(&self) -> CommentKind {
        self.kind
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
