//! In-memory comment repository.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use super::poisoned;
use crate::pipeline::{
    domain::{Comment, LeadId},
    ports::{CommentRepository, PipelineRepositoryError, PipelineRepositoryResult},
};

/// Thread-safe, append-only in-memory comment repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCommentRepository {
    comments: Arc<RwLock<Vec<Comment>>>,
}

impl InMemoryCommentRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn store(&self, comment: &Comment) -> PipelineRepositoryResult<()> {
        let mut comments = self.comments.write().map_err(poisoned)?;
        if comments.iter().any(|existing| existing.id() == comment.id()) {
            return Err(PipelineRepositoryError::DuplicateComment(comment.id()));
        }
        comments.push(comment.clone());
        Ok(())
    }

    async fn list_for_lead(&self, lead_id: LeadId) -> PipelineRepositoryResult<Vec<Comment>> {
        let comments = self.comments.read().map_err(poisoned)?;
        // Later insertions come first among equal timestamps.
        let mut for_lead: Vec<Comment> = comments
            .iter()
            .rev()
            .filter(|comment| comment.lead_id() == lead_id)
            .cloned()
            .collect();
        for_lead.sort_by(|left, right| right.created_at().cmp(&left.created_at()));
        Ok(for_lead)
    }
}
