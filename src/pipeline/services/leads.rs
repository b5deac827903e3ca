//! Service layer for lead administration and free comments.

use crate::pipeline::{
    domain::{
        Comment, CommentBody, CustomerName, Lead, LeadDetails, LeadId, NewLead, PhoneNumber,
        PipelineDomainError, StageId, UserId,
    },
    ports::{CommentRepository, LeadRepository, PipelineRepositoryError, StageRepository},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Request payload for creating a lead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateLeadRequest {
    customer_name: String,
    customer_phone: String,
    stage_id: StageId,
    seller_id: UserId,
    details: LeadDetails,
}

impl CreateLeadRequest {
    /// Creates a request with the required lead fields.
    #[must_use]
    pub fn new(
        customer_name: impl Into<String>,
        customer_phone: impl Into<String>,
        stage_id: StageId,
        seller_id: UserId,
    ) -> Self {
        Self {
            customer_name: customer_name.into(),
            customer_phone: customer_phone.into(),
            stage_id,
            seller_id,
            details: LeadDetails::new(),
        }
    }

    /// Sets the initial commercial details.
    #[must_use]
    pub fn with_details(mut self, details: LeadDetails) -> Self {
        self.details = details;
        self
    }
}

/// Service-level errors for lead operations.
#[derive(Debug, Error)]
pub enum LeadServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] PipelineDomainError),
    /// The lead does not exist.
    #[error("lead not found: {0}")]
    LeadNotFound(LeadId),
    /// The stage does not exist.
    #[error("stage {0} does not exist")]
    InvalidStage(StageId),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] PipelineRepositoryError),
}

/// Result type for lead service operations.
pub type LeadServiceResult<T> = Result<T, LeadServiceError>;

/// Lead administration service.
#[derive(Clone)]
pub struct LeadService<S, L, M, C>
where
    S: StageRepository,
    L: LeadRepository,
    M: CommentRepository,
    C: Clock + Send + Sync,
{
    stages: Arc<S>,
    leads: Arc<L>,
    comments: Arc<M>,
    clock: Arc<C>,
}

impl<S, L, M, C> LeadService<S, L, M, C>
where
    S: StageRepository,
    L: LeadRepository,
    M: CommentRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new lead service.
    #[must_use]
    pub const fn new(stages: Arc<S>, leads: Arc<L>, comments: Arc<M>, clock: Arc<C>) -> Self {
        Self {
            stages,
            leads,
            comments,
            clock,
        }
    }

    /// Creates a lead in an existing stage.
    ///
    /// # Errors
    ///
    /// Returns [`LeadServiceError::Domain`] for an invalid name or phone,
    /// [`LeadServiceError::InvalidStage`] when the stage does not exist, and
    /// [`LeadServiceError::Repository`] when persistence fails.
    pub async fn create_lead(
        &self,
        request: CreateLeadRequest,
        actor: UserId,
    ) -> LeadServiceResult<Lead> {
        let customer_name = CustomerName::new(request.customer_name)?;
        let customer_phone = PhoneNumber::new(request.customer_phone)?;
        if self.stages.find_by_id(request.stage_id).await?.is_none() {
            return Err(LeadServiceError::InvalidStage(request.stage_id));
        }

        let lead = Lead::new(
            NewLead {
                customer_name,
                customer_phone,
                stage_id: request.stage_id,
                seller_id: request.seller_id,
                details: request.details,
            },
            &*self.clock,
        );
        self.leads.store(&lead).await?;
        info!(
            lead_id = %lead.id(),
            stage_id = %lead.stage_id(),
            seller_id = %lead.seller_id(),
            actor = %actor,
            "lead created"
        );
        Ok(lead)
    }

    /// Replaces the commercial details of a lead.
    ///
    /// # Errors
    ///
    /// Returns [`LeadServiceError::LeadNotFound`] when the lead does not
    /// exist and [`LeadServiceError::Repository`] when persistence fails.
    pub async fn update_details(
        &self,
        lead_id: LeadId,
        details: LeadDetails,
        actor: UserId,
    ) -> LeadServiceResult<Lead> {
        let mut lead = self.require_lead(lead_id).await?;
        lead.update_details(details, &*self.clock);
        self.leads.update(&lead).await?;
        debug!(lead_id = %lead_id, actor = %actor, "lead details updated");
        Ok(lead)
    }

    /// Finds a lead by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`LeadServiceError::Repository`] when the lookup fails.
    pub async fn find_lead(&self, lead_id: LeadId) -> LeadServiceResult<Option<Lead>> {
        Ok(self.leads.find_by_id(lead_id).await?)
    }

    /// Lists leads currently in `stage_id`.
    ///
    /// # Errors
    ///
    /// Returns [`LeadServiceError::Repository`] when the query fails.
    pub async fn list_by_stage(&self, stage_id: StageId) -> LeadServiceResult<Vec<Lead>> {
        Ok(self.leads.list_by_stage(stage_id).await?)
    }

    /// Lists leads owned by `seller_id`.
    ///
    /// # Errors
    ///
    /// Returns [`LeadServiceError::Repository`] when the query fails.
    pub async fn list_by_seller(&self, seller_id: UserId) -> LeadServiceResult<Vec<Lead>> {
        Ok(self.leads.list_by_seller(seller_id).await?)
    }

    /// Appends a free comment to a lead.
    ///
    /// # Errors
    ///
    /// Returns [`LeadServiceError::Domain`] for a blank body,
    /// [`LeadServiceError::LeadNotFound`] when the lead does not exist, and
    /// [`LeadServiceError::Repository`] when persistence fails.
    pub async fn add_comment(
        &self,
        lead_id: LeadId,
        body: impl Into<String> + Send,
        actor: UserId,
    ) -> LeadServiceResult<Comment> {
        let comment_body = CommentBody::new(body)?;
        self.require_lead(lead_id).await?;

        let comment = Comment::new(lead_id, actor, comment_body, &*self.clock);
        self.comments.store(&comment).await?;
        debug!(lead_id = %lead_id, comment_id = %comment.id(), actor = %actor, "comment added");
        Ok(comment)
    }

    /// Lists a lead's comments, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`LeadServiceError::Repository`] when the query fails.
    pub async fn list_comments(&self, lead_id: LeadId) -> LeadServiceResult<Vec<Comment>> {
        Ok(self.comments.list_for_lead(lead_id).await?)
    }

    async fn require_lead(&self, lead_id: LeadId) -> LeadServiceResult<Lead> {
        self.leads
            .find_by_id(lead_id)
            .await?
            .ok_or(LeadServiceError::LeadNotFound(lead_id))
    }
}
