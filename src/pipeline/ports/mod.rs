//! Port contracts for the lead pipeline.
//!
//! Ports define infrastructure-agnostic interfaces used by pipeline services.

pub mod notifier;
pub mod repository;

pub use notifier::{Notification, NotificationError, NotificationResult, NotificationSink};
pub use repository::{
    CommentRepository, FollowUpTaskRepository, LeadRepository, PipelineRepositoryError,
    PipelineRepositoryResult, StageRepository,
};
