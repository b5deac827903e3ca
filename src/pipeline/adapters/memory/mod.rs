//! In-memory adapters for tests and single-process use.

mod comment;
mod follow_up;
mod lead;
mod notification;
mod stage;

pub use comment::InMemoryCommentRepository;
pub use follow_up::InMemoryFollowUpTaskRepository;
pub use lead::InMemoryLeadRepository;
pub use notification::RecordingNotificationSink;
pub use stage::InMemoryStageRepository;

use crate::pipeline::ports::PipelineRepositoryError;

fn poisoned<E: std::fmt::Display>(err: E) -> PipelineRepositoryError {
    PipelineRepositoryError::persistence(std::io::Error::other(err.to_string()))
}
