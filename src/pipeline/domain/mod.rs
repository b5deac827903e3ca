//! Domain model for the lead pipeline.
//!
//! Stages, leads, comments, and follow-up tasks, plus the pure decision
//! logic built on them: the transition gate, the annotation workflow, the
//! board model, and the reminder ledger. Nothing here performs I/O.

mod annotation;
mod board;
mod comment;
mod error;
mod follow_up;
mod gate;
mod ids;
mod lead;
mod reminder;
mod rules;
mod stage;

pub use annotation::{
    AnnotationField, AnnotationForm, AnnotationSubmitError, AnnotationValidationErrors,
    AnnotationWorkflow, DEFAULT_DUE_TIME, FieldError, FollowUpDraft, SubmissionProgress,
    ValidatedAnnotation, WorkflowState,
};
pub use board::{Board, Column, DragController, DragItem, DropOutcome};
pub use comment::{Comment, CommentBody, CommentKind, PersistedCommentData};
pub use error::{
    ParseCommentKindError, ParseFollowUpStatusError, ParseStageCategoryError, PipelineDomainError,
};
pub use follow_up::{
    DueState, FollowUpStatus, FollowUpTask, NewFollowUpTask, PersistedFollowUpTaskData, TaskTitle,
};
pub use gate::{GateDecision, TransitionGate};
pub use ids::{CommentId, FollowUpTaskId, LeadId, StageId, UserId};
pub use lead::{
    CustomerName, Lead, LeadDetails, NewLead, PersistedLeadData, PhoneNumber, Price,
};
pub use reminder::{ReminderKind, ReminderLedger};
pub use rules::{StageRules, StageRulesError};
pub use stage::{DisplayOrder, Stage, StageCatalog, StageCategory, StageColor, StageName};
