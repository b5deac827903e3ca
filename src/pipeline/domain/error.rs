//! Error types for pipeline domain validation and parsing.

use super::StageId;
use thiserror::Error;

/// Errors returned while constructing or mutating pipeline domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineDomainError {
    /// The stage name is empty after trimming.
    #[error("stage name must not be empty")]
    EmptyStageName,

    /// The stage color is not a `#RRGGBB` hex value.
    #[error("invalid stage color '{0}', expected #RRGGBB")]
    InvalidStageColor(String),

    /// Display order positions start at one.
    #[error("invalid display order {0}, expected a positive integer")]
    InvalidDisplayOrder(i64),

    /// The customer name is empty after trimming.
    #[error("customer name must not be empty")]
    EmptyCustomerName,

    /// The phone number is empty or contains unsupported characters.
    #[error("invalid phone number '{0}'")]
    InvalidPhoneNumber(String),

    /// Prices are stored as non-negative minor units.
    #[error("invalid price {0}, expected a non-negative amount in minor units")]
    NegativePrice(i64),

    /// The comment body is empty after trimming.
    #[error("comment must not be empty")]
    EmptyCommentBody,

    /// The follow-up task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTaskTitle,

    /// The requested stage does not exist in the stage registry.
    #[error("stage {0} does not exist")]
    InvalidStage(StageId),

    /// A column reorder did not list every stage exactly once.
    #[error("column order must list each of the {expected} stages exactly once")]
    IncompleteStageOrder {
        /// Number of stages currently registered.
        expected: usize,
    },

    /// The annotation workflow is not in a state that accepts the operation.
    #[error("annotation workflow is {state}, expected {expected}")]
    WorkflowState {
        /// Current workflow state.
        state: &'static str,
        /// State required by the attempted operation.
        expected: &'static str,
    },
}

/// Error returned while parsing a stage category from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown stage category: {0}")]
pub struct ParseStageCategoryError(pub String);

/// Error returned while parsing a follow-up task status from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown follow-up task status: {0}")]
pub struct ParseFollowUpStatusError(pub String);

/// Error returned while parsing a comment kind from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown comment kind: {0}")]
pub struct ParseCommentKindError(pub String);
