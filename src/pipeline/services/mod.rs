//! Application services for the lead pipeline.

mod board;
mod follow_ups;
mod leads;
mod stage_registry;
mod sweep;
mod transition;

pub use board::{BoardError, BoardResult, BoardService, DropResolution};
pub use follow_ups::{
    CreateFollowUpRequest, FollowUpService, FollowUpServiceError, FollowUpServiceResult,
};
pub use leads::{CreateLeadRequest, LeadService, LeadServiceError, LeadServiceResult};
pub use stage_registry::{
    CreateStageRequest, StageRegistryError, StageRegistryResult, StageRegistryService,
    UpdateStageRequest,
};
pub use sweep::{
    ReminderSweepService, SweepFailure, SweepReport, SweepSettings, SweepSettingsError,
    SweepStep, SweepStepFailed, SweepTrigger,
};
pub use transition::{
    AnnotatedTransition, CommitStep, LeadTransitionService, StageChangeRequest,
    TransitionError, TransitionOutcome, TransitionResult, TransitionSettings,
};
