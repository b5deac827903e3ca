//! Sales pipeline management for Leadflow.
//!
//! Leads move through an ordered, configurable set of stages rendered as
//! kanban columns. Entering a gated stage requires an annotation: a comment
//! and, unless the stage is task-optional, a dated follow-up task. A
//! background sweep escalates leads whose follow-ups are overdue and
//! reminds sellers of tasks coming due. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
