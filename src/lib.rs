//! Leadflow: sales pipeline core for a multi-tenant CRM.
//!
//! This crate moves leads through a configurable, ordered set of stages,
//! requires an annotation (a comment and usually a follow-up task) when a
//! lead enters a gated stage, backs a drag-and-drop kanban board, and runs a
//! reminder sweep that escalates leads with overdue follow-ups.
//!
//! # Architecture
//!
//! Leadflow follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, logging)
//!
//! # Modules
//!
//! - [`pipeline`]: Stages, leads, annotations, board, and reminder sweep
//! - [`config`]: TOML deployment configuration

pub mod config;
pub mod pipeline;
