//! `PostgreSQL` adapters for pipeline persistence.

mod conversion;
mod models;
mod repository;
mod schema;

pub use repository::{PipelinePgPool, PostgresPipelineRepository};
