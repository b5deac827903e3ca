//! Step definitions for lead stage transition scenarios.

#[path = "../common/sales_pipeline.rs"]
pub mod sales_pipeline;

mod then;
