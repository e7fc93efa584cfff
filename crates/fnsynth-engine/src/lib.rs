//! Code generation with type-checker feedback, and the synthesis pipeline.
//!
//! - **orchestrator**: the bounded generate → verify → retry loop
//! - **pipeline**: request in, response out; wires the loop to test
//!   synthesis, execution, linting, and aggregation

pub mod orchestrator;
pub mod pipeline;

pub use orchestrator::{GenerationError, MAX_RETRY_BUDGET, RetryOrchestrator};
pub use pipeline::{Pipeline, PipelineBuilder, PipelineError, SynthesisRequest, SynthesisResponse};
