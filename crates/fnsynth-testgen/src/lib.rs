//! Test synthesis for generated callables.
//!
//! - **generic**: deterministic, signature-driven cases (normal, edge, null and
//!   undefined inputs, per-parameter boundaries, malformed inputs, empty and
//!   large values)
//! - **enhancer**: goal-specific cases from the oracle with a bounded timeout
//!   and a deterministic fallback corpus
//! - **hints**: user-supplied test descriptions
//! - **assembler**: one executable TypeScript test unit per run
//! - **aggregator**: per-case results and the pass-rate verdict

pub mod aggregator;
pub mod assembler;
pub mod enhancer;
pub mod generic;
pub mod hints;
pub mod repair;
pub mod values;

pub use aggregator::{DEFAULT_PASS_THRESHOLD, aggregate, aggregate_verdict};
pub use assembler::assemble;
pub use enhancer::{DomainTestEnhancer, fallback_cases};
pub use generic::synthesize_generic;
pub use hints::parse_user_hints;
pub use values::ValueKind;
