//! Tree-sitter based signature extraction for synthesized callables.
//!
//! Walks a TypeScript syntax tree to find the first callable declaration and
//! reports its structural [`Signature`](fnsynth_core::Signature): name,
//! parameters, return type, async-ness, and `@throws` doc tags.

pub mod signature;
pub mod treesitter;

pub use signature::{ExtractionError, extract_signature};
