//! Core types and configuration for fnsynth.
//!
//! Provides the structural signature model ([`model::Signature`]), test case
//! and result types, the generate/verify iteration history, the
//! [`value::TestValue`] literal model used by test inputs, and the layered
//! [`config::SynthConfig`].

pub mod config;
pub mod model;
pub mod value;

pub use config::SynthConfig;
pub use model::{
    ANONYMOUS_NAME, GenerationResult, IterationStep, Parameter, Provenance, Severity, Signature,
    TestCase, TestCaseResult, TestResult, TestStatus, TypeCheckError, TypeCheckOutcome,
};
pub use value::TestValue;
