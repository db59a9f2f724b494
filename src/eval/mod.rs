//! Evaluation harness with lexical retrieval/answer metrics

pub mod harness;
pub mod metrics;

pub use harness::{load_cases, EvalCase, EvalHarness, EvalReport};
