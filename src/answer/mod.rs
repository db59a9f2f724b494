//! Constrained answering against retrieved context

pub mod answerer;
pub mod client;

pub use answerer::{Answer, Answerer, Citation, REFUSAL_SENTENCE};
pub use client::OllamaClient;
