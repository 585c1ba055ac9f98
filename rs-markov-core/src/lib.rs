//! Markov-chain text generation library.
//!
//! This crate provides an n-th order Markov chain over characters or
//! whitespace-delimited words:
//! - Tokenization of raw text (`char` or `word` mode)
//! - Transition-table construction from a single corpus
//! - Temperature-controlled sampling during generation
//! - Lightweight introspection (`Stats`)
//!
//! The engine performs no I/O and holds no internal locks. Hosts own the
//! model and serialize access to it themselves.

/// Markov model, tokenizer and transition sampling.
pub mod model;

/// Error type shared by every fallible operation.
pub mod error;

pub use error::{MarkovError, Result};
pub use model::markov_model::{MarkovModel, Stats};
pub use model::tokenizer::TokenMode;
