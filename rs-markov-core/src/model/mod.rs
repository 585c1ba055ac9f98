//! Top-level module for the Markov generation system.
//!
//! - Tokenization and rendering (`tokenizer`)
//! - Outgoing transitions of one state and their sampling (`state`)
//! - The trained model itself (`MarkovModel`)

/// Splits text into character or word tokens and renders them back.
pub mod tokenizer;

/// Occurrence counts of the tokens following one state.
///
/// Supports temperature-weighted random sampling.
pub mod state;

/// Fixed-order Markov model.
///
/// Handles training, start-state selection, generation and statistics.
pub mod markov_model;
