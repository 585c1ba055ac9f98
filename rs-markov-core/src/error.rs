use thiserror::Error;

/// Errors raised by the Markov engine.
///
/// Every variant is a synchronous failure of the call that produced it.
/// The model is left exactly as it was before the failing call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarkovError {
	/// The corpus (or a parameter) cannot be used, e.g. an empty text or a
	/// corpus with no more tokens than the model order.
	#[error("invalid input: {0}")]
	InvalidInput(String),

	/// `generate` was called before `train`, or after `clear`.
	#[error("model is not trained")]
	NotTrained,

	/// The model order must be at least 1.
	#[error("invalid order {0}: order must be >= 1")]
	InvalidOrder(usize),

	/// Every sampling weight was zero.
	#[error("degenerate distribution: all transition weights are zero")]
	DegenerateDistribution,
}

/// Shorthand used throughout the crate.
pub type Result<T> = std::result::Result<T, MarkovError>;
