use indexmap::IndexMap;

use rand::Rng;

use crate::error::{MarkovError, Result};

/// Represents a state of the Markov chain.
///
/// A `State` corresponds to `order` consecutive tokens (stored as their
/// canonical `key`) and records every token observed right after them.
///
/// Conceptually, this is a node in a Markov chain where outgoing edges
/// are weighted by their number of observations.
///
/// ## Responsibilities:
/// - Accumulate transition occurrences during training
/// - Sample the next token with temperature weighting
///
/// ## Invariants
/// - All transitions belong to the same `key`
/// - Each transition occurrence count is strictly positive
/// - Transitions iterate in first-observed order, which makes the
///   temperature-zero tie-break stable
#[derive(Clone, Debug, PartialEq)]
pub struct State {
	/// Canonical key of the state (tokens joined by a single space).
	key: String,
	/// Outgoing transitions indexed by the next token.
	/// Example: { "e" => 42, "a" => 3 }
	transitions: IndexMap<String, usize>,
}

impl State {
	/// Creates a new empty state for the given key.
	pub fn new(key: &str) -> Self {
		Self {
			key: key.to_owned(),
			transitions: IndexMap::new(),
		}
	}

	/// Returns the canonical key of the state.
	pub fn key(&self) -> &str {
		&self.key
	}

	/// Records an occurrence of a transition toward `next`.
	pub fn add_transition(&mut self, next: &str) {
		if let Some(count) = self.transitions.get_mut(next) {
			*count += 1;
		} else {
			self.transitions.insert(next.to_owned(), 1);
		}
	}

	/// Number of distinct tokens following this state.
	pub fn len(&self) -> usize {
		self.transitions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.transitions.is_empty()
	}

	/// Occurrence count of `next` after this state (0 if never observed).
	pub fn count(&self, next: &str) -> usize {
		self.transitions.get(next).copied().unwrap_or(0)
	}

	/// Sum of every occurrence count.
	pub fn total(&self) -> usize {
		self.transitions.values().sum()
	}

	/// Iterates over `(token, count)` pairs in first-observed order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
		self.transitions.iter().map(|(k, v)| (k.as_str(), *v))
	}

	/// Samples the next token using temperature weighting.
	///
	/// - `temperature == 0`: the first token (in first-observed order) holding
	///   the maximum count is returned, no randomness is consumed.
	/// - `temperature > 0`: each token weighs `count ^ (1 / temperature)`;
	///   one uniform draw in `[0, 1)` walks the normalized cumulative weights.
	///
	/// When the weights overflow (very small temperature on large counts)
	/// the sampling degrades to the temperature-zero rule, its limit.
	///
	/// # Errors
	/// - `InvalidInput` if the temperature is negative or not a number.
	/// - `DegenerateDistribution` if the state has no transitions or every
	///   weight is zero.
	pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, temperature: f64) -> Result<&str> {
		if temperature.is_nan() || temperature < 0.0 {
			return Err(MarkovError::InvalidInput(format!(
				"temperature must be >= 0, got {temperature}"
			)));
		}

		if temperature == 0.0 {
			return self.most_frequent().ok_or(MarkovError::DegenerateDistribution);
		}

		let exponent = 1.0 / temperature;
		let weights: Vec<f64> = self
			.transitions
			.values()
			.map(|&count| (count as f64).powf(exponent))
			.collect();

		let total: f64 = weights.iter().sum();
		if !total.is_finite() {
			return self.most_frequent().ok_or(MarkovError::DegenerateDistribution);
		}
		if total <= 0.0 {
			return Err(MarkovError::DegenerateDistribution);
		}

		let r: f64 = rng.random();
		let mut cumulative = 0.0;
		let mut fallback: Option<&str> = None;
		for ((next, _), weight) in self.transitions.iter().zip(&weights) {
			cumulative += weight / total;
			if cumulative > r {
				return Ok(next.as_str());
			}
			fallback = Some(next.as_str());
		}

		// Round-off can leave the cumulative sum just under r
		fallback.ok_or(MarkovError::DegenerateDistribution)
	}

	/// First token holding the maximum count.
	fn most_frequent(&self) -> Option<&str> {
		let max = self.transitions.values().copied().max()?;
		self.transitions
			.iter()
			.find(|(_, count)| **count == max)
			.map(|(next, _)| next.as_str())
	}
}
