use std::collections::HashMap;

use log::{debug, trace};
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use serde::{Deserialize, Serialize};

use super::state::State;
use super::tokenizer::{TokenMode, render, state_key, tokenize};
use crate::error::{MarkovError, Result};

/// Summary of a trained model.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct Stats {
	/// Number of states in the transition table.
	pub state_count: usize,
	/// Mean number of distinct outgoing tokens per state (0 if untrained).
	pub average_branching_factor: f64,
}

/// Represents an n-th order Markov chain over characters or words.
///
/// The `MarkovModel` maps every window of `order` consecutive tokens
/// observed in the corpus to the tokens that followed it, and samples new
/// sequences from those counts.
///
/// # Responsibilities
/// - Build the transition table from a single corpus (`train`)
/// - Pick a start state and sample a token sequence (`generate`)
/// - Report table statistics (`stats`)
///
/// # Invariants
/// - `order` is always >= 1 and never changes
/// - Each state in `states` has at least one outgoing transition
/// - Every start state is a key of `states`
/// - `train` fully replaces previous content; a failed call changes nothing
///
/// The model holds no lock. Hosts sharing it across threads must wrap it
/// themselves (e.g. in a `Mutex`).
#[derive(Clone, Debug)]
pub struct MarkovModel {
	/// Number of tokens forming one state.
	order: usize,

	/// Mapping from a state key to its outgoing transitions.
	states: HashMap<String, State>,

	/// Token windows eligible to seed generation.
	start_states: Vec<Vec<String>>,
}

impl MarkovModel {
	/// Creates an untrained model of the given order.
	///
	/// # Errors
	/// Returns `InvalidOrder` if `order < 1`.
	pub fn new(order: usize) -> Result<Self> {
		if order < 1 {
			return Err(MarkovError::InvalidOrder(order));
		}
		Ok(Self {
			order,
			states: HashMap::new(),
			start_states: Vec::new(),
		})
	}

	/// Number of tokens forming one state.
	pub fn order(&self) -> usize {
		self.order
	}

	/// Returns `true` once the model can generate.
	pub fn is_trained(&self) -> bool {
		!self.states.is_empty() && !self.start_states.is_empty()
	}

	/// Returns the state stored under `key`, if any.
	pub fn state(&self, key: &str) -> Option<&State> {
		self.states.get(key)
	}

	/// Iterates over every state of the transition table.
	pub fn states(&self) -> impl Iterator<Item = &State> {
		self.states.values()
	}

	/// Token windows currently eligible as generation seeds.
	pub fn start_states(&self) -> &[Vec<String>] {
		&self.start_states
	}

	/// Trains the model using the thread-local random source.
	///
	/// See `train_with`.
	pub fn train(&mut self, corpus: &str, mode: TokenMode) -> Result<()> {
		self.train_with(&mut rand::rng(), corpus, mode)
	}

	/// Rebuilds the transition table and start-state pool from `corpus`.
	///
	/// Every window of `order` tokens is counted against the token that
	/// follows it. Only the corpus's first window enters the start pool,
	/// which is then shuffled.
	///
	/// # Errors
	/// Returns `InvalidInput` if the corpus is blank or yields no more than
	/// `order` tokens. The model is left untouched in that case.
	pub fn train_with<R: Rng + ?Sized>(&mut self, rng: &mut R, corpus: &str, mode: TokenMode) -> Result<()> {
		let tokens = tokenize(corpus, mode)?;
		if tokens.len() <= self.order {
			return Err(MarkovError::InvalidInput(format!(
				"corpus has {} {} token(s), at least {} needed for order {}",
				tokens.len(),
				mode,
				self.order + 1,
				self.order
			)));
		}

		// Built aside and swapped in at the end so failures never leave a partial table
		let mut states: HashMap<String, State> = HashMap::new();
		let mut start_states: Vec<Vec<String>> = Vec::new();

		for (i, window) in tokens.windows(self.order + 1).enumerate() {
			let (current, next) = window.split_at(self.order);
			let key = state_key(current);
			if i == 0 {
				start_states.push(current.to_vec());
			}
			states
				.entry(key.clone())
				.or_insert_with(|| State::new(&key))
				.add_transition(&next[0]);
		}

		start_states.shuffle(rng);

		self.states = states;
		self.start_states = start_states;

		debug!(
			"trained order-{} {} model: {} tokens, {} states",
			self.order,
			mode,
			tokens.len(),
			self.states.len()
		);
		Ok(())
	}

	/// Generates text using the thread-local random source.
	///
	/// See `generate_with`.
	pub fn generate(&self, length: usize, mode: TokenMode, temperature: f64) -> Result<String> {
		self.generate_with(&mut rand::rng(), length, mode, temperature)
	}

	/// Samples a new token sequence from the trained model.
	///
	/// The output starts with the tokens of a random start state, followed by
	/// up to `length` sampled tokens. Generation stops early, without error,
	/// as soon as the current state has no recorded transition.
	///
	/// # Parameters
	/// - `length`: maximum number of tokens appended after the seed.
	/// - `mode`: controls rendering only (`char` concatenates, `word` joins
	///   with a single space).
	/// - `temperature`: sampling temperature, see `State::sample`.
	///
	/// # Errors
	/// - `NotTrained` if the model is untrained or was cleared.
	/// - `InvalidInput` if `temperature` is negative or NaN.
	pub fn generate_with<R: Rng + ?Sized>(
		&self,
		rng: &mut R,
		length: usize,
		mode: TokenMode,
		temperature: f64,
	) -> Result<String> {
		if self.states.is_empty() {
			return Err(MarkovError::NotTrained);
		}
		if temperature.is_nan() || temperature < 0.0 {
			return Err(MarkovError::InvalidInput(format!(
				"temperature must be >= 0, got {temperature}"
			)));
		}

		let mut output: Vec<String> = self.start_states.choose(rng).ok_or(MarkovError::NotTrained)?.clone();
		let mut key = state_key(&output);

		for _ in 0..length {
			let state = match self.states.get(&key) {
				Some(state) if !state.is_empty() => state,
				_ => break,
			};

			let next = state.sample(rng, temperature)?.to_owned();
			output.push(next);

			key = state_key(&output[output.len() - self.order..]);
			if !self.states.contains_key(&key) {
				trace!("state '{key}' has no transition, stopping after {} tokens", output.len());
				break;
			}
		}

		Ok(render(&output, mode))
	}

	/// Returns the number of states and the average branching factor.
	pub fn stats(&self) -> Stats {
		let state_count = self.states.len();
		if state_count == 0 {
			return Stats::default();
		}
		let branches: usize = self.states.values().map(State::len).sum();
		Stats {
			state_count,
			average_branching_factor: branches as f64 / state_count as f64,
		}
	}

	/// Empties the transition table and start pool back to the untrained state.
	pub fn clear(&mut self) {
		self.states.clear();
		self.start_states.clear();
		debug!("cleared order-{} model", self.order);
	}
}
