use std::env;
use std::str::FromStr;

use log::warn;

/// Server settings, read from the environment.
///
/// | Variable                 | Default     |
/// |--------------------------|-------------|
/// | `RS_MARKOV_HOST`         | `127.0.0.1` |
/// | `RS_MARKOV_PORT`         | `5000`      |
/// | `RS_MARKOV_ORDER`        | `2`         |
/// | `RS_MARKOV_MAX_CORPUS`   | 16 MiB      |
/// | `RS_MARKOV_MAX_LENGTH`   | `10000`     |
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
	pub host: String,
	pub port: u16,
	/// Order of the model created at startup.
	pub order: usize,
	/// Maximum accepted size of a training body, in bytes.
	pub max_corpus_bytes: usize,
	/// Largest `length` accepted by `/v1/generate`.
	pub max_length: usize,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			host: "127.0.0.1".to_owned(),
			port: 5000,
			order: 2,
			max_corpus_bytes: 16 * 1024 * 1024,
			max_length: 10_000,
		}
	}
}

impl ServerConfig {
	/// Builds the configuration from process environment variables.
	pub fn from_env() -> Self {
		Self::from_lookup(|name| env::var(name).ok())
	}

	/// Builds the configuration from an arbitrary variable lookup.
	///
	/// Unparsable values fall back to their default with a warning.
	pub fn from_lookup<F>(lookup: F) -> Self
	where
		F: Fn(&str) -> Option<String>,
	{
		let defaults = Self::default();
		Self {
			host: lookup("RS_MARKOV_HOST")
				.filter(|h| !h.trim().is_empty())
				.unwrap_or(defaults.host),
			port: parse_or(&lookup, "RS_MARKOV_PORT", defaults.port),
			order: parse_or(&lookup, "RS_MARKOV_ORDER", defaults.order).max(1),
			max_corpus_bytes: parse_or(&lookup, "RS_MARKOV_MAX_CORPUS", defaults.max_corpus_bytes),
			max_length: parse_or(&lookup, "RS_MARKOV_MAX_LENGTH", defaults.max_length),
		}
	}
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
	F: Fn(&str) -> Option<String>,
	T: FromStr + Copy + std::fmt::Display,
{
	match lookup(name) {
		None => default,
		Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
			warn!("{name}={raw:?} is invalid, using {default}");
			default
		}),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
		move |name| vars.get(name).cloned()
	}

	#[test]
	fn defaults_when_unset() {
		assert_eq!(ServerConfig::from_lookup(lookup(&[])), ServerConfig::default());
	}

	#[test]
	fn reads_values() {
		let config = ServerConfig::from_lookup(lookup(&[
			("RS_MARKOV_HOST", "0.0.0.0"),
			("RS_MARKOV_PORT", "8080"),
			("RS_MARKOV_ORDER", "4"),
			("RS_MARKOV_MAX_LENGTH", "500"),
		]));
		assert_eq!(config.host, "0.0.0.0");
		assert_eq!(config.port, 8080);
		assert_eq!(config.order, 4);
		assert_eq!(config.max_length, 500);
	}

	#[test]
	fn invalid_values_fall_back() {
		let config = ServerConfig::from_lookup(lookup(&[("RS_MARKOV_PORT", "http"), ("RS_MARKOV_ORDER", "0")]));
		assert_eq!(config.port, 5000);
		assert_eq!(config.order, 1);
	}
}
