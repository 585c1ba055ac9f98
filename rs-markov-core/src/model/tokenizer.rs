use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MarkovError, Result};

/// Separator used to build a state key from its tokens.
pub const STATE_SEPARATOR: &str = " ";

/// Granularity of a token.
///
/// - `Char`: one token per character (spaces included).
/// - `Word`: one token per maximal run of non-whitespace characters.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TokenMode {
	#[default]
	Char,
	Word,
}

impl TokenMode {
	/// Separator placed between tokens when rendering generated output.
	pub fn separator(&self) -> &'static str {
		match self {
			TokenMode::Char => "",
			TokenMode::Word => " ",
		}
	}
}

impl fmt::Display for TokenMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TokenMode::Char => write!(f, "char"),
			TokenMode::Word => write!(f, "word"),
		}
	}
}

impl FromStr for TokenMode {
	type Err = MarkovError;

	fn from_str(s: &str) -> Result<Self> {
		match s.trim().to_lowercase().as_str() {
			"char" => Ok(TokenMode::Char),
			"word" => Ok(TokenMode::Word),
			other => Err(MarkovError::InvalidInput(format!(
				"unknown token mode '{other}', expected 'char' or 'word'"
			))),
		}
	}
}

/// Collapses every whitespace run into a single space and trims both ends.
pub fn collapse_whitespace(text: &str) -> String {
	text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits `text` into tokens according to `mode`.
///
/// The text is first whitespace-collapsed (see `collapse_whitespace`).
///
/// # Errors
/// Returns `InvalidInput` if the text is empty or only whitespace.
pub fn tokenize(text: &str, mode: TokenMode) -> Result<Vec<String>> {
	let cleaned = collapse_whitespace(text);
	if cleaned.is_empty() {
		return Err(MarkovError::InvalidInput("text is empty".to_owned()));
	}

	let tokens = match mode {
		TokenMode::Char => cleaned.chars().map(String::from).collect(),
		TokenMode::Word => cleaned.split(' ').map(str::to_owned).collect(),
	};
	Ok(tokens)
}

/// Builds the canonical key of a state from its tokens.
///
/// Training and generation must both go through this function so that
/// lookups agree.
pub fn state_key<S: AsRef<str>>(tokens: &[S]) -> String {
	tokens
		.iter()
		.map(AsRef::as_ref)
		.collect::<Vec<_>>()
		.join(STATE_SEPARATOR)
}

/// Joins generated tokens into the final output string.
pub fn render<S: AsRef<str>>(tokens: &[S], mode: TokenMode) -> String {
	tokens
		.iter()
		.map(AsRef::as_ref)
		.collect::<Vec<_>>()
		.join(mode.separator())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn char_mode_keeps_collapsed_spaces() {
		let tokens = tokenize("  a \t\n b  ", TokenMode::Char).unwrap();
		assert_eq!(tokens, vec!["a", " ", "b"]);
	}

	#[test]
	fn word_mode_splits_on_whitespace_runs() {
		let tokens = tokenize("the  cat\n\tsat ", TokenMode::Word).unwrap();
		assert_eq!(tokens, vec!["the", "cat", "sat"]);
	}

	#[test]
	fn word_tokens_rejoin_to_collapsed_text() {
		let text = "  one\ttwo   three\nfour ";
		let tokens = tokenize(text, TokenMode::Word).unwrap();
		assert_eq!(tokens.join(" "), collapse_whitespace(text));
		assert_eq!(collapse_whitespace(text), "one two three four");
	}

	#[test]
	fn empty_or_blank_text_is_rejected() {
		assert!(matches!(tokenize("", TokenMode::Char), Err(MarkovError::InvalidInput(_))));
		assert!(matches!(tokenize(" \n\t ", TokenMode::Word), Err(MarkovError::InvalidInput(_))));
	}

	#[test]
	fn multibyte_characters_are_single_tokens() {
		let tokens = tokenize("été", TokenMode::Char).unwrap();
		assert_eq!(tokens, vec!["é", "t", "é"]);
	}

	#[test]
	fn mode_parsing() {
		assert_eq!("char".parse::<TokenMode>().unwrap(), TokenMode::Char);
		assert_eq!(" WORD ".parse::<TokenMode>().unwrap(), TokenMode::Word);
		assert!("byte".parse::<TokenMode>().is_err());
		assert_eq!(TokenMode::Word.to_string(), "word");
	}

	#[test]
	fn render_uses_mode_separator() {
		let tokens = ["a", "b", "c"];
		assert_eq!(render(&tokens, TokenMode::Char), "abc");
		assert_eq!(render(&tokens, TokenMode::Word), "a b c");
		assert_eq!(state_key(&tokens), "a b c");
	}
}
