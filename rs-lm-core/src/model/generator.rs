use rand::RngCore;
use tracing::debug;

use super::count_table::EmissionTable;
use super::state::{weighted_choice, State};
use super::transmission::Transmission;
use crate::error::{ModelError, Result};

/// Tokens that attach to the previous token without a space.
const CLOSING_PUNCTUATION: [char; 11] = ['.', ',', ';', ':', '!', '?', ')', ']', '}', '%', '\''];

/// Walks the chain from the start sentinels until the stop sentinel is drawn.
///
/// Returns the generated tokens without sentinels.
pub(crate) fn generate_tokens(transmission: &Transmission, limit: usize, rng: &mut dyn RngCore) -> Result<Vec<String>> {
	let mut state = State::new(transmission, limit);
	while !state.is_finished() {
		state.advance(rng)?;
	}

	let tokens = state.into_tokens();
	debug!(order = transmission.order(), tokens = tokens.len(), "generated sequence");
	Ok(tokens)
}

/// Draws one word for `tag`, weighted by its linear emission counts.
pub(crate) fn emit<'a>(emissions: &'a EmissionTable, tag: &str, rng: &mut dyn RngCore) -> Result<&'a str> {
	let words: Vec<(&str, f64)> = emissions
		.words(tag)
		.map(|words| words.iter().map(|(word, count)| (word.as_str(), *count as f64)).collect())
		.unwrap_or_default();

	weighted_choice(&words, rng)
		.copied()
		.ok_or_else(|| ModelError::UnreachableTerminal { sequence: vec![tag.to_owned()] })
}

/// Joins tokens with single spaces, except before closing punctuation,
/// apostrophe clitics and `n't`.
///
/// # Example
/// ```
/// use rs_lm_core::model::generator::detokenize;
///
/// assert_eq!(detokenize(&["He", "did", "n't", "go", "(", "yet", ")", "."]), "He didn't go ( yet).");
/// ```
pub fn detokenize<S: AsRef<str>>(tokens: &[S]) -> String {
	let mut text = String::new();
	for token in tokens {
		let token = token.as_ref();
		let attaches = token.starts_with(&CLOSING_PUNCTUATION[..]) || token == "n't";
		if !text.is_empty() && !attaches {
			text.push(' ');
		}
		text.push_str(token);
	}
	text
}
