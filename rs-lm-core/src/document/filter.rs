use std::collections::HashSet;

use tracing::debug;

use crate::settings::FilterSettings;

/// Decides whether a document is worth modelling.
///
/// A document is usable when it is interesting (long enough) and, if a
/// lexicon was supplied, written in the lexicon's language.
#[derive(Clone, Debug)]
pub struct DocumentFilter {
	lexicon: Option<HashSet<String>>,
	unusual_proportion_threshold: f64,
	interesting_words_threshold: usize,
}

impl DocumentFilter {
	pub fn new(settings: &FilterSettings) -> Self {
		Self {
			lexicon: None,
			unusual_proportion_threshold: settings.unusual_proportion_threshold,
			interesting_words_threshold: settings.interesting_words_threshold,
		}
	}

	/// Enables the language check against a word list (matched lowercase).
	pub fn with_lexicon<I, S>(mut self, words: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		self.lexicon = Some(words.into_iter().map(|w| w.as_ref().to_lowercase()).collect());
		self
	}

	/// More tokens than the interesting-words threshold.
	pub fn is_interesting(&self, tokens: &[&str]) -> bool {
		tokens.len() > self.interesting_words_threshold
	}

	/// The share of distinct alphabetic words missing from the lexicon stays
	/// below the unusual-proportion threshold.
	///
	/// Always `true` without a lexicon; `false` when there is no alphabetic word.
	pub fn is_english(&self, tokens: &[&str]) -> bool {
		let Some(lexicon) = &self.lexicon else {
			return true;
		};

		let vocabulary: HashSet<String> = tokens
			.iter()
			.map(|token| token.to_lowercase())
			.filter(|token| !token.is_empty() && token.chars().all(char::is_alphabetic))
			.collect();
		if vocabulary.is_empty() {
			return false;
		}

		let unusual = vocabulary.iter().filter(|word| !lexicon.contains(*word)).count();
		(unusual as f64 / vocabulary.len() as f64) < self.unusual_proportion_threshold
	}

	pub fn is_usable(&self, tokens: &[&str]) -> bool {
		if !self.is_english(tokens) {
			debug!(tokens = tokens.len(), "rejected: not in the lexicon's language");
			return false;
		}
		if !self.is_interesting(tokens) {
			debug!(tokens = tokens.len(), "rejected: not interesting");
			return false;
		}
		true
	}
}
