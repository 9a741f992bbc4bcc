use rand::Rng;

use super::ngram::{is_all_start, is_sentinel, start_key, NGram, STOP};
use super::transmission::{score, Transmission};
use crate::error::{ModelError, Result};

/// Generation state of one n-gram chain.
///
/// Conceptually a walk through a Markov chain: the state is the sequence
/// generated so far, seeded with `order - 1` start sentinels, and each step
/// appends one vocabulary token drawn with probability
/// `2^score(history + token)` under the raw table.
///
/// ## Invariants
/// - `sequence` always starts with `order - 1` start sentinels
/// - at most `limit` non-sentinel tokens are ever appended
pub(crate) struct State<'a> {
	transmission: &'a Transmission,
	sequence: NGram,
	limit: usize,
	generated: usize,
}

impl<'a> State<'a> {
	pub fn new(transmission: &'a Transmission, limit: usize) -> Self {
		Self {
			transmission,
			sequence: start_key(transmission.order() - 1),
			limit,
			generated: 0,
		}
	}

	/// The last generated element is the stop sentinel.
	pub fn is_finished(&self) -> bool {
		self.sequence.last().is_some_and(|token| token == STOP)
	}

	/// The last `order - 1` elements.
	fn history(&self) -> &[String] {
		let keep = self.transmission.order() - 1;
		&self.sequence[self.sequence.len() - keep..]
	}

	/// Every vocabulary token that can follow the current history, with its
	/// linear probability.
	///
	/// A candidate survives when its n-gram exists in the raw table and is not
	/// made only of start sentinels.
	pub fn candidates(&self) -> Result<Vec<(&'a str, f64)>> {
		let history = self.history();
		let raw = self.transmission.raw();
		let mut candidates = Vec::new();

		for token in self.transmission.vocabulary() {
			let mut ngram = Vec::with_capacity(history.len() + 1);
			ngram.extend_from_slice(history);
			ngram.push(token.clone());

			if !raw.contains(&ngram) || is_all_start(&ngram) {
				continue;
			}
			candidates.push((token.as_str(), score(&ngram, raw)?.exp2()));
		}

		Ok(candidates)
	}

	/// Draws the next token and appends it.
	///
	/// # Errors
	/// - `ModelError::UnreachableTerminal` if nothing can follow the history
	/// - `ModelError::SequenceTooLong` once more than `limit` tokens were drawn
	pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
		let candidates = self.candidates()?;
		let next = match weighted_choice(&candidates, rng) {
			Some(token) => *token,
			None => return Err(ModelError::UnreachableTerminal { sequence: self.sequence.clone() }),
		};

		if !is_sentinel(next) {
			self.generated += 1;
			if self.generated > self.limit {
				return Err(ModelError::SequenceTooLong { limit: self.limit });
			}
		}
		self.sequence.push(next.to_owned());
		Ok(())
	}

	/// The generated tokens without sentinels.
	pub fn into_tokens(self) -> Vec<String> {
		self.sequence.into_iter().filter(|token| !is_sentinel(token)).collect()
	}
}

/// Picks one item with probability proportional to its weight.
///
/// This method performs:
/// - an O(n) scan over the items
/// - a cumulative subtraction to select a bucket
///
/// Items are scanned in slice order, so a fixed seed and a fixed order give
/// the same pick. Returns `None` if `items` is empty.
pub(crate) fn weighted_choice<'b, T, R>(items: &'b [(T, f64)], rng: &mut R) -> Option<&'b T>
where
	R: Rng + ?Sized,
{
	let total: f64 = items.iter().map(|(_, weight)| weight).sum();
	if items.is_empty() || total <= 0.0 {
		return None;
	}

	let mut r = rng.random::<f64>() * total;

	let mut fallback = None;
	for (item, weight) in items {
		if r < *weight {
			return Some(item);
		}
		r -= weight;
		fallback = Some(item);
	}

	// Rounding can leave r just above the last bucket
	fallback
}
