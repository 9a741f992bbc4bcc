use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::aggregator::Aggregate;
use super::count_table::LogTable;
use super::ngram::{pad, rare_map};
use super::smoother::smooth;
use crate::error::{ModelError, Result};

/// `log2 P(last element of chunk | history)` under `table`.
///
/// The numerator is the exact chunk if present, else its rare form. The
/// denominator is the unigram total for order 1; otherwise the history of
/// whichever key variant produced the numerator, falling back to the rare
/// history. The denominator is never rare-mapped from the original chunk
/// when the numerator matched through the rare variant.
///
/// # Errors
/// `ModelError::MissingCount` when either lookup fails after fallback.
pub fn score<S: AsRef<str>>(chunk: &[S], table: &LogTable) -> Result<f64> {
	let exact: Vec<String> = chunk.iter().map(|token| token.as_ref().to_owned()).collect();
	let rare = rare_map(&exact);

	let (numerator, matched) = if let Some(value) = table.get(&exact) {
		(value, &exact)
	} else if let Some(value) = table.get(&rare) {
		(value, &rare)
	} else {
		return Err(ModelError::MissingCount { chunk: exact, lookup: "numerator" });
	};

	let denominator = if matched.len() == 1 {
		table.total().ok_or_else(|| ModelError::MissingCount {
			chunk: exact.clone(),
			lookup: "unigram total",
		})?
	} else {
		let history = &matched[..matched.len() - 1];
		match table.get(history) {
			Some(value) => value,
			None => table.get(&rare_map(history)).ok_or_else(|| ModelError::MissingCount {
				chunk: history.to_vec(),
				lookup: "history",
			})?,
		}
	};

	Ok(numerator - denominator)
}

/// Trained tables of one n-gram chain: words for the word models, tags for
/// the hidden Markov model.
///
/// # Invariants
/// - `order >= 1`
/// - every key in `raw` has `order` elements or fewer
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Transmission {
	order: usize,
	raw: LogTable,
	rare: LogTable,
	vocabulary: BTreeSet<String>,
}

impl Transmission {
	/// Smooths an aggregate into the raw and rare log2 tables.
	pub fn from_aggregate(aggregate: &Aggregate, order: usize, infrequency_threshold: u64) -> Self {
		let tables = smooth(&aggregate.counts, infrequency_threshold);
		Self {
			order,
			raw: tables.raw,
			rare: tables.rare,
			vocabulary: aggregate.vocabulary.clone(),
		}
	}

	pub fn order(&self) -> usize {
		self.order
	}

	pub fn raw(&self) -> &LogTable {
		&self.raw
	}

	pub fn rare(&self) -> &LogTable {
		&self.rare
	}

	pub fn vocabulary(&self) -> &BTreeSet<String> {
		&self.vocabulary
	}

	/// Sum of the rare-table scores over one padded sentence.
	///
	/// The sentence gets `max(order - 1, 1)` start sentinels and one stop
	/// sentinel before the window slides over it.
	pub fn sentence_log_probability<S: AsRef<str>>(&self, sequence: &[S]) -> Result<f64> {
		let padded = pad(sequence, self.order.saturating_sub(1).max(1));
		padded.windows(self.order).map(|chunk| score(chunk, &self.rare)).sum()
	}
}
