use std::collections::BTreeSet;

use tracing::debug;

use super::count_table::{CountTable, EmissionTable};
use super::ngram::{is_all_start, start_key};
use crate::document::{AnnotatedDocument, Layer};

/// Corpus-wide counts over a training partition.
#[derive(Clone, Debug, Default)]
pub struct Aggregate {
	/// Orders `1..=N`, the seeded start keys and the unigram total.
	pub counts: CountTable,
	/// Distinct unigram keys, start sentinel excluded. Sorted.
	pub vocabulary: BTreeSet<String>,
	/// Merged tag → word counts; empty unless requested.
	pub emissions: EmissionTable,
	pub sentences: u64,
}

/// Merges per-document tables into one [`Aggregate`].
///
/// # Example
/// ```
/// use rs_lm_core::document::Layer;
/// use rs_lm_core::model::aggregator::Aggregator;
///
/// let aggregate = Aggregator::new(2, Layer::Words).aggregate(&[]);
/// assert!(aggregate.counts.is_empty());
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Aggregator {
	order: usize,
	layer: Layer,
	emissions: bool,
}

impl Aggregator {
	pub fn new(order: usize, layer: Layer) -> Self {
		Self { order, layer, emissions: false }
	}

	/// Also merges the documents' emission tables.
	pub fn with_emissions(mut self) -> Self {
		self.emissions = true;
		self
	}

	/// Sums every document table of orders `1..=order` into a fresh aggregate.
	///
	/// An empty partition yields empty tables; rejecting it is the caller's job.
	pub fn aggregate(&self, documents: &[AnnotatedDocument]) -> Aggregate {
		let mut aggregate = Aggregate::default();

		for document in documents {
			let sentences = document.sentence_count();

			for order in 1..=self.order {
				if let Some(table) = document.ngrams(self.layer, order) {
					aggregate.counts.merge(table);

					if order == 1 {
						for (ngram, count) in table.iter().filter(|(ngram, _)| !is_all_start(ngram)) {
							aggregate.counts.add_total(count);
							aggregate.vocabulary.extend(ngram.first().cloned());
						}
					}
				}
				// Seeds the beginning-of-sentence transition mass
				aggregate.counts.add(&start_key(order), sentences);
			}

			if self.emissions {
				aggregate.emissions.merge(document.emissions());
			}
			aggregate.sentences += sentences;
		}

		debug!(
			documents = documents.len(),
			order = self.order,
			layer = ?self.layer,
			entries = aggregate.counts.len(),
			vocabulary = aggregate.vocabulary.len(),
			total = aggregate.counts.total(),
			"aggregated counts"
		);
		aggregate
	}
}
