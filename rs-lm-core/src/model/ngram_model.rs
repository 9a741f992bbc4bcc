use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::aggregator::Aggregator;
use super::generator::{detokenize, generate_tokens};
use super::language_model::LanguageModel;
use super::perplexity;
use super::transmission::{score, Transmission};
use crate::document::{AnnotatedDocument, Layer, MAX_ORDER};
use crate::error::{ModelError, Result};
use crate::settings::ModelSettings;

/// Maximum-likelihood word model of a fixed order.
///
/// One n-gram size, no back-off and no interpolation: unseen n-grams are
/// only handled by rare-token collapsing.
///
/// # Responsibilities
/// - Aggregate the word tables of a training partition
/// - Keep the raw and rare-collapsed log2 tables
/// - Score held-out text and sample new sentences
///
/// # Invariants
/// - `1 <= order <= MAX_ORDER`
/// - `transmission` is `None` until `train` succeeds, then never changes
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NGramModel {
	/// Number of words in an n-gram (1 = unigram, 4 = quadgram)
	order: usize,

	settings: ModelSettings,

	/// Trained tables
	transmission: Option<Transmission>,
}

impl NGramModel {
	/// Creates an untrained model of order `order`.
	///
	/// # Errors
	/// Returns `ModelError::InvalidOrder` unless `1 <= order <= 4`.
	pub fn new(order: usize, settings: &ModelSettings) -> Result<Self> {
		if !(1..=MAX_ORDER).contains(&order) {
			return Err(ModelError::InvalidOrder { order, max: MAX_ORDER });
		}
		Ok(Self { order, settings: settings.clone(), transmission: None })
	}

	pub fn order(&self) -> usize {
		self.order
	}

	pub fn is_trained(&self) -> bool {
		self.transmission.is_some()
	}

	/// The trained tables.
	///
	/// # Errors
	/// `ModelError::NotTrained` before `train`.
	pub fn transmission(&self) -> Result<&Transmission> {
		self.transmission.as_ref().ok_or(ModelError::NotTrained)
	}

	/// `log2 P(last word | history)` under the rare-collapsed table, the same
	/// view perplexity uses.
	pub fn score<S: AsRef<str>>(&self, chunk: &[S]) -> Result<f64> {
		score(chunk, self.transmission()?.rare())
	}
}

impl LanguageModel for NGramModel {
	fn train(&mut self, training: &[AnnotatedDocument]) -> Result<()> {
		if self.transmission.is_some() {
			return Err(ModelError::AlreadyTrained);
		}
		if training.is_empty() {
			return Err(ModelError::DegeneratePartition("training partition is empty".to_owned()));
		}
		debug!(order = self.order, documents = training.len(), "training n-gram model");

		let aggregate = Aggregator::new(self.order, Layer::Words).aggregate(training);
		let transmission = Transmission::from_aggregate(&aggregate, self.order, self.settings.infrequency_threshold);

		info!(
			order = self.order,
			sentences = aggregate.sentences,
			vocabulary = transmission.vocabulary().len(),
			raw_entries = transmission.raw().len(),
			rare_entries = transmission.rare().len(),
			"trained n-gram model"
		);
		self.transmission = Some(transmission);
		Ok(())
	}

	fn evaluate_perplexity(&self, testing: &[AnnotatedDocument]) -> Result<f64> {
		let transmission = self.transmission()?;
		perplexity::evaluate(testing, |sentence| {
			transmission.sentence_log_probability(&Layer::Words.project(sentence))
		})
	}

	fn generate(&self, rng: &mut dyn RngCore) -> Result<String> {
		let tokens = generate_tokens(self.transmission()?, self.settings.max_sequence_length, rng)?;
		Ok(detokenize(&tokens))
	}
}

#[cfg(test)]
mod tests {
	use rand::rngs::StdRng;
	use rand::SeedableRng;

	use super::*;
	use crate::model::fixtures::{document, rare_training, two_documents};

	fn trained(order: usize, documents: &[AnnotatedDocument]) -> NGramModel {
		trained_with_threshold(order, ModelSettings::default().infrequency_threshold, documents)
	}

	fn trained_with_threshold(order: usize, threshold: u64, documents: &[AnnotatedDocument]) -> NGramModel {
		let settings = ModelSettings { infrequency_threshold: threshold, ..ModelSettings::default() };
		let mut model = NGramModel::new(order, &settings).unwrap();
		model.train(documents).unwrap();
		model
	}

	#[test]
	fn order_must_be_in_range() {
		let settings = ModelSettings::default();
		assert!(matches!(NGramModel::new(0, &settings), Err(ModelError::InvalidOrder { order: 0, .. })));
		assert!(matches!(NGramModel::new(5, &settings), Err(ModelError::InvalidOrder { order: 5, .. })));
		assert!(NGramModel::new(4, &settings).is_ok());
	}

	#[test]
	fn queries_before_training_fail() {
		let model = NGramModel::new(2, &ModelSettings::default()).unwrap();
		let mut rng = StdRng::seed_from_u64(0);
		assert!(matches!(model.generate(&mut rng), Err(ModelError::NotTrained)));
		assert!(matches!(model.evaluate_perplexity(&two_documents()), Err(ModelError::NotTrained)));
		assert!(matches!(model.score(&["the"]), Err(ModelError::NotTrained)));
	}

	#[test]
	fn empty_training_partition_is_rejected() {
		let mut model = NGramModel::new(2, &ModelSettings::default()).unwrap();
		assert!(matches!(model.train(&[]), Err(ModelError::DegeneratePartition(_))));
		assert!(!model.is_trained());
	}

	#[test]
	fn training_twice_is_refused() {
		let mut model = trained(2, &two_documents());
		assert!(matches!(model.train(&two_documents()), Err(ModelError::AlreadyTrained)));
	}

	#[test]
	fn held_out_unseen_bigram_has_a_perplexity() {
		let model = trained(2, &rare_training());
		let held_out = vec![document(9, &[&["the", "cat"]])];
		let perplexity = model.evaluate_perplexity(&held_out).unwrap();
		let log_probability = (2.0f64 / 3.0).log2() + 2.0 * 0.75f64.log2();
		assert!((perplexity - (-log_probability / 3.0).exp2()).abs() < 1e-9);
		assert!(perplexity > 1.0);
	}

	#[test]
	fn all_rare_fold_is_certain() {
		// every word but the full stop is seen once, so held-out chunks fold to
		// rare keys whose counts equal their histories' counts
		let training = vec![document(1, &[&["a1", "b1", "."], &["a2", "b2", "."]])];
		let model = trained(2, &training);
		assert_eq!(model.score(&["x", "y"]).unwrap(), 0.0);
		assert_eq!(model.score(&["y", "."]).unwrap(), 0.0);
		let held_out = vec![document(9, &[&["x", "y", "."]])];
		assert_eq!(model.evaluate_perplexity(&held_out).unwrap(), 1.0);
	}

	#[test]
	fn perplexity_is_above_one_for_every_order() {
		for order in 1..=4 {
			let model = trained_with_threshold(order, 0, &two_documents());
			let perplexity = model.evaluate_perplexity(&two_documents()).unwrap();
			assert!(perplexity > 1.0, "order {order}: {perplexity}");
		}
	}

	#[test]
	fn higher_orders_fit_training_text_better() {
		let unigram = trained_with_threshold(1, 0, &two_documents()).evaluate_perplexity(&two_documents()).unwrap();
		let trigram = trained_with_threshold(3, 0, &two_documents()).evaluate_perplexity(&two_documents()).unwrap();
		assert!(trigram < unigram);
	}

	#[test]
	fn generation_is_reproducible_with_a_seed() {
		let model = trained(2, &two_documents());
		let first: Vec<String> = {
			let mut rng = StdRng::seed_from_u64(42);
			(0..5).map(|_| model.generate(&mut rng).unwrap()).collect()
		};
		let second: Vec<String> = {
			let mut rng = StdRng::seed_from_u64(42);
			(0..5).map(|_| model.generate(&mut rng).unwrap()).collect()
		};
		assert_eq!(first, second);
	}

	#[test]
	fn generated_words_come_from_the_vocabulary() {
		let model = trained(3, &two_documents());
		let mut rng = StdRng::seed_from_u64(5);
		for _ in 0..20 {
			let text = model.generate(&mut rng).unwrap();
			assert!(text.split(' ').filter(|w| !w.is_empty()).all(|w| ["the", "cat", "dog"].contains(&w)), "{text}");
		}
	}

	#[test]
	fn collapsed_history_without_rare_form_is_a_missing_count() {
		// (START, the, cat) folds into (START, RARE, RARE) but (START, RARE) never exists
		let model = trained(3, &two_documents());
		assert!(matches!(
			model.evaluate_perplexity(&two_documents()),
			Err(ModelError::MissingCount { lookup: "history", .. })
		));
	}

	#[test]
	fn deterministic_corpus_is_reproduced() {
		let model = trained(2, &[document(1, &[&["Hello", ",", "world", "!"]])]);
		let mut rng = StdRng::seed_from_u64(0);
		assert_eq!(model.generate(&mut rng).unwrap(), "Hello, world!");
	}
}
