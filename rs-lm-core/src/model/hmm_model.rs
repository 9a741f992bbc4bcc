use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::aggregator::Aggregator;
use super::count_table::EmissionTable;
use super::generator::{detokenize, emit, generate_tokens};
use super::language_model::LanguageModel;
use super::ngram::RARE;
use super::perplexity;
use super::smoother::collapse_rare_emissions;
use super::transmission::Transmission;
use crate::document::{AnnotatedDocument, Layer};
use crate::error::{ModelError, Result};
use crate::settings::ModelSettings;

/// Order of the tag chain.
pub const TAG_ORDER: usize = 3;

#[derive(Serialize, Deserialize, Clone, Debug)]
struct HmmTables {
	/// Tag trigram chain
	transmission: Transmission,
	/// Linear tag → word counts, sampled from during generation
	emissions: EmissionTable,
	/// Same counts with infrequent words folded into the rare word, scored against
	rare_emissions: EmissionTable,
}

/// Two-layer model: a trigram chain over tags, then one word per tag.
///
/// # Responsibilities
/// - Train the tag chain like a word model of order 3 over the tag layer
/// - Keep the merged emission counts, raw and rare-collapsed
/// - Generate tags first, then draw each word from its tag's emissions
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HiddenMarkovModel {
	settings: ModelSettings,
	trained: Option<HmmTables>,
}

impl HiddenMarkovModel {
	pub fn new(settings: &ModelSettings) -> Self {
		Self { settings: settings.clone(), trained: None }
	}

	pub fn is_trained(&self) -> bool {
		self.trained.is_some()
	}

	fn tables(&self) -> Result<&HmmTables> {
		self.trained.as_ref().ok_or(ModelError::NotTrained)
	}

	/// The tag chain.
	pub fn transmission(&self) -> Result<&Transmission> {
		Ok(&self.tables()?.transmission)
	}

	/// Linear emission counts as aggregated from the training partition.
	pub fn emissions(&self) -> Result<&EmissionTable> {
		Ok(&self.tables()?.emissions)
	}

	/// `log2 P(word | tag)` under the rare-collapsed emissions.
	///
	/// # Errors
	/// `ModelError::MissingCount` if neither `word` nor the rare word was
	/// recorded for `tag`.
	pub fn emission_score(&self, tag: &str, word: &str) -> Result<f64> {
		let emissions = &self.tables()?.rare_emissions;
		let missing = || ModelError::MissingCount {
			chunk: vec![tag.to_owned(), word.to_owned()],
			lookup: "emission",
		};

		let count = emissions
			.count(tag, word)
			.or_else(|| emissions.count(tag, RARE))
			.ok_or_else(missing)?;
		let total = emissions.tag_total(tag);
		if total == 0 {
			return Err(missing());
		}
		Ok((count as f64).log2() - (total as f64).log2())
	}
}

impl LanguageModel for HiddenMarkovModel {
	fn train(&mut self, training: &[AnnotatedDocument]) -> Result<()> {
		if self.trained.is_some() {
			return Err(ModelError::AlreadyTrained);
		}
		if training.is_empty() {
			return Err(ModelError::DegeneratePartition("training partition is empty".to_owned()));
		}

		let threshold = self.settings.infrequency_threshold;
		let aggregate = Aggregator::new(TAG_ORDER, Layer::Tags).with_emissions().aggregate(training);
		let tables = HmmTables {
			transmission: Transmission::from_aggregate(&aggregate, TAG_ORDER, threshold),
			rare_emissions: collapse_rare_emissions(&aggregate.emissions, threshold),
			emissions: aggregate.emissions,
		};

		info!(
			sentences = aggregate.sentences,
			tags = tables.transmission.vocabulary().len(),
			"trained hidden markov model"
		);
		self.trained = Some(tables);
		Ok(())
	}

	fn evaluate_perplexity(&self, testing: &[AnnotatedDocument]) -> Result<f64> {
		let transmission = self.transmission()?;
		perplexity::evaluate(testing, |sentence| {
			let mut log_probability = transmission.sentence_log_probability(&Layer::Tags.project(sentence))?;
			for tagged in sentence {
				log_probability += self.emission_score(&tagged.tag, &tagged.token)?;
			}
			Ok(log_probability)
		})
	}

	fn generate(&self, rng: &mut dyn RngCore) -> Result<String> {
		let tables = self.tables()?;
		let tags = generate_tokens(&tables.transmission, self.settings.max_sequence_length, rng)?;
		let words = tags
			.iter()
			.map(|tag| emit(&tables.emissions, tag, rng))
			.collect::<Result<Vec<&str>>>()?;
		Ok(detokenize(&words))
	}
}

#[cfg(test)]
mod tests {
	use rand::rngs::StdRng;
	use rand::SeedableRng;

	use super::*;
	use crate::document::builder::{Annotation, DocumentBuilder};
	use crate::model::fixtures::tagged_documents;

	fn trained(threshold: u64) -> HiddenMarkovModel {
		let settings = ModelSettings { infrequency_threshold: threshold, ..ModelSettings::default() };
		let mut model = HiddenMarkovModel::new(&settings);
		model.train(&tagged_documents()).unwrap();
		model
	}

	#[test]
	fn untrained_model_refuses_queries() {
		let model = HiddenMarkovModel::new(&ModelSettings::default());
		let mut rng = StdRng::seed_from_u64(0);
		assert!(matches!(model.generate(&mut rng), Err(ModelError::NotTrained)));
		assert!(matches!(model.emission_score("DT", "the"), Err(ModelError::NotTrained)));
	}

	#[test]
	fn training_twice_is_refused() {
		let mut model = trained(1);
		assert!(matches!(model.train(&tagged_documents()), Err(ModelError::AlreadyTrained)));
	}

	#[test]
	fn tag_chain_is_a_trigram_over_tags() {
		let model = trained(1);
		let transmission = model.transmission().unwrap();
		assert_eq!(transmission.order(), TAG_ORDER);
		assert!(transmission.vocabulary().contains("PERSON-START"));
		assert!(transmission.vocabulary().contains("PERSON-CONTINUE"));
		assert!(!transmission.vocabulary().contains("the"));
	}

	#[test]
	fn emission_scores_fall_back_to_the_rare_word() {
		let model = trained(1);
		// DT: the 2, a 1 -> the 2, RARE 1
		assert!((model.emission_score("DT", "the").unwrap() - (2.0f64 / 3.0).log2()).abs() < 1e-9);
		assert!((model.emission_score("DT", "a").unwrap() - (1.0f64 / 3.0).log2()).abs() < 1e-9);
		assert!((model.emission_score("DT", "zebra").unwrap() - (1.0f64 / 3.0).log2()).abs() < 1e-9);
		assert_eq!(model.emissions().unwrap().count("DT", "a"), Some(1));
	}

	#[test]
	fn emission_without_rare_word_is_a_missing_count() {
		let model = trained(1);
		assert!(matches!(
			model.emission_score(".", "!"),
			Err(ModelError::MissingCount { lookup: "emission", .. })
		));
		assert!(model.emission_score("NOPE", "the").is_err());
	}

	#[test]
	fn held_out_sentence_combines_tags_and_emissions() {
		let model = trained(1);
		let held_out = vec![
			DocumentBuilder::new(7, "")
				.sentence(vec![
					Annotation::word("the", "DT"),
					Annotation::word("bird", "NN"),
					Annotation::word("sleeps", "VBZ"),
					Annotation::word(".", "."),
				])
				.build(),
		];
		let tags = (3.0f64 / 4.0).log2();
		let emissions = (2.0f64 / 3.0).log2() + (1.0f64 / 3.0).log2() + (3.0f64 / 4.0).log2();
		let expected = (-(tags + emissions) / 5.0).exp2();
		let perplexity = model.evaluate_perplexity(&held_out).unwrap();
		assert!((perplexity - expected).abs() < 1e-9, "{perplexity} vs {expected}");
	}

	#[test]
	fn generated_words_were_emitted_in_training() {
		let model = trained(1);
		let known = ["the", "a", "cat", "dog", "sleeps", "barks", "Jane", "Doe"];
		let mut rng = StdRng::seed_from_u64(9);
		for _ in 0..20 {
			let text = model.generate(&mut rng).unwrap();
			assert!(text.ends_with('.'), "{text}");
			let words = text.trim_end_matches('.').split(' ').filter(|w| !w.is_empty());
			assert!(words.into_iter().all(|w| known.contains(&w)), "{text}");
		}
	}

	#[test]
	fn generation_is_reproducible_with_a_seed() {
		let model = trained(1);
		let mut first = StdRng::seed_from_u64(3);
		let mut second = StdRng::seed_from_u64(3);
		for _ in 0..5 {
			assert_eq!(model.generate(&mut first).unwrap(), model.generate(&mut second).unwrap());
		}
	}
}
