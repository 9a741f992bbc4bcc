use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::hmm_model::HiddenMarkovModel;
use super::ngram_model::NGramModel;
use super::transmission::score;
use crate::document::AnnotatedDocument;
use crate::error::{ModelError, Result};
use crate::settings::ModelSettings;

/// Common lifecycle of every model variant: train once, then score or sample.
pub trait LanguageModel {
	/// Aggregates and smooths the training partition.
	///
	/// # Errors
	/// - `ModelError::DegeneratePartition` for an empty partition
	/// - `ModelError::AlreadyTrained` on a second call
	fn train(&mut self, training: &[AnnotatedDocument]) -> Result<()>;

	/// Corpus-level perplexity of a held-out partition.
	fn evaluate_perplexity(&self, testing: &[AnnotatedDocument]) -> Result<f64>;

	/// Samples one sentence. The same seed on the same trained model gives
	/// the same text.
	fn generate(&self, rng: &mut dyn RngCore) -> Result<String>;
}

/// The five model variants.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModelKind {
	Unigram,
	Bigram,
	Trigram,
	Quadgram,
	HiddenMarkov,
}

impl ModelKind {
	pub const ALL: [ModelKind; 5] = [
		ModelKind::Unigram,
		ModelKind::Bigram,
		ModelKind::Trigram,
		ModelKind::Quadgram,
		ModelKind::HiddenMarkov,
	];

	pub fn name(self) -> &'static str {
		match self {
			ModelKind::Unigram => "unigram",
			ModelKind::Bigram => "bigram",
			ModelKind::Trigram => "trigram",
			ModelKind::Quadgram => "quadgram",
			ModelKind::HiddenMarkov => "hidden-markov",
		}
	}

	/// Word n-gram order, `None` for the hidden Markov model.
	pub fn order(self) -> Option<usize> {
		match self {
			ModelKind::Unigram => Some(1),
			ModelKind::Bigram => Some(2),
			ModelKind::Trigram => Some(3),
			ModelKind::Quadgram => Some(4),
			ModelKind::HiddenMarkov => None,
		}
	}

	/// An untrained model of this kind.
	pub fn build(self, settings: &ModelSettings) -> Result<AnyModel> {
		Ok(match self.order() {
			Some(order) => AnyModel::NGram(NGramModel::new(order, settings)?),
			None => AnyModel::HiddenMarkov(HiddenMarkovModel::new(settings)),
		})
	}
}

impl fmt::Display for ModelKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

impl FromStr for ModelKind {
	type Err = ModelError;

	fn from_str(s: &str) -> Result<Self> {
		match s.to_ascii_lowercase().as_str() {
			"unigram" | "1" => Ok(ModelKind::Unigram),
			"bigram" | "2" => Ok(ModelKind::Bigram),
			"trigram" | "3" => Ok(ModelKind::Trigram),
			"quadgram" | "4" => Ok(ModelKind::Quadgram),
			"hidden-markov" | "hmm" => Ok(ModelKind::HiddenMarkov),
			other => Err(ModelError::InvalidSettings(format!("unknown model kind `{other}`"))),
		}
	}
}

/// Any trained or untrained model, as stored on disk and served.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub enum AnyModel {
	NGram(NGramModel),
	HiddenMarkov(HiddenMarkovModel),
}

impl AnyModel {
	pub fn kind(&self) -> ModelKind {
		match self {
			AnyModel::NGram(model) => match model.order() {
				1 => ModelKind::Unigram,
				2 => ModelKind::Bigram,
				3 => ModelKind::Trigram,
				_ => ModelKind::Quadgram,
			},
			AnyModel::HiddenMarkov(_) => ModelKind::HiddenMarkov,
		}
	}

	pub fn is_trained(&self) -> bool {
		match self {
			AnyModel::NGram(model) => model.is_trained(),
			AnyModel::HiddenMarkov(model) => model.is_trained(),
		}
	}

	/// Smoothed log2 probability of one chunk: words for the n-gram variants,
	/// tags for the hidden Markov model.
	///
	/// # Errors
	/// - `ModelError::NotTrained` before training
	/// - `ModelError::MissingCount` when the chunk or its history has no count
	pub fn score<S: AsRef<str>>(&self, chunk: &[S]) -> Result<f64> {
		match self {
			AnyModel::NGram(model) => model.score(chunk),
			AnyModel::HiddenMarkov(model) => score(chunk, model.transmission()?.rare()),
		}
	}

	fn inner(&self) -> &dyn LanguageModel {
		match self {
			AnyModel::NGram(model) => model,
			AnyModel::HiddenMarkov(model) => model,
		}
	}
}

impl LanguageModel for AnyModel {
	fn train(&mut self, training: &[AnnotatedDocument]) -> Result<()> {
		match self {
			AnyModel::NGram(model) => model.train(training),
			AnyModel::HiddenMarkov(model) => model.train(training),
		}
	}

	fn evaluate_perplexity(&self, testing: &[AnnotatedDocument]) -> Result<f64> {
		self.inner().evaluate_perplexity(testing)
	}

	fn generate(&self, rng: &mut dyn RngCore) -> Result<String> {
		self.inner().generate(rng)
	}
}
