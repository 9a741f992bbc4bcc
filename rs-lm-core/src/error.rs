use thiserror::Error;

use crate::model::ngram::NGram;

/// Errors raised while training, scoring or sampling a language model,
/// plus the collaborator failures (files, settings) surfaced by this crate.
#[derive(Debug, Error)]
pub enum ModelError {
	/// A numerator or denominator lookup failed even after the rare-token fallback.
	#[error("no {lookup} count for {chunk:?}, even after rare-token fallback")]
	MissingCount {
		/// The n-gram (or history) that could not be resolved.
		chunk: NGram,
		/// Which half of the conditional probability was being resolved.
		lookup: &'static str,
	},

	/// Empty training or testing partition, or a held-out set without tokens.
	#[error("degenerate partition: {0}")]
	DegeneratePartition(String),

	#[error("n-gram order must be between 1 and {max}, got {order}")]
	InvalidOrder { order: usize, max: usize },

	/// The candidate set emptied before the stop sentinel was produced.
	#[error("no candidate can follow {sequence:?}")]
	UnreachableTerminal { sequence: NGram },

	#[error("generation exceeded {limit} tokens without reaching the stop sentinel")]
	SequenceTooLong { limit: usize },

	#[error("model has not been trained")]
	NotTrained,

	/// Trained models are immutable; training twice is refused.
	#[error("model is already trained")]
	AlreadyTrained,

	#[error("invalid settings: {0}")]
	InvalidSettings(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	#[error(transparent)]
	Toml(#[from] toml::de::Error),

	#[error(transparent)]
	Postcard(#[from] postcard::Error),
}

pub type Result<T> = std::result::Result<T, ModelError>;
