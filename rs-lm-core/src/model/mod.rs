//! Statistical core: count tables, smoothing, scoring, perplexity and
//! generation for the word n-gram models and the hidden Markov model.
//!
//! Data flows one way:
//! documents → `aggregator` → `smoother` → `transmission` tables, which
//! `perplexity` scores against and `generator` samples from.

/// Merges per-document frequency tables into corpus-wide counts.
pub mod aggregator;

/// Frequency, count, log2 and emission tables.
pub mod count_table;

/// Weighted sampling of sequences and text post-processing.
pub mod generator;

/// Trigram-tag / word-emission hidden Markov model.
pub mod hmm_model;

/// The `LanguageModel` trait and the model kind selector.
pub mod language_model;

/// N-gram keys, sentinels and the rare-token mapping.
pub mod ngram;

/// Fixed-order word n-gram model.
pub mod ngram_model;

/// Corpus-level perplexity.
pub mod perplexity;

/// Rare-token collapsing.
pub mod smoother;

/// Log2 conditional probability lookups.
pub mod transmission;

/// Generation state of one chain.
mod state;

#[cfg(test)]
pub(crate) mod fixtures;
