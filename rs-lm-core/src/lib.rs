//! N-gram language modelling library.
//!
//! This crate estimates language models over annotated text and uses them to:
//! - score held-out text (perplexity)
//! - generate new sentences with a seedable random source
//!
//! Five variants are provided: word unigram to quadgram models and a
//! trigram-tag hidden Markov model. Infrequent n-grams are folded into a
//! rare-token bucket; there is no other smoothing.
//!
//! # Example
//! ```
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//! use rs_lm_core::document::builder::{Annotation, DocumentBuilder};
//! use rs_lm_core::{LanguageModel, ModelKind, ModelSettings};
//!
//! let document = DocumentBuilder::new(1, "The cat sleeps.")
//! 	.sentence(vec![
//! 		Annotation::word("The", "DT"),
//! 		Annotation::word("cat", "NN"),
//! 		Annotation::word("sleeps", "VBZ"),
//! 		Annotation::word(".", "."),
//! 	])
//! 	.build();
//!
//! let mut model = ModelKind::Bigram.build(&ModelSettings::default()).unwrap();
//! model.train(&[document]).unwrap();
//! let mut rng = StdRng::seed_from_u64(7);
//! assert_eq!(model.generate(&mut rng).unwrap(), "The cat sleeps.");
//! ```

/// Annotated documents, their builder and usability filters.
pub mod document;

/// Error type shared by the whole crate.
pub mod error;

/// Corpus and model files.
pub mod io;

/// Count tables, smoothing, scoring and generation.
pub mod model;

/// Ordered training / held-out split.
pub mod partition;

/// TOML run configuration.
pub mod settings;

pub use document::AnnotatedDocument;
pub use error::{ModelError, Result};
pub use model::hmm_model::HiddenMarkovModel;
pub use model::language_model::{AnyModel, LanguageModel, ModelKind};
pub use model::ngram_model::NGramModel;
pub use partition::Partition;
pub use settings::{ModelSettings, Settings};
