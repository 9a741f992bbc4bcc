use tracing::debug;

use crate::document::{AnnotatedDocument, TaggedToken};
use crate::error::{ModelError, Result};

/// Corpus-level perplexity of a held-out partition.
///
/// `sentence_log_probability` returns the base-2 log probability of one
/// sentence under the model. The sum over every sentence is normalized by the
/// token count of the whole partition (not per sentence), then turned into
/// `2^(-L / M)`.
///
/// # Errors
/// - `ModelError::DegeneratePartition` for an empty partition or one without tokens
/// - any error of `sentence_log_probability`
pub fn evaluate<F>(documents: &[AnnotatedDocument], mut sentence_log_probability: F) -> Result<f64>
where
	F: FnMut(&[TaggedToken]) -> Result<f64>,
{
	if documents.is_empty() {
		return Err(ModelError::DegeneratePartition("held-out partition is empty".to_owned()));
	}

	let mut log_probability = 0.0;
	let mut tokens = 0u64;
	for document in documents {
		tokens += document.token_count();
		for sentence in document.sentences() {
			log_probability += sentence_log_probability(sentence)?;
		}
	}

	if tokens == 0 {
		return Err(ModelError::DegeneratePartition("held-out partition has no tokens".to_owned()));
	}

	let perplexity = (-(log_probability / tokens as f64)).exp2();
	debug!(documents = documents.len(), tokens, log_probability, perplexity, "evaluated perplexity");
	Ok(perplexity)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::document::builder::DocumentBuilder;
	use crate::model::fixtures::document;

	#[test]
	fn normalizes_by_partition_token_count() {
		// 2 + 3 tokens (stop sentinels included), every sentence at -5 bits
		let documents = vec![document(1, &[&["a"]]), document(2, &[&["b", "c"]])];
		let perplexity = evaluate(&documents, |_| Ok(-5.0)).unwrap();
		assert!((perplexity - 2f64.powf(10.0 / 5.0)).abs() < 1e-9);
	}

	#[test]
	fn empty_partition_is_rejected() {
		assert!(matches!(evaluate(&[], |_| Ok(0.0)), Err(ModelError::DegeneratePartition(_))));
	}

	#[test]
	fn partition_without_tokens_is_rejected() {
		let documents = vec![DocumentBuilder::new(1, "").build()];
		assert!(matches!(evaluate(&documents, |_| Ok(0.0)), Err(ModelError::DegeneratePartition(_))));
	}

	#[test]
	fn sentence_errors_propagate() {
		let documents = vec![document(1, &[&["a"]])];
		let result = evaluate(&documents, |_| Err(ModelError::NotTrained));
		assert!(matches!(result, Err(ModelError::NotTrained)));
	}
}
