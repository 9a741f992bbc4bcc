//! Small corpora shared by the unit tests.

use crate::document::builder::{Annotation, DocumentBuilder};
use crate::document::AnnotatedDocument;
use crate::model::ngram::NGram;

pub(crate) fn gram(tokens: &[&str]) -> NGram {
	tokens.iter().map(|t| t.to_string()).collect()
}

/// Every word tagged `NN`.
pub(crate) fn document(id: u64, sentences: &[&[&str]]) -> AnnotatedDocument {
	DocumentBuilder::new(id, "")
		.sentences(sentences.iter().map(|s| s.iter().map(|t| Annotation::word(t, "NN")).collect()))
		.build()
}

/// A: {the: 5, cat: 1, STOP: 2}, B: {the: 3, dog: 1, STOP: 2}
pub(crate) fn two_documents() -> Vec<AnnotatedDocument> {
	vec![
		document(1, &[&["the", "cat", "the"], &["the", "the", "the"]]),
		document(2, &[&["the", "dog"], &["the", "the"]]),
	]
}

/// Training corpus in which `(the, cat)` never occurs but `the` and `cat` do.
pub(crate) fn rare_training() -> Vec<AnnotatedDocument> {
	vec![document(1, &[&["the", "dog"], &["the", "bird"], &["a", "cat"]])]
}

/// Tagged corpus for the hidden Markov model.
pub(crate) fn tagged_documents() -> Vec<AnnotatedDocument> {
	let sentence = |words: &[(&str, &str)]| -> Vec<Annotation> {
		words.iter().map(|(token, tag)| Annotation::word(token, tag)).collect()
	};
	vec![
		DocumentBuilder::new(1, "")
			.sentence(sentence(&[("the", "DT"), ("cat", "NN"), ("sleeps", "VBZ"), (".", ".")]))
			.sentence(sentence(&[("a", "DT"), ("dog", "NN"), ("barks", "VBZ"), (".", ".")]))
			.build(),
		DocumentBuilder::new(2, "")
			.sentence(vec![
				Annotation::entity("PERSON", &["Jane", "Doe"]),
				Annotation::word("sleeps", "VBZ"),
				Annotation::word(".", "."),
			])
			.sentence(sentence(&[("the", "DT"), ("dog", "NN"), ("sleeps", "VBZ"), (".", ".")]))
			.build(),
	]
}
