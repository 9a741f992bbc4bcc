use serde::{Deserialize, Serialize};
use tracing::debug;

use super::filter::DocumentFilter;
use super::{AnnotatedDocument, Layer, Sentence, TaggedToken, MAX_ORDER};
use crate::model::count_table::{EmissionTable, FrequencyTable};
use crate::model::ngram::pad;

/// One element of a sentence as produced by the annotation pipeline.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum Annotation {
	/// A plain word with its part-of-speech tag.
	Word { token: String, tag: String },
	/// A named-entity chunk, e.g. `PERSON` over `["Barack", "Obama"]`.
	Entity { entity_type: String, tokens: Vec<String> },
}

impl Annotation {
	pub fn word(token: &str, tag: &str) -> Self {
		Annotation::Word { token: token.to_owned(), tag: tag.to_owned() }
	}

	pub fn entity(entity_type: &str, tokens: &[&str]) -> Self {
		Annotation::Entity {
			entity_type: entity_type.to_owned(),
			tokens: tokens.iter().map(|t| (*t).to_owned()).collect(),
		}
	}
}

/// Flattens entity chunks into per-word tags.
///
/// The first word of an entity is tagged `<TYPE>-START`, the others
/// `<TYPE>-CONTINUE`.
pub fn flatten(annotations: &[Annotation]) -> Sentence {
	let mut sentence = Vec::with_capacity(annotations.len());
	for annotation in annotations {
		match annotation {
			Annotation::Word { token, tag } => sentence.push(TaggedToken::new(token, tag)),
			Annotation::Entity { entity_type, tokens } => {
				for (i, token) in tokens.iter().enumerate() {
					let position = if i == 0 { "START" } else { "CONTINUE" };
					sentence.push(TaggedToken::new(token, &format!("{entity_type}-{position}")));
				}
			}
		}
	}
	sentence
}

/// Builds an [`AnnotatedDocument`] and every table derived from its sentences.
///
/// # Example
/// ```
/// use rs_lm_core::document::builder::{Annotation, DocumentBuilder};
///
/// let document = DocumentBuilder::new(1, "Obama spoke.")
/// 	.sentence(vec![
/// 		Annotation::entity("PERSON", &["Obama"]),
/// 		Annotation::word("spoke", "VBD"),
/// 		Annotation::word(".", "."),
/// 	])
/// 	.build();
/// assert_eq!(document.sentences()[0][0].tag, "PERSON-START");
/// ```
pub struct DocumentBuilder<'a> {
	id: u64,
	text: String,
	sentences: Vec<Sentence>,
	filter: Option<&'a DocumentFilter>,
}

impl<'a> DocumentBuilder<'a> {
	pub fn new(id: u64, text: &str) -> Self {
		Self { id, text: text.to_owned(), sentences: Vec::new(), filter: None }
	}

	/// Appends a sentence. Empty sentences carry no n-grams and are dropped.
	pub fn sentence(mut self, annotations: Vec<Annotation>) -> Self {
		let sentence = flatten(&annotations);
		if !sentence.is_empty() {
			self.sentences.push(sentence);
		}
		self
	}

	pub fn sentences<I>(self, sentences: I) -> Self
	where
		I: IntoIterator<Item = Vec<Annotation>>,
	{
		sentences.into_iter().fold(self, |builder, sentence| builder.sentence(sentence))
	}

	/// Decides the usable flag with `filter`. Without a filter every document is usable.
	pub fn filter(mut self, filter: &'a DocumentFilter) -> Self {
		self.filter = Some(filter);
		self
	}

	pub fn build(self) -> AnnotatedDocument {
		let usable = match self.filter {
			Some(filter) => {
				let tokens: Vec<&str> = self
					.sentences
					.iter()
					.flat_map(|sentence| Layer::Words.project(sentence))
					.collect();
				filter.is_usable(&tokens)
			}
			None => true,
		};

		let word_ngrams = count_ngrams(&self.sentences, Layer::Words);
		let tag_ngrams = count_ngrams(&self.sentences, Layer::Tags);

		let mut emissions = EmissionTable::new();
		for tagged in self.sentences.iter().flatten() {
			emissions.add(&tagged.tag, &tagged.token, 1);
		}

		debug!(
			id = self.id,
			sentences = self.sentences.len(),
			usable,
			"built annotated document"
		);

		AnnotatedDocument {
			id: self.id,
			text: self.text,
			usable,
			sentences: self.sentences,
			word_ngrams,
			tag_ngrams,
			emissions,
		}
	}
}

/// Counts orders `1..=MAX_ORDER`, padding each sentence with `order - 1` start
/// sentinels and one stop sentinel.
fn count_ngrams(sentences: &[Sentence], layer: Layer) -> Vec<FrequencyTable> {
	(1..=MAX_ORDER)
		.map(|order| {
			let mut table = FrequencyTable::new();
			for sentence in sentences {
				let padded = pad(&layer.project(sentence), order - 1);
				for window in padded.windows(order) {
					table.add(window, 1);
				}
			}
			table
		})
		.collect()
}
