//! Annotated documents: the input every model trains and is scored on.

use serde::{Deserialize, Serialize};

use crate::model::count_table::{EmissionTable, FrequencyTable};

/// Builds documents from tagged sentences and named-entity chunks.
pub mod builder;

/// Language and interest filters deciding the usable flag.
pub mod filter;

/// Highest n-gram order a document carries tables for.
pub const MAX_ORDER: usize = 4;

/// One word and its part-of-speech (or flattened entity) tag.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TaggedToken {
	pub token: String,
	pub tag: String,
}

impl TaggedToken {
	pub fn new(token: &str, tag: &str) -> Self {
		Self { token: token.to_owned(), tag: tag.to_owned() }
	}
}

pub type Sentence = Vec<TaggedToken>;

/// Which half of a tagged sentence a model reads.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layer {
	Words,
	Tags,
}

impl Layer {
	/// Projects a sentence onto this layer.
	pub fn project<'a>(&self, sentence: &'a [TaggedToken]) -> Vec<&'a str> {
		sentence
			.iter()
			.map(|tagged| match self {
				Layer::Words => tagged.token.as_str(),
				Layer::Tags => tagged.tag.as_str(),
			})
			.collect()
	}
}

/// An already-tagged text unit with precomputed frequency tables.
///
/// Immutable once built; see [`builder::DocumentBuilder`].
///
/// # Invariants
/// - `word_ngrams` and `tag_ngrams` hold exactly [`MAX_ORDER`] tables,
///   index `i` being order `i + 1`
/// - no sentence is empty
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(try_from = "DocumentRecord")]
pub struct AnnotatedDocument {
	id: u64,
	text: String,
	usable: bool,
	sentences: Vec<Sentence>,
	word_ngrams: Vec<FrequencyTable>,
	tag_ngrams: Vec<FrequencyTable>,
	emissions: EmissionTable,
}

/// Serialized form of [`AnnotatedDocument`], checked before it becomes one.
#[derive(Deserialize)]
struct DocumentRecord {
	id: u64,
	text: String,
	usable: bool,
	sentences: Vec<Sentence>,
	word_ngrams: Vec<FrequencyTable>,
	tag_ngrams: Vec<FrequencyTable>,
	emissions: EmissionTable,
}

impl TryFrom<DocumentRecord> for AnnotatedDocument {
	type Error = String;

	fn try_from(record: DocumentRecord) -> Result<Self, Self::Error> {
		for (field, tables) in [("word_ngrams", &record.word_ngrams), ("tag_ngrams", &record.tag_ngrams)] {
			if tables.len() != MAX_ORDER {
				return Err(format!(
					"document {}: `{field}` holds {} tables, expected {MAX_ORDER}",
					record.id,
					tables.len()
				));
			}
		}
		if let Some(index) = record.sentences.iter().position(|sentence| sentence.is_empty()) {
			return Err(format!("document {}: sentence {index} is empty", record.id));
		}
		Ok(AnnotatedDocument {
			id: record.id,
			text: record.text,
			usable: record.usable,
			sentences: record.sentences,
			word_ngrams: record.word_ngrams,
			tag_ngrams: record.tag_ngrams,
			emissions: record.emissions,
		})
	}
}

impl AnnotatedDocument {
	pub fn id(&self) -> u64 {
		self.id
	}

	pub fn text(&self) -> &str {
		&self.text
	}

	/// Whether the document passed the language and interest filters.
	pub fn is_usable(&self) -> bool {
		self.usable
	}

	pub fn sentences(&self) -> &[Sentence] {
		&self.sentences
	}

	pub fn sentence_count(&self) -> u64 {
		self.sentences.len() as u64
	}

	/// The frequency table of `order` for a layer, if `1 <= order <= MAX_ORDER`.
	pub fn ngrams(&self, layer: Layer, order: usize) -> Option<&FrequencyTable> {
		let tables = match layer {
			Layer::Words => &self.word_ngrams,
			Layer::Tags => &self.tag_ngrams,
		};
		order.checked_sub(1).and_then(|index| tables.get(index))
	}

	pub fn emissions(&self) -> &EmissionTable {
		&self.emissions
	}

	/// Unigram token count, stop sentinels included and start sentinels excluded.
	pub fn token_count(&self) -> u64 {
		self.ngrams(Layer::Words, 1)
			.map(FrequencyTable::total_without_start)
			.unwrap_or(0)
	}
}

#[cfg(test)]
mod tests {
	use serde_json::Value;

	use super::builder::{Annotation, DocumentBuilder};
	use super::*;

	fn document_json() -> Value {
		let document = DocumentBuilder::new(3, "the cat")
			.sentence(vec![Annotation::word("the", "DT"), Annotation::word("cat", "NN")])
			.build();
		serde_json::to_value(&document).unwrap()
	}

	#[test]
	fn well_formed_document_deserializes() {
		let document: AnnotatedDocument = serde_json::from_value(document_json()).unwrap();
		assert_eq!(document.id(), 3);
		assert_eq!(document.token_count(), 3);
	}

	#[test]
	fn missing_order_tables_are_rejected() {
		let mut json = document_json();
		json["word_ngrams"].as_array_mut().unwrap().truncate(2);
		let error = serde_json::from_value::<AnnotatedDocument>(json).unwrap_err().to_string();
		assert!(error.contains("`word_ngrams` holds 2 tables, expected 4"), "{error}");
	}

	#[test]
	fn empty_sentence_is_rejected() {
		let mut json = document_json();
		json["sentences"].as_array_mut().unwrap().push(Value::Array(Vec::new()));
		let error = serde_json::from_value::<AnnotatedDocument>(json).unwrap_err().to_string();
		assert!(error.contains("sentence 1 is empty"), "{error}");
	}
}
