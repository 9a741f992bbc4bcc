use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::ngram::{is_all_start, NGram};

/// Linear n-gram frequencies, as stored in a document or merged across a corpus.
///
/// # Invariants
/// - Every stored count is strictly positive (adding `0` is a no-op)
///
/// Serialized as a list of `{ "ngram": [...], "count": n }` entries sorted by
/// n-gram, since JSON object keys cannot be tuples.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrequencyTable {
	counts: HashMap<NGram, u64>,
}

impl FrequencyTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds `count` occurrences of `ngram`, summing with any existing count.
	pub fn add<S: AsRef<str>>(&mut self, ngram: &[S], count: u64) {
		if count == 0 {
			return;
		}
		let key: NGram = ngram.iter().map(|token| token.as_ref().to_owned()).collect();
		*self.counts.entry(key).or_insert(0) += count;
	}

	/// Merges every entry of `other` into this table.
	pub fn merge(&mut self, other: &Self) {
		for (ngram, count) in &other.counts {
			if let Some(existing) = self.counts.get_mut(ngram) {
				*existing += *count;
			} else {
				self.counts.insert(ngram.clone(), *count);
			}
		}
	}

	pub fn get(&self, ngram: &[String]) -> Option<u64> {
		self.counts.get(ngram).copied()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&NGram, u64)> {
		self.counts.iter().map(|(ngram, count)| (ngram, *count))
	}

	pub fn len(&self) -> usize {
		self.counts.len()
	}

	pub fn is_empty(&self) -> bool {
		self.counts.is_empty()
	}

	/// Sum of all counts, ignoring keys made only of start sentinels.
	///
	/// On a unigram table this is the number of tokens (stop sentinel included).
	pub fn total_without_start(&self) -> u64 {
		self.counts
			.iter()
			.filter(|(ngram, _)| !is_all_start(ngram))
			.map(|(_, count)| count)
			.sum()
	}
}

impl FromIterator<(NGram, u64)> for FrequencyTable {
	fn from_iter<I: IntoIterator<Item = (NGram, u64)>>(iter: I) -> Self {
		let mut table = Self::new();
		for (ngram, count) in iter {
			table.add(&ngram, count);
		}
		table
	}
}

#[derive(Serialize)]
struct FrequencyEntryRef<'a> {
	ngram: &'a NGram,
	count: u64,
}

#[derive(Deserialize)]
struct FrequencyEntry {
	ngram: NGram,
	count: u64,
}

impl Serialize for FrequencyTable {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let mut entries: Vec<FrequencyEntryRef<'_>> = self
			.counts
			.iter()
			.map(|(ngram, count)| FrequencyEntryRef { ngram, count: *count })
			.collect();
		entries.sort_by(|a, b| a.ngram.cmp(b.ngram));
		serializer.collect_seq(entries)
	}
}

impl<'de> Deserialize<'de> for FrequencyTable {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let entries = Vec::<FrequencyEntry>::deserialize(deserializer)?;
		Ok(entries.into_iter().map(|entry| (entry.ngram, entry.count)).collect())
	}
}

/// Corpus-wide linear counts over orders `1..=N`, plus the unigram total.
///
/// The total is not an n-gram: it is the denominator of order-1 probabilities
/// and is never rare-collapsed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CountTable {
	grams: FrequencyTable,
	total: u64,
}

impl CountTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// An empty table carrying an existing unigram total.
	pub fn with_total(total: u64) -> Self {
		Self { grams: FrequencyTable::new(), total }
	}

	pub fn add<S: AsRef<str>>(&mut self, ngram: &[S], count: u64) {
		self.grams.add(ngram, count);
	}

	pub fn merge(&mut self, table: &FrequencyTable) {
		self.grams.merge(table);
	}

	pub fn add_total(&mut self, count: u64) {
		self.total += count;
	}

	pub fn get(&self, ngram: &[String]) -> Option<u64> {
		self.grams.get(ngram)
	}

	pub fn total(&self) -> u64 {
		self.total
	}

	pub fn iter(&self) -> impl Iterator<Item = (&NGram, u64)> {
		self.grams.iter()
	}

	pub fn len(&self) -> usize {
		self.grams.len()
	}

	pub fn is_empty(&self) -> bool {
		self.grams.is_empty()
	}

	/// Builds the base-2 logarithm view of this table.
	///
	/// A zero total has no logarithm and is left out.
	pub fn to_log2(&self) -> LogTable {
		LogTable {
			grams: self
				.grams
				.iter()
				.map(|(ngram, count)| (ngram.clone(), (count as f64).log2()))
				.collect(),
			total: (self.total > 0).then(|| (self.total as f64).log2()),
		}
	}
}

/// Count table whose values are `log2(count)`.
///
/// This is what a trained model keeps; probabilities are differences of two
/// entries.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct LogTable {
	grams: HashMap<NGram, f64>,
	total: Option<f64>,
}

impl LogTable {
	pub fn get(&self, ngram: &[String]) -> Option<f64> {
		self.grams.get(ngram).copied()
	}

	pub fn contains(&self, ngram: &[String]) -> bool {
		self.grams.contains_key(ngram)
	}

	/// `log2` of the unigram total, if any token was counted.
	pub fn total(&self) -> Option<f64> {
		self.total
	}

	pub fn iter(&self) -> impl Iterator<Item = (&NGram, f64)> {
		self.grams.iter().map(|(ngram, value)| (ngram, *value))
	}

	pub fn len(&self) -> usize {
		self.grams.len()
	}

	pub fn is_empty(&self) -> bool {
		self.grams.is_empty()
	}
}

/// Tag → (word → count) emission frequencies.
///
/// Ordered maps so that weighted draws over a tag's words are reproducible
/// under a fixed seed.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct EmissionTable {
	tags: BTreeMap<String, BTreeMap<String, u64>>,
}

impl EmissionTable {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add(&mut self, tag: &str, word: &str, count: u64) {
		if count == 0 {
			return;
		}
		let words = self.tags.entry(tag.to_owned()).or_default();
		*words.entry(word.to_owned()).or_insert(0) += count;
	}

	pub fn merge(&mut self, other: &Self) {
		for (tag, words) in &other.tags {
			for (word, count) in words {
				self.add(tag, word, *count);
			}
		}
	}

	/// Words recorded against `tag`, with their counts.
	pub fn words(&self, tag: &str) -> Option<&BTreeMap<String, u64>> {
		self.tags.get(tag)
	}

	pub fn count(&self, tag: &str, word: &str) -> Option<u64> {
		self.tags.get(tag)?.get(word).copied()
	}

	/// Number of emissions recorded for `tag`.
	pub fn tag_total(&self, tag: &str) -> u64 {
		self.tags.get(tag).map(|words| words.values().sum()).unwrap_or(0)
	}

	pub fn tags(&self) -> impl Iterator<Item = &str> {
		self.tags.keys().map(String::as_str)
	}

	pub fn is_empty(&self) -> bool {
		self.tags.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::ngram::START;

	fn gram(tokens: &[&str]) -> NGram {
		tokens.iter().map(|t| t.to_string()).collect()
	}

	#[test]
	fn add_sums_and_ignores_zero() {
		let mut table = FrequencyTable::new();
		table.add(&["the"], 2);
		table.add(&["the"], 3);
		table.add(&["cat"], 0);
		assert_eq!(table.get(&gram(&["the"])), Some(5));
		assert_eq!(table.get(&gram(&["cat"])), None);
		assert_eq!(table.len(), 1);
	}

	#[test]
	fn total_skips_start_keys() {
		let mut table = FrequencyTable::new();
		table.add(&[START], 4);
		table.add(&["the"], 2);
		table.add(&["__STOP__"], 1);
		assert_eq!(table.total_without_start(), 3);
	}

	#[test]
	fn frequency_table_json_shape() {
		let mut table = FrequencyTable::new();
		table.add(&["b", "c"], 1);
		table.add(&["a"], 2);
		let json = serde_json::to_string(&table).unwrap();
		assert_eq!(json, r#"[{"ngram":["a"],"count":2},{"ngram":["b","c"],"count":1}]"#);
		let back: FrequencyTable = serde_json::from_str(&json).unwrap();
		assert_eq!(back, table);
	}

	#[test]
	fn log_table_keeps_every_entry() {
		let mut counts = CountTable::with_total(8);
		counts.add(&["the"], 4);
		counts.add(&["cat"], 1);
		let log = counts.to_log2();
		assert_eq!(log.get(&gram(&["the"])), Some(2.0));
		assert_eq!(log.get(&gram(&["cat"])), Some(0.0));
		assert_eq!(log.total(), Some(3.0));
		assert_eq!(log.len(), 2);
	}

	#[test]
	fn empty_total_has_no_log() {
		assert_eq!(CountTable::new().to_log2().total(), None);
	}

	#[test]
	fn emissions_merge_and_total() {
		let mut a = EmissionTable::new();
		a.add("DT", "the", 3);
		let mut b = EmissionTable::new();
		b.add("DT", "the", 1);
		b.add("DT", "a", 2);
		a.merge(&b);
		assert_eq!(a.count("DT", "the"), Some(4));
		assert_eq!(a.tag_total("DT"), 6);
		assert_eq!(a.tag_total("NN"), 0);
	}
}
