use tracing::debug;

use super::count_table::{CountTable, EmissionTable, LogTable};
use super::ngram::{rare_map, RARE};

/// The two log2 tables a trained model keeps.
#[derive(Clone, Debug)]
pub struct SmoothedTables {
	/// Aggregate counts, untouched apart from the log conversion.
	pub raw: LogTable,
	/// Aggregate counts with infrequent keys folded into rare keys.
	pub rare: LogTable,
}

/// Builds a new table where every entry seen `threshold` times or fewer is
/// moved onto its rare-mapped key.
///
/// The unigram total is carried over unchanged.
pub fn collapse_rare(table: &CountTable, threshold: u64) -> CountTable {
	let mut rare = CountTable::with_total(table.total());
	let mut collapsed = 0usize;

	for (ngram, count) in table.iter() {
		if count <= threshold {
			rare.add(&rare_map(ngram), count);
			collapsed += 1;
		} else {
			rare.add(ngram, count);
		}
	}

	debug!(threshold, entries = table.len(), collapsed, remaining = rare.len(), "collapsed rare n-grams");
	rare
}

/// Per tag, folds words emitted `threshold` times or fewer into [`RARE`].
pub fn collapse_rare_emissions(table: &EmissionTable, threshold: u64) -> EmissionTable {
	let mut rare = EmissionTable::new();
	for tag in table.tags() {
		if let Some(words) = table.words(tag) {
			for (word, count) in words {
				let word = if *count <= threshold { RARE } else { word.as_str() };
				rare.add(tag, word, *count);
			}
		}
	}
	rare
}

/// Rare-collapses `table` and converts both generations to log2.
pub fn smooth(table: &CountTable, threshold: u64) -> SmoothedTables {
	SmoothedTables {
		raw: table.to_log2(),
		rare: collapse_rare(table, threshold).to_log2(),
	}
}
