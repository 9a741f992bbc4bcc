//! N-gram keys, sentinel symbols and the rare-token mapping.

/// An n-gram key: an ordered tuple of tokens (or tags).
pub type NGram = Vec<String>;

/// Marks the beginning of a sentence. Repeated `order - 1` times as padding.
pub const START: &str = "__START__";

/// Marks the end of a sentence. Appended exactly once.
pub const STOP: &str = "__STOP__";

/// Canonical placeholder every infrequent token collapses into.
pub const RARE: &str = "__RARE__";

/// Returns `true` for the start and stop sentinels.
pub fn is_sentinel(token: &str) -> bool {
	token == START || token == STOP
}

/// Maps an n-gram to its rare form.
///
/// Every element except the start/stop sentinels becomes [`RARE`].
/// The mapping keeps the length and the sentinel positions, and applying it
/// to an already rare n-gram returns the same n-gram.
pub fn rare_map<S: AsRef<str>>(ngram: &[S]) -> NGram {
	ngram
		.iter()
		.map(|token| {
			let token = token.as_ref();
			if is_sentinel(token) { token.to_owned() } else { RARE.to_owned() }
		})
		.collect()
}

/// Returns `true` if the n-gram is non-empty and made only of start sentinels.
pub fn is_all_start<S: AsRef<str>>(ngram: &[S]) -> bool {
	!ngram.is_empty() && ngram.iter().all(|token| token.as_ref() == START)
}

/// The `order`-fold start key, e.g. `(__START__, __START__)` for order 2.
pub fn start_key(order: usize) -> NGram {
	vec![START.to_owned(); order]
}

/// Pads a sentence with `starts` start sentinels in front and one stop sentinel.
pub fn pad<S: AsRef<str>>(tokens: &[S], starts: usize) -> NGram {
	let mut padded = Vec::with_capacity(tokens.len() + starts + 1);
	padded.extend(start_key(starts));
	padded.extend(tokens.iter().map(|token| token.as_ref().to_owned()));
	padded.push(STOP.to_owned());
	padded
}

#[cfg(test)]
mod tests {
	use super::*;

	fn gram(tokens: &[&str]) -> NGram {
		tokens.iter().map(|t| t.to_string()).collect()
	}

	#[test]
	fn rare_map_replaces_words_and_keeps_sentinels() {
		let mapped = rare_map(&gram(&[START, "the", "cat", STOP]));
		assert_eq!(mapped, gram(&[START, RARE, RARE, STOP]));
	}

	#[test]
	fn rare_map_is_idempotent() {
		let once = rare_map(&gram(&["a", START, "b"]));
		assert_eq!(rare_map(&once), once);
	}

	#[test]
	fn rare_map_preserves_length() {
		for n in 1..=4 {
			let ngram: NGram = (0..n).map(|i| format!("w{i}")).collect();
			assert_eq!(rare_map(&ngram).len(), n);
		}
	}

	#[test]
	fn all_start_detection() {
		assert!(is_all_start(&start_key(3)));
		assert!(!is_all_start(&gram(&[START, "the"])));
		assert!(!is_all_start::<String>(&[]));
	}

	#[test]
	fn pad_adds_starts_and_one_stop() {
		assert_eq!(pad(&["the", "cat"], 2), gram(&[START, START, "the", "cat", STOP]));
		assert_eq!(pad(&["the"], 0), gram(&["the", STOP]));
	}
}
