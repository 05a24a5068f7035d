use serde::{Deserialize, Serialize};

use crate::error::{check_order, NgramError, Result};
use crate::tables::{enter_item, merge_counts, Counts};
use crate::text::tokens_for_line;

/// Separator used to canonicalize a token window into a table key.
pub const SEPARATOR: &str = " ";

/// Every contiguous window of `n` tokens, left to right.
///
/// A sequence shorter than `n` produces no window; a sequence of exactly `n`
/// tokens produces one.
pub fn split_ngrams_for_sequence<T>(tokens: &[T], n: usize) -> impl Iterator<Item = &[T]> {
	// `windows` panics on a zero width, make order 0 produce nothing instead
	let width = if n == 0 { tokens.len() + 1 } else { n };
	tokens.windows(width)
}

/// Canonical keys of every window of `n` tokens.
pub fn ngrams_for_sequence<S: AsRef<str>>(tokens: &[S], n: usize) -> Vec<String> {
	split_ngrams_for_sequence(tokens, n).map(join_tokens).collect()
}

/// Canonical keys of every window of `n` tokens in a raw line.
pub fn ngrams_for_line(line: &str, n: usize) -> Vec<String> {
	ngrams_for_sequence(&tokens_for_line(line), n)
}

/// Joins tokens into a canonical n-gram key.
pub fn join_tokens<S: AsRef<str>>(tokens: &[S]) -> String {
	tokens.iter().map(AsRef::as_ref).collect::<Vec<&str>>().join(SEPARATOR)
}

/// Splits a canonical key back into tokens.
pub fn split_key(key: &str) -> Vec<&str> {
	key.split(SEPARATOR).filter(|t| !t.is_empty()).collect()
}

/// Occurrence counts of contiguous n-grams of one fixed order.
///
/// # Responsibilities
/// - Count every window of width `n` of each line added
/// - Merge with another table of the same order (parallel counting support)
///
/// # Invariants
/// - `n` is always >= 1
/// - A count equals the number of windows in the added lines that
///   canonicalize to its key; windows never span two lines
/// - Counts are additive: merging two tables equals counting both line sets
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NGramCounts {
	/// The order of the table (number of tokens per key)
	n: usize,

	/// Mapping from a canonical n-gram to its occurrence count
	counts: Counts,
}

impl NGramCounts {
	/// Creates an empty table of order `n`.
	///
	/// # Errors
	/// Returns an error if `n < 1`.
	pub fn new(n: usize) -> Result<Self> {
		Ok(Self { n: check_order(n)?, counts: Counts::new() })
	}

	/// Counts the n-grams of every line in `lines`.
	pub fn from_lines<S: AsRef<str>>(lines: &[S], n: usize) -> Result<Self> {
		let mut table = Self::new(n)?;
		for line in lines {
			table.add_line(line.as_ref());
		}
		Ok(table)
	}

	/// The order of the table.
	pub fn order(&self) -> usize {
		self.n
	}

	/// Adds the windows of a raw line (tokenized and lowercased first).
	pub fn add_line(&mut self, line: &str) {
		self.add_tokens(&tokens_for_line(line));
	}

	/// Adds the windows of an already tokenized line.
	///
	/// # Notes
	/// - Lines shorter than `n` contribute nothing.
	pub fn add_tokens<S: AsRef<str>>(&mut self, tokens: &[S]) {
		for window in split_ngrams_for_sequence(tokens, self.n) {
			enter_item(&mut self.counts, join_tokens(window), 1u64);
		}
	}

	/// Occurrence count of `ngram`, zero when unseen.
	pub fn get(&self, ngram: &str) -> u64 {
		self.counts.get(ngram).copied().unwrap_or(0)
	}

	/// The underlying key -> count table.
	pub fn counts(&self) -> &Counts {
		&self.counts
	}

	/// Consumes the table, returning the key -> count map.
	pub fn into_counts(self) -> Counts {
		self.counts
	}

	/// Sum of all counts (number of windows seen).
	pub fn total(&self) -> u64 {
		self.counts.values().sum()
	}

	/// Number of distinct n-grams.
	pub fn len(&self) -> usize {
		self.counts.len()
	}

	pub fn is_empty(&self) -> bool {
		self.counts.is_empty()
	}

	/// Merges another table into this one.
	///
	/// # Notes
	/// - Both tables must have the same order `n`.
	/// - Counts for matching keys are summed.
	///
	/// # Errors
	/// Returns an error if the orders do not match.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.n != other.n {
			return Err(NgramError::OrderMismatch(self.n, other.n));
		}
		merge_counts(&mut self.counts, &other.counts);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn window_at_exact_length_is_counted() {
		assert_eq!(ngrams_for_line("a b c", 3), vec!["a b c"]);
		assert!(ngrams_for_line("a b", 3).is_empty());
		assert_eq!(ngrams_for_line("a b c", 2), vec!["a b", "b c"]);
	}

	#[test]
	fn order_zero_is_rejected() {
		assert!(matches!(NGramCounts::new(0), Err(NgramError::InvalidOrder(0))));
	}

	#[test]
	fn windows_do_not_cross_lines() {
		let table = NGramCounts::from_lines(&["the cat", "sat down"], 2).unwrap();
		assert_eq!(table.get("the cat"), 1);
		assert_eq!(table.get("cat sat"), 0);
		assert_eq!(table.total(), 2);
	}

	#[test]
	fn counts_are_additive_across_partitions() {
		let lines = ["The cat sat", "the cat ran", "a dog sat on the cat", "cat"];
		for n in 1..=3 {
			let whole = NGramCounts::from_lines(&lines, n).unwrap();
			let mut left = NGramCounts::from_lines(&lines[..1], n).unwrap();
			let right = NGramCounts::from_lines(&lines[1..], n).unwrap();
			left.merge(&right).unwrap();
			assert_eq!(left, whole);
		}
	}

	#[test]
	fn merging_different_orders_fails() {
		let mut a = NGramCounts::new(1).unwrap();
		let b = NGramCounts::new(2).unwrap();
		assert!(matches!(a.merge(&b), Err(NgramError::OrderMismatch(1, 2))));
	}
}
