use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ngram_counts::{join_tokens, split_key, split_ngrams_for_sequence, NGramCounts};
use crate::error::{NgramError, Result};
use crate::tables::{entropy, enter_nested_item, merge_nested, top_n, Bound, Counts, Nested, Rates};
use crate::text::tokens_for_line;

/// Placeholder written in place of a masked token.
pub const MASK_TOKEN: &str = "____";

/// Visibility mask over an n-gram window.
///
/// `true` keeps the token at that position, `false` replaces it with
/// `MASK_TOKEN`. The whole window is kept in the key, placeholders included,
/// so a masked key can be turned back into its mask.
///
/// # Invariants
/// - Length is the n-gram order the mask applies to (>= 1)
/// - At least one position is visible
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Mask(Vec<bool>);

impl Mask {
	/// Creates a mask from per-position visibility.
	///
	/// # Errors
	/// Returns `EmptyMask` when no position is visible.
	pub fn new(visible: Vec<bool>) -> Result<Self> {
		if !visible.iter().any(|v| *v) {
			return Err(NgramError::EmptyMask);
		}
		Ok(Self(visible))
	}

	/// Recovers the mask of a masked key by placeholder detection.
	pub fn for_skipgram(skipgram: &str) -> Result<Self> {
		Self::new(split_key(skipgram).iter().map(|t| *t != MASK_TOKEN).collect())
	}

	/// The n-gram order this mask applies to.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Per-position visibility.
	pub fn as_slice(&self) -> &[bool] {
		&self.0
	}

	/// First and last visible positions (inclusive).
	pub fn visible_span(&self) -> (usize, usize) {
		let first = self.0.iter().position(|v| *v).unwrap_or(0);
		let last = self.0.iter().rposition(|v| *v).unwrap_or(first);
		(first, last)
	}

	/// Masks a tokenized window.
	///
	/// # Errors
	/// - `MaskLengthMismatch` if the window length differs from the mask.
	/// - `PlaceholderCollision` if a real token equals `MASK_TOKEN`.
	pub fn apply_tokens<S: AsRef<str>>(&self, tokens: &[S]) -> Result<String> {
		if tokens.len() != self.0.len() {
			return Err(NgramError::MaskLengthMismatch { mask: self.0.len(), order: tokens.len() });
		}
		let masked: Vec<&str> = tokens
			.iter()
			.zip(&self.0)
			.map(|(token, visible)| {
				let token = token.as_ref();
				if token == MASK_TOKEN {
					Err(NgramError::PlaceholderCollision(token.to_owned()))
				} else if *visible {
					Ok(token)
				} else {
					Ok(MASK_TOKEN)
				}
			})
			.collect::<Result<_>>()?;
		Ok(join_tokens(&masked))
	}

	/// Masks a canonical n-gram key.
	pub fn apply(&self, ngram: &str) -> Result<String> {
		self.apply_tokens(&split_key(ngram))
	}
}

impl FromStr for Mask {
	type Err = NgramError;

	/// Parses `1` (visible) / `0` (masked) symbols, e.g. `101`.
	fn from_str(s: &str) -> Result<Self> {
		let visible = s
			.chars()
			.filter(|c| !c.is_whitespace())
			.map(|c| match c {
				'1' => Ok(true),
				'0' => Ok(false),
				other => Err(NgramError::InvalidMaskSymbol(other)),
			})
			.collect::<Result<Vec<bool>>>()?;
		Self::new(visible)
	}
}

impl fmt::Display for Mask {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for visible in &self.0 {
			write!(f, "{}", if *visible { '1' } else { '0' })?;
		}
		Ok(())
	}
}

/// Masks `ngram` with `mask`.
pub fn apply_mask_to_ngram(mask: &Mask, ngram: &str) -> Result<String> {
	mask.apply(ngram)
}

/// Recovers the mask that produced `skipgram`.
pub fn mask_for_skipgram(skipgram: &str) -> Result<Mask> {
	Mask::for_skipgram(skipgram)
}

/// Entries of a table keyed by concrete n-grams that `skipgram` covers.
///
/// Keys of another length, or containing the placeholder, never match.
pub fn entries_matching_skipgram<V: Clone>(
	table: &HashMap<String, V>,
	skipgram: &str,
) -> Result<HashMap<String, V>> {
	let mask = Mask::for_skipgram(skipgram)?;
	Ok(table
		.iter()
		.filter(|(key, _)| mask.apply(key).is_ok_and(|masked| masked == skipgram))
		.map(|(key, value)| (key.clone(), value.clone()))
		.collect())
}

/// Entries of a table keyed by masked keys whose re-derived mask is `mask`.
///
/// Works on flat tables and on the outer level of two-level tables.
pub fn entries_matching_mask<V: Clone>(table: &HashMap<String, V>, mask: &Mask) -> HashMap<String, V> {
	table
		.iter()
		.filter(|(key, _)| Mask::for_skipgram(key).is_ok_and(|m| m == *mask))
		.map(|(key, value)| (key.clone(), value.clone()))
		.collect()
}

/// What a skip-gram slot looks like at one window of a line.
#[derive(Clone, Debug, PartialEq)]
pub struct SlotReport {
	/// The masked key of the window.
	pub skipgram: String,
	/// Entropy of the slot fillers, `None` if the skip-gram is not common.
	pub entropy: Option<f64>,
	/// Most frequent fillers, masked positions only.
	pub fillers: Vec<String>,
}

/// Skip-gram tree: masked key -> (original n-gram -> count).
///
/// # Responsibilities
/// - Count masked windows of each line added
/// - Answer "which concrete n-grams fill this pattern"
/// - Measure how open a slot is (filler entropy)
///
/// # Invariants
/// - Every key was produced by `mask`
/// - The sum under a masked key equals its total occurrences
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SkipGramTable {
	mask: Mask,
	tree: Nested<u64>,
}

impl SkipGramTable {
	/// Creates an empty tree for `mask`.
	pub fn new(mask: Mask) -> Self {
		Self { mask, tree: Nested::new() }
	}

	/// Counts every masked window of `lines`.
	pub fn from_lines<S: AsRef<str>>(mask: Mask, lines: &[S]) -> Result<Self> {
		let mut table = Self::new(mask);
		for line in lines {
			table.add_line(line.as_ref())?;
		}
		Ok(table)
	}

	/// Builds the tree from an existing count table of the mask's order.
	///
	/// # Errors
	/// Returns `MaskLengthMismatch` if the orders differ.
	pub fn from_counts(mask: Mask, counts: &NGramCounts) -> Result<Self> {
		if counts.order() != mask.len() {
			return Err(NgramError::MaskLengthMismatch { mask: mask.len(), order: counts.order() });
		}
		let mut table = Self::new(mask);
		for (ngram, count) in counts.counts() {
			let skipgram = table.mask.apply(ngram)?;
			enter_nested_item(&mut table.tree, &skipgram, ngram, *count);
		}
		Ok(table)
	}

	/// Adds the masked windows of a raw line.
	///
	/// # Errors
	/// Returns `PlaceholderCollision` if a token equals `MASK_TOKEN`; the
	/// table is left unchanged in that case.
	pub fn add_line(&mut self, line: &str) -> Result<()> {
		self.add_tokens(&tokens_for_line(line))
	}

	/// Adds the masked windows of an already tokenized line.
	pub fn add_tokens<S: AsRef<str>>(&mut self, tokens: &[S]) -> Result<()> {
		let mut entries = Vec::new();
		for window in split_ngrams_for_sequence(tokens, self.mask.len()) {
			entries.push((self.mask.apply_tokens(window)?, join_tokens(window)));
		}
		for (skipgram, ngram) in entries {
			enter_nested_item(&mut self.tree, &skipgram, &ngram, 1);
		}
		Ok(())
	}

	/// The mask the tree was built with.
	pub fn mask(&self) -> &Mask {
		&self.mask
	}

	/// The full two-level table.
	pub fn tree(&self) -> &Nested<u64> {
		&self.tree
	}

	/// Concrete n-grams observed under `skipgram`.
	pub fn fillers(&self, skipgram: &str) -> Option<&Counts> {
		self.tree.get(skipgram)
	}

	/// Total occurrences of `skipgram`.
	pub fn total(&self, skipgram: &str) -> u64 {
		self.tree.get(skipgram).map(|row| row.values().sum()).unwrap_or(0)
	}

	/// Flat skip-gram counts (each row collapsed to its total).
	pub fn skipgram_counts(&self) -> Counts {
		self.tree
			.iter()
			.map(|(skipgram, row)| (skipgram.clone(), row.values().sum()))
			.collect()
	}

	/// Merges a tree built with the same mask.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.mask != other.mask {
			return Err(NgramError::MaskMismatch(self.mask.to_string(), other.mask.to_string()));
		}
		merge_nested(&mut self.tree, &other.tree);
		Ok(())
	}

	/// Entropy of the `top_k` most frequent fillers of each skip-gram whose
	/// total count passes `min_count`.
	///
	/// A low value marks a near-fixed slot, a high one an open slot.
	pub fn slot_entropies(&self, min_count: u64, bound: Bound, top_k: usize) -> Rates {
		self.tree
			.iter()
			.filter(|(_, row)| bound.admits(row.values().sum::<u64>(), min_count))
			.map(|(skipgram, row)| {
				let head: Counts = top_n(row, top_k).into_iter().collect();
				(skipgram.clone(), entropy(&head))
			})
			.collect()
	}

	/// Per-window slot report for one line.
	pub fn slot_report(&self, line: &str, entropies: &Rates, top_k: usize) -> Result<Vec<SlotReport>> {
		let tokens = tokens_for_line(line);
		let mut reports = Vec::new();
		for window in split_ngrams_for_sequence(&tokens, self.mask.len()) {
			let skipgram = self.mask.apply_tokens(window)?;
			let fillers = self
				.fillers(&skipgram)
				.map(|row| {
					top_n(row, top_k)
						.into_iter()
						.map(|(ngram, _)| self.masked_part(&ngram))
						.collect()
				})
				.unwrap_or_default();
			reports.push(SlotReport {
				entropy: entropies.get(&skipgram).copied(),
				skipgram,
				fillers,
			});
		}
		Ok(reports)
	}

	/// Tokens of `ngram` that sit at masked positions.
	fn masked_part(&self, ngram: &str) -> String {
		let hidden: Vec<&str> = split_key(ngram)
			.into_iter()
			.zip(self.mask.as_slice())
			.filter(|(_, visible)| !**visible)
			.map(|(token, _)| token)
			.collect();
		join_tokens(&hidden)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn mask(s: &str) -> Mask {
		s.parse().unwrap()
	}

	#[test]
	fn masked_key_keeps_placeholders() {
		assert_eq!(apply_mask_to_ngram(&mask("101"), "red fox jumps").unwrap(), "red ____ jumps");
		assert_eq!(mask("101").to_string(), "101");
	}

	#[test]
	fn mask_round_trips_through_key() {
		for m in ["1", "10", "01", "101", "0110", "11111", "10001"] {
			let m = mask(m);
			let ngram = (0..m.len()).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");
			let key = m.apply(&ngram).unwrap();
			assert_eq!(mask_for_skipgram(&key).unwrap(), m);
		}
	}

	#[test]
	fn visible_span_skips_hidden_edges() {
		assert_eq!(mask("0110").visible_span(), (1, 2));
		assert_eq!(mask("101").visible_span(), (0, 2));
		assert_eq!(mask("0001").visible_span(), (3, 3));
	}

	#[test]
	fn malformed_masks_are_rejected() {
		assert!(matches!("000".parse::<Mask>(), Err(NgramError::EmptyMask)));
		assert!(matches!("1x1".parse::<Mask>(), Err(NgramError::InvalidMaskSymbol('x'))));
		assert!(matches!(
			mask("101").apply("a b"),
			Err(NgramError::MaskLengthMismatch { mask: 3, order: 2 })
		));
		assert!(matches!(
			mask("11").apply("a ____"),
			Err(NgramError::PlaceholderCollision(_))
		));
	}

	#[test]
	fn skipgram_lookup_recovers_every_filler() {
		let lines = ["red fox jumps", "red dog jumps", "red fox sleeps", "big fox jumps"];
		let table = SkipGramTable::from_lines(mask("101"), &lines).unwrap();
		let fillers = table.fillers("red ____ jumps").unwrap();
		assert_eq!(fillers.len(), 2);
		assert_eq!(table.total("red ____ jumps"), 2);

		let trigrams = NGramCounts::from_lines(&lines, 3).unwrap();
		let matched = entries_matching_skipgram(trigrams.counts(), "red ____ jumps").unwrap();
		let mut keys: Vec<_> = matched.keys().cloned().collect();
		keys.sort();
		assert_eq!(keys, vec!["red dog jumps", "red fox jumps"]);
	}

	#[test]
	fn tree_totals_match_flat_counts() {
		let lines = ["a b a b a", "b a b"];
		let m = mask("10");
		let from_lines = SkipGramTable::from_lines(m.clone(), &lines).unwrap();
		let from_counts = SkipGramTable::from_counts(m, &NGramCounts::from_lines(&lines, 2).unwrap()).unwrap();
		assert_eq!(from_lines.tree(), from_counts.tree());
		assert_eq!(from_lines.skipgram_counts()["a ____"], 3);
		assert_eq!(from_lines.skipgram_counts()["b ____"], 3);
	}

	#[test]
	fn entries_matching_mask_filters_by_pattern() {
		let mut table = Counts::new();
		table.insert("a ____ c".to_string(), 1);
		table.insert("a b ____".to_string(), 2);
		let matched = entries_matching_mask(&table, &mask("101"));
		assert_eq!(matched.len(), 1);
		assert!(matched.contains_key("a ____ c"));
	}

	#[test]
	fn collision_leaves_table_untouched() {
		let mut table = SkipGramTable::new(mask("11"));
		assert!(table.add_line("x y ____").is_err());
		assert!(table.tree().is_empty());
	}

	#[test]
	fn fixed_slot_has_zero_entropy() {
		let lines = ["in the end", "in the end", "in a way", "in my view"];
		let table = SkipGramTable::from_lines(mask("101"), &lines).unwrap();
		let entropies = table.slot_entropies(1, Bound::Inclusive, 20);
		assert_eq!(entropies["in ____ end"], 0.0);
		let report = table.slot_report("in the end", &entropies, 3).unwrap();
		assert_eq!(report[0].fillers, vec!["the"]);
		assert!(table.slot_entropies(3, Bound::Inclusive, 20).is_empty());
	}
}
