use std::fmt;
use std::str::FromStr;

use super::ngram_counts::{join_tokens, split_ngrams_for_sequence};
use crate::error::{NgramError, Result};
use crate::tables::{enter_nested_item, Bound, Counts, Nested};

/// Role of one position in a collocate window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
	/// Neither recorded nor part of the key (`0`).
	Ignored,
	/// Recorded as a context token of the target (`1`).
	Context,
	/// Part of the target span (`x`).
	Target,
}

/// Window layout for collocate extraction, e.g. `110x011`.
///
/// The target span runs from the first to the last `Target` slot; its text
/// is the row key. `Context` slots are the tokens counted against it.
///
/// # Invariants
/// - At least one `Target` and one `Context` slot
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CollocateMask {
	slots: Vec<Slot>,
	target_start: usize,
	target_end: usize,
}

impl CollocateMask {
	/// Creates a mask from its slots.
	///
	/// # Errors
	/// - `MissingTarget` when no slot is a target.
	/// - `EmptyMask` when no slot is a context slot.
	pub fn new(slots: Vec<Slot>) -> Result<Self> {
		let target_start = slots.iter().position(|s| *s == Slot::Target).ok_or(NgramError::MissingTarget)?;
		let target_end = slots.iter().rposition(|s| *s == Slot::Target).unwrap_or(target_start);
		if !slots.contains(&Slot::Context) {
			return Err(NgramError::EmptyMask);
		}
		Ok(Self { slots, target_start, target_end })
	}

	/// Window width.
	pub fn len(&self) -> usize {
		self.slots.len()
	}

	pub fn is_empty(&self) -> bool {
		self.slots.is_empty()
	}

	pub fn slots(&self) -> &[Slot] {
		&self.slots
	}

	/// Inclusive bounds of the target span.
	pub fn target_span(&self) -> (usize, usize) {
		(self.target_start, self.target_end)
	}

	/// Text of the target span of a window.
	pub fn target_key<S: AsRef<str>>(&self, window: &[S]) -> String {
		join_tokens(&window[self.target_start..=self.target_end])
	}
}

impl FromStr for CollocateMask {
	type Err = NgramError;

	fn from_str(s: &str) -> Result<Self> {
		let slots = s
			.chars()
			.filter(|c| !c.is_whitespace())
			.map(|c| match c {
				'0' => Ok(Slot::Ignored),
				'1' => Ok(Slot::Context),
				'x' | 'X' => Ok(Slot::Target),
				other => Err(NgramError::InvalidMaskSymbol(other)),
			})
			.collect::<Result<Vec<Slot>>>()?;
		Self::new(slots)
	}
}

impl fmt::Display for CollocateMask {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for slot in &self.slots {
			let symbol = match slot {
				Slot::Ignored => '0',
				Slot::Context => '1',
				Slot::Target => 'x',
			};
			write!(f, "{}", symbol)?;
		}
		Ok(())
	}
}

/// Counts, for every target span, the context tokens seen around it.
///
/// Context tokens whose corpus count (`unigram_counts`) does not pass
/// `min_count` under `bound` are skipped, which keeps rare pairings from
/// blowing up the table.
pub fn build_collocates<L: AsRef<[String]>>(
	tokenized_lines: impl IntoIterator<Item = L>,
	mask: &CollocateMask,
	unigram_counts: &Counts,
	min_count: u64,
	bound: Bound,
) -> Nested<u64> {
	let mut collocates = Nested::new();
	for tokens in tokenized_lines {
		for window in split_ngrams_for_sequence(tokens.as_ref(), mask.len()) {
			let key = mask.target_key(window);
			for (slot, token) in mask.slots().iter().zip(window) {
				if *slot != Slot::Context {
					continue;
				}
				let count = unigram_counts.get(token).copied().unwrap_or(0);
				if bound.admits(count, min_count) {
					enter_nested_item(&mut collocates, &key, token, 1u64);
				}
			}
		}
	}
	collocates
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::ngram_counts::NGramCounts;
	use crate::text::tokens_for_line;

	#[test]
	fn parse_and_display() {
		let mask: CollocateMask = "1X0x1".parse().unwrap();
		assert_eq!(mask.target_span(), (1, 3));
		assert_eq!(mask.to_string(), "1x0x1");
		assert!(matches!("110".parse::<CollocateMask>(), Err(NgramError::MissingTarget)));
		assert!(matches!("0x0".parse::<CollocateMask>(), Err(NgramError::EmptyMask)));
		assert!(matches!("1?x".parse::<CollocateMask>(), Err(NgramError::InvalidMaskSymbol('?'))));
	}

	#[test]
	fn context_tokens_are_counted_per_target() {
		let lines = ["the cat sat", "the cat ran", "a cat sat"];
		let tokenized: Vec<Vec<String>> = lines.iter().map(|l| tokens_for_line(l)).collect();
		let unigrams = NGramCounts::from_lines(&lines, 1).unwrap();
		let mask: CollocateMask = "1x".parse().unwrap();

		let collocates = build_collocates(&tokenized, &mask, unigrams.counts(), 1, Bound::Inclusive);
		assert_eq!(collocates["cat"]["the"], 2);
		assert_eq!(collocates["cat"]["a"], 1);
		assert_eq!(collocates["sat"]["cat"], 2);
	}

	#[test]
	fn floor_boundary_is_configurable() {
		let lines = ["the cat sat", "the cat ran", "a cat sat"];
		let tokenized: Vec<Vec<String>> = lines.iter().map(|l| tokens_for_line(l)).collect();
		let unigrams = NGramCounts::from_lines(&lines, 1).unwrap();
		let mask: CollocateMask = "1x".parse().unwrap();

		let inclusive = build_collocates(&tokenized, &mask, unigrams.counts(), 2, Bound::Inclusive);
		assert_eq!(inclusive["cat"].get("the"), Some(&2));
		assert_eq!(inclusive["cat"].get("a"), None);

		let exclusive = build_collocates(&tokenized, &mask, unigrams.counts(), 2, Bound::Exclusive);
		assert!(exclusive["sat"].contains_key("cat"));
		assert!(!exclusive.contains_key("cat"));
	}
}
