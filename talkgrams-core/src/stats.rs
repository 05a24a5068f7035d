//! Comparative statistics over already built tables.
//!
//! Every function here is pure: inputs are only read, and keys that would
//! produce a non-finite ratio are dropped instead of propagated.

use std::collections::HashMap;

use log::debug;

use crate::tables::{normalize, Bound, Counts, Nested, Rates, Weight};

/// `numerator[k] / baseline[k]` for every key present in both tables.
///
/// Keys found in only one table are omitted, as are keys whose baseline is
/// zero.
pub fn keywise_quotients<A: Weight, B: Weight>(
	numerator: &HashMap<String, A>,
	baseline: &HashMap<String, B>,
) -> Rates {
	let mut dropped = 0usize;
	let quotients: Rates = numerator
		.iter()
		.filter_map(|(key, value)| {
			let denominator = baseline.get(key)?.weight();
			let quotient = value.weight() / denominator;
			if denominator == 0.0 || !quotient.is_finite() {
				dropped += 1;
				return None;
			}
			Some((key.clone(), quotient))
		})
		.collect();
	if dropped > 0 {
		debug!("dropped {} keys with a degenerate baseline", dropped);
	}
	quotients
}

/// Empirical rate of a condition per key, e.g. P(laugh | ngram).
///
/// For each key of `condition_counts` whose overall count passes
/// `count_threshold`, yields `condition / overall`. Keys failing the
/// threshold, or absent from `overall_counts`, are dropped.
pub fn keywise_rates_of_condition(
	condition_counts: &Counts,
	overall_counts: &Counts,
	count_threshold: u64,
	bound: Bound,
) -> Rates {
	let common: Counts = condition_counts
		.iter()
		.filter(|(key, _)| {
			let overall = overall_counts.get(*key).copied().unwrap_or(0);
			overall > 0 && bound.admits(overall, count_threshold)
		})
		.map(|(key, count)| (key.clone(), *count))
		.collect();
	keywise_quotients(&common, overall_counts)
}

/// Rates of the n-grams seen at least `min_count` times in at least
/// `min_doc_freq` documents.
pub fn common_rates(rates: &Rates, counts: &Counts, doc_frequencies: &Counts, min_count: u64, min_doc_freq: u64) -> Rates {
	rates
		.iter()
		.filter(|(ngram, _)| {
			let count = counts.get(*ngram).copied().unwrap_or(0);
			let df = doc_frequencies.get(*ngram).copied().unwrap_or(0);
			count >= min_count && df >= min_doc_freq
		})
		.map(|(ngram, rate)| (ngram.clone(), *rate))
		.collect()
}

/// Observed-versus-predicted ratios of common n-grams.
///
/// A high `by_unigram` ratio marks an n-gram far more frequent than its
/// words taken independently predict; a high `by_bigram` ratio marks one
/// that beats even a local-context model.
#[derive(Clone, Debug, Default)]
pub struct Surprise {
	pub by_unigram: Rates,
	pub by_bigram: Rates,
}

impl Surprise {
	/// Quotients of `common` against both likelihood tables.
	pub fn new(common: &Rates, unigram_likelihoods: &Rates, bigram_likelihoods: &Rates) -> Self {
		Self {
			by_unigram: keywise_quotients(common, unigram_likelihoods),
			by_bigram: keywise_quotients(common, bigram_likelihoods),
		}
	}
}

/// Normalizes each row of a collocate table and divides it by `base_rates`.
///
/// Values above 1 mark context tokens over-represented near the target
/// relative to their corpus-wide rate.
pub fn relative_collocates(collocates: &Nested<u64>, base_rates: &Rates) -> Nested<f64> {
	collocates
		.iter()
		.map(|(target, row)| (target.clone(), keywise_quotients(&normalize(row), base_rates)))
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn table<V: Copy>(pairs: &[(&str, V)]) -> HashMap<String, V> {
		pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
	}

	#[test]
	fn quotient_keeps_intersection_only() {
		let a = table(&[("x", 2u64), ("y", 4)]);
		let b = table(&[("y", 2u64), ("z", 1)]);
		let q = keywise_quotients(&a, &b);
		assert_eq!(q.len(), 1);
		assert_eq!(q["y"], 2.0);
	}

	#[test]
	fn zero_baseline_is_dropped() {
		let a = table(&[("x", 1.0), ("y", 3.0)]);
		let b = table(&[("x", 0.0), ("y", 1.5)]);
		let q = keywise_quotients(&a, &b);
		assert!(!q.contains_key("x"));
		assert_eq!(q["y"], 2.0);
	}

	#[test]
	fn condition_rate_respects_threshold() {
		let laughs = table(&[("you know", 3u64), ("so", 1), ("ghost", 2)]);
		let overall = table(&[("you know", 12u64), ("so", 2)]);
		let rates = keywise_rates_of_condition(&laughs, &overall, 5, Bound::Inclusive);
		assert_eq!(rates.len(), 1);
		assert_eq!(rates["you know"], 0.25);

		let rates = keywise_rates_of_condition(&laughs, &overall, 2, Bound::Inclusive);
		assert_eq!(rates["so"], 0.5);
		let rates = keywise_rates_of_condition(&laughs, &overall, 2, Bound::Exclusive);
		assert!(!rates.contains_key("so"));
	}

	#[test]
	fn common_rates_need_both_thresholds() {
		let rates = table(&[("a b", 0.5), ("b c", 0.3), ("c d", 0.2)]);
		let counts = table(&[("a b", 5u64), ("b c", 3), ("c d", 2)]);
		let dfs = table(&[("a b", 1u64), ("b c", 3), ("c d", 2)]);
		let common = common_rates(&rates, &counts, &dfs, 3, 2);
		assert_eq!(common.len(), 1);
		assert!(common.contains_key("b c"));
	}

	#[test]
	fn relative_collocates_compare_to_base_rate() {
		let mut collocates: Nested<u64> = Nested::new();
		collocates.insert("cat".to_string(), table(&[("the", 1u64), ("fat", 3)]));
		let base = table(&[("the", 0.5), ("fat", 0.25)]);
		let relative = relative_collocates(&collocates, &base);
		assert_eq!(relative["cat"]["the"], 0.5);
		assert_eq!(relative["cat"]["fat"], 3.0);
	}
}
