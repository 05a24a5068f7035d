use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::tables::{enter_item, normalize, Counts, Rates};

/// One row of a conditional model.
///
/// A `Context` corresponds to a fixed (n-1)-token prefix (`key`) and stores
/// every token observed right after it, together with the normalized
/// distribution over those continuations.
///
/// ## Responsibilities:
/// - Accumulate continuation occurrences while counting
/// - Expose P(next | key) over observed continuations
/// - Sample the next token proportionally to its count
///
/// ## Invariants
/// - All continuations belong to the same `key`
/// - Each continuation count is strictly positive
/// - Once `finalize` has run, `probabilities` sums to 1.0
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Context {
	/// Identifier of the context (n-1 token prefix, canonical form).
	key: String,
	/// Observed continuations and their counts.
	/// Example: { "cat" => 42, "dog" => 3 }
	continuations: Counts,
	/// Normalized `continuations`, filled by `finalize`.
	probabilities: Rates,
}

impl Context {
	/// Creates a new empty context for the given prefix.
	pub fn new(key: &str) -> Self {
		Self {
			key: key.to_owned(),
			continuations: HashMap::new(),
			probabilities: HashMap::new(),
		}
	}

	/// The prefix this row conditions on.
	pub fn key(&self) -> &str {
		&self.key
	}

	/// Records `count` occurrences of `next` after this prefix.
	pub fn add_continuation(&mut self, next: &str, count: u64) {
		if count > 0 {
			enter_item(&mut self.continuations, next.to_owned(), count);
		}
	}

	/// Recomputes the normalized distribution from the counts.
	pub fn finalize(&mut self) {
		self.probabilities = normalize(&self.continuations);
	}

	/// Raw continuation counts.
	pub fn continuations(&self) -> &Counts {
		&self.continuations
	}

	/// P(next | key) over observed continuations.
	pub fn probabilities(&self) -> &Rates {
		&self.probabilities
	}

	/// P(next | key), `None` when `next` was never observed here.
	pub fn probability(&self, next: &str) -> Option<f64> {
		self.probabilities.get(next).copied()
	}

	/// The most probable continuation, ties broken by lowest key.
	pub fn most_likely(&self) -> Option<&str> {
		self.continuations
			.iter()
			.max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
			.map(|(next, _)| next.as_str())
	}

	/// Samples the next token using weighted random sampling.
	///
	/// The probability of selecting a token is proportional to its count.
	///
	/// Returns `None` if the context has no continuations.
	pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
		let total: u64 = self.continuations.values().sum();
		if total == 0 {
			return None;
		}

		// Sort for a reproducible walk given a seeded rng
		let mut entries: Vec<(&String, &u64)> = self.continuations.iter().collect();
		entries.sort_by(|a, b| a.0.cmp(b.0));

		let mut r = rng.random_range(0..total);
		for (next, occurrence) in &entries {
			if r < **occurrence {
				return Some(next.as_str());
			}
			r -= **occurrence;
		}

		entries.last().map(|(next, _)| next.as_str())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::rngs::StdRng;
	use rand::SeedableRng;

	fn context() -> Context {
		let mut ctx = Context::new("the");
		ctx.add_continuation("cat", 3);
		ctx.add_continuation("dog", 1);
		ctx.finalize();
		ctx
	}

	#[test]
	fn distribution_sums_to_one() {
		let ctx = context();
		let total: f64 = ctx.probabilities().values().sum();
		assert!((total - 1.0).abs() < 1e-9);
		assert_eq!(ctx.probability("cat"), Some(0.75));
		assert_eq!(ctx.probability("fox"), None);
		assert_eq!(ctx.most_likely(), Some("cat"));
	}

	#[test]
	fn sampling_only_returns_observed_tokens() {
		let ctx = context();
		let mut rng = StdRng::seed_from_u64(7);
		for _ in 0..50 {
			let next = ctx.sample(&mut rng).unwrap();
			assert!(next == "cat" || next == "dog");
		}
		assert_eq!(Context::new("empty").sample(&mut rng), None);
	}
}
