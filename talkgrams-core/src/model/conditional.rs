use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::context::Context;
use super::ngram_counts::{join_tokens, split_key, split_ngrams_for_sequence, NGramCounts};
use crate::error::{NgramError, Result};
use crate::tables::{normalize, Rates};

/// Probability substituted for any unseen lookup.
///
/// Smaller than any probability a realistic corpus produces, so that an
/// out-of-vocabulary token drags a likelihood down without collapsing it to
/// exactly zero.
pub const OOV_PENALTY: f64 = 1e-16;

/// Conditional model of order `n`: P(last token | preceding n-1 tokens).
///
/// For `n == 1` there is no context; the model degenerates to the unigram
/// rate table, stored under the empty context key.
///
/// # Responsibilities
/// - Group an order-n count table by its first n-1 tokens
/// - Normalize each group into a distribution over the final token
/// - Score token sequences, substituting `OOV_PENALTY` for unseen pairs
///
/// # Invariants
/// - `n` is always >= 1
/// - Every context row sums to 1.0 over its observed continuations
/// - The model is never mutated after construction
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ConditionalModel {
	/// The order of the model
	n: usize,

	/// Mapping from a prefix (n-1 tokens) to its continuation row
	contexts: HashMap<String, Context>,
}

impl ConditionalModel {
	/// Builds the conditional model from an order-n count table.
	pub fn from_counts(counts: &NGramCounts) -> Self {
		let n = counts.order();
		let mut contexts: HashMap<String, Context> = HashMap::new();

		for (ngram, count) in counts.counts() {
			let tokens = split_key(ngram);
			let Some((last, prefix)) = tokens.split_last() else {
				continue;
			};
			let key = join_tokens(prefix);
			contexts
				.entry(key.clone())
				.or_insert_with(|| Context::new(&key))
				.add_continuation(last, *count);
		}

		for context in contexts.values_mut() {
			context.finalize();
		}

		Self { n, contexts }
	}

	/// The order of the model.
	pub fn order(&self) -> usize {
		self.n
	}

	/// Number of distinct contexts.
	pub fn len(&self) -> usize {
		self.contexts.len()
	}

	pub fn is_empty(&self) -> bool {
		self.contexts.is_empty()
	}

	/// The continuation row for a canonical context key.
	pub fn context(&self, context: &str) -> Option<&Context> {
		self.contexts.get(context)
	}

	/// Iterates over every context row.
	pub fn contexts(&self) -> impl Iterator<Item = &Context> {
		self.contexts.values()
	}

	/// P(next | context), `None` when the pair was never observed.
	pub fn probability(&self, context: &str, next: &str) -> Option<f64> {
		self.contexts.get(context)?.probability(next)
	}

	/// P(next | context), `OOV_PENALTY` when the pair was never observed.
	pub fn probability_or_penalty(&self, context: &str, next: &str) -> f64 {
		self.probability(context, next).unwrap_or(OOV_PENALTY)
	}

	/// Likelihood of a token sequence: the product over each order-n window
	/// of P(final | context).
	///
	/// # Notes
	/// - A sequence shorter than `n` has no window and scores 1.0.
	/// - For `n == 1` every token is scored against the unigram rates.
	pub fn likelihood<S: AsRef<str>>(&self, tokens: &[S]) -> f64 {
		split_ngrams_for_sequence(tokens, self.n)
			.map(|window| {
				let (last, prefix) = match window.split_last() {
					Some(parts) => parts,
					None => return 1.0,
				};
				self.probability_or_penalty(&join_tokens(prefix), last.as_ref())
			})
			.product()
	}

	/// Unigram rates when the model is of order 1.
	///
	/// # Errors
	/// Returns an error for models of any other order.
	pub fn unigram_rates(&self) -> Result<Rates> {
		if self.n != 1 {
			return Err(NgramError::OrderMismatch(1, self.n));
		}
		Ok(self
			.contexts
			.get("")
			.map(|ctx| normalize(ctx.continuations()))
			.unwrap_or_default())
	}
}
