use crate::error::{check_order, Result};

/// Number of counting chunks per worker.
///
/// More chunks than workers keeps every thread busy when documents have
/// very different lengths.
pub const CHUNK_FACTOR: usize = 8;

/// Build parameters of a `CorpusModel`.
///
/// # Responsibilities
/// - Track the highest n-gram order to build (`max_order`)
/// - Track how many worker threads count documents in parallel
///
/// # Invariants
/// - `max_order` is always >= 1
/// - `workers` is always >= 1
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelConfig {
	/// Highest n-gram order built; orders 1..=max_order are all available.
	max_order: usize,

	/// Worker threads used by the counting phase.
	workers: usize,
}

impl Default for ModelConfig {
	/// Unigrams to trigrams, one worker per CPU.
	fn default() -> Self {
		Self { max_order: 3, workers: num_cpus::get().max(1) }
	}
}

impl ModelConfig {
	/// Creates a configuration building orders `1..=max_order`.
	///
	/// # Errors
	/// Returns an error if `max_order < 1`.
	pub fn new(max_order: usize) -> Result<Self> {
		Ok(Self { max_order: check_order(max_order)?, ..Self::default() })
	}

	/// Returns the highest order built.
	pub fn max_order(&self) -> usize {
		self.max_order
	}

	/// Returns the worker count.
	pub fn workers(&self) -> usize {
		self.workers
	}

	/// Sets the highest order built.
	///
	/// # Errors
	/// Returns an error if `max_order < 1`.
	pub fn set_max_order(&mut self, max_order: usize) -> Result<()> {
		self.max_order = check_order(max_order)?;
		Ok(())
	}

	/// Sets the worker count; 0 is read as 1 (sequential counting).
	pub fn set_workers(&mut self, workers: usize) {
		self.workers = workers.max(1);
	}

	/// Builder-style variant of `set_workers`.
	pub fn with_workers(mut self, workers: usize) -> Self {
		self.set_workers(workers);
		self
	}

	/// Number of counting chunks for `documents` documents.
	pub(crate) fn chunk_size(&self, documents: usize) -> usize {
		let chunks = self.workers * CHUNK_FACTOR;
		documents.div_ceil(chunks).max(1)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn order_must_be_positive() {
		assert!(ModelConfig::new(0).is_err());
		let mut config = ModelConfig::new(2).unwrap();
		assert!(config.set_max_order(0).is_err());
		assert_eq!(config.max_order(), 2);
	}

	#[test]
	fn chunks_cover_every_document() {
		let config = ModelConfig::new(1).unwrap().with_workers(2);
		assert_eq!(config.chunk_size(0), 1);
		assert_eq!(config.chunk_size(16), 1);
		assert_eq!(config.chunk_size(17), 2);
		assert_eq!(ModelConfig::new(1).unwrap().with_workers(0).workers(), 1);
	}
}
