use thiserror::Error;

/// Errors raised at the configuration boundary of the statistics engine.
///
/// Counting and modeling are total over well-formed input, so every variant
/// here describes either a malformed parameter (order, mask) or a failure of
/// the corpus-loading collaborator.
///
/// Degenerate arithmetic (zero denominators, empty corpora) is never reported
/// through this type: the offending keys are dropped from the result instead.
#[derive(Debug, Error)]
pub enum NgramError {
	/// Requested n-gram order is less than 1.
	#[error("n-gram order must be >= 1, got {0}")]
	InvalidOrder(usize),

	/// Requested order is valid but was not built by the model.
	#[error("n-gram order {requested} is not available (model built up to {max})")]
	OrderOutOfRange { requested: usize, max: usize },

	/// A mask was applied to an n-gram of a different length.
	#[error("mask length {mask} does not match n-gram order {order}")]
	MaskLengthMismatch { mask: usize, order: usize },

	/// Two skip-gram tables built with different masks were merged.
	#[error("mask mismatch: {0} vs {1}")]
	MaskMismatch(String, String),

	/// A mask without any visible position.
	#[error("mask must contain at least one visible position")]
	EmptyMask,

	/// A character in a textual mask that is not one of `0`, `1`, `x`.
	#[error("invalid mask symbol '{0}', expected '0', '1' or 'x'")]
	InvalidMaskSymbol(char),

	/// A real token equals the placeholder literal used for masked positions.
	#[error("token '{0}' collides with the mask placeholder")]
	PlaceholderCollision(String),

	/// A collocate mask with no target slot.
	#[error("collocate mask has no target slot")]
	MissingTarget,

	/// Two tables of different order were merged.
	#[error("order mismatch: {0} vs {1}")]
	OrderMismatch(usize, usize),

	#[error("failed to read corpus: {0}")]
	Io(#[from] std::io::Error),

	#[error("failed to parse corpus CSV: {0}")]
	Csv(#[from] csv::Error),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, NgramError>;

/// Validates an n-gram order (must be >= 1).
pub(crate) fn check_order(n: usize) -> Result<usize> {
	if n < 1 {
		return Err(NgramError::InvalidOrder(n));
	}
	Ok(n)
}
