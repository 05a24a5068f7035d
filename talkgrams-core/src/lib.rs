//! N-gram statistics over a corpus of talk transcripts.
//!
//! This crate provides a word-level n-gram analysis toolkit including:
//! - N-gram, skip-gram and collocate counting
//! - Conditional (Markov) models and sequence likelihoods
//! - Tf-idf per document and per tag
//! - Surprise and conditional-rate statistics (e.g. what precedes laughter)
//! - Madlib helpers: masking, blank filling and category replacement
//!
//! Tables are plain `HashMap`s keyed by space-joined n-grams so they can be
//! combined freely with the helpers of `tables` and `stats`.

/// Error type shared by every fallible operation.
pub mod error;

/// Generic helpers over count and rate tables.
pub mod tables;

/// Transcript cleaning and tokenization.
pub mod text;

/// Annotated tokens (part of speech, dependency) and the `Token` trait.
pub mod token;

/// Documents and per-corpus line selection.
pub mod corpus;

/// Corpus loading (CSV pair or folder of text files).
pub mod io;

/// Comparative statistics: quotients, condition rates, surprise.
pub mod stats;

/// Masking, blank filling and category swapping.
pub mod madlibs;

/// N-gram models, from raw counts up to the corpus-level model.
pub mod model;

pub use corpus::Document;
pub use error::{NgramError, Result};
pub use model::collocates::CollocateMask;
pub use model::config::ModelConfig;
pub use model::corpus_model::CorpusModel;
pub use model::skipgram::{Mask, SkipGramTable};
pub use tables::Bound;
