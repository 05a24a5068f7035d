//! Top-level module for the n-gram models.
//!
//! This module provides, from the bottom up:
//! - Fixed-order n-gram counting (`NGramCounts`)
//! - Per-prefix continuation distributions (`Context`)
//! - Conditional models and likelihoods (`ConditionalModel`)
//! - Skip-gram trees and slot entropy (`SkipGramTable`)
//! - Tf-idf tables (`TfIdf`)
//! - Window collocates (`CollocateMask`)
//! - The corpus-level composition of all of the above (`CorpusModel`)

/// Fixed-order n-gram extraction and counting.
///
/// Windows are contiguous, keys are tokens joined by a single space.
pub mod ngram_counts;

/// Continuations observed after one prefix.
///
/// Tracks counts and normalized probabilities, and supports weighted
/// random sampling.
pub mod context;

/// P(final token | preceding tokens) for a fixed order.
pub mod conditional;

/// Masks, skip-grams and their filler trees.
pub mod skipgram;

/// Term frequency, document frequency and tf-idf.
pub mod tfidf;

/// Target/context collocate counting over windows.
pub mod collocates;

/// Build parameters (highest order, worker threads).
pub mod config;

/// Corpus-level model built once from documents.
///
/// Counts every order in parallel, then answers likelihood, surprise,
/// collocate and generation queries.
pub mod corpus_model;
