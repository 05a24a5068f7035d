use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use super::ngram_counts::NGramCounts;
use crate::error::{check_order, Result};
use crate::tables::{enter_item, top_n_keys, Counts, Rates};

/// Inverse document frequency `-ln(df / total_docs)`.
///
/// Returns `None` for an empty corpus or a term that appears nowhere.
pub fn inverse_document_frequency(doc_frequency: u64, total_docs: usize) -> Option<f64> {
	if total_docs == 0 || doc_frequency == 0 {
		return None;
	}
	// ln(N / df) rather than -ln(df / N) so a term in every document is +0.0
	Some((total_docs as f64 / doc_frequency as f64).ln())
}

/// Number of documents each key appears in at least once.
pub fn document_frequencies(term_frequencies: &[Counts]) -> Counts {
	let mut doc_frequencies = Counts::new();
	for document in term_frequencies {
		for term in document.keys() {
			enter_item(&mut doc_frequencies, term.clone(), 1u64);
		}
	}
	doc_frequencies
}

/// Per-document order-n term frequencies.
pub fn term_frequencies<D: AsRef<[String]>>(lines_by_doc: &[D], n: usize) -> Result<Vec<Counts>> {
	lines_by_doc
		.iter()
		.map(|lines| NGramCounts::from_lines(lines.as_ref(), n).map(NGramCounts::into_counts))
		.collect()
}

/// Term frequency, document frequency and tf-idf tables of one order.
///
/// # Responsibilities
/// - Keep raw per-document term frequencies
/// - Count, for each term, the documents containing it
/// - Weight each document's terms by `tf * -ln(df / total_docs)`
///
/// # Invariants
/// - `term_frequencies` and `tfidfs` are parallel to the input documents
/// - A document contributes at most 1 to a term's document frequency
/// - `tfidfs` only holds terms whose document frequency meets `min_doc_freq`
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TfIdf {
	n: usize,
	min_doc_freq: u64,
	term_frequencies: Vec<Counts>,
	doc_frequencies: Counts,
	tfidfs: Vec<Rates>,
}

impl TfIdf {
	/// Computes the tables over documents given as line collections.
	///
	/// # Errors
	/// Returns an error if `n < 1`.
	pub fn from_documents<D: AsRef<[String]>>(lines_by_doc: &[D], n: usize, min_doc_freq: u64) -> Result<Self> {
		check_order(n)?;
		Ok(Self::from_term_frequencies(n, term_frequencies(lines_by_doc, n)?, min_doc_freq))
	}

	/// Computes the tables from already counted per-document frequencies.
	///
	/// # Notes
	/// - With zero documents every table is empty.
	pub fn from_term_frequencies(n: usize, term_frequencies: Vec<Counts>, min_doc_freq: u64) -> Self {
		let total_docs = term_frequencies.len();
		if total_docs == 0 {
			debug!("tf-idf over an empty corpus, nothing to weight");
		}
		let doc_frequencies = document_frequencies(&term_frequencies);

		let tfidfs = term_frequencies
			.iter()
			.map(|document| {
				document
					.iter()
					.filter_map(|(term, tf)| {
						let df = doc_frequencies.get(term).copied().unwrap_or(0);
						if df < min_doc_freq {
							return None;
						}
						let idf = inverse_document_frequency(df, total_docs)?;
						Some((term.clone(), *tf as f64 * idf))
					})
					.collect()
			})
			.collect();

		Self { n, min_doc_freq, term_frequencies, doc_frequencies, tfidfs }
	}

	/// The n-gram order of the tables.
	pub fn order(&self) -> usize {
		self.n
	}

	/// The document-frequency cutoff applied to `tfidfs`.
	pub fn min_doc_freq(&self) -> u64 {
		self.min_doc_freq
	}

	/// Number of documents.
	pub fn total_docs(&self) -> usize {
		self.term_frequencies.len()
	}

	/// Raw per-document term frequencies.
	pub fn term_frequencies(&self) -> &[Counts] {
		&self.term_frequencies
	}

	/// Document frequency of every term.
	pub fn doc_frequencies(&self) -> &Counts {
		&self.doc_frequencies
	}

	/// Document frequency of `term`, zero when unseen.
	pub fn doc_frequency(&self, term: &str) -> u64 {
		self.doc_frequencies.get(term).copied().unwrap_or(0)
	}

	/// Per-document tf-idf tables.
	pub fn tfidfs(&self) -> &[Rates] {
		&self.tfidfs
	}

	/// Tf-idf table of one document.
	pub fn tfidf(&self, document: usize) -> Option<&Rates> {
		self.tfidfs.get(document)
	}

	/// The `k` highest weighted terms of one document.
	pub fn keywords(&self, document: usize, k: usize) -> Vec<String> {
		self.tfidf(document).map(|weights| top_n_keys(weights, k)).unwrap_or_default()
	}
}

/// Tf-idf where each named group is one document.
///
/// Used to find terms specific to a tag when every talk carrying the tag
/// is pooled into one document.
pub fn tf_idf_by_group(groups: Vec<(String, Counts)>, n: usize, min_doc_freq: u64) -> HashMap<String, Rates> {
	let (names, counts): (Vec<String>, Vec<Counts>) = groups.into_iter().unzip();
	let tables = TfIdf::from_term_frequencies(n, counts, min_doc_freq);
	names.into_iter().zip(tables.tfidfs).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn docs(raw: &[&[&str]]) -> Vec<Vec<String>> {
		raw.iter().map(|lines| lines.iter().map(|l| l.to_string()).collect()).collect()
	}

	#[test]
	fn doc_frequency_counts_documents_not_occurrences() {
		let corpus = docs(&[&["hello hello", "hello world"], &["hello there"], &["general kenobi"]]);
		let tables = TfIdf::from_documents(&corpus, 1, 1).unwrap();
		assert_eq!(tables.doc_frequency("hello"), 2);
		assert_eq!(tables.term_frequencies()[0]["hello"], 3);
	}

	#[test]
	fn threshold_keeps_shared_terms_only() {
		let corpus = docs(&[&["hello world"], &["hello there"], &["general kenobi"]]);
		let tables = TfIdf::from_documents(&corpus, 1, 2).unwrap();
		assert!(tables.tfidf(0).unwrap().contains_key("hello"));
		assert!(tables.tfidf(1).unwrap().contains_key("hello"));
		assert!(!tables.tfidf(0).unwrap().contains_key("world"));
		assert!(tables.tfidf(2).unwrap().is_empty());
		let expected = (3f64 / 2f64).ln();
		assert!((tables.tfidf(0).unwrap()["hello"] - expected).abs() < 1e-12);
	}

	#[test]
	fn term_in_every_document_weighs_zero() {
		let corpus = docs(&[&["the the the cat"], &["the dog"], &["the end"]]);
		let tables = TfIdf::from_documents(&corpus, 1, 1).unwrap();
		assert_eq!(tables.tfidf(0).unwrap()["the"], 0.0);
		assert!((tables.tfidf(0).unwrap()["cat"] - 3f64.ln()).abs() < 1e-12);
		assert_eq!(tables.keywords(0, 1), vec!["cat"]);
	}

	#[test]
	fn empty_corpus_yields_empty_tables() {
		let corpus: Vec<Vec<String>> = Vec::new();
		let tables = TfIdf::from_documents(&corpus, 2, 1).unwrap();
		assert_eq!(tables.total_docs(), 0);
		assert!(tables.tfidfs().is_empty());
		assert_eq!(inverse_document_frequency(1, 0), None);
	}

	#[test]
	fn groups_act_as_documents() {
		let mut science = Counts::new();
		science.insert("atom".to_string(), 4);
		science.insert("idea".to_string(), 1);
		let mut art = Counts::new();
		art.insert("idea".to_string(), 2);
		let weights = tf_idf_by_group(vec![("science".into(), science), ("art".into(), art)], 1, 1);
		assert!((weights["science"]["atom"] - 4.0 * 2f64.ln()).abs() < 1e-12);
		assert_eq!(weights["art"]["idea"], 0.0);
	}
}
