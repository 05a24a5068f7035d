use std::collections::HashSet;

use crate::tables::{enter_item, ranked, Counts};
use crate::text::{applause_lines, laugh_lines};

/// One talk: its cleaned lines plus metadata.
///
/// Lines are kept as produced by cleaning (original case, reaction markers
/// included); tokenization happens when a model is built.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
	pub title: String,
	pub tags: HashSet<String>,
	pub lines: Vec<String>,
}

impl Document {
	pub fn new(title: &str, lines: Vec<String>) -> Self {
		Self { title: title.to_owned(), tags: HashSet::new(), lines }
	}

	/// Adds tags, builder style.
	pub fn with_tags<I, S>(mut self, tags: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.tags.extend(tags.into_iter().map(Into::into));
		self
	}

	pub fn has_tag(&self, tag: &str) -> bool {
		self.tags.contains(tag)
	}

	/// Lines immediately followed by a laughter marker.
	pub fn laugh_lines(&self) -> Vec<String> {
		laugh_lines(&self.lines)
	}

	/// Lines immediately followed by an applause marker.
	pub fn applause_lines(&self) -> Vec<String> {
		applause_lines(&self.lines)
	}
}

impl AsRef<[String]> for Document {
	fn as_ref(&self) -> &[String] {
		&self.lines
	}
}

/// Laugh lines of every document, flattened in corpus order.
pub fn corpus_laugh_lines(documents: &[Document]) -> Vec<String> {
	documents.iter().flat_map(Document::laugh_lines).collect()
}

/// Applause lines of every document, flattened in corpus order.
pub fn corpus_applause_lines(documents: &[Document]) -> Vec<String> {
	documents.iter().flat_map(Document::applause_lines).collect()
}

/// Tags used by at least one document, sorted by descending usage.
///
/// Ties keep alphabetical order.
pub fn tag_counts(documents: &[Document]) -> Vec<(String, u64)> {
	let mut counts = Counts::new();
	for document in documents {
		for tag in &document.tags {
			enter_item(&mut counts, tag.clone(), 1u64);
		}
	}
	ranked(&counts)
}
