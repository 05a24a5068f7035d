//! Masking and replacement utilities for remixing lines.
//!
//! Keywords (by tf-idf) or content words are blanked out of a line, and
//! tokens of one category in a target text can be refilled from another
//! text ("chimera" remixing).

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use rand::seq::IndexedRandom;
use rand::Rng;

use crate::tables::{top_n_keys, Rates};
use crate::token::Token;

/// Placeholder written in place of a blanked word.
pub const BLANK_TOKEN: &str = "___";

const STOPWORD_LIST: &[&str] = &[
	"a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are", "as", "at",
	"be", "because", "been", "before", "being", "below", "between", "both", "but", "by", "can", "could",
	"did", "do", "does", "doing", "down", "during", "each", "few", "for", "from", "further", "had", "has",
	"have", "having", "he", "her", "here", "hers", "herself", "him", "himself", "his", "how", "i", "if",
	"in", "into", "is", "it", "it's", "its", "itself", "just", "me", "more", "most", "my", "myself", "no",
	"nor", "not", "now", "of", "off", "on", "once", "only", "or", "other", "our", "ours", "ourselves",
	"out", "over", "own", "same", "she", "should", "so", "some", "such", "than", "that", "the", "their",
	"theirs", "them", "themselves", "then", "there", "these", "they", "this", "those", "through", "to",
	"too", "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which", "while",
	"who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself", "yourselves",
];

/// English function words.
pub static STOPWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| STOPWORD_LIST.iter().copied().collect());

pub fn is_stopword(token: &str) -> bool {
	STOPWORDS.contains(token)
}

/// Blanks every token contained in `to_mask`.
pub fn mask_tokens_if_in_set<S: AsRef<str>>(tokens: &[S], to_mask: &HashSet<String>) -> Vec<String> {
	tokens
		.iter()
		.map(|t| if to_mask.contains(t.as_ref()) { BLANK_TOKEN.to_owned() } else { t.as_ref().to_owned() })
		.collect()
}

/// Keeps stopwords, blanks everything else.
pub fn mask_content_words<S: AsRef<str>>(tokens: &[S]) -> Vec<String> {
	tokens
		.iter()
		.map(|t| if is_stopword(t.as_ref()) { t.as_ref().to_owned() } else { BLANK_TOKEN.to_owned() })
		.collect()
}

/// Blanks stopwords, keeps everything else.
pub fn mask_stopwords<S: AsRef<str>>(tokens: &[S]) -> Vec<String> {
	tokens
		.iter()
		.map(|t| if is_stopword(t.as_ref()) { BLANK_TOKEN.to_owned() } else { t.as_ref().to_owned() })
		.collect()
}

/// The `k` highest tf-idf terms of a document, stopwords removed.
pub fn keyword_set(tfidf: &Rates, k: usize) -> HashSet<String> {
	top_n_keys(tfidf, k).into_iter().filter(|term| !is_stopword(term)).collect()
}

/// Placeholder used for a masked category, e.g. `<NOUN>`.
pub fn category_placeholder(category: &str) -> String {
	format!("<{}>", category)
}

/// Replaces tokens of `category` with its placeholder, others by their text.
pub fn mask_by_category<T: Token>(doc: &[T], category: &str) -> Vec<String> {
	doc.iter()
		.map(|t| if t.category() == category { category_placeholder(category) } else { t.text().to_owned() })
		.collect()
}

/// Texts of the tokens of `category`, in order.
pub fn tokens_matching_category<T: Token>(doc: &[T], category: &str) -> Vec<String> {
	doc.iter().filter(|t| t.category() == category).map(|t| t.text().to_owned()).collect()
}

/// Distinct categories of a document, sorted.
pub fn categories_for_doc<T: Token>(doc: &[T]) -> Vec<String> {
	let mut categories: Vec<String> = doc.iter().map(|t| t.category().to_owned()).collect();
	categories.sort();
	categories.dedup();
	categories
}

/// Replaces each `mask_token` with the next source token, cycling through
/// `source` and uppercasing replacements so they stand out.
///
/// With an empty `source` the placeholders are left in place.
pub fn replace_mask_token_in_order(masked: &[String], mask_token: &str, source: &[String]) -> Vec<String> {
	let mut deck = source.iter().cycle();
	masked
		.iter()
		.map(|token| {
			if token != mask_token {
				return token.clone();
			}
			match deck.next() {
				Some(replacement) => replacement.to_uppercase(),
				None => token.clone(),
			}
		})
		.collect()
}

/// Swaps the `category` tokens of `target` for those of `source`, in order.
pub fn replace_by_category<T: Token, U: Token>(target: &[T], source: &[U], category: &str) -> Vec<String> {
	let masked = mask_by_category(target, category);
	let source_tokens = tokens_matching_category(source, category);
	replace_mask_token_in_order(&masked, &category_placeholder(category), &source_tokens)
}

/// Replaces every token whose category is in `categories` with a random
/// token of the same category from the same document (uppercased); other
/// tokens are lowercased.
pub fn replace_categories_in_doc<T: Token, R: Rng + ?Sized>(
	doc: &[T],
	categories: &HashSet<String>,
	rng: &mut R,
) -> Vec<String> {
	let mut by_category: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
	for (i, token) in doc.iter().enumerate() {
		by_category.entry(token.category()).or_default().push(i);
	}

	doc.iter()
		.map(|token| {
			if !categories.contains(token.category()) {
				return token.text().to_lowercase();
			}
			by_category
				.get(token.category())
				.and_then(|indices| indices.choose(&mut *rng))
				.map(|i| doc[*i].text().to_uppercase())
				.unwrap_or_else(|| token.text().to_lowercase())
		})
		.collect()
}

/// `replace_categories_in_doc` over every category present.
pub fn randomly_replace_all_categories<T: Token, R: Rng + ?Sized>(doc: &[T], rng: &mut R) -> Vec<String> {
	let categories: HashSet<String> = categories_for_doc(doc).into_iter().collect();
	replace_categories_in_doc(doc, &categories, rng)
}
