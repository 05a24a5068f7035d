use std::collections::{HashMap, HashSet};
use std::sync::mpsc;
use std::thread;

use log::{debug, info};
use rand::Rng;

use super::collocates::{build_collocates, CollocateMask};
use super::conditional::{ConditionalModel, OOV_PENALTY};
use super::config::ModelConfig;
use super::ngram_counts::{join_tokens, NGramCounts};
use super::skipgram::{Mask, SkipGramTable};
use super::tfidf::{tf_idf_by_group, TfIdf};
use crate::error::{check_order, NgramError, Result};
use crate::stats::{common_rates, keywise_rates_of_condition, relative_collocates, Surprise};
use crate::tables::{merge_counts, normalize, Bound, Counts, Nested, Rates};
use crate::text::tokens_for_line;

/// Tokenized corpus: documents -> lines -> tokens.
type TokenizedCorpus = Vec<Vec<Vec<String>>>;

/// Corpus-level n-gram statistics for every order up to `max_order`.
///
/// Built once from documents, then queried read-only. Tables indexed by
/// order are parallel vectors: index `i` holds order `i + 1`.
///
/// # Responsibilities
/// - Count n-grams per document and corpus-wide (in parallel)
/// - Derive rates, conditional models and tf-idf tables per order
/// - Answer likelihood, surprise, collocate and condition-rate queries
///
/// # Invariants
/// - `ng_counts`, `ng_rates`, `ng_models` and `tfidfs` all hold
///   `max_order` entries
/// - No table changes after `build` returns
#[derive(Debug)]
pub struct CorpusModel {
	max_order: usize,
	/// Tokenized lines, kept for window scans (collocates, skip-grams).
	lines_by_doc: TokenizedCorpus,
	/// Corpus-wide n-gram counts by order.
	ng_counts: Vec<NGramCounts>,
	/// Corpus-wide n-gram rates by order.
	ng_rates: Vec<Rates>,
	/// P(last token | preceding tokens) by order.
	ng_models: Vec<ConditionalModel>,
	/// Term frequency / document frequency / tf-idf by order.
	tfidfs: Vec<TfIdf>,
}

impl CorpusModel {
	/// Builds every table for orders `1..=config.max_order()`.
	///
	/// `documents` yields, per document, its lines of raw text; lines are
	/// tokenized and lowercased here.
	pub fn build<D: AsRef<[String]>>(documents: &[D], config: &ModelConfig) -> Result<Self> {
		let max_order = check_order(config.max_order())?;
		let lines_by_doc: TokenizedCorpus = documents
			.iter()
			.map(|doc| doc.as_ref().iter().map(|line| tokens_for_line(line)).collect())
			.collect();

		let mut ng_counts = Vec::with_capacity(max_order);
		let mut ng_rates = Vec::with_capacity(max_order);
		let mut ng_models = Vec::with_capacity(max_order);
		let mut tfidfs = Vec::with_capacity(max_order);

		for n in 1..=max_order {
			info!("building {}-gram models...", n);
			let per_document = Self::count_documents(&lines_by_doc, n, config)?;

			let mut counts = NGramCounts::new(n)?;
			for document in &per_document {
				counts.merge(document)?;
			}
			ng_rates.push(normalize(counts.counts()));
			ng_models.push(ConditionalModel::from_counts(&counts));
			ng_counts.push(counts);

			info!("tfidf {}-grams...", n);
			let term_frequencies = per_document.into_iter().map(NGramCounts::into_counts).collect();
			tfidfs.push(TfIdf::from_term_frequencies(n, term_frequencies, 1));
		}

		Ok(Self { max_order, lines_by_doc, ng_counts, ng_rates, ng_models, tfidfs })
	}

	/// Counts the order-n n-grams of each document on worker threads.
	///
	/// # Behavior
	/// - Splits documents into chunks (based on workers * factor).
	/// - Each thread counts its chunk and sends it back with the chunk index.
	/// - Chunks are reassembled in input order.
	///
	/// # Notes
	/// - Uses MPSC channels to collect tables from threads.
	/// - Output is identical to counting sequentially.
	fn count_documents(lines_by_doc: &[Vec<Vec<String>>], n: usize, config: &ModelConfig) -> Result<Vec<NGramCounts>> {
		if lines_by_doc.is_empty() {
			return Ok(Vec::new());
		}
		let chunk_size = config.chunk_size(lines_by_doc.len());

		let (tx, rx) = mpsc::channel();
		thread::scope(|scope| {
			for (index, chunk) in lines_by_doc.chunks(chunk_size).enumerate() {
				let tx = tx.clone();
				scope.spawn(move || {
					let partial: Result<Vec<NGramCounts>> = chunk
						.iter()
						.map(|lines| {
							let mut table = NGramCounts::new(n)?;
							for tokens in lines {
								table.add_tokens(tokens);
							}
							Ok(table)
						})
						.collect();
					// The receiver lives until every worker has joined
					let _ = tx.send((index, partial));
				});
			}
		});
		drop(tx);

		let mut partials: Vec<(usize, Result<Vec<NGramCounts>>)> = rx.iter().collect();
		partials.sort_by_key(|(index, _)| *index);

		let mut documents = Vec::with_capacity(lines_by_doc.len());
		for (_, partial) in partials {
			documents.extend(partial?);
		}
		Ok(documents)
	}

	/// Vector slot holding order `n`.
	fn slot(&self, n: usize) -> Result<usize> {
		check_order(n)?;
		if n > self.max_order {
			return Err(NgramError::OrderOutOfRange { requested: n, max: self.max_order });
		}
		Ok(n - 1)
	}

	/// Highest order built.
	pub fn max_order(&self) -> usize {
		self.max_order
	}

	/// Number of documents.
	pub fn document_count(&self) -> usize {
		self.lines_by_doc.len()
	}

	/// Every tokenized line, in corpus order.
	pub fn lines(&self) -> impl Iterator<Item = &Vec<String>> {
		self.lines_by_doc.iter().flatten()
	}

	/// Tokenized lines of one document.
	pub fn document_lines(&self, document: usize) -> Option<&[Vec<String>]> {
		self.lines_by_doc.get(document).map(Vec::as_slice)
	}

	pub fn get_ngram_counts(&self, n: usize) -> Result<&NGramCounts> {
		Ok(&self.ng_counts[self.slot(n)?])
	}

	pub fn get_ngram_rates(&self, n: usize) -> Result<&Rates> {
		Ok(&self.ng_rates[self.slot(n)?])
	}

	pub fn get_ngram_model(&self, n: usize) -> Result<&ConditionalModel> {
		Ok(&self.ng_models[self.slot(n)?])
	}

	pub fn get_tfidf(&self, n: usize) -> Result<&TfIdf> {
		Ok(&self.tfidfs[self.slot(n)?])
	}

	/// Unigram rate table.
	pub fn unigram_rates(&self) -> &Rates {
		&self.ng_rates[0]
	}

	/// Unigram count table.
	pub fn unigram_counts(&self) -> &Counts {
		self.ng_counts[0].counts()
	}

	/// Product of the unigram rates of each token; `OOV_PENALTY` for a token
	/// never seen.
	pub fn unigram_likelihood(&self, line: &str) -> f64 {
		let rates = self.unigram_rates();
		tokens_for_line(line)
			.iter()
			.map(|token| rates.get(token).copied().unwrap_or(OOV_PENALTY))
			.product()
	}

	/// Product over each order-n window of P(final | context).
	pub fn ngram_likelihood(&self, line: &str, n: usize) -> Result<f64> {
		Ok(self.get_ngram_model(n)?.likelihood(&tokens_for_line(line)))
	}

	/// P(first token) times P(next | previous) over each bigram window.
	///
	/// # Errors
	/// Returns an error if bigrams were not built.
	pub fn bigram_likelihood(&self, line: &str) -> Result<f64> {
		let model = self.get_ngram_model(2)?;
		let tokens = tokens_for_line(line);
		let Some(first) = tokens.first() else {
			return Ok(1.0);
		};
		Ok(self.unigram_likelihood(first) * model.likelihood(&tokens))
	}

	/// Surprise ratios of the order-n n-grams seen at least `min_count` times
	/// in at least `min_doc_freq` documents.
	pub fn ngrams_by_unigram_and_bigram_surprise(&self, n: usize, min_count: u64, min_doc_freq: u64) -> Result<Surprise> {
		let counts = self.get_ngram_counts(n)?;
		let rates = self.get_ngram_rates(n)?;
		let doc_frequencies = self.get_tfidf(n)?.doc_frequencies();

		let common = common_rates(rates, counts.counts(), doc_frequencies, min_count, min_doc_freq);
		debug!("{} common {}-grams", common.len(), n);

		let by_unigram_likelihood: Rates = common
			.keys()
			.map(|ngram| (ngram.clone(), self.unigram_likelihood(ngram)))
			.collect();
		let by_bigram_likelihood = common
			.keys()
			.map(|ngram| Ok((ngram.clone(), self.bigram_likelihood(ngram)?)))
			.collect::<Result<Rates>>()?;

		Ok(Surprise::new(&common, &by_unigram_likelihood, &by_bigram_likelihood))
	}

	/// Target span -> context token -> co-occurrence count, over every
	/// window of the corpus.
	///
	/// Context tokens whose corpus count does not pass `min_count` under
	/// `bound` are skipped.
	pub fn build_collocates_from_mask(&self, mask: &CollocateMask, min_count: u64, bound: Bound) -> Nested<u64> {
		build_collocates(self.lines(), mask, self.unigram_counts(), min_count, bound)
	}

	/// Collocates normalized per target and divided by unigram rates.
	pub fn relative_collocates(&self, mask: &CollocateMask, min_count: u64, bound: Bound) -> Nested<f64> {
		relative_collocates(&self.build_collocates_from_mask(mask, min_count, bound), self.unigram_rates())
	}

	/// Skip-gram tree for `mask` over the whole corpus.
	///
	/// Reuses the built counts when the mask's order was built, otherwise
	/// scans the lines.
	pub fn skipgram_tree(&self, mask: &Mask) -> Result<SkipGramTable> {
		if let Ok(counts) = self.get_ngram_counts(mask.len()) {
			return SkipGramTable::from_counts(mask.clone(), counts);
		}
		let mut table = SkipGramTable::new(mask.clone());
		for tokens in self.lines() {
			table.add_tokens(tokens)?;
		}
		Ok(table)
	}

	/// Rate of a condition (e.g. laughter following the line) per order-n
	/// n-gram: condition count over corpus count, for n-grams whose corpus
	/// count passes `count_threshold`.
	pub fn condition_rates<S: AsRef<str>>(
		&self,
		condition_lines: &[S],
		n: usize,
		count_threshold: u64,
		bound: Bound,
	) -> Result<Rates> {
		let condition_counts = NGramCounts::from_lines(condition_lines, n)?;
		let overall = self.get_ngram_counts(n)?;
		Ok(keywise_rates_of_condition(condition_counts.counts(), overall.counts(), count_threshold, bound))
	}

	/// Tf-idf where all documents sharing a tag form one pseudo-document.
	///
	/// `doc_tags[i]` are the tags of document `i`.
	pub fn tag_tfidfs<T: AsRef<str>>(
		&self,
		doc_tags: &[HashSet<String>],
		tags: &[T],
		n: usize,
		min_doc_freq: u64,
	) -> Result<HashMap<String, Rates>> {
		let term_frequencies = self.get_tfidf(n)?.term_frequencies();
		let groups = tags
			.iter()
			.map(|tag| {
				let tag = tag.as_ref();
				let mut counts = Counts::new();
				for (document, tf) in term_frequencies.iter().enumerate() {
					if doc_tags.get(document).is_some_and(|t| t.contains(tag)) {
						merge_counts(&mut counts, tf);
					}
				}
				(tag.to_owned(), counts)
			})
			.collect();
		Ok(tf_idf_by_group(groups, n, min_doc_freq))
	}

	/// Most likely filler between `left` and `right`.
	///
	/// Candidates are the continuations of `left` (or the whole vocabulary
	/// without a left token); each is scored P(w | left) * P(right | w).
	pub fn fill_blank(&self, left: Option<&str>, right: Option<&str>) -> Result<Option<String>> {
		let bigrams = self.get_ngram_model(2)?;
		let candidates = match left {
			Some(left) => match bigrams.context(left) {
				Some(context) => context.probabilities(),
				None => self.unigram_rates(),
			},
			None => self.unigram_rates(),
		};

		let best = candidates
			.iter()
			.map(|(word, p)| {
				let follow = right.map_or(1.0, |right| bigrams.probability_or_penalty(word, right));
				(word, p * follow)
			})
			.max_by(|a, b| a.1.total_cmp(&b.1).then_with(|| b.0.cmp(a.0)))
			.map(|(word, _)| word.clone());
		Ok(best)
	}

	/// Fills every `blank` token left to right; filled tokens become the left
	/// context of the next blank.
	pub fn fill_blanks<S: AsRef<str>>(&self, tokens: &[S], blank: &str) -> Result<Vec<String>> {
		let mut filled: Vec<String> = Vec::with_capacity(tokens.len());
		for (i, token) in tokens.iter().enumerate() {
			let token = token.as_ref();
			if token != blank {
				filled.push(token.to_lowercase());
				continue;
			}
			let left = filled.last().map(String::as_str);
			let right = tokens
				.get(i + 1)
				.map(AsRef::as_ref)
				.filter(|next| *next != blank)
				.map(str::to_lowercase);
			let choice = self.fill_blank(left, right.as_deref())?.unwrap_or_else(|| blank.to_owned());
			filled.push(choice);
		}
		Ok(filled)
	}

	/// Extends `seed` by sampling up to `max_tokens` tokens.
	///
	/// Each step uses the longest context available (up to `max_order - 1`
	/// tokens) and backs off to shorter ones when the context is unseen,
	/// down to the unigram rates. Stops early only when the corpus is empty.
	pub fn continue_line<R: Rng + ?Sized>(&self, seed: &str, max_tokens: usize, rng: &mut R) -> Vec<String> {
		let mut tokens = tokens_for_line(seed);
		for _ in 0..max_tokens {
			let mut n = self.max_order.min(tokens.len() + 1);
			let mut next = None;
			while n >= 1 {
				let context = join_tokens(&tokens[tokens.len() + 1 - n..]);
				if let Some(token) = self.ng_models[n - 1].context(&context).and_then(|ctx| ctx.sample(rng)) {
					next = Some(token.to_owned());
					break;
				}
				n -= 1;
			}
			match next {
				Some(token) => tokens.push(token),
				None => break,
			}
		}
		tokens
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::rngs::StdRng;
	use rand::SeedableRng;

	fn corpus(raw: &[&[&str]]) -> Vec<Vec<String>> {
		raw.iter().map(|lines| lines.iter().map(|l| l.to_string()).collect()).collect()
	}

	fn model(raw: &[&[&str]], max_order: usize) -> CorpusModel {
		CorpusModel::build(&corpus(raw), &ModelConfig::new(max_order).unwrap().with_workers(2)).unwrap()
	}

	#[test]
	fn orders_outside_the_model_are_rejected() {
		let m = model(&[&["a b c"]], 2);
		assert!(matches!(m.get_ngram_counts(0), Err(NgramError::InvalidOrder(0))));
		assert!(matches!(
			m.get_ngram_counts(3),
			Err(NgramError::OrderOutOfRange { requested: 3, max: 2 })
		));
		assert_eq!(m.get_ngram_counts(2).unwrap().get("b c"), 1);
	}

	#[test]
	fn unigram_likelihood_penalizes_unknown_tokens() {
		let m = model(&[&["the cat"]], 1);
		assert_eq!(m.unigram_likelihood("the dog"), 0.5 * OOV_PENALTY);
		assert_eq!(m.unigram_likelihood("The Cat"), 0.25);
	}

	#[test]
	fn bigram_likelihood_chains_from_first_token() {
		let m = model(&[&["the cat sat", "the dog sat"]], 2);
		let p_the = 2.0 / 6.0;
		let expected = p_the * 0.5 * 1.0;
		assert!((m.bigram_likelihood("the cat sat").unwrap() - expected).abs() < 1e-12);
		assert_eq!(m.bigram_likelihood("").unwrap(), 1.0);
		assert!(model(&[&["a"]], 1).bigram_likelihood("a").is_err());
	}

	#[test]
	fn parallel_counts_match_sequential() {
		let raw: Vec<Vec<String>> = (0..40)
			.map(|i| vec![format!("doc {} says hello world", i % 7), "hello world again".to_string()])
			.collect();
		let parallel = CorpusModel::build(&raw, &ModelConfig::new(3).unwrap().with_workers(4)).unwrap();
		let sequential = CorpusModel::build(&raw, &ModelConfig::new(3).unwrap().with_workers(1)).unwrap();
		for n in 1..=3 {
			assert_eq!(parallel.get_ngram_counts(n).unwrap(), sequential.get_ngram_counts(n).unwrap());
			assert_eq!(
				parallel.get_tfidf(n).unwrap().term_frequencies(),
				sequential.get_tfidf(n).unwrap().term_frequencies()
			);
		}
		assert_eq!(parallel.get_tfidf(2).unwrap().doc_frequency("hello world"), 40);
	}

	#[test]
	fn surprise_only_scores_common_ngrams() {
		let m = model(
			&[&["new york is big", "i love new york"], &["new york again"], &["old york", "new shoes"]],
			2,
		);
		let surprise = m.ngrams_by_unigram_and_bigram_surprise(2, 2, 2).unwrap();
		assert_eq!(surprise.by_unigram.len(), 1);
		let rate = m.get_ngram_rates(2).unwrap()["new york"];
		let expected = rate / m.unigram_likelihood("new york");
		assert!((surprise.by_unigram["new york"] - expected).abs() < 1e-9);
		assert!(surprise.by_unigram["new york"] > 1.0);
		assert!(surprise.by_bigram.contains_key("new york"));
	}

	#[test]
	fn collocates_and_condition_rates() {
		let m = model(&[&["the cat sat", "the cat ran", "a cat sat"]], 2);
		let mask: CollocateMask = "1x".parse().unwrap();
		let collocates = m.build_collocates_from_mask(&mask, 1, Bound::Inclusive);
		assert_eq!(collocates["cat"]["the"], 2);
		let relative = m.relative_collocates(&mask, 1, Bound::Inclusive);
		let expected = (2.0 / 3.0) / m.unigram_rates()["the"];
		assert!((relative["cat"]["the"] - expected).abs() < 1e-12);

		let rates = m.condition_rates(&["the cat"], 1, 2, Bound::Inclusive).unwrap();
		assert_eq!(rates["the"], 0.5);
		assert!((rates["cat"] - 1.0 / 3.0).abs() < 1e-12);
	}

	#[test]
	fn skipgram_tree_works_beyond_built_orders() {
		let m = model(&[&["red fox jumps high", "red dog jumps"]], 2);
		let tree = m.skipgram_tree(&"101".parse().unwrap()).unwrap();
		assert_eq!(tree.total("red ____ jumps"), 2);
		let tree = m.skipgram_tree(&"01".parse().unwrap()).unwrap();
		assert_eq!(tree.total("____ jumps"), 2);
	}

	#[test]
	fn tags_pool_documents() {
		let m = model(&[&["atoms and ideas"], &["atoms split"], &["paint and ideas"]], 1);
		let tags: Vec<HashSet<String>> = vec![
			["science".to_string()].into_iter().collect(),
			["science".to_string()].into_iter().collect(),
			["art".to_string()].into_iter().collect(),
		];
		let weights = m.tag_tfidfs(&tags, &["science", "art"], 1, 1).unwrap();
		assert!((weights["science"]["atoms"] - 2.0 * 2f64.ln()).abs() < 1e-12);
		assert_eq!(weights["art"]["ideas"], 0.0);
	}

	#[test]
	fn blanks_are_filled_from_context() {
		let m = model(&[&["the cat sat", "the cat sat", "the dog ran"]], 2);
		let filled = m.fill_blanks(&["the", "___", "sat"], "___").unwrap();
		assert_eq!(filled, vec!["the", "cat", "sat"]);
		let filled = m.fill_blanks(&["the", "___", "ran"], "___").unwrap();
		assert_eq!(filled, vec!["the", "dog", "ran"]);
	}

	#[test]
	fn mixed_case_context_is_normalized() {
		let m = model(&[&["the cat sat", "the cat sat", "the dog ran"]], 2);
		let lower = m.fill_blanks(&["the", "___", "ran"], "___").unwrap();
		assert_eq!(m.fill_blanks(&["The", "___", "Ran"], "___").unwrap(), lower);
		assert_eq!(lower, vec!["the", "dog", "ran"]);
	}

	#[test]
	fn ngram_likelihood_uses_the_requested_order() {
		let m = model(&[&["the cat sat", "the dog sat"]], 2);
		assert_eq!(m.ngram_likelihood("the cat sat", 2).unwrap(), 0.5);
		assert!((m.ngram_likelihood("the fox", 2).unwrap() - OOV_PENALTY).abs() < 1e-30);
		assert!(matches!(
			m.ngram_likelihood("the cat", 3),
			Err(NgramError::OrderOutOfRange { requested: 3, max: 2 })
		));
	}

	#[test]
	fn continuation_follows_observed_paths() {
		let m = model(&[&["one two three four"]], 3);
		let mut rng = StdRng::seed_from_u64(11);
		assert_eq!(m.continue_line("one", 3, &mut rng), vec!["one", "two", "three", "four"]);
		assert_eq!(m.continue_line("one two", 1, &mut rng), vec!["one", "two", "three"]);
	}

	#[test]
	fn unseen_seed_backs_off_to_unigrams() {
		let vocab = ["one", "two", "three", "four"];
		let m = model(&[&["one two three four"]], 3);
		let mut rng = StdRng::seed_from_u64(11);
		let line = m.continue_line("zebra", 2, &mut rng);
		assert_eq!(line.len(), 3);
		assert_eq!(line[0], "zebra");
		assert!(line[1..].iter().all(|token| vocab.contains(&token.as_str())));
	}

	#[test]
	fn order_one_model_extends_a_seed() {
		let m = model(&[&["the cat"]], 1);
		let mut rng = StdRng::seed_from_u64(3);
		let line = m.continue_line("the", 3, &mut rng);
		assert_eq!(line.len(), 4);
		assert!(line.iter().all(|token| token == "the" || token == "cat"));

		let no_lines: &[&str] = &[];
		let empty = model(&[no_lines], 2);
		assert_eq!(empty.continue_line("hello", 3, &mut rng), vec!["hello"]);
	}
}
