use std::collections::HashSet;

use clap::{Args, Parser, Subcommand};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use talkgrams_core::corpus::{corpus_applause_lines, corpus_laugh_lines, tag_counts};
use talkgrams_core::io::{load_ted_corpus, load_text_documents};
use talkgrams_core::madlibs::{keyword_set, mask_tokens_if_in_set, BLANK_TOKEN};
use talkgrams_core::model::ngram_counts::join_tokens;
use talkgrams_core::tables::{bottom_n, top_n, Rates};
use talkgrams_core::{Bound, CollocateMask, CorpusModel, Document, Mask, ModelConfig};

/// N-gram statistics over talk transcripts.
#[derive(Parser)]
#[command(name = "talkgrams", version, about)]
struct Cli {
	#[command(flatten)]
	source: SourceArgs,

	/// Highest n-gram order to build
	#[arg(long, default_value_t = 3)]
	max_order: usize,

	/// Worker threads used for counting (defaults to the CPU count)
	#[arg(long)]
	workers: Option<usize>,

	/// Number of entries printed at each end of a ranking
	#[arg(long, default_value_t = 20)]
	top: usize,

	#[command(subcommand)]
	command: Command,
}

#[derive(Args)]
struct SourceArgs {
	/// Talk metadata CSV (title, url, tags)
	#[arg(long, requires = "transcripts", conflicts_with = "folder")]
	talks: Option<String>,

	/// Transcript CSV (url, transcript)
	#[arg(long, requires = "talks")]
	transcripts: Option<String>,

	/// Keep only the first talks of the metadata file
	#[arg(long)]
	cutoff: Option<usize>,

	/// Folder of plain text documents, one line per line
	#[arg(long)]
	folder: Option<String>,

	/// Extension of the documents in `--folder`
	#[arg(long, default_value = "txt")]
	ext: String,
}

#[derive(Subcommand)]
enum Command {
	/// N-grams most (and least) surprising against unigram and bigram models
	Surprise {
		#[arg(long, default_value_t = 3)]
		order: usize,
		#[arg(long, default_value_t = 5)]
		min_count: u64,
		#[arg(long, default_value_t = 3)]
		min_doc_freq: u64,
	},
	/// Context tokens around each target span, e.g. `--mask 11x11`
	Collocates {
		#[arg(long)]
		mask: CollocateMask,
		#[arg(long, default_value_t = 5)]
		min_count: u64,
		#[arg(long, default_value_t = Bound::Inclusive)]
		bound: Bound,
		/// Target span to report; all targets when omitted
		#[arg(long)]
		target: Option<String>,
		/// Divide by corpus-wide unigram rates
		#[arg(long)]
		relative: bool,
	},
	/// Rate at which each n-gram occurs in lines followed by laughter
	LaughRates {
		#[arg(long, default_value_t = 1)]
		order: usize,
		#[arg(long, default_value_t = 10)]
		threshold: u64,
		#[arg(long, default_value_t = Bound::Inclusive)]
		bound: Bound,
		/// Use applause instead of laughter
		#[arg(long)]
		applause: bool,
	},
	/// Terms specific to a tag, pooling every talk carrying it
	TagTfidf {
		/// Tags to compare; the most used tags when omitted
		#[arg(long = "tag")]
		tags: Vec<String>,
		#[arg(long, default_value_t = 1)]
		order: usize,
		#[arg(long, default_value_t = 1)]
		min_doc_freq: u64,
	},
	/// Blanks the keywords of one document and refills them from the model
	Madlib {
		#[arg(long, default_value_t = 0)]
		document: usize,
		/// Number of keywords blanked
		#[arg(long, default_value_t = 10)]
		keywords: usize,
		/// Number of lines printed
		#[arg(long, default_value_t = 10)]
		lines: usize,
	},
	/// Filler entropy of skip-gram slots, e.g. `--mask 101`
	Slots {
		#[arg(long)]
		mask: Mask,
		#[arg(long, default_value_t = 10)]
		min_count: u64,
		/// Fillers considered per skip-gram
		#[arg(long, default_value_t = 10)]
		top_k: usize,
		/// Report the slots of this line instead of ranking all skip-grams
		#[arg(long)]
		line: Option<String>,
	},
	/// Extends a seed by sampling the conditional models
	Generate {
		#[arg(long, default_value = "")]
		seed: String,
		#[arg(long, default_value_t = 20)]
		tokens: usize,
		#[arg(long)]
		rng_seed: Option<u64>,
	},
}

impl Command {
	/// Lowest `max_order` the command needs.
	fn required_order(&self) -> usize {
		match self {
			Command::Surprise { order, .. } => (*order).max(2),
			Command::LaughRates { order, .. } | Command::TagTfidf { order, .. } => *order,
			Command::Madlib { .. } | Command::Generate { .. } => 2,
			Command::Collocates { .. } | Command::Slots { .. } => 1,
		}
	}
}

fn load_documents(source: &SourceArgs) -> Result<Vec<Document>, Box<dyn std::error::Error>> {
	match (&source.talks, &source.transcripts, &source.folder) {
		(Some(talks), Some(transcripts), _) => Ok(load_ted_corpus(talks, transcripts, source.cutoff)?),
		(_, _, Some(folder)) => Ok(load_text_documents(folder, &source.ext)?),
		_ => Err("a corpus is required: --talks and --transcripts, or --folder".into()),
	}
}

fn print_ranking(title: &str, table: &Rates, n: usize) {
	println!("== {} ({} entries) ==", title, table.len());
	for (key, value) in top_n(table, n) {
		println!("{:>12.6}  {}", value, key);
	}
	if table.len() > n {
		println!("...");
		for (key, value) in bottom_n(table, n) {
			println!("{:>12.6}  {}", value, key);
		}
	}
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
	env_logger::init();
	let cli = Cli::parse();

	let documents = load_documents(&cli.source)?;
	let mut config = ModelConfig::new(cli.max_order.max(cli.command.required_order()))?;
	if let Some(workers) = cli.workers {
		config.set_workers(workers);
	}
	let model = CorpusModel::build(&documents, &config)?;
	info!("model ready: {} documents, orders 1..={}", model.document_count(), model.max_order());

	match cli.command {
		Command::Surprise { order, min_count, min_doc_freq } => {
			let surprise = model.ngrams_by_unigram_and_bigram_surprise(order, min_count, min_doc_freq)?;
			print_ranking("surprise vs unigram model", &surprise.by_unigram, cli.top);
			print_ranking("surprise vs bigram model", &surprise.by_bigram, cli.top);
		}
		Command::Collocates { mask, min_count, bound, target, relative } => {
			let mut rows: Vec<(String, Rates)> = if relative {
				model.relative_collocates(&mask, min_count, bound).into_iter().collect()
			} else {
				model
					.build_collocates_from_mask(&mask, min_count, bound)
					.into_iter()
					.map(|(key, row)| (key, row.into_iter().map(|(k, v)| (k, v as f64)).collect()))
					.collect()
			};
			rows.retain(|(key, _)| target.as_ref().is_none_or(|t| t.to_lowercase() == *key));
			rows.sort_by(|a, b| a.0.cmp(&b.0));
			for (key, row) in &rows {
				print_ranking(key, row, cli.top);
			}
		}
		Command::LaughRates { order, threshold, bound, applause } => {
			let (title, lines) = if applause {
				("applause rate", corpus_applause_lines(&documents))
			} else {
				("laugh rate", corpus_laugh_lines(&documents))
			};
			info!("{} condition lines", lines.len());
			let rates = model.condition_rates(&lines, order, threshold, bound)?;
			print_ranking(title, &rates, cli.top);
		}
		Command::TagTfidf { mut tags, order, min_doc_freq } => {
			if tags.is_empty() {
				tags = tag_counts(&documents).into_iter().take(5).map(|(tag, _)| tag).collect();
			}
			let doc_tags: Vec<HashSet<String>> = documents.iter().map(|d| d.tags.clone()).collect();
			let weights = model.tag_tfidfs(&doc_tags, &tags, order, min_doc_freq)?;
			for tag in &tags {
				if let Some(table) = weights.get(tag) {
					print_ranking(tag, table, cli.top);
				}
			}
		}
		Command::Madlib { document, keywords, lines } => {
			let tfidf = model.get_tfidf(1)?;
			let Some(weights) = tfidf.tfidf(document) else {
				return Err(format!("no document {} (corpus has {})", document, tfidf.total_docs()).into());
			};
			let blanked = keyword_set(weights, keywords);
			let title = documents.get(document).map(|d| d.title.as_str()).unwrap_or_default();
			println!("== {} ==", title);
			for line in model.document_lines(document).unwrap_or_default().iter().take(lines) {
				let masked = mask_tokens_if_in_set(line, &blanked);
				let filled = model.fill_blanks(&masked, BLANK_TOKEN)?;
				println!("{}\n  -> {}", join_tokens(&masked), join_tokens(&filled));
			}
		}
		Command::Slots { mask, min_count, top_k, line } => {
			let tree = model.skipgram_tree(&mask)?;
			let entropies = tree.slot_entropies(min_count, Bound::Inclusive, top_k);
			match line {
				Some(line) => {
					for report in tree.slot_report(&line, &entropies, top_k)? {
						let entropy = report.entropy.map_or("-".to_owned(), |e| format!("{:.4}", e));
						println!("{:>8}  {}  [{}]", entropy, report.skipgram, report.fillers.join(", "));
					}
				}
				None => print_ranking("slot entropy", &entropies, cli.top),
			}
		}
		Command::Generate { seed, tokens, rng_seed } => {
			let mut rng = match rng_seed {
				Some(s) => StdRng::seed_from_u64(s),
				None => StdRng::from_os_rng(),
			};
			println!("{}", join_tokens(&model.continue_line(&seed, tokens, &mut rng)));
		}
	}

	Ok(())
}
