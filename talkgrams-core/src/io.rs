//! Corpus loading.
//!
//! Two sources are supported:
//! - the TED CSV pair (talk metadata + transcripts, joined on `url`)
//! - a folder of plain text files, one document per file, one line per line

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

use log::{debug, info};
use serde::Deserialize;

use crate::corpus::Document;
use crate::error::Result;
use crate::text::lines_from_text;

/// Row of the talk metadata file. Other columns are ignored.
#[derive(Debug, Deserialize)]
struct TalkRecord {
	url: String,
	#[serde(default)]
	title: String,
	/// Python-style list literal, e.g. `['science', 'technology']`.
	#[serde(default)]
	tags: String,
}

/// Row of the transcripts file.
#[derive(Debug, Deserialize)]
struct TranscriptRecord {
	url: String,
	#[serde(default)]
	transcript: String,
}

/// Reads a text file and returns all its lines as a `Vec<String>`.
///
/// - Reads the entire file into memory
/// - Splits on `\n` / `\r\n`
pub fn read_file<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	let mut contents = String::new();
	File::open(filename)?.read_to_string(&mut contents)?;
	Ok(contents.lines().map(str::to_owned).collect())
}

/// Extracts the base filename without extension.
///
/// Examples:
/// - `"./data/talk.txt"` → `"talk"`
/// - `"talk.txt"` → `"talk"`
pub fn get_filename<P: AsRef<Path>>(input_path: P) -> io::Result<String> {
	let stem = input_path
		.as_ref()
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no filename"))?;

	Ok(stem.to_string_lossy().to_string())
}

/// Normalize a folder path.
///
/// - `"."` or `"./"` resolves to the current working directory
/// - Other paths are returned as-is (not canonicalized)
pub fn normalize_folder(input: &str) -> PathBuf {
	if input == "." || input == "./" {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		PathBuf::from(input)
	}
}

/// Lists all files with a given extension in a directory, sorted by name.
///
/// Returns file names only (no paths).
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<String>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let path = entry?.path();
		if path.is_file() && path.extension() == Some(std::ffi::OsStr::new(extension)) {
			if let Some(name) = path.file_name() {
				files.push(name.to_string_lossy().to_string());
			}
		}
	}

	files.sort();
	Ok(files)
}

/// Parses a Python-style list literal of strings into a set.
///
/// `"['a', \"b c\"]"` → `{"a", "b c"}`; malformed input yields whatever
/// comma-separated items could be recovered.
pub fn parse_tags(raw: &str) -> HashSet<String> {
	raw.trim()
		.trim_start_matches('[')
		.trim_end_matches(']')
		.split(',')
		.map(|item| item.trim().trim_matches(|c: char| c == '\'' || c == '"').trim().to_owned())
		.filter(|item| !item.is_empty())
		.collect()
}

/// Loads the TED corpus from its metadata and transcript CSV files.
///
/// # Behavior
/// - Keeps the metadata file order (left join on `url`)
/// - Talks without a transcript get no lines
/// - `cutoff` keeps only the first talks, for quick experiments
///
/// # Errors
/// Returns an error if either file cannot be read or parsed.
pub fn load_ted_corpus<P, Q>(talks_path: P, transcripts_path: Q, cutoff: Option<usize>) -> Result<Vec<Document>>
where
	P: AsRef<Path>,
	Q: AsRef<Path>,
{
	let mut transcripts: HashMap<String, String> = HashMap::new();
	let mut reader = csv::Reader::from_path(transcripts_path)?;
	for record in reader.deserialize() {
		let record: TranscriptRecord = record?;
		transcripts.insert(record.url.trim().to_owned(), record.transcript);
	}

	let mut documents: Vec<Document> = Vec::new();
	let mut reader = csv::Reader::from_path(talks_path)?;
	for record in reader.deserialize() {
		if cutoff.is_some_and(|max| documents.len() >= max) {
			break;
		}
		let record: TalkRecord = record?;
		let lines = match transcripts.get(record.url.trim()) {
			Some(transcript) => lines_from_text(transcript),
			None => {
				debug!("no transcript for {}", record.url);
				Vec::new()
			}
		};
		documents.push(Document {
			title: record.title,
			tags: parse_tags(&record.tags),
			lines,
		});
	}

	info!("loaded {} talks", documents.len());
	Ok(documents)
}

/// Loads every `extension` file of a folder as one document.
///
/// Each file line is one document line; the title is the file stem.
pub fn load_text_documents(folder: &str, extension: &str) -> Result<Vec<Document>> {
	let folder = normalize_folder(folder);
	let mut documents: Vec<Document> = Vec::new();
	for file in list_files(&folder, extension)? {
		let path = folder.join(&file);
		let lines = read_file(&path)?
			.into_iter()
			.map(|line| line.trim().to_owned())
			.filter(|line| !line.is_empty())
			.collect();
		documents.push(Document::new(&get_filename(&path)?, lines));
	}
	info!("loaded {} documents from {}", documents.len(), folder.display());
	Ok(documents)
}
