//! Tokenization and transcript cleaning.
//!
//! A line is split into lowercase whitespace tokens; nothing else about a
//! token is interpreted. Cleaning turns a raw transcript into lines and
//! splits out the audience-reaction markers so that the lines preceding them
//! can be used as a condition subset.

use std::sync::LazyLock;

use regex::Regex;

/// Marker line emitted for a `(Laughter)` annotation.
pub const LAUGHTER_MARKER: &str = "<Laughter>";

/// Marker line emitted for an `(Applause)` annotation.
pub const APPLAUSE_MARKER: &str = "<Applause>";

/// Lines containing any of these characters are dropped (sung passages).
const EXCLUDED_CHARS: [char; 2] = ['♫', '♪'];

static PARENTHETICAL: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\(.*?\)").expect("parenthetical pattern is valid"));

/// Periods followed by whitespace or the end of the text; a period inside a
/// token (`3.5`) is not a sentence end.
static SENTENCE_END: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\.+(?:\s+|$)").expect("sentence end pattern is valid"));

/// Splits a line into lowercase whitespace-delimited tokens.
pub fn tokens_for_line(line: &str) -> Vec<String> {
	line.split_whitespace().map(str::to_lowercase).collect()
}

/// Lines immediately followed by a line equal to `marker`.
pub fn lines_preceding(lines: &[String], marker: &str) -> Vec<String> {
	lines
		.windows(2)
		.filter(|pair| pair[1] == marker)
		.map(|pair| pair[0].clone())
		.collect()
}

/// Lines that drew laughter.
pub fn laugh_lines(lines: &[String]) -> Vec<String> {
	lines_preceding(lines, LAUGHTER_MARKER)
}

/// Lines that drew applause.
pub fn applause_lines(lines: &[String]) -> Vec<String> {
	lines_preceding(lines, APPLAUSE_MARKER)
}

/// Flattens per-document lines into one corpus-wide sequence, keeping order.
pub fn flatten_lines<T: AsRef<[String]>>(documents: &[T]) -> Vec<String> {
	documents.iter().flat_map(|doc| doc.as_ref().iter().cloned()).collect()
}

/// Normalizes punctuation to sentence breaks and isolates reaction markers.
///
/// - commas and double quotes are removed
/// - `?`, `!` and `:` end a sentence like `.`
/// - `(Laughter)` / `(Applause)` become stand-alone marker sentences
/// - every other parenthetical is removed
/// - a run of periods before whitespace or the end becomes a single `". "`
pub fn clean(text: &str) -> String {
	let text = text.replace([',', '"'], "").replace(['?', '!', ':'], ".");
	let text = handle_parentheticals(&text);
	SENTENCE_END.replace_all(&text, ". ").into_owned()
}

fn handle_parentheticals(text: &str) -> String {
	let text = text
		.replace("(Applause)", &format!(". {}. ", APPLAUSE_MARKER))
		.replace("(Laughter)", &format!(". {}. ", LAUGHTER_MARKER));
	PARENTHETICAL.replace_all(&text, "").into_owned()
}

/// Cleans a transcript and splits it into trimmed, non-empty lines.
///
/// Lines with music glyphs are excluded.
pub fn lines_from_text(text: &str) -> Vec<String> {
	clean(text)
		.split(". ")
		.map(str::trim)
		.filter(|line| !line.is_empty() && !line.contains(EXCLUDED_CHARS))
		.map(str::to_owned)
		.collect()
}
