//! Token capability used by the masking and replacement utilities.
//!
//! Those utilities only need a token's text and a comparable category
//! label. Plain strings implement it with their own text as category, so
//! "category" degenerates to "this exact word"; annotated tokens carry a
//! part-of-speech tag and a dependency relation, selectable as category.

/// Anything with a text form and an equality-comparable category label.
pub trait Token {
	fn text(&self) -> &str;
	fn category(&self) -> &str;
}

impl Token for str {
	fn text(&self) -> &str {
		self
	}

	fn category(&self) -> &str {
		self
	}
}

impl Token for String {
	fn text(&self) -> &str {
		self
	}

	fn category(&self) -> &str {
		self
	}
}

impl<T: Token + ?Sized> Token for &T {
	fn text(&self) -> &str {
		(**self).text()
	}

	fn category(&self) -> &str {
		(**self).category()
	}
}

/// A token produced by an external linguistic annotator.
///
/// `head` is the index of the syntactic head within the same sentence; a
/// root token is its own head.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnotatedToken {
	pub text: String,
	/// Coarse part-of-speech tag, e.g. `NOUN`.
	pub pos: String,
	/// Dependency relation to the head, e.g. `dobj`.
	pub dep: String,
	pub head: usize,
}

impl AnnotatedToken {
	pub fn new(text: &str, pos: &str, dep: &str, head: usize) -> Self {
		Self {
			text: text.to_owned(),
			pos: pos.to_owned(),
			dep: dep.to_owned(),
			head,
		}
	}

	/// View of this token whose category is the dependency relation.
	pub fn by_dependency(&self) -> ByDependency<'_> {
		ByDependency(self)
	}
}

/// Category is the part-of-speech tag.
impl Token for AnnotatedToken {
	fn text(&self) -> &str {
		&self.text
	}

	fn category(&self) -> &str {
		&self.pos
	}
}

/// An annotated token categorized by its dependency relation.
#[derive(Clone, Copy, Debug)]
pub struct ByDependency<'a>(pub &'a AnnotatedToken);

impl Token for ByDependency<'_> {
	fn text(&self) -> &str {
		&self.0.text
	}

	fn category(&self) -> &str {
		&self.0.dep
	}
}

/// Indices of the syntactic ancestors of `index`, nearest first.
///
/// The walk stops at a root (a token that is its own head), at a head index
/// outside the sentence, or after `max_depth` steps, so malformed or cyclic
/// parses terminate.
pub fn ancestors(sentence: &[AnnotatedToken], index: usize, max_depth: usize) -> Vec<usize> {
	let mut chain = Vec::new();
	let mut current = index;
	while chain.len() < max_depth {
		let Some(token) = sentence.get(current) else {
			break;
		};
		if token.head == current || token.head >= sentence.len() {
			break;
		}
		current = token.head;
		chain.push(current);
	}
	chain
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sentence() -> Vec<AnnotatedToken> {
		vec![
			AnnotatedToken::new("dogs", "NOUN", "nsubj", 1),
			AnnotatedToken::new("chase", "VERB", "ROOT", 1),
			AnnotatedToken::new("red", "ADJ", "amod", 3),
			AnnotatedToken::new("cars", "NOUN", "dobj", 1),
		]
	}

	#[test]
	fn categories_follow_the_view() {
		let doc = sentence();
		assert_eq!(doc[3].category(), "NOUN");
		assert_eq!(doc[3].by_dependency().category(), "dobj");
		assert_eq!("word".category(), "word");
	}

	#[test]
	fn ancestor_walk_reaches_root() {
		assert_eq!(ancestors(&sentence(), 2, 10), vec![3, 1]);
		assert_eq!(ancestors(&sentence(), 1, 10), Vec::<usize>::new());
		assert_eq!(ancestors(&sentence(), 2, 1), vec![3]);
	}

	#[test]
	fn cyclic_parse_terminates() {
		let cyclic = vec![AnnotatedToken::new("a", "X", "dep", 1), AnnotatedToken::new("b", "X", "dep", 0)];
		assert_eq!(ancestors(&cyclic, 0, 5), vec![1, 0, 1, 0, 1]);
	}
}
