use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::ops::AddAssign;
use std::str::FromStr;

/// Flat occurrence table: key -> count.
pub type Counts = HashMap<String, u64>;

/// Flat rate table: key -> real-valued weight (rates, probabilities, ratios).
pub type Rates = HashMap<String, f64>;

/// Two-level table: outer key -> (inner key -> value).
pub type Nested<V> = HashMap<String, HashMap<String, V>>;

/// A table value that can be read as a real weight.
///
/// Lets the ranking and normalization helpers work on both count tables
/// and rate tables without converting one into the other first.
pub trait Weight: Copy + Default + AddAssign {
	fn weight(self) -> f64;
}

impl Weight for u64 {
	fn weight(self) -> f64 {
		self as f64
	}
}

impl Weight for f64 {
	fn weight(self) -> f64 {
		self
	}
}

/// Boundary semantics of a threshold comparison.
///
/// `Inclusive` admits values `>= threshold`, `Exclusive` admits values
/// `> threshold`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Bound {
	#[default]
	Inclusive,
	Exclusive,
}

impl Bound {
	/// Returns `true` if `value` passes `threshold` under this boundary.
	pub fn admits<T: PartialOrd>(self, value: T, threshold: T) -> bool {
		match self {
			Bound::Inclusive => value >= threshold,
			Bound::Exclusive => value > threshold,
		}
	}
}

impl FromStr for Bound {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"inclusive" | ">=" => Ok(Bound::Inclusive),
			"exclusive" | ">" => Ok(Bound::Exclusive),
			other => Err(format!("unknown bound '{}', expected 'inclusive' or 'exclusive'", other)),
		}
	}
}

impl fmt::Display for Bound {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Bound::Inclusive => write!(f, "inclusive"),
			Bound::Exclusive => write!(f, "exclusive"),
		}
	}
}

/// Adds `value` to the entry for `key`, creating it if missing.
pub fn enter_item<K: Eq + Hash, V: Weight>(table: &mut HashMap<K, V>, key: K, value: V) {
	*table.entry(key).or_default() += value;
}

/// Adds `value` to `table[outer][inner]`, creating both levels if missing.
pub fn enter_nested_item<V: Weight>(table: &mut Nested<V>, outer: &str, inner: &str, value: V) {
	match table.get_mut(outer) {
		Some(row) => match row.get_mut(inner) {
			Some(existing) => *existing += value,
			None => {
				row.insert(inner.to_owned(), value);
			}
		},
		None => {
			let mut row = HashMap::new();
			row.insert(inner.to_owned(), value);
			table.insert(outer.to_owned(), row);
		}
	}
}

/// Key-wise sum of `other` into `acc`.
pub fn merge_counts<V: Weight>(acc: &mut HashMap<String, V>, other: &HashMap<String, V>) {
	for (key, value) in other {
		match acc.get_mut(key) {
			Some(existing) => *existing += *value,
			None => {
				acc.insert(key.clone(), *value);
			}
		}
	}
}

/// Key-wise sum of a sequence of tables.
pub fn sum_counters<'a, V, I>(tables: I) -> HashMap<String, V>
where
	V: Weight + 'a,
	I: IntoIterator<Item = &'a HashMap<String, V>>,
{
	let mut acc = HashMap::new();
	for table in tables {
		merge_counts(&mut acc, table);
	}
	acc
}

/// Two-level key-wise sum of `other` into `acc`.
pub fn merge_nested<V: Weight>(acc: &mut Nested<V>, other: &Nested<V>) {
	for (outer, row) in other {
		merge_counts(acc.entry(outer.clone()).or_default(), row);
	}
}

/// Divides every value by the table total.
///
/// An empty table, or one whose total is zero, yields an empty rate table.
pub fn normalize<V: Weight>(table: &HashMap<String, V>) -> Rates {
	let total: f64 = table.values().map(|v| v.weight()).sum();
	if total <= 0.0 {
		return Rates::new();
	}
	table.iter().map(|(k, v)| (k.clone(), v.weight() / total)).collect()
}

/// Keeps the entries whose value passes `threshold`.
pub fn above_threshold<V: Weight + PartialOrd>(
	table: &HashMap<String, V>,
	threshold: V,
	bound: Bound,
) -> HashMap<String, V> {
	table
		.iter()
		.filter(|(_, v)| bound.admits(**v, threshold))
		.map(|(k, v)| (k.clone(), *v))
		.collect()
}

/// All entries sorted by descending value.
///
/// Equal values keep ascending key order so that rankings are reproducible
/// across runs regardless of hash iteration order.
pub fn ranked<V: Weight>(table: &HashMap<String, V>) -> Vec<(String, V)> {
	let mut entries: Vec<(String, V)> = table.iter().map(|(k, v)| (k.clone(), *v)).collect();
	entries.sort_by(|a, b| a.0.cmp(&b.0));
	entries.sort_by(|a, b| b.1.weight().total_cmp(&a.1.weight()));
	entries
}

/// The `n` highest-valued entries, highest first.
pub fn top_n<V: Weight>(table: &HashMap<String, V>, n: usize) -> Vec<(String, V)> {
	let mut entries = ranked(table);
	entries.truncate(n);
	entries
}

/// The `n` lowest-valued entries, lowest first.
pub fn bottom_n<V: Weight>(table: &HashMap<String, V>, n: usize) -> Vec<(String, V)> {
	let mut entries: Vec<(String, V)> = table.iter().map(|(k, v)| (k.clone(), *v)).collect();
	entries.sort_by(|a, b| a.0.cmp(&b.0));
	entries.sort_by(|a, b| a.1.weight().total_cmp(&b.1.weight()));
	entries.truncate(n);
	entries
}

/// Keys of the `n` highest-valued entries.
pub fn top_n_keys<V: Weight>(table: &HashMap<String, V>, n: usize) -> Vec<String> {
	top_n(table, n).into_iter().map(|(k, _)| k).collect()
}

/// Shannon entropy (natural log) of the distribution obtained by
/// normalizing `table`. Zero-weight entries contribute nothing.
pub fn entropy<V: Weight>(table: &HashMap<String, V>) -> f64 {
	-normalize(table)
		.values()
		.filter(|p| **p > 0.0)
		.map(|p| p * p.ln())
		.sum::<f64>()
}
