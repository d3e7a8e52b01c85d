/// Sentinel prepended to every token sequence.
pub const START_TOKEN: &str = "^";

/// Sentinel appended to every token sequence.
pub const END_TOKEN: &str = "$";

/// One window of `n` consecutive tokens from a padded sequence.
///
/// The last token is the outcome; the tokens before it form the context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ngram(Vec<String>);

impl Ngram {
	/// The context: every token but the last, joined with a single space.
	///
	/// Empty for unigrams.
	pub fn context(&self) -> String {
		self.0[..self.0.len() - 1].join(" ")
	}

	/// The outcome: the last token of the window.
	pub fn outcome(&self) -> &str {
		&self.0[self.0.len() - 1]
	}

	pub fn tokens(&self) -> &[String] {
		&self.0
	}
}

/// Builds every n-gram of order `n` over `tokens` padded with sentinels.
///
/// The padded sequence is `[START_TOKEN] + tokens + [END_TOKEN]`, so a
/// sequence of `k` tokens yields `k + 3 - n` windows. If `n` exceeds the
/// padded length, no window is produced.
///
/// # Panics
/// Panics if `n == 0`.
pub fn make_ngrams<S: AsRef<str>>(tokens: &[S], n: usize) -> Vec<Ngram> {
	assert!(n >= 1, "n-gram order must be >= 1");

	let mut padded: Vec<String> = Vec::with_capacity(tokens.len() + 2);
	padded.push(START_TOKEN.to_owned());
	padded.extend(tokens.iter().map(|t| t.as_ref().to_owned()));
	padded.push(END_TOKEN.to_owned());

	padded.windows(n).map(|window| Ngram(window.to_vec())).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn pairs(ngrams: &[Ngram]) -> Vec<(String, String)> {
		ngrams.iter().map(|g| (g.context(), g.outcome().to_owned())).collect()
	}

	#[test]
	fn empty_sequence_bigram_is_start_end() {
		let ngrams = make_ngrams::<&str>(&[], 2);
		assert_eq!(ngrams.len(), 1);
		assert_eq!(ngrams[0].tokens(), ["^", "$"]);
		assert_eq!(ngrams[0].context(), "^");
		assert_eq!(ngrams[0].outcome(), "$");
	}

	#[test]
	fn bigrams_cover_boundaries() {
		let ngrams = make_ngrams(&["a", "b"], 2);
		assert_eq!(
			pairs(&ngrams),
			vec![
				("^".to_owned(), "a".to_owned()),
				("a".to_owned(), "b".to_owned()),
				("b".to_owned(), "$".to_owned()),
			]
		);
	}

	#[test]
	fn trigram_context_is_space_joined() {
		let ngrams = make_ngrams(&["a", "b", "c"], 3);
		assert_eq!(ngrams.len(), 3);
		assert_eq!(ngrams[0].context(), "^ a");
		assert_eq!(ngrams[2].context(), "b c");
		assert_eq!(ngrams[2].outcome(), "$");
	}

	#[test]
	fn unigrams_have_empty_context() {
		let ngrams = make_ngrams(&["a"], 1);
		assert_eq!(ngrams.len(), 3);
		assert!(ngrams.iter().all(|g| g.context().is_empty()));
		assert_eq!(ngrams[1].outcome(), "a");
	}

	#[test]
	fn order_larger_than_padded_sequence_is_empty() {
		assert!(make_ngrams(&["a"], 4).is_empty());
		assert_eq!(make_ngrams(&["a"], 3).len(), 1);
	}

	#[test]
	#[should_panic(expected = "n-gram order must be >= 1")]
	fn zero_order_is_a_precondition_failure() {
		make_ngrams(&["a"], 0);
	}
}
