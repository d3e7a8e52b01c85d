/// Characters removed by `preprocess`.
///
/// A fixed ASCII set; other punctuation is kept.
pub const PUNCTUATION: &[char] = &[
	'.', ',', '-', '/', '#', '!', '$', '%', '^', '&', '*', ';', ':', '{', '}', '=', '_', '`', '~', '(', ')',
];

/// Splits `text` on runs of whitespace.
///
/// Leading or trailing whitespace produces a single empty token at that
/// edge, and an empty input produces `[""]`. Callers must tolerate empty
/// tokens.
pub fn tokenize(text: &str) -> Vec<String> {
	let mut tokens = Vec::new();
	let mut current = String::new();
	let mut in_gap = false;

	for c in text.chars() {
		if c.is_whitespace() {
			if !in_gap {
				tokens.push(std::mem::take(&mut current));
				in_gap = true;
			}
		} else {
			in_gap = false;
			current.push(c);
		}
	}
	tokens.push(current);

	tokens
}

/// Lowercases `text`, strips `PUNCTUATION`, then tokenizes the result.
pub fn preprocess(text: &str) -> Vec<String> {
	let cleaned: String = text
		.to_lowercase()
		.chars()
		.filter(|c| !PUNCTUATION.contains(c))
		.collect();
	tokenize(&cleaned)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn preprocess_strips_and_lowercases() {
		assert_eq!(preprocess("Hello, World!"), vec!["hello", "world"]);
	}

	#[test]
	fn preprocess_strips_before_splitting() {
		assert_eq!(preprocess("a - b"), vec!["a", "b"]);
		assert_eq!(preprocess("(x_y) {z}=1"), vec!["xy", "z1"]);
		assert_eq!(preprocess("what? 'quoted'"), vec!["what?", "'quoted'"]);
	}

	#[test]
	fn tokenize_collapses_whitespace_runs() {
		assert_eq!(tokenize("a  b\t\nc"), vec!["a", "b", "c"]);
	}

	#[test]
	fn tokenize_keeps_one_empty_token_per_edge() {
		assert_eq!(tokenize(""), vec![""]);
		assert_eq!(tokenize("   "), vec!["", ""]);
		assert_eq!(tokenize("  a "), vec!["", "a", ""]);
	}

	#[test]
	fn punctuation_only_message_is_one_empty_token() {
		assert_eq!(preprocess("!!! ..."), vec!["", ""]);
		assert_eq!(preprocess("?!"), vec!["?"]);
	}
}
