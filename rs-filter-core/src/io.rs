use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Reads a corpus file and returns one message per non-blank line.
///
/// - Reads the entire file into memory
/// - Splits on `\n` / `\r\n`
/// - Skips lines made only of whitespace
pub fn read_corpus<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	let mut contents = String::new();
	File::open(filename)?.read_to_string(&mut contents)?;
	Ok(contents
		.lines()
		.filter(|line| !line.trim().is_empty())
		.map(str::to_owned)
		.collect())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn skips_blank_lines() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		write!(file, "first line\r\n\n   \nsecond\n").unwrap();
		let lines = read_corpus(file.path()).unwrap();
		assert_eq!(lines, vec!["first line", "second"]);
	}

	#[test]
	fn missing_file_is_an_error() {
		assert!(read_corpus("/definitely/not/here.txt").is_err());
	}
}
