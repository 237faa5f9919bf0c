use std::str::SplitWhitespace;

/// Punctuation split off the end of a word and emitted as its own token.
pub const PUNCTUATION: [char; 13] = ['.', ',', ';', ':', '?', '!', ')', '(', '»', '«', '"', '\'', '_'];

/// Punctuation rendered without a leading space when joining generated tokens.
pub const CLOSING_PUNCTUATION: [char; 7] = ['.', ',', ':', ';', '?', '!', ')'];

/// Lazy token iterator over a single line of text.
///
/// Each whitespace-delimited run yields one token. When the run is longer
/// than one character and ends with a character from [`PUNCTUATION`], that
/// last character is detached and yielded as a second token. Any other
/// trailing punctuation stays attached to the word.
///
/// Tokens borrow from the line, so a caller streaming a large file only keeps
/// the current line in memory.
#[derive(Clone, Debug)]
pub struct Tokens<'a> {
	words: SplitWhitespace<'a>,
	pending: Option<&'a str>,
}

impl<'a> Iterator for Tokens<'a> {
	type Item = &'a str;

	fn next(&mut self) -> Option<Self::Item> {
		if let Some(punctuation) = self.pending.take() {
			return Some(punctuation);
		}

		let word = self.words.next()?;
		match word.chars().next_back() {
			Some(last) if PUNCTUATION.contains(&last) && word.len() > last.len_utf8() => {
				let split = word.len() - last.len_utf8();
				self.pending = Some(&word[split..]);
				Some(&word[..split])
			}
			_ => Some(word),
		}
	}
}

/// Splits a line into word and punctuation tokens.
pub fn tokenize(line: &str) -> Tokens<'_> {
	Tokens { words: line.split_whitespace(), pending: None }
}

/// Returns true if `token` is rendered glued to the previous token.
pub fn is_closing(token: &str) -> bool {
	let mut chars = token.chars();
	match (chars.next(), chars.next()) {
		(Some(c), None) => CLOSING_PUNCTUATION.contains(&c),
		_ => false,
	}
}
