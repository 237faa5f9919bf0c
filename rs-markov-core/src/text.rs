/// Lines shorter than this (in characters) are treated as noise and dropped.
pub const MIN_LINE_CHARS: usize = 40;

/// Re-flows hard-wrapped text into one line per paragraph.
///
/// - A blank line ends the paragraph
/// - Lines shorter than [`MIN_LINE_CHARS`] are dropped (headings, page numbers)
/// - A line ending in `-` is joined to the next one without a space
/// - Other lines are joined with a single space
pub fn prepare_text(raw: &str) -> String {
	let mut text = String::new();
	let mut join_spaced = false;

	for line in raw.lines() {
		let line = line.trim();
		if line.is_empty() {
			text.push_str("\n\n");
			join_spaced = false;
			continue;
		}
		if line.chars().count() < MIN_LINE_CHARS {
			continue;
		}

		if join_spaced {
			text.push(' ');
		} else {
			// Drops the hyphen, or one of the two paragraph newlines.
			text.pop();
		}
		text.push_str(line);
		join_spaced = !line.ends_with('-');
	}

	text
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	const FIRST: &str = "It was the best of times, it was the worst of times,";
	const SECOND: &str = "it was the age of wisdom, it was the age of foolishness";

	#[test]
	fn joins_wrapped_lines_with_spaces() {
		let raw = format!("{FIRST}\n{SECOND}\n");
		assert_eq!(prepare_text(&raw), format!("{FIRST} {SECOND}"));
	}

	#[test]
	fn joins_hyphenated_lines_without_space() {
		let raw = format!("{FIRST} incredi-\nbly long sentence that keeps going and going on\n");
		assert_eq!(
			prepare_text(&raw),
			format!("{FIRST} incredibly long sentence that keeps going and going on")
		);
	}

	#[test]
	fn drops_short_lines_and_breaks_paragraphs() {
		let raw = format!("CHAPTER I\n{FIRST}\n\n{SECOND}\n");
		assert_eq!(prepare_text(&raw), format!("{FIRST}\n{SECOND}"));
	}
}
