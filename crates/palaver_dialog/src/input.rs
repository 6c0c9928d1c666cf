//! Editing model behind the message input box: a text buffer with a hard
//! character limit.
//!
//! Lengths, cursor positions and selections count Unicode scalar values.

use std::ops::Range;

use tracing::debug;

/// Fill level of a [`BoundedInput`], for progress indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputProgress {
	pub used: usize,
	pub max: usize,
}

impl InputProgress {
	/// `used / max` in `0.0..=1.0`; a zero limit counts as full.
	pub fn fraction(self) -> f64 {
		if self.max == 0 {
			return 1.0;
		}
		(self.used as f64 / self.max as f64).min(1.0)
	}
}

#[derive(Debug, Clone)]
pub struct BoundedInput {
	chars: Vec<char>,
	max_chars: usize,
	cursor: usize,
	selection: Option<Range<usize>>,
	active: bool,
}

impl BoundedInput {
	pub fn new(max_chars: usize) -> Self {
		Self {
			chars: Vec::new(),
			max_chars,
			cursor: 0,
			selection: None,
			active: true,
		}
	}

	pub fn max_chars(&self) -> usize {
		self.max_chars
	}

	pub fn len(&self) -> usize {
		self.chars.len()
	}

	pub fn is_empty(&self) -> bool {
		self.chars.is_empty()
	}

	pub fn text(&self) -> String {
		self.chars.iter().collect()
	}

	pub fn cursor(&self) -> usize {
		self.cursor
	}

	pub fn selection(&self) -> Option<Range<usize>> {
		self.selection.clone()
	}

	pub fn selected_text(&self) -> Option<String> {
		self.selection.as_ref().map(|r| self.chars[r.clone()].iter().collect())
	}

	pub fn progress(&self) -> InputProgress {
		InputProgress {
			used: self.chars.len(),
			max: self.max_chars,
		}
	}

	pub fn is_active(&self) -> bool {
		self.active
	}

	pub fn activate(&mut self) {
		self.active = true;
	}

	/// Freeze the buffer; edits are ignored until [`activate`](Self::activate).
	pub fn inactivate(&mut self) {
		self.active = false;
	}

	/// Move the cursor, clearing any selection.
	pub fn set_cursor(&mut self, pos: usize) {
		self.cursor = pos.min(self.chars.len());
		self.selection = None;
	}

	/// Select `range` (clamped to the buffer); the cursor moves to its end.
	pub fn select(&mut self, range: Range<usize>) {
		let len = self.chars.len();
		let start = range.start.min(len);
		let end = range.end.clamp(start, len);
		self.cursor = end;
		self.selection = (start < end).then_some(start..end);
	}

	pub fn move_left(&mut self) {
		self.set_cursor(self.cursor.saturating_sub(1));
	}

	pub fn move_right(&mut self) {
		self.set_cursor(self.cursor + 1);
	}

	/// Type one character.
	///
	/// Refused once the buffer holds `max_chars` characters, even if a
	/// selection would be replaced.
	pub fn insert_char(&mut self, c: char) -> bool {
		if !self.active || self.chars.len() >= self.max_chars {
			return false;
		}
		self.delete_selection();
		self.chars.insert(self.cursor, c);
		self.cursor += 1;
		true
	}

	pub fn backspace(&mut self) {
		if !self.active || self.delete_selection() {
			return;
		}
		if self.cursor > 0 {
			self.cursor -= 1;
			self.chars.remove(self.cursor);
		}
	}

	pub fn delete(&mut self) {
		if !self.active || self.delete_selection() {
			return;
		}
		if self.cursor < self.chars.len() {
			self.chars.remove(self.cursor);
		}
	}

	/// Paste clipboard text over the selection, cut to the remaining room.
	///
	/// Returns the number of characters inserted.
	pub fn paste(&mut self, clipboard: &str) -> usize {
		if !self.active {
			return 0;
		}

		let selected = self.selection.as_ref().map_or(0, |r| r.len());
		let room = self.max_chars.saturating_sub(self.chars.len() - selected);
		let pasted: Vec<char> = clipboard.chars().take(room).collect();
		let offered = clipboard.chars().count();
		if pasted.len() < offered {
			debug!(offered, kept = pasted.len(), max = self.max_chars, "paste truncated");
		}

		self.delete_selection();
		let n = pasted.len();
		let tail = self.chars.split_off(self.cursor);
		self.chars.extend(pasted);
		self.chars.extend(tail);
		self.cursor += n;
		n
	}

	/// Return the buffer contents and clear it.
	pub fn take_text(&mut self) -> String {
		let text = self.text();
		self.clear();
		text
	}

	pub fn clear(&mut self) {
		self.chars.clear();
		self.cursor = 0;
		self.selection = None;
	}

	fn delete_selection(&mut self) -> bool {
		match self.selection.take() {
			Some(range) => {
				self.cursor = range.start;
				self.chars.drain(range);
				true
			}
			None => false,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn typed(max: usize, s: &str) -> BoundedInput {
		let mut input = BoundedInput::new(max);
		for c in s.chars() {
			input.insert_char(c);
		}
		input
	}

	#[test]
	fn typing_stops_at_limit() {
		let mut input = typed(3, "abcd");
		assert_eq!(input.text(), "abc");
		assert!(!input.insert_char('x'));

		input.backspace();
		assert!(input.insert_char('z'));
		assert_eq!(input.text(), "abz");
	}

	#[test]
	fn full_buffer_refuses_typing_over_selection() {
		let mut input = typed(3, "abc");
		input.select(0..2);
		assert!(!input.insert_char('x'));
		assert_eq!(input.text(), "abc");
	}

	#[test]
	fn typing_replaces_selection_below_limit() {
		let mut input = typed(10, "hello");
		input.select(1..4);
		assert!(input.insert_char('E'));
		assert_eq!(input.text(), "hEo");
		assert_eq!(input.cursor(), 2);
	}

	#[test]
	fn paste_is_truncated_to_room() {
		let mut input = typed(5, "ab");
		assert_eq!(input.paste("123456"), 3);
		assert_eq!(input.text(), "ab123");
		assert_eq!(input.paste("x"), 0);
	}

	#[test]
	fn paste_over_selection_counts_freed_room() {
		let mut input = typed(5, "abcde");
		input.select(1..3);
		assert_eq!(input.paste("WXYZ"), 2);
		assert_eq!(input.text(), "aWXde");
	}

	#[test]
	fn paste_counts_chars_not_bytes() {
		let mut input = BoundedInput::new(3);
		assert_eq!(input.paste("привет"), 3);
		assert_eq!(input.text(), "при");
		assert_eq!(input.progress(), InputProgress { used: 3, max: 3 });
	}

	#[test]
	fn editing_keys_move_and_delete() {
		let mut input = typed(10, "abc");
		input.move_left();
		input.move_left();
		input.delete();
		assert_eq!(input.text(), "ac");
		input.backspace();
		assert_eq!(input.text(), "c");
		input.move_left();
		input.backspace();
		assert_eq!(input.text(), "c");
	}

	#[test]
	fn inactive_input_ignores_edits() {
		let mut input = typed(10, "hi");
		input.inactivate();
		assert!(!input.insert_char('!'));
		assert_eq!(input.paste("there"), 0);
		input.backspace();
		assert_eq!(input.text(), "hi");

		input.activate();
		assert!(input.insert_char('!'));
	}

	#[test]
	fn take_text_clears_and_resets_progress() {
		let mut input = typed(4, "ab");
		assert!((input.progress().fraction() - 0.5).abs() < f64::EPSILON);
		assert_eq!(input.take_text(), "ab");
		assert!(input.is_empty());
		assert_eq!(input.progress().used, 0);
	}

	#[test]
	fn select_is_clamped() {
		let mut input = typed(10, "abc");
		input.select(2..99);
		assert_eq!(input.selected_text().as_deref(), Some("c"));
		input.select(5..1);
		assert_eq!(input.selection(), None);
	}
}
