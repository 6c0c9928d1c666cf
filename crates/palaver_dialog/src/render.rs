//! Text layout helpers for presentation layers that render a dialog as lines.

use palaver_domain::TextMessage;

/// `strftime` pattern for the timestamp prefix.
pub const TIME_FORMAT: &str = "%d.%m.%Y - %H:%M:%S";

/// Render a message as a single transcript entry, newline terminated.
///
/// The time is shown in the offset it was sent with.
pub fn format_message(message: &TextMessage) -> String {
	format!(
		"[{}] {}: {}\n",
		message.time.format(TIME_FORMAT),
		message.author,
		message.body
	)
}

/// Length in chars of the `[time] author:` header of a formatted entry.
///
/// Renderers use it to style the header span differently from the body.
pub fn header_len(formatted: &str) -> usize {
	match formatted.find(": ") {
		Some(byte_idx) => formatted[..byte_idx].chars().count() + 1,
		None => 0,
	}
}

/// Number of text lines a message body occupies once formatted.
pub fn rendered_lines(body: &str) -> usize {
	body.matches('\n').count() + 1
}

#[cfg(test)]
mod tests {
	use super::*;

	fn msg(body: &str) -> TextMessage {
		TextMessage::parse("m0", "2024-03-01T09:05:07+03:00", "alice", body).unwrap()
	}

	#[test]
	fn formats_in_sender_offset() {
		assert_eq!(format_message(&msg("hi")), "[01.03.2024 - 09:05:07] alice: hi\n");
	}

	#[test]
	fn header_covers_time_and_author() {
		let line = format_message(&msg("a: b"));
		let header: String = line.chars().take(header_len(&line)).collect();
		assert_eq!(header, "[01.03.2024 - 09:05:07] alice:");
	}

	#[test]
	fn header_len_counts_chars_not_bytes() {
		let m = TextMessage::parse("m0", "2024-03-01T09:05:07+03:00", "алиса", "x").unwrap();
		let line = format_message(&m);
		assert_eq!(header_len(&line), "[01.03.2024 - 09:05:07] алиса:".chars().count());
	}

	#[test]
	fn counts_body_lines() {
		assert_eq!(rendered_lines("one"), 1);
		assert_eq!(rendered_lines("one\ntwo"), 2);
		assert_eq!(rendered_lines("one\ntwo\n"), 3);
	}
}
