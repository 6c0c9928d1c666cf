#![forbid(unsafe_code)]

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, FixedOffset};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors for parsing identifiers from strings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseIdError {
	#[error("empty value")]
	Empty,
	#[error("invalid format: {0}")]
	InvalidFormat(String),
}

/// Prefix of locally assigned message ids (`m0`, `m1`, ...).
pub const LOCAL_ID_PREFIX: char = 'm';

/// Message identifier, unique within one dialog.
///
/// Ids assigned by this client have the form `m<integer>`. Ids from peers are
/// accepted verbatim, empty ones included; only the `m<integer>` shape feeds
/// the local counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "String", into = "String"))]
pub struct MessageId(String);

impl MessageId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	/// Id for the `seq`-th locally sent message.
	pub fn local(seq: u64) -> Self {
		Self(format!("{LOCAL_ID_PREFIX}{seq}"))
	}

	/// Numeric suffix of an `m<integer>` id; `None` for any other shape.
	pub fn sequence(&self) -> Option<u64> {
		let digits = self.0.strip_prefix(LOCAL_ID_PREFIX)?;
		if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
			return None;
		}
		digits.parse().ok()
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
	pub fn into_string(self) -> String {
		self.0
	}
}

impl fmt::Display for MessageId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl FromStr for MessageId {
	type Err = core::convert::Infallible;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(MessageId::new(s))
	}
}

impl From<String> for MessageId {
	fn from(value: String) -> Self {
		MessageId::new(value)
	}
}

impl From<MessageId> for String {
	fn from(id: MessageId) -> Self {
		id.0
	}
}

/// Identifier of an open dialog (one tab of the chat view).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct DialogId(pub u64);

impl fmt::Display for DialogId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl FromStr for DialogId {
	type Err = ParseIdError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let s = s.trim();
		if s.is_empty() {
			return Err(ParseIdError::Empty);
		}
		s.parse::<u64>()
			.map(DialogId)
			.map_err(|_| ParseIdError::InvalidFormat(format!("expected unsigned integer, got {s}")))
	}
}

/// A text message in a dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TextMessage {
	pub id: MessageId,
	/// Send time with the sender's UTC offset.
	pub time: DateTime<FixedOffset>,
	pub author: String,
	#[cfg_attr(feature = "serde", serde(rename = "message"))]
	pub body: String,
}

impl TextMessage {
	pub fn new(id: MessageId, time: DateTime<FixedOffset>, author: impl Into<String>, body: impl Into<String>) -> Self {
		Self {
			id,
			time,
			author: author.into(),
			body: body.into(),
		}
	}

	/// Build a message from an ISO-8601 timestamp string.
	pub fn parse(id: &str, time: &str, author: impl Into<String>, body: impl Into<String>) -> Result<Self, ParseIdError> {
		let id = MessageId::new(id);
		let time = DateTime::parse_from_rfc3339(time.trim())
			.map_err(|e| ParseIdError::InvalidFormat(format!("timestamp {time}: {e}")))?;
		Ok(Self::new(id, time, author, body))
	}
}

/// A file transferred into a dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FileMessage {
	/// Base64 (standard alphabet, padded) file contents.
	pub raw_data: String,
	pub filename: String,
}

/// Kind of payload carried by a [`MessageData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
	Text,
	File,
}

impl MessageKind {
	pub const fn as_str(self) -> &'static str {
		match self {
			MessageKind::Text => "Text",
			MessageKind::File => "File",
		}
	}
}

impl fmt::Display for MessageKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Outgoing payload handed to the transport: `{"type": ..., "message": ...}`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", content = "message"))]
pub enum MessageData {
	Text(TextMessage),
	File(FileMessage),
}

impl MessageData {
	pub fn kind(&self) -> MessageKind {
		match self {
			MessageData::Text(_) => MessageKind::Text,
			MessageData::File(_) => MessageKind::File,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn local_ids_expose_sequence() {
		assert_eq!(MessageId::local(7).as_str(), "m7");
		assert_eq!(MessageId::local(7).sequence(), Some(7));
		assert_eq!("m0".parse::<MessageId>().unwrap().sequence(), Some(0));
	}

	#[test]
	fn foreign_ids_have_no_sequence() {
		for raw in ["x12", "m", "m-1", "m1a", "12", "mm3", "m 4", "", "m18446744073709551616"] {
			let id = MessageId::new(raw);
			assert_eq!(id.sequence(), None, "{raw}");
		}
	}

	#[test]
	fn dialog_ids_must_be_integers() {
		assert!("".parse::<DialogId>().is_err());
		assert!("abc".parse::<DialogId>().is_err());
		assert_eq!("42".parse::<DialogId>().unwrap(), DialogId(42));
	}

	#[test]
	fn parse_accepts_fractional_seconds_and_offset() {
		let msg = TextMessage::parse("m1", "2024-03-01T10:02:00.123456+03:00", "alice", "hi").unwrap();
		assert_eq!(msg.time.offset().local_minus_utc(), 3 * 3600);
		assert!(TextMessage::parse("m1", "yesterday", "alice", "hi").is_err());
	}

	#[cfg(feature = "serde")]
	#[test]
	fn message_data_uses_type_and_message_fields() {
		let msg = TextMessage::parse("m3", "2024-03-01T10:00:00+03:00", "bob", "hello").unwrap();
		let json = serde_json::to_value(MessageData::Text(msg.clone())).unwrap();
		assert_eq!(json["type"], "Text");
		assert_eq!(json["message"]["id"], "m3");
		assert_eq!(json["message"]["message"], "hello");

		let back: MessageData = serde_json::from_value(json).unwrap();
		assert_eq!(back, MessageData::Text(msg));
		assert_eq!(back.kind(), MessageKind::Text);
	}

	#[cfg(feature = "serde")]
	#[test]
	fn deserialize_keeps_blank_id() {
		let raw = r#"{"id":"","time":"2024-03-01T10:00:00+03:00","author":"a","message":"b"}"#;
		let msg: TextMessage = serde_json::from_str(raw).unwrap();
		assert_eq!(msg.id.as_str(), "");
		assert_eq!(msg.id.sequence(), None);
	}
}
