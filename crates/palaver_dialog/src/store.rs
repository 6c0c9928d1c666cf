//! Time-ordered message log of a single dialog.

use std::collections::HashSet;

use chrono::{DateTime, FixedOffset, Offset as _, Utc};
use palaver_domain::{MessageId, TextMessage};
use tracing::{debug, info, warn};

use crate::render::rendered_lines;

/// Where a renderer must surface a newly stored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
	/// After every message already shown.
	End,
	/// Before the message currently at `index`, whose first text line is `line` (1-based).
	At { index: usize, line: usize },
}

/// Outcome of [`DialogMessageStore::receive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertResult {
	/// A message with the same id is already stored; nothing changed.
	Duplicate,
	/// Stored as the newest message.
	Appended,
	/// Stored at `index` because it is older than the newest message.
	InsertedAt { index: usize, line: usize },
}

impl InsertResult {
	/// Insertion descriptor for the renderer, `None` for duplicates.
	pub fn position(self) -> Option<InsertPosition> {
		match self {
			InsertResult::Duplicate => None,
			InsertResult::Appended => Some(InsertPosition::End),
			InsertResult::InsertedAt { index, line } => Some(InsertPosition::At { index, line }),
		}
	}

	pub fn is_duplicate(self) -> bool {
		matches!(self, InsertResult::Duplicate)
	}
}

/// Outcome of [`DialogMessageStore::load_history`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryMerge {
	/// Messages that were not stored before, oldest first.
	pub inserted: Vec<TextMessage>,
	/// True when some inserted message landed before previously stored ones,
	/// so a sequential renderer has to redraw instead of appending.
	pub merged: bool,
}

/// Message log of one conversation, sorted ascending by time.
#[derive(Debug, Clone)]
pub struct DialogMessageStore {
	messages: Vec<TextMessage>,
	ids: HashSet<MessageId>,
	next_seq: u64,
	offset: FixedOffset,
}

impl Default for DialogMessageStore {
	fn default() -> Self {
		Self::new(Utc.fix())
	}
}

impl DialogMessageStore {
	/// Empty store stamping local messages in `offset`.
	pub fn new(offset: FixedOffset) -> Self {
		Self {
			messages: Vec::new(),
			ids: HashSet::new(),
			next_seq: 0,
			offset,
		}
	}

	pub fn messages(&self) -> &[TextMessage] {
		&self.messages
	}

	pub fn len(&self) -> usize {
		self.messages.len()
	}

	pub fn is_empty(&self) -> bool {
		self.messages.is_empty()
	}

	pub fn last(&self) -> Option<&TextMessage> {
		self.messages.last()
	}

	pub fn exists(&self, id: &MessageId) -> bool {
		self.ids.contains(id)
	}

	pub fn get(&self, id: &MessageId) -> Option<&TextMessage> {
		if !self.exists(id) {
			return None;
		}
		self.messages.iter().find(|m| &m.id == id)
	}

	/// Id the next local message will receive.
	pub fn next_id(&self) -> MessageId {
		MessageId::local(self.next_seq)
	}

	/// First text line (1-based) of the message at `index`.
	///
	/// `index == len()` yields the line right after the last message.
	pub fn line_of(&self, index: usize) -> usize {
		let upto = index.min(self.messages.len());
		1 + self.messages[..upto].iter().map(|m| rendered_lines(&m.body)).sum::<usize>()
	}

	/// Lines occupied by the whole transcript.
	pub fn total_lines(&self) -> usize {
		self.line_of(self.messages.len()) - 1
	}

	/// Record a message typed by the local user, stamped with the current time.
	///
	/// Returns `None` (and stores nothing) for a blank body or once the id
	/// counter is exhausted.
	pub fn append_local(&mut self, author: &str, body: &str) -> Option<TextMessage> {
		let now = Utc::now().with_timezone(&self.offset);
		self.append_local_at(author, body, now)
	}

	/// [`append_local`](Self::append_local) with an explicit send time.
	///
	/// A time earlier than the newest stored message is raised to it, so the
	/// local message stays last without breaking the ordering.
	pub fn append_local_at(&mut self, author: &str, body: &str, time: DateTime<FixedOffset>) -> Option<TextMessage> {
		if body.trim().is_empty() {
			return None;
		}

		let time = match self.messages.last() {
			Some(last) if time < last.time => {
				debug!(requested = %time, newest = %last.time, "local clock behind newest message; clamping");
				last.time.with_timezone(time.offset())
			}
			_ => time,
		};

		let id = self.next_id();
		let Some(next_seq) = self.next_seq.checked_add(1) else {
			warn!(id = %id, "local id counter exhausted; message not stored");
			return None;
		};

		let message = TextMessage::new(id, time, author, body);
		self.next_seq = next_seq;
		self.ids.insert(message.id.clone());
		self.messages.push(message.clone());
		Some(message)
	}

	/// Store a message delivered by a peer, keeping time order.
	pub fn receive(&mut self, message: TextMessage) -> InsertResult {
		if self.exists(&message.id) {
			debug!(id = %message.id, "duplicate message dropped");
			return InsertResult::Duplicate;
		}

		self.observe_id(&message.id);
		self.ids.insert(message.id.clone());

		let is_late = self.messages.last().is_some_and(|last| message.time < last.time);
		if is_late {
			let index = self
				.messages
				.iter()
				.position(|m| message.time < m.time)
				.unwrap_or(self.messages.len());
			let line = self.line_of(index);
			debug!(id = %message.id, index, line, "out-of-order message inserted");
			self.messages.insert(index, message);
			return InsertResult::InsertedAt { index, line };
		}

		self.messages.push(message);
		InsertResult::Appended
	}

	/// Merge a batch of previously seen messages (e.g. stored history).
	pub fn load_history(&mut self, history: impl IntoIterator<Item = TextMessage>) -> HistoryMerge {
		let mut batch: Vec<TextMessage> = history.into_iter().collect();
		if batch.is_empty() {
			return HistoryMerge::default();
		}

		batch.sort_by(|a, b| a.time.cmp(&b.time));

		let newest_before = self.messages.last().map(|m| m.time);
		let offered = batch.len();
		let mut inserted = Vec::new();

		for message in batch {
			if self.exists(&message.id) {
				continue;
			}
			self.observe_id(&message.id);
			self.ids.insert(message.id.clone());
			inserted.push(message.clone());
			self.messages.push(message);
		}

		let merged = match (newest_before, inserted.first()) {
			(Some(newest), Some(first)) => first.time < newest,
			_ => false,
		};
		if merged {
			self.messages.sort_by(|a, b| a.time.cmp(&b.time));
		}

		info!(
			offered,
			inserted = inserted.len(),
			merged,
			total = self.messages.len(),
			"history loaded"
		);

		HistoryMerge { inserted, merged }
	}

	fn observe_id(&mut self, id: &MessageId) {
		// `m<u64::MAX>` has no successor to move to; treat it like a foreign id.
		if let Some(seq) = id.sequence()
			&& seq >= self.next_seq
			&& let Some(next) = seq.checked_add(1)
		{
			self.next_seq = next;
		}
	}
}
