use std::io::Read;

use palaver_domain::{DialogId, MessageData, MessageId, TextMessage};
use rand::Rng as _;
use rand::distr::Alphanumeric;
use tracing::{debug, info};

use crate::attachment::{AttachmentError, encode_attachment};
use crate::config::DialogSettings;
use crate::input::BoundedInput;
use crate::render::format_message;
use crate::store::{DialogMessageStore, HistoryMerge, InsertResult};

/// Length of generated user and dialog names.
pub const GENERATED_NAME_LEN: usize = 12;

#[derive(Debug, thiserror::Error)]
pub enum DialogError {
	/// Sending is disabled while the peer is disconnected.
	#[error("dialog is inactive")]
	Inactive,

	#[error(transparent)]
	Attachment(#[from] AttachmentError),
}

/// One conversation with a single interlocutor.
#[derive(Debug, Clone)]
pub struct Dialog {
	id: DialogId,
	name: String,
	interlocutor_id: String,
	username: String,
	store: DialogMessageStore,
	input: BoundedInput,
	max_file_bytes: u64,
	active: bool,
	visible: bool,
}

impl Dialog {
	/// Blank `username` or `name` are replaced by random alphanumeric names.
	pub fn new(id: DialogId, interlocutor_id: impl Into<String>, username: &str, name: &str, settings: &DialogSettings) -> Self {
		Self {
			id,
			name: non_blank_or_random(name),
			interlocutor_id: interlocutor_id.into(),
			username: non_blank_or_random(username),
			store: DialogMessageStore::new(settings.utc_offset),
			input: BoundedInput::new(settings.max_text_chars),
			max_file_bytes: settings.max_file_bytes,
			active: true,
			visible: true,
		}
	}

	pub fn id(&self) -> DialogId {
		self.id
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn interlocutor_id(&self) -> &str {
		&self.interlocutor_id
	}

	pub fn username(&self) -> &str {
		&self.username
	}

	pub fn store(&self) -> &DialogMessageStore {
		&self.store
	}

	pub fn input(&self) -> &BoundedInput {
		&self.input
	}

	pub fn input_mut(&mut self) -> &mut BoundedInput {
		&mut self.input
	}

	pub fn is_active(&self) -> bool {
		self.active
	}

	pub fn is_visible(&self) -> bool {
		self.visible
	}

	/// Send the input contents as a text message.
	///
	/// Returns the payload to hand to the transport. A blank input, or an
	/// inactive dialog, sends nothing and leaves the input as is.
	pub fn send(&mut self) -> Option<MessageData> {
		if !self.active {
			return None;
		}
		let text = self.input.text();
		let message = self.store.append_local(&self.username, &text)?;
		self.input.clear();
		debug!(dialog = %self.id, id = %message.id, "message sent");
		Some(MessageData::Text(message))
	}

	pub fn receive(&mut self, message: TextMessage) -> InsertResult {
		self.store.receive(message)
	}

	pub fn load_history(&mut self, history: impl IntoIterator<Item = TextMessage>) -> HistoryMerge {
		self.store.load_history(history)
	}

	pub fn exists(&self, id: &MessageId) -> bool {
		self.store.exists(id)
	}

	/// Wrap a dropped file as a payload for the transport.
	pub fn attach<R: Read>(&self, reader: R, filename: &str) -> Result<MessageData, DialogError> {
		if !self.active {
			debug!(dialog = %self.id, filename, "attachment ignored: dialog inactive");
			return Err(DialogError::Inactive);
		}
		let file = encode_attachment(reader, filename, self.max_file_bytes)?;
		Ok(MessageData::File(file))
	}

	/// Whole conversation as rendered text.
	pub fn transcript(&self) -> String {
		self.store.messages().iter().map(format_message).collect()
	}

	/// Enable the input and sending.
	pub fn activate(&mut self) {
		self.active = true;
		self.input.activate();
		info!(dialog = %self.id, interlocutor = %self.interlocutor_id, "dialog activated");
	}

	/// Disable the input and sending; the history stays readable.
	pub fn inactivate(&mut self) {
		self.active = false;
		self.input.inactivate();
		info!(dialog = %self.id, interlocutor = %self.interlocutor_id, "dialog inactivated");
	}

	pub(crate) fn set_visible(&mut self, visible: bool) {
		self.visible = visible;
	}
}

fn non_blank_or_random(s: &str) -> String {
	if s.trim().is_empty() {
		random_name()
	} else {
		s.to_string()
	}
}

/// Random alphanumeric name of [`GENERATED_NAME_LEN`] characters.
pub fn random_name() -> String {
	rand::rng()
		.sample_iter(Alphanumeric)
		.take(GENERATED_NAME_LEN)
		.map(char::from)
		.collect()
}
