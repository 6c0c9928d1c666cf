use std::collections::HashMap;

use palaver_domain::{DialogId, TextMessage};
use tracing::{debug, info};

use crate::config::DialogSettings;
use crate::dialog::Dialog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
	#[error("no dialog with id {0}")]
	UnavailableDialogId(DialogId),

	#[error("no dialog is selected")]
	EmptyActiveDialog,

	#[error("dialog ids exhausted")]
	DialogIdsExhausted,
}

/// Open dialogs of the chat view, in tab order.
#[derive(Debug)]
pub struct DialogRegistry {
	dialogs: HashMap<DialogId, Dialog>,
	tabs: Vec<DialogId>,
	current: Option<DialogId>,
	username: String,
	settings: DialogSettings,
	/// `None` once `DialogId(u64::MAX)` has been handed out.
	next_dialog_id: Option<u64>,
}

impl DialogRegistry {
	pub fn new(username: impl Into<String>, settings: DialogSettings) -> Self {
		Self::with_first_id(username, settings, DialogId(0))
	}

	/// Registry whose first dialog gets `first`; ids then count up from it.
	pub fn with_first_id(username: impl Into<String>, settings: DialogSettings, first: DialogId) -> Self {
		Self {
			dialogs: HashMap::new(),
			tabs: Vec::new(),
			current: None,
			username: username.into(),
			settings,
			next_dialog_id: Some(first.0),
		}
	}

	pub fn username(&self) -> &str {
		&self.username
	}

	/// Name used as author for dialogs opened from now on.
	pub fn set_username(&mut self, username: impl Into<String>) {
		self.username = username.into();
		info!(username = %self.username, "username changed");
	}

	pub fn settings(&self) -> &DialogSettings {
		&self.settings
	}

	/// Open a dialog with `interlocutor_id`, load its history and select it.
	pub fn add_dialog(
		&mut self,
		dialog_name: &str,
		interlocutor_id: &str,
		history: impl IntoIterator<Item = TextMessage>,
	) -> Result<DialogId, RegistryError> {
		let id = DialogId(self.next_dialog_id.ok_or(RegistryError::DialogIdsExhausted)?);
		self.next_dialog_id = id.0.checked_add(1);

		let mut dialog = Dialog::new(id, interlocutor_id, &self.username, dialog_name, &self.settings);
		let merge = dialog.load_history(history);

		self.dialogs.insert(id, dialog);
		self.tabs.push(id);
		self.current = Some(id);

		info!(
			dialog = %id,
			interlocutor = interlocutor_id,
			history = merge.inserted.len(),
			"dialog added"
		);
		Ok(id)
	}

	/// Disable sending in a dialog. Unknown ids are ignored.
	pub fn inactivate_dialog(&mut self, id: DialogId) {
		if let Some(dialog) = self.dialogs.get_mut(&id) {
			dialog.inactivate();
		}
	}

	/// Hide a dialog's tab. Unknown ids are ignored.
	pub fn hide_dialog(&mut self, id: DialogId) {
		if let Some(dialog) = self.dialogs.get_mut(&id) {
			dialog.set_visible(false);
			if self.current == Some(id) {
				self.current = self
					.tabs
					.iter()
					.rev()
					.copied()
					.find(|t| self.dialogs.get(t).is_some_and(Dialog::is_visible));
			}
			debug!(dialog = %id, current = ?self.current, "dialog hidden");
		}
	}

	/// Show a dialog again and enable sending. Unknown ids are ignored.
	pub fn load_dialog(&mut self, id: DialogId) {
		if let Some(dialog) = self.dialogs.get_mut(&id) {
			if !dialog.is_visible() {
				dialog.set_visible(true);
			}
			dialog.activate();
		}
	}

	/// Make `id` the current tab.
	pub fn select(&mut self, id: DialogId) -> Result<(), RegistryError> {
		let dialog = self.dialogs.get(&id).ok_or(RegistryError::UnavailableDialogId(id))?;
		if !dialog.is_visible() {
			return Err(RegistryError::UnavailableDialogId(id));
		}
		self.current = Some(id);
		Ok(())
	}

	pub fn size(&self) -> usize {
		self.dialogs.len()
	}

	pub fn get_dialog(&self, id: DialogId) -> Result<&Dialog, RegistryError> {
		self.dialogs.get(&id).ok_or(RegistryError::UnavailableDialogId(id))
	}

	pub fn get_dialog_mut(&mut self, id: DialogId) -> Result<&mut Dialog, RegistryError> {
		self.dialogs.get_mut(&id).ok_or(RegistryError::UnavailableDialogId(id))
	}

	pub fn current_dialog(&self) -> Result<&Dialog, RegistryError> {
		self.current
			.and_then(|id| self.dialogs.get(&id))
			.ok_or(RegistryError::EmptyActiveDialog)
	}

	pub fn current_dialog_mut(&mut self) -> Result<&mut Dialog, RegistryError> {
		self.current
			.and_then(|id| self.dialogs.get_mut(&id))
			.ok_or(RegistryError::EmptyActiveDialog)
	}

	/// Most recently opened dialog with `interlocutor_id`.
	pub fn find_by_interlocutor(&self, interlocutor_id: &str) -> Option<DialogId> {
		self.tabs
			.iter()
			.rev()
			.copied()
			.find(|id| self.dialogs.get(id).is_some_and(|d| d.interlocutor_id() == interlocutor_id))
	}

	/// Dialogs in tab order, hidden ones included.
	pub fn tabs(&self) -> impl Iterator<Item = &Dialog> {
		self.tabs.iter().filter_map(|id| self.dialogs.get(id))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn registry() -> DialogRegistry {
		DialogRegistry::new("alice", DialogSettings::default())
	}

	fn history() -> Vec<TextMessage> {
		vec![
			TextMessage::parse("m4", "2024-03-01T09:00:00+03:00", "bob", "later").unwrap(),
			TextMessage::parse("m1", "2024-03-01T08:00:00+03:00", "bob", "earlier").unwrap(),
		]
	}

	#[test]
	fn ids_come_from_injected_counter() {
		let mut reg = DialogRegistry::with_first_id("alice", DialogSettings::default(), DialogId(10));
		assert_eq!(reg.add_dialog("a", "pa", Vec::new()).unwrap(), DialogId(10));
		assert_eq!(reg.add_dialog("b", "pb", Vec::new()).unwrap(), DialogId(11));
		assert_eq!(reg.size(), 2);

		let other = DialogRegistry::new("bob", DialogSettings::default());
		assert_eq!(other.size(), 0);
	}

	#[test]
	fn last_dialog_id_is_handed_out_once() {
		let mut reg = DialogRegistry::with_first_id("alice", DialogSettings::default(), DialogId(u64::MAX));
		let last = reg.add_dialog("a", "pa", Vec::new()).unwrap();
		assert_eq!(last, DialogId(u64::MAX));

		assert_eq!(reg.add_dialog("b", "pb", Vec::new()), Err(RegistryError::DialogIdsExhausted));
		assert_eq!(reg.size(), 1);
		assert_eq!(reg.current_dialog().unwrap().id(), last);
	}

	#[test]
	fn add_dialog_loads_history_and_selects() {
		let mut reg = registry();
		let id = reg.add_dialog("Bob", "bob-id", history()).unwrap();

		let current = reg.current_dialog().unwrap();
		assert_eq!(current.id(), id);
		assert_eq!(current.username(), "alice");
		let ids: Vec<&str> = current.store().messages().iter().map(|m| m.id.as_str()).collect();
		assert_eq!(ids, ["m1", "m4"]);
		assert_eq!(current.store().next_id().as_str(), "m5");
	}

	#[test]
	fn unknown_and_missing_dialogs_are_errors() {
		let mut reg = registry();
		assert_eq!(reg.current_dialog().unwrap_err(), RegistryError::EmptyActiveDialog);
		assert_eq!(
			reg.get_dialog(DialogId(7)).unwrap_err(),
			RegistryError::UnavailableDialogId(DialogId(7))
		);
		assert!(reg.select(DialogId(7)).is_err());

		reg.inactivate_dialog(DialogId(7));
		reg.hide_dialog(DialogId(7));
		reg.load_dialog(DialogId(7));
		assert_eq!(reg.size(), 0);
	}

	#[test]
	fn inactivate_then_load_reenables() {
		let mut reg = registry();
		let id = reg.add_dialog("Bob", "bob-id", Vec::new()).unwrap();

		reg.inactivate_dialog(id);
		assert!(!reg.get_dialog(id).unwrap().is_active());

		reg.hide_dialog(id);
		assert!(!reg.get_dialog(id).unwrap().is_visible());
		assert_eq!(reg.current_dialog().unwrap_err(), RegistryError::EmptyActiveDialog);

		reg.load_dialog(id);
		let d = reg.get_dialog(id).unwrap();
		assert!(d.is_active() && d.is_visible());
		reg.select(id).unwrap();
		assert_eq!(reg.current_dialog().unwrap().id(), id);
	}

	#[test]
	fn hiding_current_falls_back_to_last_visible_tab() {
		let mut reg = registry();
		let a = reg.add_dialog("A", "pa", Vec::new()).unwrap();
		let b = reg.add_dialog("B", "pb", Vec::new()).unwrap();

		reg.hide_dialog(b);
		assert_eq!(reg.current_dialog().unwrap().id(), a);
	}

	#[test]
	fn username_applies_to_new_dialogs() {
		let mut reg = registry();
		let first = reg.add_dialog("A", "pa", Vec::new()).unwrap();
		reg.set_username("carol");
		let second = reg.add_dialog("B", "pb", Vec::new()).unwrap();

		assert_eq!(reg.get_dialog(first).unwrap().username(), "alice");
		assert_eq!(reg.get_dialog(second).unwrap().username(), "carol");
	}

	#[test]
	fn find_by_interlocutor_prefers_newest_tab() {
		let mut reg = registry();
		let old = reg.add_dialog("Bob", "bob-id", Vec::new()).unwrap();
		reg.add_dialog("Eve", "eve-id", Vec::new()).unwrap();
		assert_eq!(reg.find_by_interlocutor("bob-id"), Some(old));

		let newer = reg.add_dialog("Bob again", "bob-id", Vec::new()).unwrap();
		assert_eq!(reg.find_by_interlocutor("bob-id"), Some(newer));
		assert_eq!(reg.find_by_interlocutor("nobody"), None);
		assert_eq!(reg.tabs().count(), 3);
	}
}
