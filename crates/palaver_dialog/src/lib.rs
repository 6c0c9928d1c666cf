#![forbid(unsafe_code)]

//! Headless chat dialogs: a time-ordered message store per conversation,
//! the bounded input box, file attachments and the tabbed dialog registry.
//!
//! Rendering is left to the caller; the store reports where each message
//! must appear (see [`InsertPosition`]).

pub mod attachment;
pub mod config;
pub mod dialog;
pub mod input;
pub mod registry;
pub mod render;
pub mod store;

pub use attachment::{AttachmentError, decode_attachment, encode_attachment};
pub use config::{DialogSettings, load_dialog_settings, load_dialog_settings_from_path};
pub use dialog::{Dialog, DialogError};
pub use input::{BoundedInput, InputProgress};
pub use registry::{DialogRegistry, RegistryError};
pub use store::{DialogMessageStore, HistoryMerge, InsertPosition, InsertResult};
