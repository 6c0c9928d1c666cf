use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, anyhow};
use chrono::{FixedOffset, Offset as _};
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Default character limit of the message input.
pub const DEFAULT_MAX_TEXT_CHARS: usize = 5000;

/// Default size limit of a dropped file.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// Default offset for local timestamps (UTC+03:00).
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 180;

/// Default config path: `~/.palaver/config.toml`.
pub fn default_config_path() -> anyhow::Result<PathBuf> {
	let home = dirs::home_dir().ok_or_else(|| anyhow!("could not determine home directory"))?;
	Ok(home.join(".palaver").join("config.toml"))
}

/// Load dialog settings from the default path and env overrides.
pub fn load_dialog_settings() -> anyhow::Result<DialogSettings> {
	let path = default_config_path()?;
	load_dialog_settings_from_path(&path)
}

/// Same as `load_dialog_settings` but with an explicit config path.
pub fn load_dialog_settings_from_path(path: &Path) -> anyhow::Result<DialogSettings> {
	let file_cfg = read_config_file(path)
		.with_context(|| format!("read config from {}", path.display()))?
		.unwrap_or_default();

	let mut cfg = DialogSettings::from_file(file_cfg);

	apply_env_overrides(&mut cfg);

	Ok(cfg)
}

/// Limits and locale shared by every dialog of a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogSettings {
	/// Character limit of the message input.
	pub max_text_chars: usize,
	/// Largest file accepted for transfer, in bytes.
	pub max_file_bytes: u64,
	/// Offset applied to locally sent messages.
	pub utc_offset: FixedOffset,
}

impl Default for DialogSettings {
	fn default() -> Self {
		Self {
			max_text_chars: DEFAULT_MAX_TEXT_CHARS,
			max_file_bytes: DEFAULT_MAX_FILE_BYTES,
			utc_offset: offset_from_minutes(DEFAULT_UTC_OFFSET_MINUTES).unwrap_or_else(utc),
		}
	}
}

fn utc() -> FixedOffset {
	chrono::Utc.fix()
}

fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
	minutes.checked_mul(60).and_then(FixedOffset::east_opt)
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FileConfig {
	#[serde(default)]
	dialog: FileDialogSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FileDialogSettings {
	max_text_chars: Option<usize>,
	max_file_bytes: Option<u64>,
	utc_offset_minutes: Option<i32>,
}

impl DialogSettings {
	fn from_file(file: FileConfig) -> Self {
		let defaults = Self::default();

		let utc_offset = match file.dialog.utc_offset_minutes {
			Some(minutes) => offset_from_minutes(minutes).unwrap_or_else(|| {
				warn!(minutes, "dialog config: utc_offset_minutes out of range; using default");
				defaults.utc_offset
			}),
			None => defaults.utc_offset,
		};

		Self {
			max_text_chars: file
				.dialog
				.max_text_chars
				.filter(|v| *v > 0)
				.unwrap_or(defaults.max_text_chars),
			max_file_bytes: file.dialog.max_file_bytes.unwrap_or(defaults.max_file_bytes),
			utc_offset,
		}
	}
}

/// Parsed `[dialog]` file, or `None` when there is no file at `path`.
fn read_config_file(path: &Path) -> anyhow::Result<Option<FileConfig>> {
	let raw = match fs::read_to_string(path) {
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
			debug!(path = %path.display(), "no dialog config file; using defaults");
			return Ok(None);
		}
		other => other.context("read dialog config file")?,
	};
	toml::from_str(&raw).map(Some).context("parse dialog config TOML")
}

fn apply_env_overrides(cfg: &mut DialogSettings) {
	if let Ok(v) = std::env::var("PALAVER_MAX_TEXT_CHARS")
		&& let Ok(max) = v.trim().parse::<usize>()
		&& max > 0
	{
		cfg.max_text_chars = max;
		info!(max, "dialog config: max_text_chars overridden by env");
	}

	if let Ok(v) = std::env::var("PALAVER_MAX_FILE_BYTES")
		&& let Ok(max) = v.trim().parse::<u64>()
	{
		cfg.max_file_bytes = max;
		info!(max, "dialog config: max_file_bytes overridden by env");
	}

	if let Ok(v) = std::env::var("PALAVER_UTC_OFFSET_MINUTES")
		&& let Ok(minutes) = v.trim().parse::<i32>()
	{
		match offset_from_minutes(minutes) {
			Some(offset) => {
				cfg.utc_offset = offset;
				info!(minutes, "dialog config: utc_offset overridden by env");
			}
			None => warn!(minutes, "dialog config: PALAVER_UTC_OFFSET_MINUTES out of range; ignored"),
		}
	}
}
