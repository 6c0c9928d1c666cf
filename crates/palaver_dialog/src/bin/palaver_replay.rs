#![forbid(unsafe_code)]

use std::io::Read as _;
use std::path::PathBuf;

use anyhow::Context as _;
use palaver_dialog::{DialogRegistry, load_dialog_settings, load_dialog_settings_from_path};
use palaver_domain::TextMessage;
use tracing::{info, warn};

fn usage_and_exit() -> ! {
	eprintln!(
		"Usage: palaver_replay [--config path] [--history path] [--author name] [--peer id] [--send text]...\n\
\n\
Options:\n\
	--config   Config file (default: ~/.palaver/config.toml)\n\
	--history  JSON array or JSON lines of messages (default: stdin)\n\
	--author   Local user name (default: random)\n\
	--peer     Interlocutor id (default: peer)\n\
	--send     Message to send after loading history (repeatable)\n\
	--help     Show this help\n\
\n\
Examples:\n\
	palaver_replay --history dialog.json\n\
	cat dialog.jsonl | palaver_replay --author alice --send 'see you'\n"
	);
	std::process::exit(2)
}

fn init_tracing() {
	let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info,palaver_dialog=debug".to_string());
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(false)
		.with_writer(std::io::stderr)
		.init();
}

struct Args {
	config: Option<PathBuf>,
	history: Option<PathBuf>,
	author: String,
	peer: String,
	sends: Vec<String>,
}

fn parse_args() -> Args {
	let mut args = Args {
		config: None,
		history: None,
		author: String::new(),
		peer: "peer".to_string(),
		sends: Vec::new(),
	};

	let mut it = std::env::args().skip(1);
	while let Some(arg) = it.next() {
		match arg.as_str() {
			"--help" | "-h" => usage_and_exit(),
			"--config" => args.config = Some(PathBuf::from(it.next().unwrap_or_else(|| usage_and_exit()))),
			"--history" => args.history = Some(PathBuf::from(it.next().unwrap_or_else(|| usage_and_exit()))),
			"--author" => args.author = it.next().unwrap_or_else(|| usage_and_exit()),
			"--peer" => {
				let v = it.next().unwrap_or_else(|| usage_and_exit());
				if v.trim().is_empty() {
					eprintln!("--peer must be non-empty");
					usage_and_exit();
				}
				args.peer = v;
			}
			"--send" => args.sends.push(it.next().unwrap_or_else(|| usage_and_exit())),
			other => {
				eprintln!("Unknown argument: {other}");
				usage_and_exit();
			}
		}
	}

	args
}

/// Accept either a JSON array or one JSON object per line.
fn parse_history(raw: &str) -> anyhow::Result<Vec<TextMessage>> {
	let trimmed = raw.trim_start();
	if trimmed.is_empty() {
		return Ok(Vec::new());
	}
	if trimmed.starts_with('[') {
		return serde_json::from_str(trimmed).context("parse history JSON array");
	}

	raw.lines()
		.enumerate()
		.filter(|(_, line)| !line.trim().is_empty())
		.map(|(n, line)| serde_json::from_str(line).with_context(|| format!("parse history line {}", n + 1)))
		.collect()
}

fn main() -> anyhow::Result<()> {
	init_tracing();
	let args = parse_args();

	let settings = match &args.config {
		Some(path) => load_dialog_settings_from_path(path)?,
		None => load_dialog_settings()?,
	};

	let raw = match &args.history {
		Some(path) => std::fs::read_to_string(path).with_context(|| format!("read history {}", path.display()))?,
		None => {
			let mut s = String::new();
			std::io::stdin().read_to_string(&mut s).context("read history from stdin")?;
			s
		}
	};
	let history = parse_history(&raw)?;
	info!(messages = history.len(), "history parsed");

	let mut registry = DialogRegistry::new(args.author, settings);
	let id = registry.add_dialog(&args.peer, &args.peer, history)?;
	let dialog = registry.get_dialog_mut(id)?;

	for text in &args.sends {
		let inserted = dialog.input_mut().paste(text);
		if inserted < text.chars().count() {
			warn!(inserted, "message truncated to input limit");
		}
		match dialog.send() {
			Some(payload) => eprintln!("> {}", serde_json::to_string(&payload)?),
			None => warn!("message not sent: blank body or local ids exhausted"),
		}
	}

	print!("{}", dialog.transcript());
	Ok(())
}
