use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "soot")]
#[command(about = "SOOT client - session management and clipboard ingestion")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format: json (default) or text
	#[arg(short = 'f', long, global = true, value_enum, default_value = "json")]
	pub format: OutputFormat,

	/// Client config file (defaults to ./config.json when present)
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Session store file (defaults to $XDG_CONFIG_HOME/soot/session.json)
	#[arg(long, global = true, value_name = "FILE")]
	pub session: Option<PathBuf>,

	/// Auth backend base URL, overriding config and SOOT_API_URL
	#[arg(long, global = true, value_name = "URL")]
	pub api_url: Option<String>,

	/// Mash backend base URL, overriding config and SOOT_MASH_URL
	#[arg(long, global = true, value_name = "URL")]
	pub mash_url: Option<String>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Exchange an OAuth authorization code for a session
	Login(LoginArgs),

	/// Show the stored session and its renewal schedule
	Status,

	/// Renew the access token now
	Refresh,

	/// Clear the stored session
	Logout,

	/// Correlate a clipboard snapshot and submit it to the mash backend
	Ingest(IngestArgs),
}

impl Commands {
	pub fn name(&self) -> &'static str {
		match self {
			Commands::Login(_) => "login",
			Commands::Status => "status",
			Commands::Refresh => "refresh",
			Commands::Logout => "logout",
			Commands::Ingest(_) => "ingest",
		}
	}
}

#[derive(Args, Debug, Clone)]
pub struct LoginArgs {
	/// Authorization code returned by the OAuth consent screen
	#[arg(long, value_name = "CODE")]
	pub code: String,
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
	/// Snapshot file: JSON array of clipboard items
	#[arg(long, value_name = "FILE")]
	pub snapshot: PathBuf,

	/// Correlate only; do not post to the backend
	#[arg(long)]
	pub no_submit: bool,

	/// Concatenate metadata from every item instead of keeping the last
	#[arg(long)]
	pub accumulate: bool,
}
