//! Command implementations.
//!
//! Each command returns its data; [`dispatch`] wraps it in the output
//! envelope.

mod ingest;
mod login;
mod session;

use serde::Serialize;

use crate::cli::{Cli, Commands};
use crate::context::CommandContext;
use crate::error::Result;
use crate::output::{self, DiagnosticLevel, OutputFormat, ResultBuilder};

/// Data plus any warnings worth surfacing in the envelope.
pub struct CommandOutcome<T: Serialize> {
	pub data: T,
	pub warnings: Vec<String>,
}

impl<T: Serialize> CommandOutcome<T> {
	pub fn new(data: T) -> Self {
		Self {
			data,
			warnings: Vec::new(),
		}
	}
}

pub async fn dispatch(cli: Cli, format: OutputFormat) -> Result<()> {
	let ctx = CommandContext::build(&cli)?;
	let name = cli.command.name();

	match cli.command {
		Commands::Login(args) => emit(name, CommandOutcome::new(login::execute(&ctx, &args).await?), format),
		Commands::Status => emit(name, CommandOutcome::new(session::status(&ctx)), format),
		Commands::Refresh => emit(name, CommandOutcome::new(session::refresh(&ctx).await?), format),
		Commands::Logout => emit(name, CommandOutcome::new(session::logout(&ctx)), format),
		Commands::Ingest(args) => emit(name, ingest::execute(&ctx, &args).await?, format),
	}
	Ok(())
}

fn emit<T: Serialize>(command: &str, outcome: CommandOutcome<T>, format: OutputFormat) {
	let builder = outcome
		.warnings
		.into_iter()
		.fold(ResultBuilder::new(command), |b, w| b.diagnostic(DiagnosticLevel::Warning, w));
	output::print_result(&builder.data(outcome.data).build(), format);
}
