use clap::Parser;
use soot_cli::cli::Cli;
use soot_cli::commands;
use soot_cli::error::CliError;
use soot_cli::logging;
use soot_cli::output::{self, CommandResult, OutputFormat, ResultBuilder};

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let format = cli.format;
	let command = cli.command.name();

	if let Err(err) = commands::dispatch(cli, format).await {
		handle_error(command, err, format);
		std::process::exit(1);
	}
}

fn handle_error(command: &str, err: CliError, format: OutputFormat) {
	let cmd_error = err.to_command_error();

	// Always print to stderr for humans
	output::print_error_stderr(&cmd_error);

	// The JSON envelope goes to stdout for scripts
	if format != OutputFormat::Text {
		let result: CommandResult<()> = ResultBuilder::new(command).error(cmd_error).build();
		output::print_result(&result, format);
	}
}
