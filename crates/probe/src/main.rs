//! ICU probe binary.
//!
//! Confines the process-wide ICU context, binds it and prints the version
//! that was selected. Used as a child process by tests that need a fresh
//! process per resolution.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use icubind_loader::{Error, wrapper};
use tracing::{debug, error};
#[cfg(test)]
use tempfile as _;

const EXIT_MISSING_ARGUMENTS: u8 = 1;
const EXIT_INVALID_VERSION: u8 = 2;
const EXIT_FAILURE: u8 = 3;

/// Probe command line arguments.
#[derive(Parser, Debug)]
#[command(name = "icu-probe")]
#[command(about = "Resolve ICU4C within a version range and print the bound version")]
struct Args {
	/// Lowest acceptable major version
	min: u32,

	/// Highest acceptable major version
	max: u32,

	/// Exact major version to require; 0 for none
	exact: Option<u32>,

	/// Directory searched before all others
	#[arg(value_name = "PREFERRED_DIR")]
	preferred_dir: Option<PathBuf>,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,
}

fn main() -> ExitCode {
	let args = match Args::try_parse() {
		Ok(args) => args,
		Err(err) => {
			let code = match err.kind() {
				ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
				ErrorKind::MissingRequiredArgument | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => EXIT_MISSING_ARGUMENTS,
				_ => EXIT_INVALID_VERSION,
			};
			let _ = err.print();
			return ExitCode::from(code);
		}
	};

	setup_tracing(args.verbose);

	match run(&args) {
		Ok(version) => {
			println!("{version}");
			ExitCode::SUCCESS
		}
		Err(err) => {
			error!(%err, "ICU probe failed");
			match err {
				Error::InvalidConfinementRange { .. } => ExitCode::from(EXIT_INVALID_VERSION),
				_ => ExitCode::from(EXIT_FAILURE),
			}
		}
	}
}

fn run(args: &Args) -> icubind_loader::Result<String> {
	wrapper::confine_icu_versions(args.min, args.max)?;
	if let Some(exact) = args.exact.filter(|&v| v != 0) {
		wrapper::confine_icu_version(exact);
	}
	if let Some(dir) = &args.preferred_dir {
		wrapper::set_preferred_icu4c_directory(Some(dir.clone()));
	}

	let active = wrapper::init()?;
	debug!(version = %active.version, dir = %active.directory.display(), "resolved ICU");
	let version = wrapper::icu_version()?;
	wrapper::cleanup();
	Ok(version)
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("icubind_loader=debug,icu_probe=debug,info")
		} else {
			EnvFilter::new("warn")
		}
	});

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
