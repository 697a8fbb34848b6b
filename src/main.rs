//! Binary entrypoint for the course catalog tool.

use std::process::ExitCode;

use clap::Parser;
use course_catalog::cli::{self, Cli};

fn main() -> ExitCode {
    cli::run(Cli::parse())
}
