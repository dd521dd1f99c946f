use clap::Parser;
use orgdir::cli::{Args, run};
use orgdir::output::OutputFormatter;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Args::parse();
    orgdir::logging::init(args.verbose, args.quiet);

    match run(&args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&format!("Error: {}", e));
            ExitCode::FAILURE
        }
    }
}
