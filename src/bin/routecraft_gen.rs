use clap::Parser;
use routecraft::cli::{init_logging, run_cli, Cli};
use routecraft::Diagnostics;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = init_logging(cli.verbose, cli.log_format) {
        eprintln!("warning: {err:#}");
    }

    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<Diagnostics>() {
                Some(diagnostics) => eprintln!("{}", diagnostics.report()),
                None => eprintln!("error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}
