use snapfetch_core::logging;

mod cli;

use crate::cli::Cli;

fn main() {
    // Initialize logging as early as possible; fall back to stderr when the
    // XDG state directory is unusable.
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    // Parse CLI and run the download sequence.
    if let Err(err) = Cli::run_from_args() {
        eprintln!("snapfetch error: {:#}", err);
        std::process::exit(1);
    }
}
