/// Helena command-line interpreter
///
/// Runs, evaluates and parses Helena scripts.
use helena_core::cli;

fn main() {
    if let Err(e) = cli::run_cli() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
