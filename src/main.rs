//! Command-line entry point.
//!
//! ```bash
//! routedoc generate [--root DIR] [-o FILE] [--route DIR]... [--skip PREFIX]...
//! ```
//!
//! Exit code 0 on success; on failure a single-line diagnostic goes to
//! standard error.

use routedoc::cli;

fn main() {
    let args = cli::parse_args();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Err(err) = cli::run(args) {
        eprintln!("{}: {}", cli::command_name(), err);
        std::process::exit(1);
    }
}
