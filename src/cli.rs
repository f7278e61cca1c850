use crate::generator::{generate_and_save_openapi, ProjectConfig};
use anyhow::Result;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use log::{debug, info};
use std::path::PathBuf;

const DEFAULT_COMMAND_NAME: &str = "routedoc";

/// Generate OpenAPI documentation from fiber-style Rust web services
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Discover routes and emit openapi.json
    #[command(alias = "gen")]
    Generate(GenerateArgs),
}

#[derive(clap::Args, Debug)]
pub struct GenerateArgs {
    /// Workspace root to scan (defaults to the current module)
    #[arg(long = "root", value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Output file (default: <workspace-root>/openapi.json)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Override the generated document title
    #[arg(long = "title", value_name = "TITLE")]
    pub title: Option<String>,

    /// Additional directory to scan for routes (repeatable)
    #[arg(long = "route", value_name = "DIR")]
    pub routes: Vec<PathBuf>,

    /// Path prefix to exclude from documentation (repeatable)
    #[arg(long = "skip", value_name = "PREFIX")]
    pub skips: Vec<String>,

    /// Include bearer auth and a global security requirement
    #[arg(long = "enable-auth")]
    pub enable_auth: bool,
}

/// Derives the command name from the invocation path, trimming any
/// extension.
pub fn command_name() -> String {
    let invoked = std::env::args().next().unwrap_or_default();
    let base = PathBuf::from(invoked)
        .file_stem()
        .map(|s| s.to_string_lossy().trim().to_string())
        .unwrap_or_default();
    if base.is_empty() || base.eq_ignore_ascii_case("main") {
        return DEFAULT_COMMAND_NAME.to_string();
    }
    base
}

/// Parses command-line arguments; clap handles `--help`/`--version` and
/// usage errors by exiting directly.
pub fn parse_args() -> Cli {
    let command = Cli::command().name(command_name());
    let matches = command.get_matches();
    Cli::from_arg_matches(&matches).unwrap_or_else(|err| err.exit())
}

/// Runs the selected subcommand.
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Generate(args) => run_generate(args),
    }
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    debug!("generate args: {:?}", args);

    let config = ProjectConfig {
        workspace_root: args.root,
        route_paths: args.routes,
        skip_prefixes: args.skips,
        output_path: args.output,
        project_name: args.title,
        enable_auth_ui: args.enable_auth,
    };

    let (path, spec) = generate_and_save_openapi(&config)?;
    info!("document size: {} bytes", spec.len());
    println!("generated {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_subcommand_parsing() {
        let cli = Cli::try_parse_from([
            "routedoc",
            "generate",
            "--root",
            "/tmp/project",
            "-o",
            "docs/openapi.json",
            "--title",
            "Billing",
            "--route",
            "src/api",
            "--route",
            "src/admin",
            "--skip",
            "/internal",
            "--enable-auth",
            "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        let Command::Generate(args) = cli.command;
        assert_eq!(args.root.unwrap(), PathBuf::from("/tmp/project"));
        assert_eq!(args.output.unwrap(), PathBuf::from("docs/openapi.json"));
        assert_eq!(args.title.unwrap(), "Billing");
        assert_eq!(args.routes.len(), 2);
        assert_eq!(args.skips, vec!["/internal"]);
        assert!(args.enable_auth);
    }

    #[test]
    fn test_gen_alias() {
        let cli = Cli::try_parse_from(["routedoc", "gen"]).unwrap();
        let Command::Generate(args) = cli.command;
        assert!(args.root.is_none());
        assert!(args.routes.is_empty());
    }

    #[test]
    fn test_missing_subcommand_is_an_error() {
        assert!(Cli::try_parse_from(["routedoc"]).is_err());
    }
}
