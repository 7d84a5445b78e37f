mod commands;
mod context;
mod output;

use clap::Parser;
use color_eyre::Result;
use tracing_subscriber::EnvFilter;

use commands::Command;
use context::InputArgs;

/// Glint - evaluate, check and format game-logic expressions
#[derive(Parser, Debug)]
#[command(name = "glint", version)]
#[command(about = "Evaluate, check and format glint expressions", long_about = None)]
struct Cli {
    #[command(flatten)]
    input: InputArgs,

    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        Command::Eval(args) => commands::eval::execute(args, &cli.input),
        Command::Check(args) => commands::check::execute(args, &cli.input),
        Command::Format(args) => commands::format::execute(args, &cli.input),
    }
}

/// Log to stderr, filtered by GLINT_LOG, then RUST_LOG, default warn
fn init_logging() {
    let filter = EnvFilter::try_from_env("GLINT_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // Try to initialize, ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
