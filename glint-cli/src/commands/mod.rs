pub mod check;
pub mod eval;
pub mod format;

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate an expression and print its value
    Eval(eval::EvalArgs),

    /// Compile an expression and report diagnostics
    Check(check::CheckArgs),

    /// Interpolate a template string
    Format(format::FormatArgs),
}
