use crate::context::InputArgs;
use crate::output;

use clap::Args;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use tracing::debug;

/// Evaluate an expression and print its value
#[derive(Args, Debug)]
pub struct EvalArgs {
    /// Expression to evaluate
    pub expression: String,

    /// Print string results without JSON quoting
    #[arg(long)]
    pub raw: bool,
}

pub fn execute(args: EvalArgs, input: &InputArgs) -> Result<()> {
    let engine = input.engine()?;
    let context = input.load_context()?;

    debug!(expression = %args.expression, "evaluating");
    let value = engine
        .evaluate(&args.expression, &context)
        .wrap_err_with(|| format!("failed to evaluate '{}'", args.expression))?;

    println!("{}", output::render_value(value.as_ref(), args.raw));

    Ok(())
}
