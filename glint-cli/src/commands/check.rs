use crate::context::InputArgs;
use crate::output;

use clap::Args;
use color_eyre::Result;

/// Compile an expression and report diagnostics
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Expression to check
    pub expression: String,

    /// Also list the identifiers the expression looked up
    #[arg(long)]
    pub references: bool,
}

pub fn execute(args: CheckArgs, input: &InputArgs) -> Result<()> {
    let engine = input.engine()?;
    let context = input.load_context()?;

    output::status("Checking", &args.expression);

    let compiled = engine.compile(&context, &args.expression);
    output::info(&format!(
        "Result: {}",
        output::render_value(compiled.result.as_ref(), false)
    ));

    if args.references {
        if compiled.references.is_empty() {
            output::dim("  no references");
        }
        for reference in &compiled.references {
            output::dim(&format!(
                "  {} ({}..{})",
                reference.name, reference.from, reference.to
            ));
        }
    }

    if compiled.diagnostics.is_empty() {
        output::success("No problems found");
        return Ok(());
    }

    output::error(&format!("{} diagnostic(s):", compiled.diagnostics.len()));
    for diagnostic in &compiled.diagnostics {
        output::diagnostic(&args.expression, diagnostic);
    }
    std::process::exit(1);
}
