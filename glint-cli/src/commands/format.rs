use crate::context::InputArgs;
use crate::output;

use clap::Args;
use color_eyre::Result;

/// Interpolate a template string
#[derive(Args, Debug)]
pub struct FormatArgs {
    /// Template text, e.g. "Hello {name}!"
    pub text: String,
}

pub fn execute(args: FormatArgs, input: &InputArgs) -> Result<()> {
    let engine = input.engine()?;
    let context = input.load_context()?;

    let (text, diagnostics) = engine.format(&args.text, &context, input.locale.as_deref());
    println!("{}", text);

    if !diagnostics.is_empty() {
        output::warning(&format!("{} diagnostic(s):", diagnostics.len()));
        for diagnostic in &diagnostics {
            output::diagnostic(&args.text, diagnostic);
        }
    }

    Ok(())
}
