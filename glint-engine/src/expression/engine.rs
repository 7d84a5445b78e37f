// Expression Entry Points
// compile (never fails, returns diagnostics), evaluate (fails fast) and format

use crate::config::EngineOptions;
use crate::error::{EngineError, EngineResult};
use crate::expression::compiler::Compiler;
use crate::expression::diagnostics::{Diagnostic, DiagnosticKind, Reference};
use crate::template::{format_template, FormatterRegistry};
use crate::value::{Context, Value};

use once_cell::sync::Lazy;
use serde::Serialize;
use tracing::debug;

/// Outcome of [`ExpressionEngine::compile`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompileResult {
    /// Evaluated value, `None` when absent
    pub result: Option<Value>,
    pub diagnostics: Vec<Diagnostic>,
    pub references: Vec<Reference>,
}

impl CompileResult {
    pub fn is_ok(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Engine bundling options and formatters.
///
/// Immutable once built; share one engine across threads.
#[derive(Debug, Clone)]
pub struct ExpressionEngine {
    options: EngineOptions,
    formatters: FormatterRegistry,
}

impl Default for ExpressionEngine {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}

impl ExpressionEngine {
    pub fn new(options: EngineOptions) -> Self {
        Self::with_formatters(options, FormatterRegistry::with_builtins())
    }

    /// Engine over a custom formatter registry; configured aliases are added to it
    pub fn with_formatters(options: EngineOptions, mut formatters: FormatterRegistry) -> Self {
        for (alias, target) in &options.formatter_aliases {
            if !formatters.alias(alias.clone(), target) {
                debug!(alias = %alias, target = %target, "alias target is not a registered formatter");
            }
        }

        Self {
            options,
            formatters,
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn formatters(&self) -> &FormatterRegistry {
        &self.formatters
    }

    /// Locale for a call: explicit, then the context's `locale`, then the default
    fn resolve_locale<'a>(&'a self, explicit: Option<&'a str>, context: &'a Context) -> Option<&'a str> {
        explicit
            .or_else(|| context.locale())
            .or(self.options.default_locale.as_deref())
    }

    fn compiler<'a>(&'a self, expression: &'a str, context: &'a Context) -> Compiler<'a> {
        Compiler::new(expression)
            .with_formatters(&self.formatters)
            .with_locale(self.resolve_locale(None, context))
    }

    /// Compile and evaluate `expression`, folding every failure into diagnostics
    pub fn compile(&self, context: &Context, expression: &str) -> CompileResult {
        let mut compiler = self.compiler(expression, context);
        let outcome = run(&mut compiler, context);

        let (mut diagnostics, references) = compiler.into_parts();
        let result = match outcome {
            Ok(Some(value)) => Some(value),
            Ok(None) => None,
            Err(e) => {
                debug!(expression, error = %e, "expression failed to compile");
                if diagnostics.is_empty() {
                    diagnostics.push(whole_expression(expression, "Invalid expression"));
                }
                None
            }
        };

        CompileResult {
            result,
            diagnostics,
            references,
        }
    }

    /// Evaluate `expression`, discarding diagnostics. Fails on the first fatal error.
    pub fn evaluate(&self, expression: &str, context: &Context) -> EngineResult<Option<Value>> {
        let mut compiler = self.compiler(expression, context);
        compiler.tokenize()?;

        let Some(tree) = compiler.parse()? else {
            return Err(EngineError::Parse(format!(
                "'{}' does not contain an expression",
                expression
            )));
        };
        compiler.calc(Some(&tree), context)
    }

    /// Interpolate a template string
    pub fn format(
        &self,
        text: &str,
        context: &Context,
        locale: Option<&str>,
    ) -> (String, Vec<Diagnostic>) {
        let locale = self.resolve_locale(locale, context);
        format_template(text, context, locale, &self.formatters)
    }
}

fn run(compiler: &mut Compiler<'_>, context: &Context) -> EngineResult<Option<Value>> {
    compiler.tokenize()?;

    let Some(tree) = compiler.parse()? else {
        if compiler.diagnostics.is_empty() {
            debug!(expression = compiler.source, "expression is empty");
            let diagnostic = whole_expression(compiler.source, "Empty expression");
            compiler.diagnostics.push(diagnostic);
        }
        return Ok(None);
    };

    compiler.calc(Some(&tree), context)
}

fn whole_expression(expression: &str, message: &str) -> Diagnostic {
    Diagnostic::spanning(
        DiagnosticKind::ParseError,
        message,
        expression,
        0,
        expression.len(),
    )
}

static DEFAULT_ENGINE: Lazy<ExpressionEngine> = Lazy::new(ExpressionEngine::default);

/// [`ExpressionEngine::compile`] on the default engine
pub fn compile(context: &Context, expression: &str) -> CompileResult {
    DEFAULT_ENGINE.compile(context, expression)
}

/// [`ExpressionEngine::evaluate`] on the default engine
pub fn evaluate(expression: &str, context: &Context) -> EngineResult<Option<Value>> {
    DEFAULT_ENGINE.evaluate(expression, context)
}

/// [`ExpressionEngine::format`] on the default engine
pub fn format(text: &str, context: &Context, locale: Option<&str>) -> (String, Vec<Diagnostic>) {
    DEFAULT_ENGINE.format(text, context, locale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::FormatOutput;
    use crate::test_utils::init_test_logging;

    use pretty_assertions::assert_eq;

    fn kinds(result: &CompileResult) -> Vec<DiagnosticKind> {
        result.diagnostics.iter().map(|d| d.kind).collect()
    }

    fn number(expression: &str) -> f64 {
        match evaluate(expression, &Context::new()) {
            Ok(Some(Value::Number(n))) => n,
            other => panic!("expected a number from '{}', got {:?}", expression, other),
        }
    }

    #[test]
    fn test_literals() {
        let ctx = Context::new();
        assert_eq!(evaluate("42", &ctx).unwrap(), Some(Value::Number(42.0)));
        assert_eq!(evaluate("'text'", &ctx).unwrap(), Some(Value::from("text")));
        assert_eq!(evaluate("true", &ctx).unwrap(), Some(Value::Bool(true)));

        let result = compile(&ctx, "\"quoted\"");
        assert_eq!(result.result, Some(Value::from("quoted")));
        assert!(result.diagnostics.is_empty());
        assert!(result.references.is_empty());
    }

    #[test]
    fn test_precedence_and_associativity() {
        assert_eq!(number("2 + 3 * 4"), 14.0);
        assert_eq!(number("(2 + 3) * 4"), 20.0);
        assert_eq!(number("10 - 2 - 3"), 5.0);
        assert_eq!(number("2 * (3 + (4 - 1)) % 5"), 2.0);
    }

    #[test]
    fn test_unary_operators() {
        assert_eq!(number("-5 + 3"), -2.0);
        assert_eq!(number("3 - -2"), 5.0);
        assert_eq!(
            evaluate("!true", &Context::new()).unwrap(),
            Some(Value::Bool(false))
        );
    }

    #[test]
    fn test_empty_input() {
        init_test_logging();

        for input in ["", "()", "(())"] {
            let result = compile(&Context::new(), input);
            assert_eq!(result.result, None);
            assert_eq!(kinds(&result), vec![DiagnosticKind::ParseError]);
            assert_eq!(
                (result.diagnostics[0].from, result.diagnostics[0].to),
                (0, input.len())
            );
        }

        assert!(matches!(
            evaluate("", &Context::new()),
            Err(EngineError::Parse(_))
        ));
    }

    #[test]
    fn test_unsupported_operation() {
        let result = compile(&Context::new(), "'a' - 1");

        assert_eq!(result.result, None);
        assert_eq!(kinds(&result), vec![DiagnosticKind::UnsupportedOperation]);
    }

    #[test]
    fn test_comparison_with_string_is_not_diagnosed() {
        let result = compile(&Context::new(), "1 < 'a'");

        assert_eq!(result.result, Some(Value::Bool(false)));
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_missing_variable_short_circuits() {
        let result = compile(&Context::new(), "missing + 1");

        assert_eq!(result.result, None);
        assert_eq!(kinds(&result), vec![DiagnosticKind::VariableNotFound]);
    }

    #[test]
    fn test_references() {
        let ctx = Context::new().with("a", 1).with("b", Value::Object(Default::default()));
        let result = compile(&ctx, "a + b.c");

        assert_eq!(
            result.references,
            vec![Reference::new("a", 0, 1), Reference::new("b.c", 4, 7)]
        );

        for literal_only in ["$.a + 2 + 'b'", "true", "false || !true"] {
            let result = compile(&ctx, literal_only);
            assert!(result.references.is_empty(), "{literal_only}");
        }
    }

    #[test]
    fn test_conditional_falsy_middle() {
        assert_eq!(
            evaluate("true ? false : 'fallback'", &Context::new()).unwrap(),
            Some(Value::from("fallback"))
        );
    }

    #[test]
    fn test_fatal_errors_become_diagnostics() {
        let result = compile(&Context::new(), "1 +");
        assert_eq!(
            result.diagnostics,
            vec![Diagnostic::new(
                DiagnosticKind::ParseError,
                "Invalid expression",
                "1 +",
                0,
                3
            )]
        );

        let result = compile(&Context::new(), "'open");
        assert_eq!(kinds(&result), vec![DiagnosticKind::ParseError]);

        // Diagnostics captured before the failure are kept as-is
        let result = compile(&Context::new(), "1 + *");
        assert_eq!(kinds(&result), vec![DiagnosticKind::ReservedKeyword]);

        let result = compile(&Context::new(), "a b c + d");
        assert_eq!(kinds(&result), vec![DiagnosticKind::UnknownOperation]);
    }

    #[test]
    fn test_evaluate_returns_fatal_errors() {
        let ctx = Context::new();
        assert!(matches!(evaluate("1 +", &ctx), Err(EngineError::MalformedTree(_))));
        assert!(matches!(evaluate("'open", &ctx), Err(EngineError::Lex(_))));
        assert!(matches!(
            evaluate("a b c + d", &ctx),
            Err(EngineError::UnknownOperation { .. })
        ));
        assert_eq!(evaluate("missing", &ctx).unwrap(), None);
    }

    #[test]
    fn test_compile_is_idempotent() {
        let ctx = Context::new().with("gold", 3);
        let first = compile(&ctx, "gold * 2 + missing");
        let second = compile(&ctx, "gold * 2 + missing");

        assert_eq!(first, second);
    }

    #[test]
    fn test_format_entry_point() {
        let ctx = Context::new().with("name", "Ada");
        assert_eq!(
            format("Hello {name}!", &ctx, None),
            ("Hello Ada!".to_string(), vec![])
        );

        let (text, diagnostics) = format("{missing}", &Context::new(), None);
        assert_eq!(text, "undefined");
        assert_eq!(diagnostics[0].kind, DiagnosticKind::VariableNotFound);
        assert_eq!((diagnostics[0].from, diagnostics[0].to), (1, 8));
    }

    #[test]
    fn test_locale_resolution() {
        let engine = ExpressionEngine::new(EngineOptions::new().with_default_locale("fr"));
        let ctx = Context::new().with("n", 0);

        // French counts zero as singular
        assert_eq!(engine.format("{n:p:# pomme|# pommes}", &ctx, None).0, "0 pomme");
        assert_eq!(engine.format("{n:p:# apple|# apples}", &ctx, Some("en")).0, "0 apples");

        let ctx = ctx.with("locale", "en-US");
        assert_eq!(engine.format("{n:p:# apple|# apples}", &ctx, None).0, "0 apples");
    }

    #[test]
    fn test_backtick_template_in_expression() {
        let ctx = Context::new().with("count", 2);
        let result = compile(&ctx, "`{count:coin|coins}` + '!'");

        assert_eq!(result.result, Some(Value::from("coins!")));
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_custom_formatter_and_alias() {
        let mut registry = FormatterRegistry::with_builtins();
        registry.register("shout", |value: Option<&Value>, _: Option<&str>, args: &[&str]| {
            let text = value.map(Value::as_string).unwrap_or_default();
            FormatOutput::text(format!("{}{}", text.to_uppercase(), args.join("")))
        });
        let options = EngineOptions::new().with_formatter_alias("s", "shout");
        let engine = ExpressionEngine::with_formatters(options, registry);

        let ctx = Context::new().with("name", "ada");
        assert_eq!(engine.format("{name:s:!}", &ctx, None).0, "ADA!");
        assert_eq!(engine.formatters().names().len(), 8);
    }
}
