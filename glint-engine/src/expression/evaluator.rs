// Expression Evaluator
// Reduces a parsed tree to a value against a read-only context

use crate::error::{EngineError, EngineResult};
use crate::expression::compiler::Compiler;
use crate::expression::diagnostics::{DiagnosticKind, Reference};
use crate::expression::lexer::Token;
use crate::expression::parser::{precedence, Node, Operand, Operator};
use crate::template::format_template;
use crate::value::{parse_number, Context, Value};

use std::cmp::Ordering;

impl<'a> Compiler<'a> {
    /// Evaluate a parsed tree.
    ///
    /// Diagnostics from any earlier `calc` are cleared; references accumulate
    /// for the lifetime of the compiler. `Ok(None)` is an absent result.
    pub fn calc(
        &mut self,
        tree: Option<&Operand>,
        context: &Context,
    ) -> EngineResult<Option<Value>> {
        self.diagnostics.clear();
        self.get_value(tree, context)
    }

    fn get_value(
        &mut self,
        operand: Option<&Operand>,
        context: &Context,
    ) -> EngineResult<Option<Value>> {
        let token = match operand {
            None => {
                return Err(EngineError::MalformedTree(
                    "operation is missing an operand".to_string(),
                ))
            }
            Some(Operand::Node(node)) => return self.calc_node(node, context),
            Some(Operand::Token(token)) => token,
        };
        let content = token.content.as_str();

        if precedence(content).is_some() {
            self.report(
                DiagnosticKind::ReservedKeyword,
                token.from,
                token.to,
                format!("'{}' is reserved and cannot be used as a value", content),
            );
            return Err(EngineError::ReservedKeyword {
                keyword: content.to_string(),
                from: token.from,
                to: token.to,
            });
        }

        // Silent lookup, never reported as a reference
        if let Some(path) = content.strip_prefix("$.") {
            return Ok(context.lookup(path));
        }

        if content.starts_with('\'') || content.starts_with('"') {
            return Ok(Some(Value::String(strip_delimiters(content).to_string())));
        }

        if content.starts_with('`') {
            return Ok(Some(Value::String(self.interpolate(token, context))));
        }

        match content {
            "true" => return Ok(Some(Value::Bool(true))),
            "false" => return Ok(Some(Value::Bool(false))),
            _ => {}
        }

        let number = parse_number(content);
        if number.is_finite() {
            return Ok(Some(Value::Number(number)));
        }

        Ok(self.resolve_identifier(token, context))
    }

    /// Run a backtick template through the formatter, mapping its diagnostics
    /// back onto the expression source
    fn interpolate(&mut self, token: &Token, context: &Context) -> String {
        let inner = strip_delimiters(&token.content);
        let (text, diagnostics) = format_template(inner, context, self.locale, self.formatters);

        self.diagnostics.extend(
            diagnostics
                .into_iter()
                .map(|diagnostic| diagnostic.shifted(token.from + 1)),
        );
        text
    }

    fn resolve_identifier(&mut self, token: &Token, context: &Context) -> Option<Value> {
        self.references
            .push(Reference::new(token.content.clone(), token.from, token.to));

        let value = context.lookup(&token.content);
        if value.is_none() {
            self.report(
                DiagnosticKind::VariableNotFound,
                token.from,
                token.to,
                format!("Variable '{}' not found", token.content),
            );
        }
        value
    }

    fn calc_node(&mut self, node: &Node, context: &Context) -> EngineResult<Option<Value>> {
        let Some(token) = node.operation.as_ref() else {
            let (from, to) = node.span().unwrap_or((0, 0));
            self.report(
                DiagnosticKind::UnknownOperation,
                from,
                to,
                "Expression has no operation",
            );
            return Ok(None);
        };

        let Some(operator) = Operator::from_symbol(&token.content) else {
            self.report(
                DiagnosticKind::UnknownOperation,
                token.from,
                token.to,
                format!("Unknown operation '{}'", token.content),
            );
            return Ok(None);
        };

        // Negation only looks at the right side
        if operator == Operator::Not && node.right.is_some() {
            let right = self.get_value(node.right.as_ref(), context)?;
            let truthy = right.as_ref().is_some_and(Value::is_truthy);
            return Ok(Some(Value::Bool(!truthy)));
        }

        let Some(left) = self.get_value(node.left.as_ref(), context)? else {
            return Ok(None);
        };
        let Some(right) = self.get_value(node.right.as_ref(), context)? else {
            return Ok(None);
        };

        Ok(self.apply(operator, token, left, right))
    }

    fn apply(&mut self, operator: Operator, token: &Token, left: Value, right: Value) -> Option<Value> {
        match operator {
            // Arithmetic
            Operator::Add => match (&left, &right) {
                (Value::Number(a), Value::Number(b)) => Some(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Some(Value::String(format!("{}{}", a, b))),
                _ => self.unsupported(operator, token, &left, &right),
            },
            Operator::Sub => self.numeric_op(operator, token, &left, &right, |a, b| a - b),
            Operator::Mul => self.numeric_op(operator, token, &left, &right, |a, b| a * b),
            Operator::Div => self.numeric_op(operator, token, &left, &right, |a, b| a / b),
            Operator::Mod => self.numeric_op(operator, token, &left, &right, |a, b| a % b),

            // Comparison
            Operator::Lt => compare(&left, &right, |o| o == Ordering::Less),
            Operator::Le => compare(&left, &right, |o| o != Ordering::Greater),
            Operator::Gt => compare(&left, &right, |o| o == Ordering::Greater),
            Operator::Ge => compare(&left, &right, |o| o != Ordering::Less),

            // Equality
            Operator::Eq => Some(Value::Bool(left.loose_eq(&right))),
            Operator::Ne => Some(Value::Bool(!left.loose_eq(&right))),
            Operator::StrictEq => Some(Value::Bool(left.strict_eq(&right))),
            Operator::StrictNe => Some(Value::Bool(!left.strict_eq(&right))),

            // Logical, returning the deciding operand
            Operator::And | Operator::Then => Some(if left.is_truthy() { right } else { left }),
            Operator::Or | Operator::Else => Some(if left.is_truthy() { left } else { right }),

            Operator::Not => None,
        }
    }

    fn numeric_op<F>(
        &mut self,
        operator: Operator,
        token: &Token,
        left: &Value,
        right: &Value,
        op: F,
    ) -> Option<Value>
    where
        F: FnOnce(f64, f64) -> f64,
    {
        match (left.as_number(), right.as_number()) {
            (Some(a), Some(b)) => Some(Value::Number(op(a, b))),
            _ => self.unsupported(operator, token, left, right),
        }
    }

    fn unsupported(
        &mut self,
        operator: Operator,
        token: &Token,
        left: &Value,
        right: &Value,
    ) -> Option<Value> {
        self.report(
            DiagnosticKind::UnsupportedOperation,
            token.from,
            token.to,
            format!(
                "Cannot apply '{}' to {} and {}",
                operator,
                left.type_name(),
                right.type_name()
            ),
        );
        None
    }
}

fn compare<F>(left: &Value, right: &Value, test: F) -> Option<Value>
where
    F: FnOnce(Ordering) -> bool,
{
    Some(Value::Bool(left.script_cmp(right).is_some_and(test)))
}

/// Drop the opening delimiter and, when present, the matching closing one
fn strip_delimiters(content: &str) -> &str {
    let mut chars = content.chars();
    match chars.next() {
        Some(delimiter) => {
            let inner = chars.as_str();
            inner.strip_suffix(delimiter).unwrap_or(inner)
        }
        None => content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(input: &'static str, context: &Context) -> (EngineResult<Option<Value>>, Compiler<'static>) {
        let mut compiler = Compiler::new(input);
        compiler.tokenize().unwrap();
        let tree = compiler.parse().unwrap();
        let result = compiler.calc(tree.as_ref(), context);
        (result, compiler)
    }

    fn eval(input: &'static str) -> Option<Value> {
        run(input, &Context::new()).0.unwrap()
    }

    #[test]
    fn test_eval_literals() {
        assert_eq!(eval("42"), Some(Value::Number(42.0)));
        assert_eq!(eval("1.5e1"), Some(Value::Number(15.0)));
        assert_eq!(eval("'it\\'s'"), Some(Value::from("it\\'s")));
        assert_eq!(eval("\"double\""), Some(Value::from("double")));
        assert_eq!(eval("true"), Some(Value::Bool(true)));
        assert_eq!(eval("false"), Some(Value::Bool(false)));
    }

    #[test]
    fn test_eval_arithmetic() {
        assert_eq!(eval("7 % 4"), Some(Value::Number(3.0)));
        assert_eq!(eval("1 / 0"), Some(Value::Number(f64::INFINITY)));
        assert_eq!(eval("'a' + 'b'"), Some(Value::from("ab")));
        assert_eq!(eval("2 * -3"), Some(Value::Number(-6.0)));
    }

    #[test]
    fn test_eval_mixed_add_is_unsupported() {
        let (result, compiler) = run("'a' + 1", &Context::new());

        assert_eq!(result.unwrap(), None);
        let diagnostics = compiler.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::UnsupportedOperation);
        assert_eq!((diagnostics[0].from, diagnostics[0].to), (4, 5));
        assert_eq!(diagnostics[0].message, "Cannot apply '+' to string and number");
    }

    #[test]
    fn test_eval_comparison() {
        assert_eq!(eval("2 < 10"), Some(Value::Bool(true)));
        assert_eq!(eval("'2' < '10'"), Some(Value::Bool(false)));
        assert_eq!(eval("3 >= 3"), Some(Value::Bool(true)));
        assert_eq!(eval("1 <= 'a'"), Some(Value::Bool(false)));
        assert_eq!(eval("1 > 'a'"), Some(Value::Bool(false)));
    }

    #[test]
    fn test_eval_equality() {
        assert_eq!(eval("1 == '1'"), Some(Value::Bool(true)));
        assert_eq!(eval("1 === '1'"), Some(Value::Bool(false)));
        assert_eq!(eval("1 != 2"), Some(Value::Bool(true)));
        assert_eq!(eval("'x' !== 'x'"), Some(Value::Bool(false)));
        assert_eq!(eval("true == 1"), Some(Value::Bool(true)));
    }

    #[test]
    fn test_eval_logical_returns_operand() {
        assert_eq!(eval("0 || 'fallback'"), Some(Value::from("fallback")));
        assert_eq!(eval("'' && 5"), Some(Value::from("")));
        assert_eq!(eval("1 && 5"), Some(Value::Number(5.0)));
        assert_eq!(eval("!0"), Some(Value::Bool(true)));
        assert_eq!(eval("!'text'"), Some(Value::Bool(false)));
    }

    #[test]
    fn test_eval_conditional_keeps_falsy_middle_quirk() {
        assert_eq!(eval("1 > 0 ? 'yes' : 'no'"), Some(Value::from("yes")));
        assert_eq!(eval("1 < 0 ? 'yes' : 'no'"), Some(Value::from("no")));
        assert_eq!(eval("true ? 0 : 'other'"), Some(Value::from("other")));
    }

    #[test]
    fn test_eval_identifiers_and_references() {
        let context = Context::new().with("gold", 10).with("hero", Value::from(vec!["a", "b"]));
        let (result, compiler) = run("gold + hero.length + $.gold", &context);

        assert_eq!(result.unwrap(), Some(Value::Number(22.0)));
        assert!(compiler.diagnostics().is_empty());
        assert_eq!(
            compiler.references(),
            &[Reference::new("gold", 0, 4), Reference::new("hero.length", 7, 18)]
        );
    }

    #[test]
    fn test_eval_missing_variable() {
        let (result, compiler) = run("missing * 2", &Context::new());

        assert_eq!(result.unwrap(), None);
        assert_eq!(compiler.diagnostics().len(), 1);
        assert_eq!(compiler.diagnostics()[0].kind, DiagnosticKind::VariableNotFound);
        assert_eq!(compiler.diagnostics()[0].content, "missing");
        assert_eq!(compiler.references().len(), 1);
    }

    #[test]
    fn test_eval_silent_lookup_has_no_diagnostic() {
        let (result, compiler) = run("$.missing", &Context::new());

        assert_eq!(result.unwrap(), None);
        assert!(compiler.diagnostics().is_empty());
        assert!(compiler.references().is_empty());
    }

    #[test]
    fn test_eval_backtick_template() {
        let context = Context::new().with("name", "Ada");
        let (result, compiler) = run("`Hi {name}` + '!'", &context);

        assert_eq!(result.unwrap(), Some(Value::from("Hi Ada!")));
        assert!(compiler.diagnostics().is_empty());
    }

    #[test]
    fn test_eval_backtick_diagnostics_are_shifted() {
        let (result, compiler) = run("1 && `x {ghost}`", &Context::new());

        assert_eq!(result.unwrap(), Some(Value::from("x undefined")));
        let diagnostic = &compiler.diagnostics()[0];
        assert_eq!(diagnostic.kind, DiagnosticKind::VariableNotFound);
        assert_eq!((diagnostic.from, diagnostic.to), (9, 14));
        assert_eq!(diagnostic.content, "ghost");
    }

    #[test]
    fn test_eval_operator_as_value_is_fatal() {
        let (result, compiler) = run("1 + *", &Context::new());

        assert_eq!(
            result.unwrap_err(),
            EngineError::ReservedKeyword {
                keyword: "*".to_string(),
                from: 4,
                to: 5
            }
        );
        assert_eq!(compiler.diagnostics()[0].kind, DiagnosticKind::ReservedKeyword);
    }

    #[test]
    fn test_eval_missing_operand_is_fatal() {
        let (result, _) = run("1 +", &Context::new());
        assert!(matches!(result, Err(EngineError::MalformedTree(_))));
    }

    #[test]
    fn test_eval_unknown_operation_is_diagnosed() {
        let (result, compiler) = run("a b c", &Context::new().with("a", 1).with("c", 2));

        assert_eq!(result.unwrap(), None);
        assert_eq!(compiler.diagnostics()[0].kind, DiagnosticKind::UnknownOperation);
        assert_eq!(compiler.diagnostics()[0].content, "b");
    }

    #[test]
    fn test_calc_clears_previous_diagnostics() {
        let mut compiler = Compiler::new("missing");
        compiler.tokenize().unwrap();
        let tree = compiler.parse().unwrap();

        compiler.calc(tree.as_ref(), &Context::new()).unwrap();
        compiler.calc(tree.as_ref(), &Context::new()).unwrap();

        assert_eq!(compiler.diagnostics().len(), 1);
        assert_eq!(compiler.references().len(), 2);
    }

    #[test]
    fn test_strip_delimiters() {
        assert_eq!(strip_delimiters("'abc'"), "abc");
        assert_eq!(strip_delimiters("`é`"), "é");
        assert_eq!(strip_delimiters("'"), "");
    }
}
