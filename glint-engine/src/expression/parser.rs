// Expression Parser
// Builds an operator-precedence tree by rotating each new operator into place

use crate::error::{EngineError, EngineResult};
use crate::expression::compiler::Compiler;
use crate::expression::diagnostics::DiagnosticKind;
use crate::expression::lexer::Token;

use serde::Serialize;
use tracing::trace;

use std::fmt;

/// Operators known to the evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Not, // !

    // Arithmetic
    Add, // +
    Sub, // -
    Mul, // *
    Div, // /
    Mod, // %

    // Comparison
    Eq,       // ==
    Ne,       // !=
    StrictEq, // ===
    StrictNe, // !==
    Lt,       // <
    Le,       // <=
    Gt,       // >
    Ge,       // >=

    // Logical
    And,  // &&
    Or,   // ||
    Then, // ?
    Else, // :
}

impl Operator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "!" => Operator::Not,
            "+" => Operator::Add,
            "-" => Operator::Sub,
            "*" => Operator::Mul,
            "/" => Operator::Div,
            "%" => Operator::Mod,
            "==" => Operator::Eq,
            "!=" => Operator::Ne,
            "===" => Operator::StrictEq,
            "!==" => Operator::StrictNe,
            "<" => Operator::Lt,
            "<=" => Operator::Le,
            ">" => Operator::Gt,
            ">=" => Operator::Ge,
            "&&" => Operator::And,
            "||" => Operator::Or,
            "?" => Operator::Then,
            ":" => Operator::Else,
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Not => "!",
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Mod => "%",
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::StrictEq => "===",
            Operator::StrictNe => "!==",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::And => "&&",
            Operator::Or => "||",
            Operator::Then => "?",
            Operator::Else => ":",
        }
    }

    // Precedence (lowest to highest):
    // 1. Conditional: ? :
    // 2. Or: ||
    // 3. And: &&
    // 4. Equality: == === != !==
    // 5. Comparison: < <= > >=
    // 6. Additive: + -
    // 7. Multiplicative: * / %
    // 8. Unary: !
    // 9. Grouping: ( )
    pub fn precedence(&self) -> u8 {
        match self {
            Operator::Then | Operator::Else => 1,
            Operator::Or => 2,
            Operator::And => 3,
            Operator::Eq | Operator::Ne | Operator::StrictEq | Operator::StrictNe => 4,
            Operator::Lt | Operator::Le | Operator::Gt | Operator::Ge => 5,
            Operator::Add | Operator::Sub => 6,
            Operator::Mul | Operator::Div | Operator::Mod => 7,
            Operator::Not => 8,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Binding strength of an operator or parenthesis symbol
pub fn precedence(symbol: &str) -> Option<u8> {
    match symbol {
        "(" | ")" => Some(9),
        other => Operator::from_symbol(other).map(|op| op.precedence()),
    }
}

/// Either side of a [`Node`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Operand {
    Token(Token),
    Node(Box<Node>),
}

impl Operand {
    /// Byte span covered by this operand, `None` for an empty node
    pub fn span(&self) -> Option<(usize, usize)> {
        match self {
            Operand::Token(token) => Some((token.from, token.to)),
            Operand::Node(node) => node.span(),
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Operand::Node(node) => Some(node),
            Operand::Token(_) => None,
        }
    }

    pub fn as_token(&self) -> Option<&Token> {
        match self {
            Operand::Token(token) => Some(token),
            Operand::Node(_) => None,
        }
    }
}

impl From<Token> for Operand {
    fn from(token: Token) -> Self {
        Operand::Token(token)
    }
}

impl From<Node> for Operand {
    fn from(node: Node) -> Self {
        Operand::Node(Box::new(node))
    }
}

/// One binary operation, or a unary one when `left` is `None`.
///
/// A `grouped` node is opaque to later rotations: parenthesized groups and
/// the synthesized `0 - x` of a unary minus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub left: Option<Operand>,
    pub right: Option<Operand>,
    pub operation: Option<Token>,
    pub grouped: bool,
}

impl Node {
    pub fn new(left: Option<Operand>, operation: Token, right: Option<Operand>) -> Self {
        Self {
            left,
            right,
            operation: Some(operation),
            grouped: false,
        }
    }

    pub fn unary(operation: Token, right: Option<Operand>) -> Self {
        Self::new(None, operation, right)
    }

    pub fn span(&self) -> Option<(usize, usize)> {
        let spans = [
            self.left.as_ref().and_then(Operand::span),
            self.operation.as_ref().map(|op| (op.from, op.to)),
            self.right.as_ref().and_then(Operand::span),
        ];

        spans
            .into_iter()
            .flatten()
            .reduce(|(from, to), (f, t)| (from.min(f), to.max(t)))
    }
}

impl<'a> Compiler<'a> {
    /// Parse tokens from the cursor up to the end of the stream or the `)`
    /// closing the current group.
    ///
    /// Returns `None` when there is nothing to parse at this level.
    pub fn parse(&mut self) -> EngineResult<Option<Operand>> {
        let Some(first) = self.parse_statement()? else {
            return Ok(None);
        };

        let operation = match self.advance() {
            Some(token) if !token.is(")") => token,
            _ => return Ok(Some(first)),
        };
        let right = self.parse_statement()?;
        let mut root = Node::new(Some(first), operation, right);

        while let Some(operation) = self.advance() {
            if operation.is(")") {
                break;
            }
            let operand = self.parse_statement()?;
            root = self.insert(root, operation, operand)?;
        }

        Ok(Some(Operand::from(root)))
    }

    /// Read one primary term
    pub(crate) fn parse_statement(&mut self) -> EngineResult<Option<Operand>> {
        let Some(token) = self.advance() else {
            return Ok(None);
        };

        let symbol = token.content.clone();
        match symbol.as_str() {
            "(" => {
                self.depth += 1;
                trace!(depth = self.depth, from = token.from, "entering group");
                let inner = self.parse();
                self.depth -= 1;

                Ok(inner?.map(|operand| match operand {
                    Operand::Node(mut node) => {
                        node.grouped = true;
                        Operand::Node(node)
                    }
                    leaf => leaf,
                }))
            }
            ")" => Ok(None),
            "!" => {
                let right = self.parse_statement()?;
                Ok(Some(Node::unary(token, right).into()))
            }
            "-" if self.follows_operator() => {
                let zero = Token::new("0", token.from, token.from);
                let right = self.parse_statement()?;
                let mut node = Node::new(Some(zero.into()), token, right);
                node.grouped = true;
                Ok(Some(node.into()))
            }
            _ => Ok(Some(token.into())),
        }
    }

    /// Whether the token just consumed starts an operand: nothing precedes it,
    /// or the previous token is an operator or an opening parenthesis.
    fn follows_operator(&self) -> bool {
        match self.look_back(2) {
            None => true,
            Some(previous) => {
                previous.is("(") || Operator::from_symbol(&previous.content).is_some()
            }
        }
    }

    /// Place `operation` and its right operand into the tree rooted at `root`
    fn insert(
        &mut self,
        mut root: Node,
        operation: Token,
        operand: Option<Operand>,
    ) -> EngineResult<Node> {
        let incoming = self.precedence_of(&operation)?;

        if !root.grouped {
            let current = match root.operation.as_ref() {
                Some(token) => self.precedence_of(token)?,
                None => 0,
            };

            if current < incoming {
                self.splice(&mut root, operation, operand, incoming)?;
                return Ok(root);
            }
        }

        Ok(Node::new(Some(root.into()), operation, operand))
    }

    /// Walk down the right spine past ungrouped nodes that bind looser than
    /// `incoming`, then hang the new operation off the last one.
    fn splice(
        &mut self,
        node: &mut Node,
        operation: Token,
        operand: Option<Operand>,
        incoming: u8,
    ) -> EngineResult<()> {
        if let Some(Operand::Node(child)) = &mut node.right {
            if !child.grouped {
                if let Some(token) = child.operation.as_ref() {
                    if self.precedence_of(token)? < incoming {
                        return self.splice(child, operation, operand, incoming);
                    }
                }
            }
        }

        let displaced = node.right.take();
        node.right = Some(Node::new(displaced, operation, operand).into());
        Ok(())
    }

    /// Precedence of an operator token; unknown operators are diagnosed and fatal
    fn precedence_of(&mut self, token: &Token) -> EngineResult<u8> {
        match precedence(&token.content) {
            Some(level) => Ok(level),
            None => {
                self.report(
                    DiagnosticKind::UnknownOperation,
                    token.from,
                    token.to,
                    format!("Unknown operation '{}'", token.content),
                );
                Err(EngineError::UnknownOperation {
                    operation: token.content.clone(),
                    from: token.from,
                    to: token.to,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Render a tree with explicit parentheses around every node
    fn render(operand: &Operand) -> String {
        match operand {
            Operand::Token(token) => token.content.clone(),
            Operand::Node(node) => {
                let side = |side: &Option<Operand>| side.as_ref().map(render).unwrap_or_default();
                let op = node
                    .operation
                    .as_ref()
                    .map(|t| t.content.as_str())
                    .unwrap_or("?");
                if node.left.is_none() {
                    format!("({}{})", op, side(&node.right))
                } else {
                    format!("({} {} {})", side(&node.left), op, side(&node.right))
                }
            }
        }
    }

    fn parse_str(input: &str) -> EngineResult<Option<Operand>> {
        let mut compiler = Compiler::new(input);
        compiler.tokenize()?;
        compiler.parse()
    }

    fn tree(input: &str) -> String {
        render(&parse_str(input).unwrap().unwrap())
    }

    #[test]
    fn test_parse_single_operand() {
        assert_eq!(tree("42"), "42");
        assert_eq!(tree("hero.name"), "hero.name");
    }

    #[test]
    fn test_parse_precedence() {
        assert_eq!(tree("2 + 3 * 4"), "(2 + (3 * 4))");
        assert_eq!(tree("2 * 3 + 4"), "((2 * 3) + 4)");
        assert_eq!(tree("a || b && c == d"), "(a || (b && (c == d)))");
        assert_eq!(tree("a == b && c || d"), "(((a == b) && c) || d)");
    }

    #[test]
    fn test_parse_left_associative() {
        assert_eq!(tree("10 - 2 - 3"), "((10 - 2) - 3)");
        assert_eq!(tree("8 / 4 * 2"), "((8 / 4) * 2)");
    }

    #[test]
    fn test_parse_groups_are_opaque() {
        assert_eq!(tree("(2 + 3) * 4"), "((2 + 3) * 4)");
        assert_eq!(tree("2 * (3 + 4)"), "(2 * (3 + 4))");
        assert_eq!(tree("((a))"), "a");

        let parsed = parse_str("(1 + 2)").unwrap().unwrap();
        assert!(parsed.as_node().unwrap().grouped);
    }

    #[test]
    fn test_parse_unary_minus() {
        assert_eq!(tree("-5 + 3"), "((0 - 5) + 3)");
        assert_eq!(tree("2 * -3"), "(2 * (0 - 3))");
        assert_eq!(tree("(-a)"), "(0 - a)");

        let parsed = parse_str("-5").unwrap().unwrap();
        let node = parsed.as_node().unwrap();
        assert!(node.grouped);
        assert_eq!(node.left.as_ref().unwrap().as_token().unwrap(), &Token::new("0", 0, 0));
    }

    #[test]
    fn test_parse_not() {
        assert_eq!(tree("!a && b"), "((!a) && b)");
        assert_eq!(tree("a && !b == c"), "(a && ((!b) == c))");
    }

    #[test]
    fn test_parse_conditional() {
        assert_eq!(tree("a ? b : c"), "((a ? b) : c)");
        assert_eq!(tree("x > 1 ? 'big' : 'small'"), "(((x > 1) ? 'big') : 'small')");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(parse_str("").unwrap(), None);
        assert_eq!(parse_str("()").unwrap(), None);
        assert_eq!(parse_str(")").unwrap(), None);
    }

    #[test]
    fn test_parse_unknown_operator_is_fatal() {
        let mut compiler = Compiler::new("a b c + d");
        compiler.tokenize().unwrap();
        let err = compiler.parse().unwrap_err();

        assert_eq!(
            err,
            EngineError::UnknownOperation {
                operation: "b".to_string(),
                from: 2,
                to: 3
            }
        );
        assert_eq!(compiler.diagnostics().len(), 1);
        assert_eq!(compiler.diagnostics()[0].kind, DiagnosticKind::UnknownOperation);
    }

    #[test]
    fn test_parse_restores_depth_after_groups() {
        let mut compiler = Compiler::new("((1 + 2) * (3))");
        compiler.tokenize().unwrap();
        compiler.parse().unwrap();
        assert_eq!(compiler.depth, 0);
    }

    #[test]
    fn test_node_span() {
        let parsed = parse_str("a + b.c").unwrap().unwrap();
        assert_eq!(parsed.span(), Some((0, 7)));
    }

    #[test]
    fn test_precedence_table() {
        assert_eq!(precedence("?"), Some(1));
        assert_eq!(precedence("==="), Some(4));
        assert_eq!(precedence("%"), Some(7));
        assert_eq!(precedence("("), Some(9));
        assert_eq!(precedence("foo"), None);
    }
}
