// Runtime Values
// Dynamic values produced by expressions and the read-only context they resolve against

use serde::{Deserialize, Serialize};

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// Textual form of an absent value
pub const UNDEFINED: &str = "undefined";

/// Runtime value type used in expression evaluation.
///
/// An absent value (a lookup that found nothing, or an operation that could not
/// produce a result) is represented as `Option::None` by callers, never as a
/// variant here. `Null` is an explicit null supplied by the context.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(HashMap<String, Value>),
}

impl Value {
    /// Script truthiness: `false`, `0`, `NaN`, `""` and `null` are falsy,
    /// every array and object is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The number held by this value, without coercion
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Stringify for interpolation
    pub fn as_string(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Array(_) => self.to_primitive_string(),
            Value::Object(_) => self.to_json(),
        }
    }

    pub fn to_json(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) if n.is_finite() => format_number(*n),
            Value::Number(_) => "null".to_string(),
            Value::String(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
            Value::Array(arr) => {
                let items: Vec<String> = arr.iter().map(|v| v.to_json()).collect();
                format!("[{}]", items.join(","))
            }
            Value::Object(obj) => {
                let mut keys: Vec<&String> = obj.keys().collect();
                keys.sort();
                let items: Vec<String> = keys
                    .into_iter()
                    .map(|k| format!("\"{}\":{}", k, obj[k].to_json()))
                    .collect();
                format!("{{{}}}", items.join(","))
            }
        }
    }

    /// Numeric coercion used by relational and loose-equality comparisons
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => parse_number(s),
            Value::Array(_) | Value::Object(_) => parse_number(&self.to_primitive_string()),
        }
    }

    /// Primitive string form of a composite, as used when comparing it with a scalar
    fn to_primitive_string(&self) -> String {
        match self {
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::Null => String::new(),
                    other => other.to_primitive_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => "[object Object]".to_string(),
            other => other.as_string(),
        }
    }

    /// Type-juggling equality (`==`)
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::String(b)) | (Value::String(b), Value::Number(a)) => {
                *a == parse_number(b)
            }
            (Value::Bool(a), other) | (other, Value::Bool(a)) => {
                Value::Number(f64::from(u8::from(*a))).loose_eq(other)
            }
            (
                Value::Array(_) | Value::Object(_),
                Value::Array(_) | Value::Object(_),
            ) => self == other,
            (Value::Array(_) | Value::Object(_), scalar) => {
                Value::String(self.to_primitive_string()).loose_eq(scalar)
            }
            (scalar, composite) => {
                Value::String(composite.to_primitive_string()).loose_eq(scalar)
            }
        }
    }

    /// Type-and-value equality (`===`). Composites compare structurally.
    pub fn strict_eq(&self, other: &Value) -> bool {
        self == other
    }

    /// Relational ordering without type checks: two strings compare
    /// lexicographically, anything else numerically. `None` when either side
    /// coerces to `NaN`.
    pub fn script_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => self.to_number().partial_cmp(&other.to_number()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

/// Format a number the way scripts print it: no trailing `.0`, named infinities
pub fn format_number(n: f64) -> String {
    if n.is_infinite() {
        let name = if n > 0.0 { "Infinity" } else { "-Infinity" };
        name.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        n.to_string()
    }
}

/// Parse a string as a number with script semantics: surrounding whitespace is
/// ignored, an empty string is zero, anything unparsable is `NaN`.
pub fn parse_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    // Rust also accepts "inf" and "nan", which are identifiers here
    if trimmed
        .bytes()
        .any(|b| b.is_ascii_alphabetic() && b != b'e' && b != b'E')
    {
        return f64::NAN;
    }

    trimmed.parse().unwrap_or(f64::NAN)
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(map: HashMap<String, Value>) -> Self {
        Value::Object(map)
    }
}

/// Read-only variable context supplied by the host for each evaluation.
///
/// Two root keys have special meaning for the template engine: `#` seeds the
/// choice shorthand and `locale` provides the default formatting locale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
    values: HashMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, for hosts assembling a context up front
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Root-level lookup, no path traversal
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Deep lookup of a dot-separated path such as `player.stats.hp`.
    ///
    /// Array segments are numeric indices; `length` is available on arrays and
    /// strings.
    pub fn lookup(&self, path: &str) -> Option<Value> {
        let mut segments = path.split('.');
        let mut current = self.values.get(segments.next()?)?.clone();

        for segment in segments {
            current = match (&current, segment) {
                (Value::Object(map), key) => map.get(key)?.clone(),
                (Value::Array(items), "length") => Value::Number(items.len() as f64),
                (Value::Array(items), index) => items.get(index.parse::<usize>().ok()?)?.clone(),
                (Value::String(s), "length") => Value::Number(s.chars().count() as f64),
                _ => return None,
            };
        }

        Some(current)
    }

    /// Locale requested by the context's `locale` key
    pub fn locale(&self) -> Option<&str> {
        self.values.get("locale").and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<HashMap<String, Value>> for Context {
    fn from(values: HashMap<String, Value>) -> Self {
        Self { values }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player_context() -> Context {
        let mut stats = HashMap::new();
        stats.insert("hp".to_string(), Value::Number(12.0));
        let mut player = HashMap::new();
        player.insert("name".to_string(), Value::from("Ada"));
        player.insert("stats".to_string(), Value::Object(stats));
        player.insert("items".to_string(), Value::from(vec!["sword", "lamp"]));

        Context::new().with("player", Value::Object(player))
    }

    #[test]
    fn test_value_is_truthy() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(Value::Number(1.0).is_truthy());
        assert!(!Value::String("".to_string()).is_truthy());
        assert!(Value::String("hello".to_string()).is_truthy());
        assert!(Value::Array(vec![]).is_truthy());
    }

    #[test]
    fn test_value_as_string() {
        assert_eq!(Value::Null.as_string(), "null");
        assert_eq!(Value::Bool(true).as_string(), "true");
        assert_eq!(Value::Number(42.0).as_string(), "42");
        assert_eq!(Value::Number(3.14).as_string(), "3.14");
        assert_eq!(Value::Number(-0.0).as_string(), "0");
        assert_eq!(Value::Number(f64::INFINITY).as_string(), "Infinity");
        assert_eq!(Value::Number(f64::NAN).as_string(), "NaN");
        assert_eq!(Value::String("hello".to_string()).as_string(), "hello");
        assert_eq!(Value::from(vec![1, 2]).as_string(), "1,2");

        let mut obj = HashMap::new();
        obj.insert("b".to_string(), Value::from(vec![1.5]));
        obj.insert("a".to_string(), Value::from("x\"y"));
        assert_eq!(Value::Object(obj).as_string(), r#"{"a":"x\"y","b":[1.5]}"#);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("42"), 42.0);
        assert_eq!(parse_number(" 1.5 "), 1.5);
        assert_eq!(parse_number(""), 0.0);
        assert_eq!(parse_number("1e3"), 1000.0);
        assert!(parse_number("abc").is_nan());
        assert!(parse_number("inf").is_nan());
        assert!(parse_number("Infinity").is_infinite());
    }

    #[test]
    fn test_loose_equality() {
        assert!(Value::Number(1.0).loose_eq(&Value::from("1")));
        assert!(Value::Bool(true).loose_eq(&Value::Number(1.0)));
        assert!(Value::Bool(false).loose_eq(&Value::from("0")));
        assert!(Value::from("").loose_eq(&Value::Number(0.0)));
        assert!(Value::from(vec![5]).loose_eq(&Value::from("5")));
        assert!(!Value::Null.loose_eq(&Value::Number(0.0)));
        assert!(!Value::Number(f64::NAN).loose_eq(&Value::Number(f64::NAN)));
    }

    #[test]
    fn test_strict_equality() {
        assert!(Value::Number(1.0).strict_eq(&Value::Number(1.0)));
        assert!(!Value::Number(1.0).strict_eq(&Value::from("1")));
        assert!(!Value::Bool(true).strict_eq(&Value::Number(1.0)));
    }

    #[test]
    fn test_script_cmp() {
        assert_eq!(
            Value::from("apple").script_cmp(&Value::from("banana")),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::from("10").script_cmp(&Value::Number(9.0)),
            Some(Ordering::Greater)
        );
        assert_eq!(Value::Number(1.0).script_cmp(&Value::from("a")), None);
    }

    #[test]
    fn test_context_deep_lookup() {
        let ctx = player_context();

        assert_eq!(ctx.lookup("player.name"), Some(Value::from("Ada")));
        assert_eq!(ctx.lookup("player.stats.hp"), Some(Value::Number(12.0)));
        assert_eq!(ctx.lookup("player.items.1"), Some(Value::from("lamp")));
        assert_eq!(ctx.lookup("player.items.length"), Some(Value::Number(2.0)));
        assert_eq!(ctx.lookup("player.name.length"), Some(Value::Number(3.0)));
        assert_eq!(ctx.lookup("player.mana"), None);
        assert_eq!(ctx.lookup("player.items.7"), None);
        assert_eq!(ctx.lookup("nobody"), None);
        assert_eq!(ctx.lookup(""), None);
    }

    #[test]
    fn test_context_deserializes_from_json() {
        let ctx: Context =
            serde_json::from_str(r##"{"name": "Ada", "gold": 3, "#": [2, "npc"], "flag": null}"##)
                .unwrap();

        assert_eq!(ctx.get("name"), Some(&Value::from("Ada")));
        assert_eq!(ctx.get("gold"), Some(&Value::Number(3.0)));
        assert_eq!(
            ctx.get("#"),
            Some(&Value::Array(vec![Value::Number(2.0), Value::from("npc")]))
        );
        assert_eq!(ctx.get("flag"), Some(&Value::Null));
    }

    #[test]
    fn test_context_locale() {
        let ctx = Context::new().with("locale", "fr-FR");
        assert_eq!(ctx.locale(), Some("fr-FR"));
        assert_eq!(Context::new().locale(), None);
    }
}
