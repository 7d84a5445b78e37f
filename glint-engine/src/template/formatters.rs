// Template Formatters
// Pluggable value formatters invoked from `{tag:formatter:args}` placeholders

use crate::expression::diagnostics::{Diagnostic, DiagnosticKind};
use crate::template::plural::{categories, is_english_like, plural_category, PluralCategory};
use crate::value::{format_number, Value, UNDEFINED};

use once_cell::sync::Lazy;
use regex::RegexBuilder;
use rustc_hash::FxHashMap;
use tracing::trace;

use std::fmt;
use std::hash::Hasher;
use std::sync::Arc;

/// Result of a formatter call. Diagnostic spans are relative to the
/// `|`-joined argument text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormatOutput {
    pub text: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl FormatOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            diagnostics: Vec::new(),
        }
    }

    /// Absent result with a single `InvalidFormatterArguments` diagnostic
    pub fn invalid(message: impl Into<String>, args: &[&str]) -> Self {
        let joined = args.join("|");
        let diagnostic = Diagnostic::spanning(
            DiagnosticKind::InvalidFormatterArguments,
            message,
            &joined,
            0,
            joined.len(),
        );
        Self {
            text: None,
            diagnostics: vec![diagnostic],
        }
    }
}

/// A pure formatting function: value and locale in, text (or nothing) out
pub trait Formatter: Send + Sync {
    fn format(&self, value: Option<&Value>, locale: Option<&str>, args: &[&str]) -> FormatOutput;
}

impl<F> Formatter for F
where
    F: Fn(Option<&Value>, Option<&str>, &[&str]) -> FormatOutput + Send + Sync,
{
    fn format(&self, value: Option<&Value>, locale: Option<&str>, args: &[&str]) -> FormatOutput {
        self(value, locale, args)
    }
}

static BUILTIN: Lazy<FormatterRegistry> = Lazy::new(FormatterRegistry::with_builtins);

/// Name to formatter mapping consulted by the template engine
#[derive(Clone, Default)]
pub struct FormatterRegistry {
    formatters: FxHashMap<String, Arc<dyn Formatter>>,
}

impl FormatterRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `choose`, `pluralize` and `regex` under their short aliases
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("choose", choose);
        registry.register("pluralize", pluralize);
        registry.register("regex", regex_rewrite);
        registry.alias("c", "choose");
        registry.alias("p", "pluralize");
        registry.alias("r", "regex");
        registry
    }

    /// Shared registry of the built-in formatters
    pub fn builtin() -> &'static FormatterRegistry {
        &BUILTIN
    }

    pub fn register(&mut self, name: impl Into<String>, formatter: impl Formatter + 'static) {
        self.formatters.insert(name.into(), Arc::new(formatter));
    }

    /// Make `alias` resolve to the formatter registered as `target`.
    /// Returns false when `target` is unknown.
    pub fn alias(&mut self, alias: impl Into<String>, target: &str) -> bool {
        match self.formatters.get(target).cloned() {
            Some(formatter) => {
                self.formatters.insert(alias.into(), formatter);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Formatter> {
        self.formatters.get(name).map(|f| f.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.formatters.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.formatters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for FormatterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatterRegistry")
            .field("formatters", &self.names())
            .finish()
    }
}

/// Pick one of `options`.
///
/// A number or boolean selects by index. A two-element `[index, salt]` array
/// makes a stable pseudo-random pick: the salt is hashed and offset by
/// `index`, so the same salt and index always give the same option.
pub fn choose(value: Option<&Value>, _locale: Option<&str>, options: &[&str]) -> FormatOutput {
    let index = match value {
        Some(Value::Bool(b)) => Some(usize::from(*b)),
        Some(Value::Number(n)) => whole_index(*n),
        Some(Value::Array(pair)) if pair.len() == 2 => seeded_index(&pair[0], &pair[1], options.len()),
        _ => {
            return FormatOutput::invalid(
                "choose expects a number, a boolean or an [index, salt] pair",
                options,
            )
        }
    };

    match index.and_then(|i| options.get(i)) {
        Some(option) => {
            trace!(index = ?index, option, "choose");
            FormatOutput::text(*option)
        }
        None => FormatOutput::invalid(
            format!(
                "choose index {} is out of range for {} options",
                value.map_or_else(|| UNDEFINED.to_string(), Value::as_string),
                options.len()
            ),
            options,
        ),
    }
}

fn whole_index(n: f64) -> Option<usize> {
    (n >= 0.0 && n.fract() == 0.0 && n <= usize::MAX as f64).then_some(n as usize)
}

fn seeded_index(index: &Value, salt: &Value, len: usize) -> Option<usize> {
    let index = index.as_number().filter(|n| n.fract() == 0.0)?;
    if len == 0 {
        return None;
    }

    let mut hasher = SeedHasher::default();
    hasher.write(salt.as_string().as_bytes());
    let len = len as u64;
    let base = hasher.finish() % len;
    let offset = (index as i64).rem_euclid(len as i64) as u64;

    Some(((base + offset) % len) as usize)
}

/// 64-bit FNV-1a over raw bytes. Seeded picks must not depend on the target
/// or on the std `Hash` encoding, so the salt is fed in with `write` only.
struct SeedHasher(u64);

impl SeedHasher {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
}

impl Default for SeedHasher {
    fn default() -> Self {
        Self(Self::OFFSET_BASIS)
    }
}

impl Hasher for SeedHasher {
    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.0 ^= u64::from(*byte);
            self.0 = self.0.wrapping_mul(Self::PRIME);
        }
    }

    fn finish(&self) -> u64 {
        self.0
    }
}

/// Pick an option by the plural category of a number.
///
/// Options follow the locale's category order (`one|other` in English,
/// `one|few|many|other` in Russian). English also takes `zero|one|other`.
/// Every `#` in the chosen option becomes the number.
pub fn pluralize(value: Option<&Value>, locale: Option<&str>, options: &[&str]) -> FormatOutput {
    let Some(n) = value.and_then(Value::as_number) else {
        return FormatOutput::invalid("pluralize expects a number", options);
    };

    let chosen = if is_english_like(locale) && options.len() == 3 {
        if n == 0.0 {
            options[0]
        } else if plural_category(locale, n) == PluralCategory::One {
            options[1]
        } else {
            options[2]
        }
    } else {
        let order = categories(locale);
        if options.len() < order.len() {
            return FormatOutput::invalid(
                format!(
                    "pluralize expects {} options ({}), got {}",
                    order.len(),
                    order
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join("|"),
                    options.len()
                ),
                options,
            );
        }

        let category = plural_category(locale, n);
        let position = order.iter().position(|c| *c == category).unwrap_or(order.len() - 1);
        options[position]
    };

    FormatOutput::text(chosen.replace('#', &format_number(n)))
}

/// Rewrite a value through `pattern=replacement` rules.
///
/// Rules are tried in order, case-insensitively, against the stringified
/// value; the first match yields its replacement with `$1`-style captures
/// expanded. A rule with an empty pattern is the fallback. Without any rules
/// the locale's indefinite article for the value is produced.
pub fn regex_rewrite(value: Option<&Value>, locale: Option<&str>, args: &[&str]) -> FormatOutput {
    let text = value.map_or_else(|| UNDEFINED.to_string(), Value::as_string);

    if args.iter().all(|arg| arg.is_empty()) {
        return FormatOutput::text(indefinite_article(locale, &text).unwrap_or(&text));
    }

    let joined = args.join("|");
    let mut diagnostics = Vec::new();
    let mut fallback = None;
    let mut offset = 0;

    for arg in args {
        let from = offset;
        offset += arg.len() + 1;

        if arg.is_empty() {
            continue;
        }

        let Some((pattern, replacement)) = arg.split_once('=') else {
            diagnostics.push(Diagnostic::spanning(
                DiagnosticKind::InvalidFormatterArguments,
                format!("expected pattern=replacement, got '{}'", arg),
                &joined,
                from,
                from + arg.len(),
            ));
            continue;
        };

        if pattern.is_empty() {
            fallback.get_or_insert(replacement);
            continue;
        }

        let re = match RegexBuilder::new(pattern).case_insensitive(true).build() {
            Ok(re) => re,
            Err(e) => {
                diagnostics.push(Diagnostic::spanning(
                    DiagnosticKind::InvalidFormatterArguments,
                    format!("invalid pattern '{}': {}", pattern, e),
                    &joined,
                    from,
                    from + pattern.len(),
                ));
                continue;
            }
        };

        if let Some(captures) = re.captures(&text) {
            let mut expanded = String::new();
            captures.expand(replacement, &mut expanded);
            return FormatOutput {
                text: Some(expanded),
                diagnostics,
            };
        }
    }

    FormatOutput {
        text: Some(fallback.map(str::to_string).unwrap_or(text)),
        diagnostics,
    }
}

/// Indefinite article for `word`, for locales that have an article table
fn indefinite_article(locale: Option<&str>, word: &str) -> Option<&'static str> {
    let english = locale.map_or(true, |l| l.to_ascii_lowercase().starts_with("en"));
    if !english {
        return None;
    }

    let first = word.trim_start().chars().next()?;
    let article = if "aeiouAEIOU".contains(first) { "an" } else { "a" };
    Some(article)
}
