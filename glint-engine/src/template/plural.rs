// Plural Rules
// CLDR cardinal plural categories for a table of common languages

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluralCategory {
    Zero,
    One,
    Two,
    Few,
    Many,
    Other,
}

impl fmt::Display for PluralCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PluralCategory::Zero => "zero",
            PluralCategory::One => "one",
            PluralCategory::Two => "two",
            PluralCategory::Few => "few",
            PluralCategory::Many => "many",
            PluralCategory::Other => "other",
        };
        write!(f, "{}", name)
    }
}

/// Rule families, each shared by several languages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rules {
    /// one, other (English, German, Spanish, Italian, ...)
    OneOther,
    /// one for 0 <= n < 2 (French, Portuguese)
    ZeroOneOther,
    /// one, few, many, other (Russian, Ukrainian, Belarusian)
    EastSlavic,
    Polish,
    /// one, few, other (Czech, Slovak)
    WestSlavic,
    Arabic,
    /// other only (Japanese, Chinese, Korean, ...)
    Invariant,
}

use PluralCategory::*;

impl Rules {
    fn for_locale(locale: Option<&str>) -> Self {
        let language = locale
            .and_then(|l| l.split(['-', '_']).next())
            .unwrap_or("en")
            .to_ascii_lowercase();

        match language.as_str() {
            "fr" | "pt" => Rules::ZeroOneOther,
            "ru" | "uk" | "be" => Rules::EastSlavic,
            "pl" => Rules::Polish,
            "cs" | "sk" => Rules::WestSlavic,
            "ar" => Rules::Arabic,
            "ja" | "zh" | "ko" | "vi" | "th" | "id" | "ms" => Rules::Invariant,
            _ => Rules::OneOther,
        }
    }

    fn categories(self) -> &'static [PluralCategory] {
        match self {
            Rules::OneOther | Rules::ZeroOneOther => &[One, Other],
            Rules::EastSlavic | Rules::Polish => &[One, Few, Many, Other],
            Rules::WestSlavic => &[One, Few, Other],
            Rules::Arabic => &[Zero, One, Two, Few, Many, Other],
            Rules::Invariant => &[Other],
        }
    }

    fn category(self, n: f64) -> PluralCategory {
        let abs = n.abs();
        let integral = abs.fract() == 0.0;
        let i = abs.trunc() as u64;

        match self {
            Rules::OneOther => {
                if integral && i == 1 {
                    One
                } else {
                    Other
                }
            }
            Rules::ZeroOneOther => {
                if abs < 2.0 {
                    One
                } else {
                    Other
                }
            }
            Rules::EastSlavic | Rules::Polish if !integral => Other,
            Rules::EastSlavic => match (i % 10, i % 100) {
                (1, m) if m != 11 => One,
                (2..=4, m) if !(12..=14).contains(&m) => Few,
                _ => Many,
            },
            Rules::Polish => match (i, i % 10, i % 100) {
                (1, _, _) => One,
                (_, 2..=4, m) if !(12..=14).contains(&m) => Few,
                _ => Many,
            },
            Rules::WestSlavic => match (integral, i) {
                (false, _) => Other,
                (true, 1) => One,
                (true, 2..=4) => Few,
                _ => Other,
            },
            Rules::Arabic => {
                if !integral {
                    return Other;
                }
                match (i, i % 100) {
                    (0, _) => Zero,
                    (1, _) => One,
                    (2, _) => Two,
                    (_, 3..=10) => Few,
                    (_, 11..=99) => Many,
                    _ => Other,
                }
            }
            Rules::Invariant => Other,
        }
    }
}

/// Plural category of `n` in `locale`; English rules when the locale is
/// missing or unknown
pub fn plural_category(locale: Option<&str>, n: f64) -> PluralCategory {
    Rules::for_locale(locale).category(n)
}

/// Categories used by `locale`, in the order pluralize options are listed
pub fn categories(locale: Option<&str>) -> &'static [PluralCategory] {
    Rules::for_locale(locale).categories()
}

/// Whether `locale` follows the English one/other rules
pub fn is_english_like(locale: Option<&str>) -> bool {
    Rules::for_locale(locale) == Rules::OneOther
}
