// ABOUTME: Numeric text handling with separate display-locale and invariant wire formats
// Display text follows the user's decimal separator; anything serialized uses '.'

use std::env;

/// Significant digits kept when formatting a value received from the server.
pub const SIGNIFICANT_DIGITS: usize = 15;

/// Languages whose locales write a decimal comma.
const COMMA_LANGUAGES: &[&str] = &[
    "bg", "ca", "cs", "da", "de", "el", "es", "et", "fi", "fr", "hr", "hu", "id", "it", "lt",
    "lv", "nb", "nl", "nn", "no", "pl", "pt", "ro", "ru", "sk", "sl", "sr", "sv", "tr", "uk",
    "vi",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberFormat {
    decimal_separator: char,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self::invariant()
    }
}

impl NumberFormat {
    pub const fn invariant() -> Self {
        Self { decimal_separator: '.' }
    }

    pub const fn with_separator(decimal_separator: char) -> Self {
        Self { decimal_separator }
    }

    /// Pick the display format from `LC_ALL`, `LC_NUMERIC` or `LANG`, in that order.
    pub fn from_env() -> Self {
        ["LC_ALL", "LC_NUMERIC", "LANG"]
            .iter()
            .filter_map(|var| env::var(var).ok())
            .find(|value| !value.is_empty())
            .map_or_else(Self::invariant, |value| Self::from_locale_name(&value))
    }

    /// Map a POSIX-style locale name such as `de_DE.UTF-8` to a format.
    pub fn from_locale_name(name: &str) -> Self {
        let language = name
            .split(['_', '-', '.', '@'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        if COMMA_LANGUAGES.contains(&language.as_str()) {
            Self::with_separator(',')
        } else {
            Self::invariant()
        }
    }

    pub const fn decimal_separator(self) -> char {
        self.decimal_separator
    }

    /// Parse display text. Only finite values count as numbers.
    pub fn parse(self, text: &str) -> Option<f64> {
        parse_with_separator(text, self.decimal_separator)
    }

    pub fn is_number(self, text: &str) -> bool {
        self.parse(text).is_some()
    }

    /// Format a locally computed value for the display.
    pub fn format(self, value: f64) -> String {
        self.localize(&format_shortest(value))
    }

    /// Convert display text to its invariant wire form. Text that does not
    /// parse is passed through untouched so the server can reject it.
    pub fn to_invariant(self, text: &str) -> String {
        self.parse(text)
            .map_or_else(|| text.to_string(), format_shortest)
    }

    /// Convert invariant text (from the wire) to display text.
    pub fn localize(self, invariant: &str) -> String {
        if self.decimal_separator == '.' {
            invariant.to_string()
        } else {
            invariant.replace('.', &self.decimal_separator.to_string())
        }
    }
}

/// Parse invariant text as sent by the compute endpoint.
pub fn parse_invariant(text: &str) -> Option<f64> {
    parse_with_separator(text, '.')
}

/// Shortest text that round-trips `value`, laid out like [`format_significant`];
/// negative zero prints as `0`.
fn format_shortest(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }
    layout(&format!("{value:e}"))
}

/// General format with [`SIGNIFICANT_DIGITS`] significant digits, invariant
/// separator, trailing zeros trimmed and `E+XX` notation for very large or
/// very small magnitudes.
pub fn format_significant(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }
    layout(&format!("{:.*e}", SIGNIFICANT_DIGITS - 1, value))
}

/// Lay out Rust `{:e}` text: plain decimal for exponents in `-5..15`,
/// otherwise `d.dddE+XX`.
fn layout(scientific: &str) -> String {
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if mantissa.starts_with('-') { "-" } else { "" };
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let digits = digits.trim_end_matches('0');
    let digits = if digits.is_empty() { "0" } else { digits };

    let max_exponent = i32::try_from(SIGNIFICANT_DIGITS).unwrap_or(i32::MAX);
    if exponent < -5 || exponent >= max_exponent {
        let (head, tail) = digits.split_at(1);
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        if tail.is_empty() {
            format!("{sign}{head}E{exp_sign}{:02}", exponent.abs())
        } else {
            format!("{sign}{head}.{tail}E{exp_sign}{:02}", exponent.abs())
        }
    } else if exponent < 0 {
        let zeros = usize::try_from(-exponent - 1).unwrap_or(0);
        format!("{sign}0.{}{digits}", "0".repeat(zeros))
    } else {
        let int_len = usize::try_from(exponent).unwrap_or(0) + 1;
        if digits.len() <= int_len {
            format!("{sign}{digits}{}", "0".repeat(int_len - digits.len()))
        } else {
            format!("{sign}{}.{}", &digits[..int_len], &digits[int_len..])
        }
    }
}

fn parse_with_separator(text: &str, separator: char) -> Option<f64> {
    let text = text.trim();
    let mut normalized = String::with_capacity(text.len());
    let mut seen_digit = false;
    let mut seen_separator = false;
    let mut seen_exponent = false;
    let mut exponent_digit = false;

    for ch in text.chars() {
        match ch {
            '0'..='9' => {
                if seen_exponent {
                    exponent_digit = true;
                } else {
                    seen_digit = true;
                }
                normalized.push(ch);
            }
            '+' | '-' if normalized.is_empty() || normalized.ends_with('e') => normalized.push(ch),
            c if c == separator && !seen_separator && !seen_exponent => {
                seen_separator = true;
                normalized.push('.');
            }
            'e' | 'E' if seen_digit && !seen_exponent => {
                seen_exponent = true;
                normalized.push('e');
            }
            _ => return None,
        }
    }

    if !seen_digit || (seen_exponent && !exponent_digit) {
        return None;
    }

    normalized.parse::<f64>().ok().filter(|value| value.is_finite())
}
