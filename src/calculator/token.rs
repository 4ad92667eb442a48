// ABOUTME: Discrete keypad input tokens fed into the expression machine

use crate::models::Operator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputToken {
    Digit(u8),
    Decimal,
    Operator(Operator),
    Equals,
    Backspace,
    ToggleSign,
    Percent,
    Clear,
}

impl InputToken {
    /// Map a keypad label (`7`, `.`, `×`, `=`, `←`, `±`, `%`, `C`, ...) to a token.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if let Some(op) = Operator::from_glyph(label) {
            return Some(Self::Operator(op));
        }
        match label {
            "." | "," => Some(Self::Decimal),
            "=" => Some(Self::Equals),
            "←" | "⌫" | "BS" => Some(Self::Backspace),
            "±" | "+/-" => Some(Self::ToggleSign),
            "%" => Some(Self::Percent),
            "C" | "c" => Some(Self::Clear),
            _ => {
                let mut chars = label.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => ch
                        .to_digit(10)
                        .and_then(|d| u8::try_from(d).ok())
                        .map(Self::Digit),
                    _ => None,
                }
            }
        }
    }

    /// Whether this token can lead to a remote evaluation.
    pub const fn may_evaluate(self) -> bool {
        matches!(self, Self::Operator(_) | Self::Equals)
    }
}
