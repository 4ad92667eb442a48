// ABOUTME: Binary operator model shared by the keypad, the expression machine and the wire protocol
// Keeps the on-screen glyph and the canonical wire symbol apart

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
}

impl Operator {
    /// Parse either a display glyph (`+ - − × ÷`) or a wire symbol (`+ - * /`).
    pub fn from_glyph(glyph: &str) -> Option<Self> {
        match glyph.trim() {
            "+" => Some(Self::Add),
            "-" | "−" => Some(Self::Sub),
            "*" | "×" | "x" | "X" => Some(Self::Mul),
            "/" | "÷" => Some(Self::Div),
            _ => None,
        }
    }

    /// Symbol sent in the `op` field of a compute request.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        }
    }

    /// Glyph shown on the keypad and in the record line.
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "×",
            Self::Div => "÷",
        }
    }

    /// Path segment of the fixed-operator convenience endpoint.
    pub fn route(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
        }
    }

    pub fn is_additive(self) -> bool {
        matches!(self, Self::Add | Self::Sub)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
