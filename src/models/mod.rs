// ABOUTME: Core value types shared by the calculator, the compute client and the UI

pub mod number;
pub mod operator;

pub use number::{format_significant, parse_invariant, NumberFormat};
pub use operator::Operator;
