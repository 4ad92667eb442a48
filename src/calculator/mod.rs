// ABOUTME: Calculator expression handling: input tokens, session state and the evaluation seam

pub mod evaluator;
pub mod machine;
pub mod session;
pub mod token;

pub use evaluator::Evaluator;
pub use machine::{EvalKind, EvalRequest, ExpressionMachine, Step};
pub use session::{MachineState, Session};
pub use token::InputToken;
