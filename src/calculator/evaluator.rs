// ABOUTME: Seam between the expression machine and whatever performs the arithmetic

use async_trait::async_trait;

use crate::client::ComputeError;
use crate::models::Operator;

/// Evaluates `left operator right`. Operands are display text; the result is
/// invariant numeric text.
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(
        &self,
        left: &str,
        right: &str,
        operator: Operator,
    ) -> Result<String, ComputeError>;
}
