// ABOUTME: JSON wire types for the compute endpoint
// Field names are case-sensitive and every numeric value travels as an invariant string

use serde::{Deserialize, Serialize};

use crate::models::Operator;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeRequest {
    pub op: Operator,
    pub num1: String,
    pub num2: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeResponse {
    #[serde(default)]
    pub op: Option<String>,
    #[serde(default)]
    pub num1: Option<String>,
    #[serde(default)]
    pub num2: Option<String>,
    pub result: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    /// Pull a non-blank `error` message out of a response body.
    pub fn extract(body: &str) -> Option<String> {
        serde_json::from_str::<Self>(body)
            .ok()
            .map(|b| b.error)
            .filter(|msg| !msg.trim().is_empty())
    }
}

/// Which endpoint a compute request is posted to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ComputeRoute {
    /// `POST {base}/compute` with the operator in the body.
    #[default]
    Generic,
    /// `POST {base}/add|sub|mul|div`.
    PerOperator,
}

impl ComputeRoute {
    pub fn path(self, operator: Operator) -> &'static str {
        match self {
            Self::Generic => "compute",
            Self::PerOperator => operator.route(),
        }
    }
}
