// ABOUTME: Compute client turning an (operand, operand, operator) triple into an authenticated POST
// Interprets status codes into typed errors and reports transport failures to the connection monitor

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::audit::AuditLog;
use super::error::ComputeError;
use super::protocol::{ComputeRequest, ComputeResponse, ComputeRoute, ErrorBody};
use crate::calculator::Evaluator;
use crate::connection::{ConnectionMonitor, Endpoint, EndpointHandle};
use crate::models::{format_significant, parse_invariant, NumberFormat, Operator};

const MAX_LOGGED_BODY: usize = 512;

pub struct ComputeClient {
    endpoint: EndpointHandle,
    monitor: Arc<ConnectionMonitor>,
    audit: Arc<AuditLog>,
    format: NumberFormat,
    route: ComputeRoute,
}

impl ComputeClient {
    /// Build a client that shares the monitor's endpoint configuration.
    /// `format` is the display format the operands arrive in.
    pub fn new(monitor: Arc<ConnectionMonitor>, audit: Arc<AuditLog>, format: NumberFormat) -> Self {
        Self {
            endpoint: monitor.endpoint().clone(),
            monitor,
            audit,
            format,
            route: ComputeRoute::default(),
        }
    }

    #[must_use]
    pub const fn with_route(mut self, route: ComputeRoute) -> Self {
        self.route = route;
        self
    }

    /// Evaluate `left operator right` remotely. Operands are display text;
    /// the result is invariant text with 15 significant digits.
    pub async fn compute(
        &self,
        left: &str,
        right: &str,
        operator: Operator,
    ) -> Result<String, ComputeError> {
        let endpoint = self.endpoint.current();
        let outcome = self.exchange(&endpoint, left, right, operator).await;
        if let Err(e) = &outcome {
            if e.triggers_reconnect() {
                self.monitor.connection_lost(endpoint.epoch());
            }
        }
        outcome
    }

    async fn exchange(
        &self,
        endpoint: &Endpoint,
        left: &str,
        right: &str,
        operator: Operator,
    ) -> Result<String, ComputeError> {
        let request = ComputeRequest {
            op: operator,
            num1: self.format.to_invariant(left),
            num2: self.format.to_invariant(right),
        };

        let url = endpoint
            .join(self.route.path(operator))
            .map_err(|e| ComputeError::UnexpectedResponse(format!("invalid compute URL: {e}")))?;
        let request_json = serde_json::to_string(&request)
            .map_err(|e| ComputeError::UnexpectedResponse(e.to_string()))?;

        self.audit.request(operator.symbol(), &request.num1, &request.num2);
        debug!("POST {} {}", url, request_json);

        let sent = endpoint
            .authorize(endpoint.http().post(url.clone()).json(&request))
            .send()
            .await;
        let response = match sent {
            Ok(response) => response,
            Err(e) => return Err(self.transport_failure(endpoint, &e)),
        };

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_string())
            .unwrap_or_default();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return Err(self.transport_failure(endpoint, &e)),
        };

        self.audit.meta(url.as_str(), status.as_u16(), &content_type);
        debug!(
            "Status: {} Content-Type: {} Body: {}",
            status,
            content_type,
            truncate(&body)
        );

        self.interpret(status, &body, &request_json)
    }

    fn interpret(
        &self,
        status: StatusCode,
        body: &str,
        request_json: &str,
    ) -> Result<String, ComputeError> {
        let code = status.as_u16();

        if status.is_success() {
            let parsed = serde_json::from_str::<ComputeResponse>(body)
                .ok()
                .and_then(|r| parse_invariant(&r.result).map(|value| (r.result, value)));

            return match parsed {
                Some((raw, value)) => {
                    self.audit.response(&raw);
                    Ok(format_significant(value))
                }
                None => {
                    self.audit.error("Unexpected response payload", Some(code));
                    Err(ComputeError::UnexpectedResponse(truncate(body)))
                }
            };
        }

        if status == StatusCode::UNAUTHORIZED {
            let message = ErrorBody::extract(body).unwrap_or_else(|| "Unauthorized".to_string());
            warn!("Compute request rejected: {}", message);
            self.audit.error("Unauthorized", Some(code));
            return Err(ComputeError::Unauthorized { message });
        }

        if status.is_server_error() {
            self.audit.error(&format!("Server error {code}"), Some(code));
            error!(
                "Server error (HTTP {}). Request: {}, Response: {}",
                code,
                request_json,
                truncate(body)
            );
            return Err(ComputeError::Server { status: code });
        }

        let message = ErrorBody::extract(body).unwrap_or_else(|| format!("HTTP {code}"));
        self.audit.error(&message, Some(code));
        Err(ComputeError::Rejected { status: code, message })
    }

    fn transport_failure(&self, endpoint: &Endpoint, e: &reqwest::Error) -> ComputeError {
        warn!("Compute request to {} failed: {}", endpoint.base_url(), e);
        self.audit.error("Connection error", None);
        ComputeError::ConnectionLost(e.to_string())
    }
}

#[async_trait]
impl Evaluator for ComputeClient {
    async fn evaluate(
        &self,
        left: &str,
        right: &str,
        operator: Operator,
    ) -> Result<String, ComputeError> {
        self.compute(left, right, operator).await
    }
}

fn truncate(body: &str) -> String {
    if body.len() <= MAX_LOGGED_BODY {
        return body.to_string();
    }
    let mut end = MAX_LOGGED_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
