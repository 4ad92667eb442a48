// ABOUTME: Expression state machine driving a two-operand calculator one keypad token at a time
// Arithmetic is delegated: operator and equals tokens yield an EvalRequest for the caller to run

use std::collections::VecDeque;
use tracing::{debug, warn};

use super::evaluator::Evaluator;
use super::session::{MachineState, Session};
use super::token::InputToken;
use crate::client::ComputeError;
use crate::models::{NumberFormat, Operator};

/// What an evaluated result should do to the session once it arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalKind {
    /// A second operator was pressed; the result becomes the new accumulator
    /// and `next` becomes the pending operator.
    Chain { next: Operator },
    Equals,
    /// Equals pressed again right after an evaluation.
    Repeat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalRequest {
    pub ticket: u64,
    pub left: String,
    pub right: String,
    pub operator: Operator,
    pub glyph: &'static str,
    pub kind: EvalKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Idle,
    Evaluate(EvalRequest),
}

#[derive(Debug, Clone, Default)]
pub struct ExpressionMachine {
    session: Session,
    format: NumberFormat,
    in_flight: Option<u64>,
    next_ticket: u64,
    deferred: VecDeque<InputToken>,
}

impl ExpressionMachine {
    pub fn new(format: NumberFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn display(&self) -> &str {
        &self.session.display
    }

    pub fn record(&self) -> &str {
        &self.session.record
    }

    pub fn state(&self) -> MachineState {
        self.session.state()
    }

    pub const fn format(&self) -> NumberFormat {
        self.format
    }

    pub const fn is_evaluating(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    /// Feed one token. While an evaluation is outstanding tokens are queued
    /// and replayed in order once it completes.
    pub fn input(&mut self, token: InputToken) -> Step {
        if self.in_flight.is_some() {
            debug!("Deferring {:?} until the pending evaluation completes", token);
            self.deferred.push_back(token);
            return Step::Idle;
        }
        self.apply(token)
    }

    /// Apply the outcome of a request previously returned from [`input`](Self::input).
    /// Results for anything but the outstanding request are dropped.
    pub fn complete(&mut self, request: EvalRequest, outcome: Result<String, ComputeError>) -> Step {
        if self.in_flight != Some(request.ticket) {
            warn!("Discarding result for stale evaluation #{}", request.ticket);
            return Step::Idle;
        }
        self.in_flight = None;

        match outcome {
            Ok(result) => {
                let result = self.format.localize(&result);
                self.apply_result(request, &result);
            }
            Err(e) => {
                debug!("Evaluation #{} failed: {}", request.ticket, e);
                self.show_message(&e.display_text());
            }
        }

        self.drain_deferred()
    }

    /// Feed a token and run any resulting evaluation to completion.
    pub async fn press<E>(&mut self, token: InputToken, evaluator: &E)
    where
        E: Evaluator + ?Sized,
    {
        let mut step = self.input(token);
        while let Step::Evaluate(request) = step {
            let outcome = evaluator
                .evaluate(&request.left, &request.right, request.operator)
                .await;
            step = self.complete(request, outcome);
        }
    }

    pub async fn press_all<E, I>(&mut self, tokens: I, evaluator: &E)
    where
        E: Evaluator + ?Sized,
        I: IntoIterator<Item = InputToken>,
    {
        for token in tokens {
            self.press(token, evaluator).await;
        }
    }

    /// Put the machine into the error display state. The accumulator is kept
    /// so an operator can continue from the last good value.
    pub fn show_message(&mut self, message: &str) {
        let s = &mut self.session;
        s.display = message.to_string();
        s.record.clear();
        s.clear_pending();
        s.clear_last_operation();
        s.awaiting_second_operand = false;
        s.just_evaluated = false;
        s.showing_error = true;
    }

    /// Return the display to `0` without touching the accumulator.
    pub fn reset_display(&mut self) {
        self.session.display = "0".to_string();
        self.session.showing_error = false;
    }

    pub fn reset(&mut self) {
        self.session = Session::default();
        self.in_flight = None;
        self.deferred.clear();
    }

    fn apply(&mut self, token: InputToken) -> Step {
        match token {
            InputToken::Digit(d) => {
                if let Some(ch) = char::from_digit(u32::from(d), 10) {
                    self.enter(ch);
                }
            }
            InputToken::Decimal => self.enter(self.format.decimal_separator()),
            InputToken::Operator(op) => return self.choose_operator(op),
            InputToken::Equals => return self.equals(),
            InputToken::Backspace => self.backspace(),
            InputToken::ToggleSign => self.toggle_sign(),
            InputToken::Percent => self.percent(),
            InputToken::Clear => {
                self.session = Session::default();
                self.deferred.clear();
            }
        }
        Step::Idle
    }

    fn drain_deferred(&mut self) -> Step {
        while self.in_flight.is_none() {
            let Some(token) = self.deferred.pop_front() else {
                break;
            };
            if let Step::Evaluate(request) = self.apply(token) {
                return Step::Evaluate(request);
            }
        }
        Step::Idle
    }

    fn issue(
        &mut self,
        left: String,
        right: String,
        operator: Operator,
        glyph: &'static str,
        kind: EvalKind,
    ) -> Step {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.in_flight = Some(ticket);
        debug!("Evaluation #{}: {} {} {} ({:?})", ticket, left, glyph, right, kind);
        Step::Evaluate(EvalRequest {
            ticket,
            left,
            right,
            operator,
            glyph,
            kind,
        })
    }

    fn enter(&mut self, ch: char) {
        if self.session.just_evaluated || self.session.showing_error {
            self.session = Session::default();
        }

        let separator = self.format.decimal_separator();
        let s = &mut self.session;
        if s.awaiting_second_operand {
            s.display = if ch == separator {
                format!("0{separator}")
            } else {
                ch.to_string()
            };
            s.awaiting_second_operand = false;
        } else if ch == separator {
            if !s.display.contains(separator) {
                s.display.push(separator);
            }
        } else if s.display == "0" {
            s.display = ch.to_string();
        } else if s.display == "-0" {
            s.display = format!("-{ch}");
        } else {
            s.display.push(ch);
        }
        s.update_record_for_typing();
    }

    fn choose_operator(&mut self, op: Operator) -> Step {
        let s = &mut self.session;

        if s.showing_error {
            let Some(acc) = s.accumulator.clone() else {
                return Step::Idle;
            };
            s.showing_error = false;
            s.display = acc;
            s.set_pending(op);
            s.awaiting_second_operand = true;
            s.update_pending_record();
            return Step::Idle;
        }

        // Fresh start or right after a result: the display becomes the left operand.
        if s.accumulator.is_none() || s.just_evaluated {
            s.accumulator = Some(s.display.clone());
            s.set_pending(op);
            s.awaiting_second_operand = true;
            s.just_evaluated = false;
            s.update_pending_record();
            return Step::Idle;
        }

        if !s.awaiting_second_operand && self.format.is_number(&s.display) {
            if let (Some(left), Some(pending), Some(glyph)) = (
                s.accumulator.clone(),
                s.pending_operator,
                s.pending_operator_glyph,
            ) {
                let right = s.display.clone();
                return self.issue(left, right, pending, glyph, EvalKind::Chain { next: op });
            }
        }

        // Otherwise only the pending operator changes.
        s.set_pending(op);
        s.awaiting_second_operand = true;
        s.update_pending_record();
        Step::Idle
    }

    fn equals(&mut self) -> Step {
        let s = &self.session;
        if s.showing_error {
            return Step::Idle;
        }

        if let (Some(left), Some(op), Some(glyph)) =
            (&s.accumulator, s.pending_operator, s.pending_operator_glyph)
        {
            if self.format.is_number(&s.display) {
                let (left, right) = (left.clone(), s.display.clone());
                return self.issue(left, right, op, glyph, EvalKind::Equals);
            }
            return Step::Idle;
        }

        if let (Some(left), Some(right), Some(op), Some(glyph)) = (
            &s.accumulator,
            &s.last_operand,
            s.last_operator,
            s.last_operator_glyph,
        ) {
            let (left, right) = (left.clone(), right.clone());
            return self.issue(left, right, op, glyph, EvalKind::Repeat);
        }

        Step::Idle
    }

    fn apply_result(&mut self, request: EvalRequest, result: &str) {
        let s = &mut self.session;
        s.showing_error = false;
        s.display = result.to_string();
        s.accumulator = Some(result.to_string());

        match request.kind {
            EvalKind::Chain { next } => {
                s.set_pending(next);
                s.awaiting_second_operand = true;
                s.just_evaluated = false;
                s.clear_last_operation();
                s.update_pending_record();
            }
            EvalKind::Equals | EvalKind::Repeat => {
                s.record = format!("{} {} {} =", request.left, request.glyph, request.right);
                s.last_operand = Some(request.right);
                s.last_operator = Some(request.operator);
                s.last_operator_glyph = Some(request.glyph);
                s.last_left_operand = Some(request.left);
                s.clear_pending();
                s.awaiting_second_operand = false;
                s.just_evaluated = true;
            }
        }
    }

    fn backspace(&mut self) {
        let s = &mut self.session;

        if s.showing_error {
            s.display = "0".to_string();
            s.record.clear();
            s.showing_error = false;
            return;
        }

        if s.just_evaluated {
            s.record.clear();
            s.pending_operator_glyph = None;
            return;
        }

        // Operator chosen but nothing typed yet: cancel the operator.
        if s.awaiting_second_operand && s.pending_operator.is_some() {
            s.clear_pending();
            s.awaiting_second_operand = false;
            s.record = s.accumulator.clone().unwrap_or_default();
            return;
        }

        s.display.pop();
        if s.display.is_empty() || s.display == "-" {
            s.display = "0".to_string();
        }
        s.update_record_for_typing();
    }

    fn toggle_sign(&mut self) {
        if self.session.showing_error {
            return;
        }
        let Some(value) = self.format.parse(&self.session.display) else {
            return;
        };
        self.session.display = self.format.format(-value);
        self.session.just_evaluated = false;
        self.session.update_record_for_typing();
    }

    fn percent(&mut self) {
        if self.session.showing_error {
            return;
        }
        let Some(x) = self.format.parse(&self.session.display) else {
            return;
        };

        let accumulated = self
            .session
            .accumulator
            .as_deref()
            .and_then(|acc| self.format.parse(acc));

        let s = &mut self.session;
        match (accumulated, s.pending_operator) {
            (Some(acc), Some(op)) => {
                let value = if op.is_additive() {
                    acc * x / 100.0
                } else {
                    x / 100.0
                };
                s.display = self.format.format(value);
                s.just_evaluated = false;
                s.update_record_for_typing();
            }
            _ if s.just_evaluated => {
                // Percent of the result against itself.
                let shown = s.display.clone();
                s.display = self.format.format(x * x / 100.0);
                s.record = format!("{shown} %");
                s.just_evaluated = false;
            }
            _ => {
                s.display = "0".to_string();
                s.record.clear();
            }
        }
    }
}
