// ABOUTME: Calculator session data: display, accumulator, pending operator and repeat-equals memory

use crate::models::Operator;

/// Conceptual machine state derived from the session flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineState {
    Empty,
    EnteringFirstOperand,
    OperatorChosen,
    EnteringSecondOperand,
    Evaluated,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Numeric text in the display format, or a message while `showing_error`.
    pub display: String,
    /// History line shown above the display.
    pub record: String,
    pub accumulator: Option<String>,
    pub pending_operator: Option<Operator>,
    pub pending_operator_glyph: Option<&'static str>,
    pub awaiting_second_operand: bool,
    pub just_evaluated: bool,
    pub showing_error: bool,
    pub last_operand: Option<String>,
    pub last_operator: Option<Operator>,
    pub last_operator_glyph: Option<&'static str>,
    pub last_left_operand: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            display: "0".to_string(),
            record: String::new(),
            accumulator: None,
            pending_operator: None,
            pending_operator_glyph: None,
            awaiting_second_operand: false,
            just_evaluated: false,
            showing_error: false,
            last_operand: None,
            last_operator: None,
            last_operator_glyph: None,
            last_left_operand: None,
        }
    }
}

impl Session {
    pub fn state(&self) -> MachineState {
        if self.showing_error {
            MachineState::Error
        } else if self.just_evaluated {
            MachineState::Evaluated
        } else if self.pending_operator.is_some() && self.awaiting_second_operand {
            MachineState::OperatorChosen
        } else if self.pending_operator.is_some() {
            MachineState::EnteringSecondOperand
        } else if self.accumulator.is_none() && self.display == "0" {
            MachineState::Empty
        } else {
            MachineState::EnteringFirstOperand
        }
    }

    pub(crate) fn set_pending(&mut self, operator: Operator) {
        self.pending_operator = Some(operator);
        self.pending_operator_glyph = Some(operator.glyph());
    }

    pub(crate) fn clear_pending(&mut self) {
        self.pending_operator = None;
        self.pending_operator_glyph = None;
    }

    pub(crate) fn clear_last_operation(&mut self) {
        self.last_operand = None;
        self.last_operator = None;
        self.last_operator_glyph = None;
        self.last_left_operand = None;
    }

    /// `"{accumulator} {glyph} {display}"` while an operation is pending,
    /// otherwise the bare display.
    pub(crate) fn update_record_for_typing(&mut self) {
        self.record = match (&self.accumulator, self.pending_operator_glyph) {
            (Some(acc), Some(glyph)) => format!("{acc} {glyph} {}", self.display),
            _ => self.display.clone(),
        };
    }

    /// `"{accumulator} {glyph}"` right after an operator is chosen.
    pub(crate) fn update_pending_record(&mut self) {
        if let (Some(acc), Some(glyph)) = (&self.accumulator, self.pending_operator_glyph) {
            self.record = format!("{acc} {glyph}");
        }
    }
}
