// ABOUTME: Scenario tests for the expression machine against a local arithmetic evaluator and mocks

use async_trait::async_trait;
use mockall::mock;
use pretty_assertions::assert_eq;

use netcalc::calculator::{Evaluator, ExpressionMachine, InputToken, MachineState};
use netcalc::client::ComputeError;
use netcalc::models::{format_significant, NumberFormat, Operator};

/// Evaluates locally with the same operand handling and error messages as the server.
struct Arithmetic {
    format: NumberFormat,
}

impl Arithmetic {
    fn new() -> Self {
        Self {
            format: NumberFormat::invariant(),
        }
    }

    fn rejected(message: &str) -> ComputeError {
        ComputeError::Rejected {
            status: 400,
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl Evaluator for Arithmetic {
    async fn evaluate(
        &self,
        left: &str,
        right: &str,
        operator: Operator,
    ) -> Result<String, ComputeError> {
        let (Some(a), Some(b)) = (self.format.parse(left), self.format.parse(right)) else {
            return Err(Self::rejected("Invalid number."));
        };
        let value = match operator {
            Operator::Add => a + b,
            Operator::Sub => a - b,
            Operator::Mul => a * b,
            Operator::Div => {
                if b == 0.0 {
                    return Err(Self::rejected("Cannot divide by zero."));
                }
                a / b
            }
        };
        Ok(format_significant(value))
    }
}

mock! {
    pub Remote {}

    #[async_trait]
    impl Evaluator for Remote {
        async fn evaluate(
            &self,
            left: &str,
            right: &str,
            operator: Operator,
        ) -> Result<String, ComputeError>;
    }
}

/// Split a script like `"12 + 3 ="` into tokens; multi-digit words are typed digit by digit.
fn tokens(script: &str) -> Vec<InputToken> {
    script
        .split_whitespace()
        .flat_map(|word| match InputToken::from_label(word) {
            Some(token) => vec![token],
            None => word
                .chars()
                .map(|ch| {
                    InputToken::from_label(&ch.to_string())
                        .unwrap_or_else(|| panic!("unknown key {ch}"))
                })
                .collect(),
        })
        .collect()
}

async fn run(script: &str) -> ExpressionMachine {
    let mut machine = ExpressionMachine::default();
    machine.press_all(tokens(script), &Arithmetic::new()).await;
    machine
}

#[tokio::test]
async fn repeated_equals_reapplies_last_operation() {
    let machine = run("5 + 3 =").await;
    assert_eq!(machine.display(), "8");
    assert_eq!(machine.record(), "5 + 3 =");

    let machine = run("5 + 3 = =").await;
    assert_eq!(machine.display(), "11");
    assert_eq!(machine.record(), "8 + 3 =");

    let machine = run("5 + 3 = = =").await;
    assert_eq!(machine.display(), "14");
}

#[tokio::test]
async fn second_operator_evaluates_pending_operation_first() {
    let machine = run("5 + 3 ×").await;
    assert_eq!(machine.display(), "8");
    assert_eq!(machine.record(), "8 ×");
    assert_eq!(machine.state(), MachineState::OperatorChosen);
    assert_eq!(machine.session().pending_operator, Some(Operator::Mul));

    // Equals with no new operand multiplies the result by itself
    let machine = run("5 + 3 × =").await;
    assert_eq!(machine.display(), "64");

    let machine = run("2 + 3 × 4 =").await;
    assert_eq!(machine.display(), "20");
    assert_eq!(machine.record(), "5 × 4 =");
}

#[tokio::test]
async fn operator_pressed_twice_replaces_pending_operator() {
    let machine = run("9 + - 4 =").await;
    assert_eq!(machine.display(), "5");
    assert_eq!(machine.record(), "9 - 4 =");
}

#[tokio::test]
async fn backspace_after_operator_cancels_it() {
    let machine = run("12 + ←").await;
    assert_eq!(machine.display(), "12");
    assert_eq!(machine.record(), "12");
    assert_eq!(machine.session().pending_operator, None);
    assert_eq!(machine.session().pending_operator_glyph, None);

    let machine = run("12 + ← × 2 =").await;
    assert_eq!(machine.display(), "24");
}

#[tokio::test]
async fn backspace_never_leaves_an_empty_display() {
    assert_eq!(run("7 ←").await.display(), "0");
    assert_eq!(run("7 ← ←").await.display(), "0");
    assert_eq!(run("5 ± ←").await.display(), "0");
    assert_eq!(run("123 ←").await.display(), "12");
}

#[tokio::test]
async fn backspace_after_result_only_clears_the_record() {
    let machine = run("5 + 3 = ←").await;
    assert_eq!(machine.display(), "8");
    assert_eq!(machine.record(), "");
    assert_eq!(machine.state(), MachineState::Evaluated);
}

#[tokio::test]
async fn decimal_point_appears_once_per_number() {
    assert_eq!(run("1 . . 5 .").await.display(), "1.5");
    assert_eq!(run("3 + .").await.display(), "0.");
    assert_eq!(run("0.5 + 0.25 =").await.display(), "0.75");
}

#[tokio::test]
async fn digit_after_result_starts_a_new_expression() {
    let machine = run("5 + 3 = 2").await;
    assert_eq!(machine.display(), "2");
    assert_eq!(machine.record(), "2");
    assert_eq!(machine.session().accumulator, None);
    assert_eq!(machine.session().last_operator, None);
}

#[tokio::test]
async fn percent_of_accumulator_for_additive_operators() {
    let machine = run("200 + 10 %").await;
    assert_eq!(machine.display(), "20");
    assert_eq!(machine.record(), "200 + 20");
    assert!(!machine.session().just_evaluated);

    let machine = run("200 + 10 % =").await;
    assert_eq!(machine.display(), "220");
}

#[tokio::test]
async fn percent_right_after_operator_still_awaits_the_operand() {
    let machine = run("200 + %").await;
    assert_eq!(machine.display(), "400");
    assert!(machine.session().awaiting_second_operand);

    let machine = run("200 + % 5").await;
    assert_eq!(machine.display(), "5");

    let machine = run("200 + % 5 =").await;
    assert_eq!(machine.display(), "205");
}

#[tokio::test]
async fn percent_is_a_plain_fraction_for_multiplicative_operators() {
    let machine = run("50 × 10 %").await;
    assert_eq!(machine.display(), "0.1");
    assert_eq!(run("50 × 10 % =").await.display(), "5");
}

// Self-percentage after a result squares the value (x * x / 100). Kept for
// compatibility with the desktop calculator even though it looks accidental.
#[tokio::test]
async fn percent_after_result_squares_the_value_quirk() {
    let machine = run("2 + 8 = %").await;
    assert_eq!(machine.display(), "1");
    assert_eq!(machine.record(), "10 %");
}

#[tokio::test]
async fn percent_without_operation_resets_to_zero() {
    let machine = run("42 %").await;
    assert_eq!(machine.display(), "0");
    assert_eq!(machine.record(), "");
}

#[tokio::test]
async fn sign_toggle_is_an_involution() {
    let mut machine = run("3.5 ±").await;
    assert_eq!(machine.display(), "-3.5");

    let arithmetic = Arithmetic::new();
    machine.press(InputToken::ToggleSign, &arithmetic).await;
    assert_eq!(machine.display(), "3.5");
    machine.press(InputToken::ToggleSign, &arithmetic).await;
    assert_eq!(machine.display(), "-3.5");

    assert_eq!(run("0 ±").await.display(), "0");
}

#[tokio::test]
async fn operator_after_sign_toggle_on_result_keeps_the_accumulator() {
    let machine = run("2 + 3 = ± + 1 =").await;
    assert_eq!(machine.display(), "6");
    assert_eq!(machine.record(), "5 + 1 =");
}

#[tokio::test]
async fn operator_after_cancelled_operator_keeps_the_accumulator() {
    let machine = run("5 + ← 6 + 2 =").await;
    assert_eq!(machine.display(), "7");
    assert_eq!(machine.record(), "5 + 2 =");
}

#[tokio::test]
async fn sign_toggle_keeps_exponent_notation() {
    let machine = run("1000000000 × 1000000000 = ±").await;
    assert_eq!(machine.display(), "-1E+18");
}

#[tokio::test]
async fn divide_by_zero_shows_message_and_keeps_accumulator() {
    let machine = run("9 ÷ 0 =").await;
    assert_eq!(machine.display(), "Cannot divide by zero.");
    assert_eq!(machine.record(), "");
    assert_eq!(machine.state(), MachineState::Error);
    assert_eq!(machine.session().accumulator.as_deref(), Some("9"));
    assert!(!machine.session().awaiting_second_operand);
    assert!(!machine.session().just_evaluated);
}

#[tokio::test]
async fn error_state_handles_follow_up_input() {
    // Operator continues from the preserved accumulator
    let machine = run("9 ÷ 0 = + 1 =").await;
    assert_eq!(machine.display(), "10");

    // Digit starts over
    let machine = run("9 ÷ 0 = 4").await;
    assert_eq!(machine.display(), "4");
    assert_eq!(machine.session().accumulator, None);

    // Equals, sign toggle and percent leave the message alone
    let machine = run("9 ÷ 0 = = ± %").await;
    assert_eq!(machine.display(), "Cannot divide by zero.");

    // Backspace clears the message
    let machine = run("9 ÷ 0 = ←").await;
    assert_eq!(machine.display(), "0");
    assert_eq!(machine.state(), MachineState::EnteringFirstOperand);
}

#[tokio::test]
async fn clear_resets_everything() {
    let machine = run("5 + 3 = C").await;
    assert_eq!(machine.display(), "0");
    assert_eq!(machine.record(), "");
    assert_eq!(machine.state(), MachineState::Empty);
    assert_eq!(machine.session().last_operand, None);
}

#[tokio::test]
async fn display_operands_are_passed_to_the_evaluator() {
    let mut remote = MockRemote::new();
    remote
        .expect_evaluate()
        .withf(|left, right, operator| {
            left.to_string() == "12" && right.to_string() == "3" && operator.symbol() == "/"
        })
        .times(1)
        .returning(|_, _, _| Ok("4".to_string()));

    let mut machine = ExpressionMachine::default();
    machine.press_all(tokens("12 ÷ 3 ="), &remote).await;
    assert_eq!(machine.display(), "4");
    assert_eq!(machine.record(), "12 ÷ 3 =");
}

#[tokio::test]
async fn no_evaluation_without_a_complete_expression() {
    let mut remote = MockRemote::new();
    remote.expect_evaluate().never();

    let mut machine = ExpressionMachine::default();
    machine.press_all(tokens("= 5 = ± = ← ←"), &remote).await;
    assert_eq!(machine.display(), "0");
}

#[tokio::test]
async fn remote_failure_text_replaces_the_display() {
    let mut remote = MockRemote::new();
    remote.expect_evaluate().times(1).returning(|_, _, _| {
        Err(ComputeError::Unauthorized {
            message: "Invalid token".to_string(),
        })
    });

    let mut machine = ExpressionMachine::default();
    machine.press_all(tokens("1 + 1 ="), &remote).await;
    assert_eq!(machine.display(), "Authentication failed");
    assert_eq!(machine.state(), MachineState::Error);
    assert_eq!(machine.session().accumulator.as_deref(), Some("1"));
}

#[tokio::test]
async fn comma_locale_keeps_display_and_wire_formats_apart() {
    let mut remote = MockRemote::new();
    remote
        .expect_evaluate()
        .withf(|left, right, _| left.to_string() == "1,5" && right.to_string() == "2")
        .times(1)
        .returning(|_, _, _| Ok("3.5".to_string()));

    let mut machine = ExpressionMachine::new(NumberFormat::with_separator(','));
    machine.press_all(tokens("1 , 5 + 2 ="), &remote).await;
    assert_eq!(machine.display(), "3,5");
    assert_eq!(machine.record(), "1,5 + 2 =");
}
