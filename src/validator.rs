//! Runnability checks for a rule set, performed before any run starts.

use crate::types::{ControlState, Rule, ValidationError, START_STATE};

/// Checks that a rule set can be handed to the engine.
///
/// The checks run in order and the first failure is reported:
/// the list is nonempty, the first rule starts in state `"1"`, and some rule leads to
/// `Accept` and some rule leads to `Reject`. Only the first rule is inspected for the
/// start state; reachability is left to the analyzer.
///
/// # Arguments
///
/// * `rules` - The rules, in matching order.
///
/// # Returns
///
/// * `Ok(())` if the rule set is runnable.
/// * `Err(ValidationError)` naming the first check that failed.
pub fn validate(rules: &[Rule]) -> Result<(), ValidationError> {
    [
        check_nonempty,
        check_start_state,
        check_accept_state,
        check_reject_state,
    ]
    .iter()
    .try_for_each(|check| check(rules))
}

fn check_nonempty(rules: &[Rule]) -> Result<(), ValidationError> {
    if rules.is_empty() {
        return Err(ValidationError::EmptyRuleSet);
    }
    Ok(())
}

fn check_start_state(rules: &[Rule]) -> Result<(), ValidationError> {
    match rules.first() {
        Some(rule) if rule.old_state != START_STATE => Err(ValidationError::MissingStartState),
        _ => Ok(()),
    }
}

fn check_accept_state(rules: &[Rule]) -> Result<(), ValidationError> {
    if !leads_to(rules, &ControlState::Accept) {
        return Err(ValidationError::MissingAcceptState);
    }
    Ok(())
}

fn check_reject_state(rules: &[Rule]) -> Result<(), ValidationError> {
    if !leads_to(rules, &ControlState::Reject) {
        return Err(ValidationError::MissingRejectState);
    }
    Ok(())
}

fn leads_to(rules: &[Rule], state: &ControlState) -> bool {
    rules.iter().any(|rule| &rule.new_state == state)
}
