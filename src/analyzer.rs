//! This module provides non-fatal diagnostics for rule sets. None of these findings stop a
//! run; they point at rules that can never fire and states the machine can never leave
//! or reach.

use crate::types::{Rule, START_STATE};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

/// A finding about a rule set that is runnable but probably not what was meant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// The rule at `index` matches the same state and symbol as the earlier rule at `by`,
    /// so first-match selection never picks it.
    ShadowedRule { index: usize, by: usize },
    /// The rule at `index` moves to a state no rule reads from; the machine halts there.
    UndefinedNextState { index: usize, state: String },
    /// Rules exist for this state, but no path from the start state leads to it.
    UnreachableState(String),
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::ShadowedRule { index, by } => write!(
                f,
                "Rule {} is never used: rule {} matches the same state and symbol",
                index + 1,
                by + 1
            ),
            Diagnostic::UndefinedNextState { index, state } => write!(
                f,
                "Rule {} moves to state {} which has no rules; the machine will halt there",
                index + 1,
                state
            ),
            Diagnostic::UnreachableState(state) => {
                write!(f, "State {} is unreachable from state {}", state, START_STATE)
            }
        }
    }
}

/// Analyzes a rule set and returns every finding, in rule order.
///
/// # Arguments
///
/// * `rules` - The rules, in matching order.
pub fn analyze(rules: &[Rule]) -> Vec<Diagnostic> {
    [
        check_shadowed_rules,
        check_undefined_next_states,
        check_unreachable_states,
    ]
    .iter()
    .flat_map(|check| check(rules))
    .collect()
}

/// Finds rules that an earlier rule always wins against.
fn check_shadowed_rules(rules: &[Rule]) -> Vec<Diagnostic> {
    let mut first_seen: HashMap<(&str, char), usize> = HashMap::new();

    rules
        .iter()
        .enumerate()
        .filter_map(|(index, rule)| {
            let key = (rule.old_state.as_str(), rule.read);
            match first_seen.get(&key) {
                Some(&by) => Some(Diagnostic::ShadowedRule { index, by }),
                None => {
                    first_seen.insert(key, index);
                    None
                }
            }
        })
        .collect()
}

/// Finds rules leading to active states that nothing reads from.
fn check_undefined_next_states(rules: &[Rule]) -> Vec<Diagnostic> {
    let defined: HashSet<&str> = rules.iter().map(|rule| rule.old_state.as_str()).collect();

    rules
        .iter()
        .enumerate()
        .filter_map(|(index, rule)| {
            let state = rule.new_state.as_active()?;
            (!defined.contains(state)).then(|| Diagnostic::UndefinedNextState {
                index,
                state: state.to_string(),
            })
        })
        .collect()
}

/// Finds states with rules that are never entered, walking transitions from the start state.
fn check_unreachable_states(rules: &[Rule]) -> Vec<Diagnostic> {
    let mut reachable: HashSet<&str> = HashSet::new();
    let mut queue = VecDeque::from([START_STATE]);

    while let Some(state) = queue.pop_front() {
        if !reachable.insert(state) {
            continue;
        }

        queue.extend(
            rules
                .iter()
                .filter(|rule| rule.old_state == state)
                .filter_map(|rule| rule.new_state.as_active()),
        );
    }

    let mut reported = HashSet::new();
    rules
        .iter()
        .map(|rule| rule.old_state.as_str())
        .filter(|state| !reachable.contains(state) && reported.insert(*state))
        .map(|state| Diagnostic::UnreachableState(state.to_string()))
        .collect()
}
