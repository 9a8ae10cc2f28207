//! This module defines the core data structures and types used throughout the verifier,
//! including rules, control states, run outcomes, engine configuration, and error types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use thiserror::Error;

use crate::parser::Token;

/// The reserved symbol denoting an unwritten tape cell.
pub const BLANK_SYMBOL: char = '_';
/// The control state every run starts in.
pub const START_STATE: &str = "1";
/// The default number of cells in the tape window.
pub const DEFAULT_TAPE_WINDOW: usize = 20;
/// The default maximum number of steps to execute before giving up.
pub const MAX_EXECUTION_STEPS: usize = 10000;

/// The directions a rule may move the head after writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    /// Move the head one cell to the left.
    Left,
    /// Move the head one cell to the right.
    Right,
    /// Keep the head on the same cell.
    Stay,
}

impl Move {
    /// Returns the signed offset this move applies to the head.
    pub fn offset(self) -> isize {
        match self {
            Move::Left => -1,
            Move::Right => 1,
            Move::Stay => 0,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Move::Left => "L",
            Move::Right => "R",
            Move::Stay => "N",
        };
        f.write_str(letter)
    }
}

/// The state a rule transitions into.
///
/// The terminal markers are recognised once, when the rule is built, so the engine
/// never compares against the `"Accept"`/`"Reject"` strings while stepping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlState {
    /// A regular, named control state.
    Active(String),
    /// Stop and accept the input.
    Accept,
    /// Stop and reject the input.
    Reject,
}

impl ControlState {
    /// Returns the label of an active state, or `None` for the terminal markers.
    pub fn as_active(&self) -> Option<&str> {
        match self {
            ControlState::Active(label) => Some(label),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ControlState::Active(_))
    }
}

impl From<&str> for ControlState {
    fn from(label: &str) -> Self {
        if label.eq_ignore_ascii_case("accept") {
            ControlState::Accept
        } else if label.eq_ignore_ascii_case("reject") {
            ControlState::Reject
        } else {
            ControlState::Active(label.to_string())
        }
    }
}

impl fmt::Display for ControlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlState::Active(label) => f.write_str(label),
            ControlState::Accept => f.write_str("Accept"),
            ControlState::Reject => f.write_str("Reject"),
        }
    }
}

/// A single transition rule.
///
/// When the machine is in `old_state` and reads `read`, it writes `write`, enters
/// `new_state`, and moves the head by `movement`. Equality is structural over all
/// five fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rule {
    /// The symbol that must be under the head.
    pub read: char,
    /// The control state the machine must be in.
    pub old_state: String,
    /// The symbol written under the head.
    pub write: char,
    /// The state entered after the rule fires.
    pub new_state: ControlState,
    /// Where the head moves after writing.
    pub movement: Move,
}

impl Rule {
    /// Builds a rule, recognising `Accept` and `Reject` in `new_state` in any case.
    ///
    /// Any label is accepted here, but only labels free of whitespace, `,`, `;`, `#`
    /// and `->` can be written back in rule notation.
    pub fn new(read: char, old_state: &str, write: char, new_state: &str, movement: Move) -> Self {
        Self {
            read,
            old_state: old_state.to_string(),
            write,
            new_state: ControlState::from(new_state),
            movement,
        }
    }

    /// Checks whether this rule applies to the given state and symbol.
    pub fn matches(&self, state: &str, symbol: char) -> bool {
        self.old_state == state && self.read == symbol
    }
}

/// Formats a rule in the `read,old_state->write,new_state,move` notation.
impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{}->{},{},{}",
            self.read, self.old_state, self.write, self.new_state, self.movement
        )
    }
}

/// An immutable, ordered snapshot of rules handed to the engine.
///
/// Order matters: rule selection is first-match, not most-specific. Cloning a
/// `RuleSet` shares the underlying rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet(Arc<[Rule]>);

impl RuleSet {
    pub fn new(rules: impl Into<Arc<[Rule]>>) -> Self {
        Self(rules.into())
    }

    /// Finds the first rule, in list order, matching the given state and symbol.
    pub fn first_match(&self, state: &str, symbol: char) -> Option<(usize, &Rule)> {
        self.0
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.matches(state, symbol))
    }
}

impl Deref for RuleSet {
    type Target = [Rule];

    fn deref(&self) -> &[Rule] {
        &self.0
    }
}

impl From<Vec<Rule>> for RuleSet {
    fn from(rules: Vec<Rule>) -> Self {
        Self::new(rules)
    }
}

impl From<&[Rule]> for RuleSet {
    fn from(rules: &[Rule]) -> Self {
        Self::new(rules)
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect::<Vec<_>>())
    }
}

/// A rule together with its position in the rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedRule {
    /// Zero-based position of the rule in its rule set.
    pub index: usize,
    pub rule: Rule,
}

impl AppliedRule {
    /// The one-based rule number shown to users.
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

impl fmt::Display for AppliedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule {} ({})", self.number(), self.rule)
    }
}

/// The event emitted after every non-terminal step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepEvent {
    /// Number of steps applied so far, including this one.
    pub step: usize,
    /// The rule that was applied.
    pub rule: AppliedRule,
    /// Head position after the move.
    pub head: usize,
    /// Control state after the step.
    pub state: String,
    /// Snapshot of the whole tape window after the write.
    pub tape: String,
}

/// How a run ended when it ended normally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// A rule moved the machine into the accept state.
    Accepted { rule: AppliedRule },
    /// A rule moved the machine into the reject state.
    Rejected { rule: AppliedRule },
    /// No rule matched. Carries the last rule applied, if any.
    Halted { last_rule: Option<AppliedRule> },
}

impl Outcome {
    /// Returns the rule reported alongside this outcome.
    pub fn rule(&self) -> Option<&AppliedRule> {
        match self {
            Outcome::Accepted { rule } | Outcome::Rejected { rule } => Some(rule),
            Outcome::Halted { last_rule } => last_rule.as_ref(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Outcome::Accepted { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Outcome::Rejected { .. })
    }

    pub fn is_halted(&self) -> bool {
        matches!(self, Outcome::Halted { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Accepted { rule } => write!(f, "Accepted at {}", rule),
            Outcome::Rejected { rule } => write!(f, "Rejected at {}", rule),
            Outcome::Halted {
                last_rule: Some(rule),
            } => write!(f, "Halted at {}", rule),
            Outcome::Halted { last_rule: None } => {
                f.write_str("Halted before any rule was applied")
            }
        }
    }
}

/// The lifecycle of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// Tape loaded, no step requested yet.
    Initialized,
    Running,
    Accepted,
    Rejected,
    Halted,
    /// The head was moved outside the tape window.
    BoundsExceeded,
    /// The configured step limit was reached without a terminal outcome.
    StepLimitExceeded,
}

impl Status {
    /// Checks whether the run is over and no more steps may be taken.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Status::Initialized | Status::Running)
    }
}

/// Tunables for a single run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of cells in the fixed tape window.
    pub tape_window: usize,
    /// Maximum number of applied rules before the run is abandoned. `None` disables the guard.
    pub step_limit: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tape_window: DEFAULT_TAPE_WINDOW,
            step_limit: Some(MAX_EXECUTION_STEPS),
        }
    }
}

impl EngineConfig {
    pub fn with_tape_window(mut self, tape_window: usize) -> Self {
        self.tape_window = tape_window;
        self
    }

    pub fn with_step_limit(mut self, step_limit: Option<usize>) -> Self {
        self.step_limit = step_limit;
        self
    }
}

/// Reasons a rule set is not runnable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("The rule set is empty")]
    EmptyRuleSet,
    #[error("The first rule must start in state 1")]
    MissingStartState,
    #[error("No rule leads to the Accept state")]
    MissingAcceptState,
    #[error("No rule leads to the Reject state")]
    MissingRejectState,
}

/// Failures raised by the engine before or during a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The configured tape window has no cells for the head to stand on.
    #[error("The tape window must have at least one cell")]
    EmptyTapeWindow,
    /// The input does not fit into the tape window.
    #[error("Input of length {len} does not fit the tape window of {window} cells")]
    InputTooLong { len: usize, window: usize },
    /// The input contains the reserved blank symbol.
    #[error("Input contains the reserved blank symbol '_' at position {position}")]
    ReservedBlank { position: usize },
    /// A rule moved the head outside the tape window.
    #[error("Tape boundary exceeded: {rule} moved {movement:?} from cell {head}")]
    TapeBoundsExceeded {
        head: usize,
        movement: Move,
        rule: AppliedRule,
    },
    /// The run reached the configured step limit.
    #[error("No terminal outcome after {limit} steps")]
    StepLimitExceeded { limit: usize },
    /// A step was requested after the run had already ended.
    #[error("The run has already ended ({0:?})")]
    AlreadyTerminated(Status),
}

/// Indicates that a rule or rule list could not be parsed from its textual notation.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Rule parsing error: {0}")]
pub struct ParseError(#[from] pub Box<pest::error::Error<Token>>);

/// Any failure surfaced by the verifier, for callers that want a single error type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VerifierError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("Invalid rule set: {0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}
