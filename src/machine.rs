//! This module defines the `TuringMachine` struct, which runs a single-tape deterministic
//! Turing machine over a fixed tape window. It owns the tape, the head, and the current
//! control state, and advances exactly one rule per call to [`TuringMachine::step`].

use crate::tape::Tape;
use crate::types::{
    AppliedRule, ControlState, EngineConfig, EngineError, Move, Outcome, Rule, RuleSet,
    Status, StepEvent, BLANK_SYMBOL, START_STATE,
};
use serde::{Deserialize, Serialize};
use std::iter::FusedIterator;

/// The result of a single successful step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// A non-terminal rule was applied and the machine keeps running.
    Continue(StepEvent),
    /// The run ended with an outcome.
    Terminal(Outcome),
}

/// Everything a finished run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    pub events: Vec<StepEvent>,
    pub outcome: Outcome,
    /// The tape as it was left by the final rule.
    pub tape: Tape,
    /// Number of rules applied, including the terminal one.
    pub steps: usize,
}

/// A single-tape Turing machine run.
///
/// The rule set is an immutable snapshot taken at construction, so callers may keep
/// editing their own rule list while the machine runs. The machine does not validate
/// the rules; call [`crate::validate`] first.
#[derive(Debug, Clone)]
pub struct TuringMachine {
    rules: RuleSet,
    input: String,
    config: EngineConfig,
    initial_tape: Tape,
    tape: Tape,
    start: usize,
    head: usize,
    state: String,
    status: Status,
    last_rule: Option<AppliedRule>,
    step_count: usize,
}

impl TuringMachine {
    /// Creates a machine with `input` centered on a blank tape, in state `"1"`, with the
    /// head on the first input cell.
    ///
    /// # Arguments
    ///
    /// * `rules` - The rules to run, in matching order.
    /// * `input` - The initial tape content. Must not contain the blank symbol.
    /// * `config` - Tape window size and step limit.
    ///
    /// # Returns
    ///
    /// * `Err(EngineError::EmptyTapeWindow)` if the configured window has no cells.
    /// * `Err(EngineError::InputTooLong)` if the input does not fit the tape window.
    /// * `Err(EngineError::ReservedBlank)` if the input contains the blank symbol.
    pub fn new(
        rules: impl Into<RuleSet>,
        input: &str,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        let (tape, start) = Tape::load(config.tape_window, input)?;

        Ok(Self {
            rules: rules.into(),
            input: input.to_string(),
            config,
            initial_tape: tape.clone(),
            tape,
            start,
            head: start,
            state: START_STATE.to_string(),
            status: Status::Initialized,
            last_rule: None,
            step_count: 0,
        })
    }

    /// Executes a single step of the computation.
    ///
    /// The first rule whose state and read symbol match the current state and the symbol
    /// under the head is applied. Its symbol is written, then either the run ends
    /// (`Accept`/`Reject`) or the state changes and the head moves.
    ///
    /// # Returns
    ///
    /// * `Ok(Step::Continue(_))` after a non-terminal rule.
    /// * `Ok(Step::Terminal(_))` when the run is accepted, rejected, or no rule matches.
    /// * `Err(EngineError::TapeBoundsExceeded)` if the head would leave the tape. The
    ///   symbol is still written; the state and head are left as they were.
    /// * `Err(EngineError::StepLimitExceeded)` if a rule matches but the configured limit
    ///   of applied rules has been reached. A machine with no matching rule halts instead.
    /// * `Err(EngineError::AlreadyTerminated)` if the run had already ended.
    pub fn step(&mut self) -> Result<Step, EngineError> {
        if self.status.is_terminal() {
            return Err(EngineError::AlreadyTerminated(self.status));
        }

        let applied = match self.next_rule() {
            Some((index, rule)) => AppliedRule {
                index,
                rule: rule.clone(),
            },
            None => {
                self.status = Status::Halted;
                return Ok(Step::Terminal(Outcome::Halted {
                    last_rule: self.last_rule.clone(),
                }));
            }
        };

        // The limit only counts rules that would actually be applied.
        if let Some(limit) = self.config.step_limit {
            if self.step_count >= limit {
                self.status = Status::StepLimitExceeded;
                return Err(EngineError::StepLimitExceeded { limit });
            }
        }

        self.status = Status::Running;

        if !self.tape.write(self.head, applied.rule.write) {
            self.status = Status::BoundsExceeded;
            return Err(EngineError::TapeBoundsExceeded {
                head: self.head,
                movement: Move::Stay,
                rule: applied,
            });
        }
        self.step_count += 1;
        self.last_rule = Some(applied.clone());

        let next_state = match applied.rule.new_state.clone() {
            ControlState::Accept => {
                self.status = Status::Accepted;
                return Ok(Step::Terminal(Outcome::Accepted { rule: applied }));
            }
            ControlState::Reject => {
                self.status = Status::Rejected;
                return Ok(Step::Terminal(Outcome::Rejected { rule: applied }));
            }
            ControlState::Active(label) => label,
        };

        let movement = applied.rule.movement;
        let Some(head) = self.tape.shift(self.head, movement.offset()) else {
            self.status = Status::BoundsExceeded;
            return Err(EngineError::TapeBoundsExceeded {
                head: self.head,
                movement,
                rule: applied,
            });
        };

        self.state = next_state;
        self.head = head;

        Ok(Step::Continue(StepEvent {
            step: self.step_count,
            rule: applied,
            head,
            state: self.state.clone(),
            tape: self.tape.to_string(),
        }))
    }

    /// Runs the machine until the run ends, collecting every event.
    ///
    /// With the step limit disabled this does not return for rule sets that never
    /// reach a terminal outcome.
    pub fn run_to_completion(&mut self) -> Result<Trace, EngineError> {
        let mut events = Vec::new();

        loop {
            match self.step()? {
                Step::Continue(event) => events.push(event),
                Step::Terminal(outcome) => {
                    return Ok(Trace {
                        events,
                        outcome,
                        tape: self.tape.clone(),
                        steps: self.step_count,
                    })
                }
            }
        }
    }

    /// Turns the machine into a pull-based iterator over its steps.
    pub fn into_steps(self) -> Execution {
        Execution {
            machine: self,
            finished: false,
        }
    }

    /// Resets the machine to its initial configuration: the loaded input, state `"1"`,
    /// the head on the first input cell, and no steps taken.
    pub fn reset(&mut self) {
        self.tape = self.initial_tape.clone();
        self.head = self.start;
        self.state = START_STATE.to_string();
        self.status = Status::Initialized;
        self.last_rule = None;
        self.step_count = 0;
    }

    /// Finds the rule the next step would apply, using first-match selection.
    pub fn next_rule(&self) -> Option<(usize, &Rule)> {
        self.rules.first_match(&self.state, self.symbol())
    }

    /// Returns the symbol currently under the head.
    pub fn symbol(&self) -> char {
        self.tape.read(self.head).unwrap_or(BLANK_SYMBOL)
    }

    /// Returns the current control state.
    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn head(&self) -> usize {
        self.head
    }

    /// Returns the index of the first input cell.
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Returns the total number of rules applied so far.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn last_rule(&self) -> Option<&AppliedRule> {
        self.last_rule.as_ref()
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

/// A finite, non-restartable sequence of steps.
///
/// Yields every [`Step::Continue`], then exactly one [`Step::Terminal`] or one error,
/// and then `None` forever.
#[derive(Debug)]
pub struct Execution {
    machine: TuringMachine,
    finished: bool,
}

impl Execution {
    /// Returns the machine, to inspect the tape or head between steps.
    pub fn machine(&self) -> &TuringMachine {
        &self.machine
    }

    pub fn into_machine(self) -> TuringMachine {
        self.machine
    }
}

impl Iterator for Execution {
    type Item = Result<Step, EngineError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let result = self.machine.step();
        self.finished = !matches!(result, Ok(Step::Continue(_)));
        Some(result)
    }
}

impl FusedIterator for Execution {}

/// Starts a run of `rules` over `input` with the default configuration.
///
/// The rules are not validated here; call [`crate::validate`] first.
pub fn run(rules: impl Into<RuleSet>, input: &str) -> Result<Execution, EngineError> {
    run_with_config(rules, input, EngineConfig::default())
}

/// Starts a run of `rules` over `input` with the given configuration.
pub fn run_with_config(
    rules: impl Into<RuleSet>,
    input: &str,
    config: EngineConfig,
) -> Result<Execution, EngineError> {
    TuringMachine::new(rules, input, config).map(TuringMachine::into_steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_rules;
    use crate::programs::PresetManager;

    fn rules(text: &str) -> RuleSet {
        RuleSet::from(parse_rules(text).unwrap())
    }

    fn preset(name: &str) -> RuleSet {
        PresetManager::get_by_name(name).unwrap().rules.clone()
    }

    fn machine(rules: RuleSet, input: &str) -> TuringMachine {
        TuringMachine::new(rules, input, EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_machine_creation() {
        let machine = machine(preset("Binary Increment"), "0110");

        assert_eq!(machine.state(), "1");
        assert_eq!(machine.head(), 8);
        assert_eq!(machine.start(), 8);
        assert_eq!(machine.symbol(), '0');
        assert_eq!(machine.status(), Status::Initialized);
        assert_eq!(machine.step_count(), 0);
        assert!(machine.last_rule().is_none());
        assert_eq!(machine.tape().to_string(), "________0110________");
    }

    #[test]
    fn test_single_step() {
        let mut machine = machine(preset("Binary Increment"), "1");

        let step = machine.step().unwrap();

        let Step::Continue(event) = step else {
            panic!("Expected a step event, got {:?}", step);
        };
        assert_eq!(event.step, 1);
        assert_eq!(event.rule.index, 0);
        assert_eq!(event.head, 11);
        assert_eq!(event.state, "2");
        assert_eq!(event.tape, "__________1_________");
        assert_eq!(machine.status(), Status::Running);
        assert_eq!(machine.state(), "2");
    }

    #[test]
    fn test_binary_increment_one() {
        let trace = machine(preset("Binary Increment"), "1")
            .run_to_completion()
            .unwrap();

        assert_eq!(trace.events.len(), 3);
        assert_eq!(trace.steps, 4);
        assert_eq!(trace.tape.contents(), "10");
        assert_eq!(trace.tape.to_string(), "_________10_________");

        match trace.outcome {
            Outcome::Accepted { rule } => {
                assert_eq!(rule.number(), 8);
                assert_eq!(rule.rule.to_string(), "_,3->1,Accept,L");
            }
            other => panic!("Expected acceptance, got {:?}", other),
        }
    }

    #[test]
    fn test_binary_increment_carries() {
        let mut machine = machine(preset("Binary Increment"), "11");
        let trace = machine.run_to_completion().unwrap();

        assert!(trace.outcome.is_accepted());
        assert_eq!(trace.events.len(), 5);
        assert_eq!(trace.tape.contents(), "100");
        assert_eq!(machine.status(), Status::Accepted);
    }

    #[test]
    fn test_lexicographic_successor() {
        let trace = machine(preset("Lexicographic Successor"), "1")
            .run_to_completion()
            .unwrap();
        assert!(trace.outcome.is_accepted());
        assert_eq!(trace.tape.contents(), "00");

        let trace = machine(preset("Lexicographic Successor"), "11")
            .run_to_completion()
            .unwrap();
        assert_eq!(trace.tape.contents(), "000");

        let trace = machine(preset("Lexicographic Successor"), "10")
            .run_to_completion()
            .unwrap();
        assert_eq!(trace.tape.contents(), "11");
    }

    #[test]
    fn test_empty_input_reads_blank() {
        let trace = machine(preset("Binary Increment"), "")
            .run_to_completion()
            .unwrap();

        assert!(trace.events.is_empty());
        match trace.outcome {
            Outcome::Rejected { rule } => assert_eq!(rule.rule.read, BLANK_SYMBOL),
            other => panic!("Expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_halt_before_any_rule() {
        let mut machine = machine(rules("1,1->1,Accept,N\n0,1->0,Reject,N"), "");

        let step = machine.step().unwrap();

        assert_eq!(
            step,
            Step::Terminal(Outcome::Halted { last_rule: None })
        );
        assert_eq!(machine.status(), Status::Halted);
        assert_eq!(machine.step_count(), 0);
    }

    #[test]
    fn test_halt_reports_last_applied_rule() {
        let mut machine = machine(rules("1,1->1,2,R\n0,2->0,Accept,N\n1,2->1,Reject,N"), "1");

        let trace = machine.run_to_completion().unwrap();

        assert_eq!(trace.events.len(), 1);
        match trace.outcome {
            Outcome::Halted {
                last_rule: Some(rule),
            } => assert_eq!(rule.index, 0),
            other => panic!("Expected a halt after rule 1, got {:?}", other),
        }
    }

    #[test]
    fn test_first_match_wins() {
        let mut machine = machine(rules("1,1->a,Accept,N\n1,1->b,Reject,N"), "1");

        let trace = machine.run_to_completion().unwrap();

        assert!(trace.outcome.is_accepted());
        assert_eq!(trace.outcome.rule().map(|r| r.index), Some(0));
        assert_eq!(trace.tape.contents(), "a");
    }

    #[test]
    fn test_terminal_marker_case_is_ignored() {
        let rules = vec![
            Rule::new('1', "1", 'x', "accept", Move::Right),
            Rule::new('0', "1", '0', "REJECT", Move::Right),
        ];
        let trace = machine(rules.into(), "1").run_to_completion().unwrap();
        assert!(trace.outcome.is_accepted());
    }

    #[test]
    fn test_stay_keeps_head() {
        let mut machine = machine(rules("1,1->0,2,N\n0,2->0,Accept,N\n_,1->_,Reject,N"), "1");

        let Ok(Step::Continue(event)) = machine.step() else {
            panic!("Expected a step event");
        };
        assert_eq!(event.head, 10);
        assert_eq!(machine.symbol(), '0');
    }

    #[test]
    fn test_step_after_terminal_is_an_error() {
        let mut machine = machine(preset("Even Parity"), "11");
        machine.run_to_completion().unwrap();

        assert_eq!(
            machine.step(),
            Err(EngineError::AlreadyTerminated(Status::Accepted))
        );
    }

    #[test]
    fn test_head_leaving_right_edge() {
        let input = "1".repeat(20);
        let mut machine = machine(preset("Even Parity"), &input);

        let result = machine.run_to_completion();

        match result {
            Err(EngineError::TapeBoundsExceeded { head, movement, .. }) => {
                assert_eq!(head, 19);
                assert_eq!(movement, Move::Right);
            }
            other => panic!("Expected a tape boundary error, got {:?}", other),
        }
        assert_eq!(machine.status(), Status::BoundsExceeded);
        assert_eq!(machine.head(), 19);
        assert_eq!(machine.step_count(), 20);
        assert!(matches!(
            machine.step(),
            Err(EngineError::AlreadyTerminated(Status::BoundsExceeded))
        ));
    }

    #[test]
    fn test_head_leaving_left_edge() {
        let mut machine = machine(
            rules("1,1->1,1,L\n_,1->_,1,L\n0,1->0,Accept,N\n0,1->0,Reject,N"),
            "1",
        );

        let mut events = 0;
        let error = loop {
            match machine.step() {
                Ok(Step::Continue(_)) => events += 1,
                Ok(Step::Terminal(outcome)) => panic!("Unexpected outcome {:?}", outcome),
                Err(e) => break e,
            }
        };

        assert_eq!(events, 10);
        assert!(matches!(
            error,
            EngineError::TapeBoundsExceeded {
                head: 0,
                movement: Move::Left,
                ..
            }
        ));
    }

    #[test]
    fn test_input_too_long() {
        let input = "1".repeat(21);
        let result = TuringMachine::new(preset("Even Parity"), &input, EngineConfig::default());
        assert!(matches!(
            result,
            Err(EngineError::InputTooLong {
                len: 21,
                window: 20
            })
        ));
    }

    #[test]
    fn test_custom_tape_window() {
        let config = EngineConfig::default().with_tape_window(4);
        let mut machine = TuringMachine::new(preset("Binary Increment"), "11", config).unwrap();

        let trace = machine.run_to_completion().unwrap();
        assert_eq!(trace.tape.to_string(), "100_");
    }

    #[test]
    fn test_step_limit() {
        let config = EngineConfig::default().with_step_limit(Some(50));
        let mut machine = TuringMachine::new(
            rules("1,1->1,1,N\n_,1->_,Accept,N\n0,1->0,Reject,N"),
            "1",
            config,
        )
        .unwrap();

        let result = machine.run_to_completion();

        assert_eq!(result, Err(EngineError::StepLimitExceeded { limit: 50 }));
        assert_eq!(machine.status(), Status::StepLimitExceeded);
        assert_eq!(machine.step_count(), 50);
    }

    #[test]
    fn test_halt_at_step_limit() {
        let config = EngineConfig::default().with_step_limit(Some(1));
        let mut machine = TuringMachine::new(
            rules("1,1->1,2,R\n0,1->0,Accept,N\n_,1->_,Reject,N"),
            "1",
            config,
        )
        .unwrap();

        assert!(matches!(machine.step(), Ok(Step::Continue(_))));
        let outcome = match machine.step() {
            Ok(Step::Terminal(outcome)) => outcome,
            other => panic!("expected a halt, got {:?}", other),
        };

        assert!(outcome.is_halted());
        assert_eq!(outcome.rule().map(AppliedRule::number), Some(1));
        assert_eq!(machine.status(), Status::Halted);
        assert_eq!(machine.step_count(), 1);
    }

    #[test]
    fn test_zero_tape_window() {
        let config = EngineConfig::default().with_tape_window(0);
        let result = TuringMachine::new(rules("_,1->x,Accept,N\n0,1->0,Reject,N"), "", config);

        assert_eq!(result.unwrap_err(), EngineError::EmptyTapeWindow);
    }

    #[test]
    fn test_single_cell_tape_window() {
        let config = EngineConfig::default().with_tape_window(1);
        let trace = TuringMachine::new(rules("_,1->x,Accept,N\n0,1->0,Reject,N"), "", config)
            .unwrap()
            .run_to_completion()
            .unwrap();

        assert!(trace.outcome.is_accepted());
        assert_eq!(trace.tape.to_string(), "x");
    }

    #[test]
    fn test_determinism() {
        let first = machine(preset("Palindrome"), "0110")
            .run_to_completion()
            .unwrap();
        let second = machine(preset("Palindrome"), "0110")
            .run_to_completion()
            .unwrap();

        assert_eq!(first, second);
        assert!(first.outcome.is_accepted());
    }

    #[test]
    fn test_reset() {
        let mut machine = machine(preset("Binary Increment"), "1");
        machine.run_to_completion().unwrap();
        assert_eq!(machine.tape().contents(), "10");

        machine.reset();

        assert_eq!(machine.state(), "1");
        assert_eq!(machine.head(), 10);
        assert_eq!(machine.status(), Status::Initialized);
        assert_eq!(machine.step_count(), 0);
        assert_eq!(machine.tape().contents(), "1");
        assert!(machine.run_to_completion().unwrap().outcome.is_accepted());
    }

    #[test]
    fn test_rules_are_a_snapshot() {
        let mut editable = parse_rules("1,1->1,Accept,N\n_,1->_,Reject,N").unwrap();
        let mut machine = machine(RuleSet::from(editable.as_slice()), "1");

        editable[0].new_state = ControlState::Reject;

        let trace = machine.run_to_completion().unwrap();
        assert!(trace.outcome.is_accepted());
    }

    #[test]
    fn test_execution_iterator() {
        let mut execution = run(preset("Binary Increment"), "1").unwrap();

        let steps: Vec<_> = execution.by_ref().collect();

        assert_eq!(steps.len(), 4);
        assert!(steps[..3]
            .iter()
            .all(|s| matches!(s, Ok(Step::Continue(_)))));
        assert!(matches!(
            steps[3],
            Ok(Step::Terminal(Outcome::Accepted { .. }))
        ));
        assert!(execution.next().is_none());
        assert_eq!(execution.machine().tape().contents(), "10");
    }

    #[test]
    fn test_execution_ends_after_error() {
        let config = EngineConfig::default().with_step_limit(Some(3));
        let execution = run_with_config(
            rules("1,1->1,1,N\n_,1->_,Accept,N\n0,1->0,Reject,N"),
            "1",
            config,
        )
        .unwrap();

        let steps: Vec<_> = execution.collect();

        assert_eq!(steps.len(), 4);
        assert_eq!(steps[3], Err(EngineError::StepLimitExceeded { limit: 3 }));
    }
}
