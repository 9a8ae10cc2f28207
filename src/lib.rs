//! This crate provides the core logic for a single-tape Turing machine verifier.
//! It includes modules for parsing rule notation, validating and analyzing rule sets,
//! running them step by step over a fixed tape window, and a collection of bundled rule sets.

pub mod analyzer;
pub mod machine;
pub mod parser;
pub mod programs;
pub mod tape;
pub mod types;
pub mod validator;

/// Re-exports the `analyze` function and `Diagnostic` enum from the analyzer module.
pub use analyzer::{analyze, Diagnostic};
/// Re-exports the engine and its iterator surface from the machine module.
pub use machine::{run, run_with_config, Execution, Step, Trace, TuringMachine};
/// Re-exports the rule notation parser.
pub use parser::parse_rules;
/// Re-exports `Preset`, `PresetManager`, and `PRESETS` from the programs module.
pub use programs::{Preset, PresetManager, PRESETS};
/// Re-exports the `Tape` struct from the tape module.
pub use tape::Tape;
/// Re-exports the rule, outcome, configuration, and error types from the types module.
pub use types::{
    AppliedRule, ControlState, EngineConfig, EngineError, Move, Outcome, ParseError, Rule,
    RuleSet, Status, StepEvent, ValidationError, VerifierError, BLANK_SYMBOL,
    DEFAULT_TAPE_WINDOW, MAX_EXECUTION_STEPS, START_STATE,
};
/// Re-exports the `validate` function from the validator module.
pub use validator::validate;
