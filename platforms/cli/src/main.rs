use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::{self, Read};
use std::process::ExitCode;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use tur_verifier::{
    analyze, parse_rules, validate, EngineConfig, Outcome, PresetManager, Rule, Step,
    TuringMachine, DEFAULT_TAPE_WINDOW, MAX_EXECUTION_STEPS,
};

/// Validates a Turing machine rule set and runs it over an input string.
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(after_help = "EXAMPLES:
  tur-verifier --program binary-increment --input 1011
  tur-verifier -r '1,1->1,Accept,N' -r '_,1->_,Reject,N' -i 1
  cat rules.txt | tur-verifier --input 0110 --debug

EXIT STATUS:
  0 accepted, 1 rejected, 2 halted, 3 error")]
struct Cli {
    /// Name of a bundled rule set (see --list)
    #[clap(short, long, conflicts_with = "rule")]
    program: Option<String>,

    /// A rule in `read,old_state->write,new_state,move` notation. Repeat for more rules
    #[clap(short, long)]
    rule: Vec<String>,

    /// The input written onto the tape
    #[clap(short, long, default_value = "")]
    input: String,

    /// Number of cells in the tape window
    #[clap(long, default_value_t = DEFAULT_TAPE_WINDOW)]
    window: usize,

    /// Give up after this many steps
    #[clap(long, default_value_t = MAX_EXECUTION_STEPS, conflicts_with = "no_step_limit")]
    max_steps: usize,

    /// Run without a step limit
    #[clap(long)]
    no_step_limit: bool,

    /// Print each step of the execution
    #[clap(short = 'd', long)]
    debug: bool,

    /// Print step events and the outcome as JSON lines
    #[clap(long)]
    json: bool,

    /// List the bundled rule sets and exit
    #[clap(long)]
    list: bool,

    /// Validate and analyze the rule set without running it
    #[clap(long)]
    check: bool,
}

const ERROR_STATUS: u8 = 3;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match execute(&cli) {
        Ok(status) => ExitCode::from(status),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(ERROR_STATUS)
        }
    }
}

/// Logs go to stderr so that stdout stays parseable with `--json`.
fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Runs the command and returns the process exit status.
fn execute(cli: &Cli) -> Result<u8> {
    if cli.list {
        for preset in PresetManager::list() {
            println!("{}: {}", preset.name, preset.description);
        }
        return Ok(0);
    }

    let rules = load_rules(cli)?;
    info!(rules = rules.len(), "loaded rule set");

    validate(&rules).context("Rule set is not runnable")?;

    let diagnostics = analyze(&rules);
    for diagnostic in &diagnostics {
        warn!("{}", diagnostic);
    }

    if cli.check {
        for diagnostic in &diagnostics {
            println!("warning: {}", diagnostic);
        }
        println!("Rule set is valid ({} rules)", rules.len());
        return Ok(0);
    }

    let config = EngineConfig::default()
        .with_tape_window(cli.window)
        .with_step_limit((!cli.no_step_limit).then_some(cli.max_steps));
    let mut machine = TuringMachine::new(rules, &cli.input, config)
        .with_context(|| format!("Cannot load input '{}'", cli.input))?;

    debug!(input = %cli.input, head = machine.head(), "starting run");
    if cli.debug && !cli.json {
        print_state(&machine);
    }

    let outcome = loop {
        match machine.step()? {
            Step::Continue(event) => {
                if cli.json {
                    println!("{}", serde_json::to_string(&event)?);
                } else if cli.debug {
                    println!(
                        "Step: {}, Rule: {}, State: {}, Head: {}, Tape: {}",
                        event.step,
                        event.rule.number(),
                        event.state,
                        event.head,
                        event.tape
                    );
                }
            }
            Step::Terminal(outcome) => break outcome,
        }
    };

    info!(steps = machine.step_count(), "run finished");

    if cli.json {
        println!("{}", serde_json::to_string(&outcome)?);
    } else {
        if cli.debug {
            println!();
        }
        println!("{}", outcome);
        println!("{}", machine.tape());
    }

    Ok(exit_status(&outcome))
}

/// Collects rules from a preset, from `--rule` arguments, or from piped stdin, in that order.
fn load_rules(cli: &Cli) -> Result<Vec<Rule>> {
    if let Some(name) = &cli.program {
        let preset = PresetManager::get_by_name(name).with_context(|| {
            format!(
                "Unknown program '{}'. Available: {}",
                name,
                PresetManager::names().join(", ")
            )
        })?;
        return Ok(preset.rules.to_vec());
    }

    if !cli.rule.is_empty() {
        let mut rules = Vec::new();
        for text in &cli.rule {
            rules.extend(parse_rules(text).with_context(|| format!("Invalid rule '{}'", text))?);
        }
        return Ok(rules);
    }

    if atty::isnt(atty::Stream::Stdin) {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read rules from stdin")?;
        return parse_rules(&buffer).context("Invalid rules on stdin");
    }

    bail!("No rules given. Use --program, --rule, or pipe rules on stdin (see --help)")
}

fn print_state(machine: &TuringMachine) {
    println!(
        "Step: {}, State: {}, Head: {}, Tape: {}",
        machine.step_count(),
        machine.state(),
        machine.head(),
        machine.tape()
    );
}

fn exit_status(outcome: &Outcome) -> u8 {
    match outcome {
        Outcome::Accepted { .. } => 0,
        Outcome::Rejected { .. } => 1,
        Outcome::Halted { .. } => 2,
    }
}
