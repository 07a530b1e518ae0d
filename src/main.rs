//! Command-line front end for the intcode VM
//!
//! Usage:
//!   intcode run <FILE> [--input 1,2] [--set 1=12] [--dump]
//!   intcode amplify <FILE> [--phases 5,6,7,8,9] [--feedback]
//!   intcode search <FILE> --target 19690720 [--max 99]
//!   intcode encode <FILE> <OUT>
//!   intcode decode <FILE>

use std::error::Error as StdError;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt};

use intcode::{Machine, Program, Topology, Word, best_phase_setting};

type CliResult<T> = Result<T, Box<dyn StdError>>;

#[derive(Parser, Debug)]
#[command(name = "intcode")]
#[command(about = "Run intcode programs and amplifier networks")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a program to completion and print its output
    Run {
        /// Program in comma-separated text form
        file: PathBuf,

        /// Input values, comma-separated
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        input: Vec<Word>,

        /// Overwrite a memory cell before running, as ADDR=VALUE
        #[arg(long = "set", value_parser = parse_patch)]
        patches: Vec<(Word, Word)>,

        /// Print final memory as well
        #[arg(long)]
        dump: bool,
    },

    /// Find the phase assignment giving the strongest amplifier signal
    Amplify {
        /// Amplifier program in comma-separated text form
        file: PathBuf,

        /// Phase candidates, comma-separated
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        phases: Option<Vec<Word>>,

        /// Wire the last amplifier back into the first
        #[arg(long)]
        feedback: bool,
    },

    /// Find the noun and verb (cells 1 and 2) that leave TARGET in cell 0
    Search {
        /// Program in comma-separated text form
        file: PathBuf,

        /// Value cell 0 must hold once the program halts
        #[arg(long, allow_hyphen_values = true)]
        target: Word,

        /// Largest noun and verb to try, starting from 0
        #[arg(long, default_value_t = 99)]
        max: Word,
    },

    /// Convert a text program to protobuf bytes
    Encode { file: PathBuf, out: PathBuf },

    /// Print a protobuf program in text form
    Decode { file: PathBuf },
}

fn parse_patch(arg: &str) -> Result<(Word, Word), String> {
    let (address, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected ADDR=VALUE, got '{}'", arg))?;
    let address = address
        .trim()
        .parse()
        .map_err(|e| format!("invalid address '{}': {}", address, e))?;
    let value = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid value '{}': {}", value, e))?;
    Ok((address, value))
}

fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        })
    });

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_text(path: &Path) -> CliResult<Program> {
    let source = fs::read_to_string(path)?;
    let program = Program::parse(&source)?;
    debug!(path = %path.display(), words = program.len(), "loaded program");
    Ok(program)
}

fn join(words: impl IntoIterator<Item = Word>) -> String {
    words
        .into_iter()
        .map(|word| word.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn execute(command: Command) -> CliResult<()> {
    match command {
        Command::Run {
            file,
            input,
            patches,
            dump,
        } => {
            let program = load_text(&file)?.patched(&patches)?;
            let mut machine = Machine::new(&program).with_input(input);
            machine.run_to_terminal()?;

            println!("{}", join(machine.outputs().iter().copied()));
            if dump {
                println!("{}", join(machine.memory().as_slice().iter().copied()));
            }
        }
        Command::Amplify {
            file,
            phases,
            feedback,
        } => {
            let program = load_text(&file)?;
            let (topology, default_phases) = if feedback {
                (Topology::Feedback, vec![5, 6, 7, 8, 9])
            } else {
                (Topology::Chain, vec![0, 1, 2, 3, 4])
            };
            let candidates = phases.unwrap_or(default_phases);

            let (best, signal) = best_phase_setting(&program, &candidates, topology)?;
            println!("{} {}", join(best), signal);
        }
        Command::Search { file, target, max } => {
            let program = load_text(&file)?;
            match program.find_noun_verb(target, 0..=max)? {
                Some((noun, verb)) => println!("{} {}", noun, verb),
                None => {
                    return Err(format!("no noun/verb pair up to {} gives {}", max, target).into());
                }
            }
        }
        Command::Encode { file, out } => {
            let program = load_text(&file)?;
            fs::write(&out, program.to_proto_bytes())?;
            info!(path = %out.display(), words = program.len(), "wrote program");
        }
        Command::Decode { file } => {
            let program = Program::from_proto_bytes(&fs::read(&file)?)?;
            println!("{}", join(program.words().iter().copied()));
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = execute(cli.command) {
        error!("{}", err);
        process::exit(1);
    }
}
