//! Blink-PIN CLI
//!
//! Usage:
//!   blinkpin register --user alice --frames capture.jsonl   # Store a new PIN
//!   landmarks | blinkpin authenticate --user alice          # Frames from stdin
//!   blinkpin list                                           # Registered users
//!   blinkpin classify 0.2 0.1 0.2 0.6                       # Durations → bits
//!   blinkpin --json authenticate --user alice < frames      # JSON output

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blinkpin::core::{
    classify_all, read_inputs, AuthenticationFlow, CredentialStore, RegistrationFlow,
};
use blinkpin::types::{AuthOutcome, PatternSequence, ReasonCode, SessionUpdate, UpdateOutput};
use blinkpin::{BlinkConfig, BlinkError, PIN_LENGTH, VERSION};

#[derive(Parser, Debug)]
#[command(
    name = "blinkpin",
    version = VERSION,
    about = "Blink-PIN - register and authenticate with a 4-blink pattern",
    long_about = "Blink-PIN turns a stream of eye landmarks into a 4-symbol PIN.\n\n\
                  Quick blink = 0, long blink (0.4s or longer) = 1.\n\n\
                  Frames are read as JSON lines from --frames or stdin:\n  \
                  {\"t\": 0.033, \"left\": [[x,y],...], \"right\": [[x,y],...]}\n  \
                  {\"t\": 0.033, \"mesh\": [[x,y],...], \"width\": 640, \"height\": 480}\n  \
                  {\"t\": 0.033, \"ear\": 0.31}\n  \
                  {\"control\": \"reset\"} / {\"control\": \"quit\"}"
)]
struct Args {
    /// Credential store (default: <data dir>/blinkpin/users.json)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// TOML file with detection thresholds
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    no_color: bool,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Capture a blink PIN and store it for a new user
    Register {
        #[arg(short, long)]
        user: String,
        /// Frame stream file (default: stdin)
        #[arg(short, long)]
        frames: Option<PathBuf>,
    },
    /// Capture a blink PIN and check it against the stored one
    Authenticate {
        #[arg(short, long)]
        user: String,
        /// Frame stream file (default: stdin)
        #[arg(short, long)]
        frames: Option<PathBuf>,
    },
    /// List registered usernames
    List,
    /// Classify blink durations (seconds) with the configured threshold
    Classify {
        #[arg(required = true)]
        durations: Vec<f64>,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.no_color || args.json {
        colored::control::set_override(false);
    }

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            if args.json {
                println!("{}", serde_json::json!({ "error": format!("{:#}", e) }));
            } else {
                eprintln!("{} {:#}", "[ERROR]".red().bold(), e);
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "blinkpin=debug" } else { "blinkpin=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn run(args: &Args) -> anyhow::Result<ExitCode> {
    let config = match &args.config {
        Some(path) => BlinkConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => BlinkConfig::default(),
    };
    let store_path = args
        .store
        .clone()
        .unwrap_or_else(BlinkConfig::default_store_path);

    match &args.command {
        Command::Register { user, frames } => {
            let mut store = open_store(&store_path)?;
            run_register(&config, &mut store, user, open_frames(frames.as_deref())?, args)
        }
        Command::Authenticate { user, frames } => {
            let store = open_store(&store_path)?;
            run_authenticate(&config, &store, user, open_frames(frames.as_deref())?, args)
        }
        Command::List => {
            let store = open_store(&store_path)?;
            run_list(&store, args);
            Ok(ExitCode::SUCCESS)
        }
        Command::Classify { durations } => run_classify(&config, durations, args),
    }
}

fn open_store(path: &Path) -> anyhow::Result<CredentialStore> {
    CredentialStore::open(path).with_context(|| format!("opening store {}", path.display()))
}

fn open_frames(path: Option<&Path>) -> anyhow::Result<Box<dyn BufRead>> {
    Ok(match path {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("opening frame stream {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(io::stdin())),
    })
}

/// Register a new user (write flow)
fn run_register(
    config: &BlinkConfig,
    store: &mut CredentialStore,
    user: &str,
    frames: Box<dyn BufRead>,
    args: &Args,
) -> anyhow::Result<ExitCode> {
    if !args.json {
        print_header("Registration");
        println!("Quick blink = 0, Long blink = 1 | reset / quit via control lines");
        println!();
    }

    let result = RegistrationFlow::new(config, store).run(user, read_inputs(frames), |u| {
        print_update(u, args)
    });

    match result {
        Ok(record) => {
            if args.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "reason": ReasonCode::R401_REGISTERED,
                        "username": record.username,
                        "updated_at": record.updated_at,
                    })
                );
            } else {
                println!(
                    "{} PIN registered for user: {}",
                    "[SUCCESS]".green().bold(),
                    record.username
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(BlinkError::AlreadyExists(name)) => {
            print_reason(ReasonCode::R402_ALREADY_EXISTS, &name, args);
            Ok(ExitCode::FAILURE)
        }
        Err(BlinkError::IncompletePattern { collected, expected }) => {
            if !args.json {
                println!(
                    "{} Registration incomplete ({}/{}); nothing saved.",
                    "[INFO]".yellow(),
                    collected,
                    expected
                );
            }
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e.into()),
    }
}

/// Authenticate an existing user (read-compare flow)
fn run_authenticate(
    config: &BlinkConfig,
    store: &CredentialStore,
    user: &str,
    frames: Box<dyn BufRead>,
    args: &Args,
) -> anyhow::Result<ExitCode> {
    if !args.json {
        print_header("Authentication");
        println!("Blink your {}-blink PIN", PIN_LENGTH);
        println!();
    }

    let result = AuthenticationFlow::new(config, store).run(user, read_inputs(frames), |u| {
        print_update(u, args)
    });

    match result {
        Ok(outcome) => {
            print_verdict(&outcome, user, args);
            Ok(if outcome.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Err(BlinkError::IncompletePattern { collected, expected }) => {
            if !args.json {
                println!(
                    "{} Authentication cancelled ({}/{} blinks).",
                    "[INFO]".yellow(),
                    collected,
                    expected
                );
            }
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e.into()),
    }
}

fn run_list(store: &CredentialStore, args: &Args) {
    if args.json {
        let users: Vec<&str> = store.usernames().collect();
        println!("{}", serde_json::json!({ "users": users }));
        return;
    }
    if store.is_empty() {
        println!("No users registered in {}", store.path().display());
        return;
    }
    for name in store.usernames() {
        println!("{}", name);
    }
}

/// Calibration aid: show how durations map to bits
fn run_classify(
    config: &BlinkConfig,
    durations: &[f64],
    args: &Args,
) -> anyhow::Result<ExitCode> {
    let symbols = classify_all(durations, config.dah_threshold);
    let bits: String = symbols.iter().map(|s| s.bit()).collect();

    if args.json {
        println!(
            "{}",
            serde_json::json!({ "symbols": symbols, "bits": bits, "threshold": config.dah_threshold })
        );
    } else {
        for (d, s) in durations.iter().zip(&symbols) {
            println!("{:.2}s -> {} ({})", d, s, s.bit());
        }
        println!("bits: {}", bits.bold());
        if let Ok(pattern) = PatternSequence::new(&symbols) {
            println!("PIN: {}", pattern);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print_header(mode: &str) {
    println!("{}", format!("Blink-PIN v{} - {}", VERSION, mode).cyan().bold());
}

fn print_update(update: &SessionUpdate, args: &Args) {
    tracing::debug!("{}", update.reason());
    if args.json {
        let output = UpdateOutput::new(update.clone());
        match serde_json::to_string(&output) {
            Ok(line) => println!("{}", line),
            Err(e) => tracing::warn!("Could not serialize update: {}", e),
        }
    } else {
        println!("{}", update.to_terminal_string());
    }
}

fn print_reason(reason: ReasonCode, subject: &str, args: &Args) {
    if args.json {
        println!("{}", serde_json::json!({ "reason": reason, "subject": subject }));
    } else {
        println!("{} {}: {}", "[ERROR]".red().bold(), reason.description(), subject);
    }
}

fn print_verdict(outcome: &AuthOutcome, user: &str, args: &Args) {
    if args.json {
        println!(
            "{}",
            serde_json::json!({ "outcome": outcome, "reason": outcome.reason() })
        );
        return;
    }

    match outcome {
        AuthOutcome::Success => {
            println!("{} Welcome, {}", "[SUCCESS]".green().bold(), user.trim())
        }
        // Unknown user and wrong pattern read the same
        AuthOutcome::Failure(_) => println!("{} Authentication failed", "[FAILURE]".red().bold()),
    }
}
