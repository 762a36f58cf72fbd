use std::fs::File;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use anyhow::Result;
use arc_core::classifier::classify;
use arc_core::Config;
use arc_exec::NarrativeExecutor;
use arc_exec::PathSpeechDetector;
use arc_exec::SpeechDetector;
use clap::Parser;
use clap::Subcommand;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod driver;
mod ui;

use driver::run_headless;
use driver::HeadlessEvent;
use driver::Session;

#[derive(Parser, Debug)]
#[command(name = "arc", version, about = "ARC Command console")]
struct Cli {
    /// Config file; defaults to <config dir>/arc-command/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the interactive console
    Console,
    /// Run one command against a simulated clock and print the transcript
    Run {
        command: String,
        /// Scan and approve governance requests (default)
        #[arg(long, conflicts_with = "cancel")]
        approve: bool,
        /// Close governance requests instead of approving them
        #[arg(long)]
        cancel: bool,
        /// Simulated milliseconds per tick
        #[arg(long, default_value_t = 10)]
        tick_ms: u64,
    },
    /// Print how a command would be routed, as JSON
    Classify { command: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Console);
    let console = matches!(command, Commands::Console);

    init_logging(cli.verbose, cli.log_file.as_deref(), console)?;
    let config = load_config(cli.config.as_deref())?;

    match command {
        Commands::Console => {
            let mut session = Session::new(config.clone(), NarrativeExecutor);
            session.apply_speech_capability(
                &PathSpeechDetector::new(config.voice.recognizer.clone()).detect(),
            );
            ui::run(session).context("console failed")
        }
        Commands::Run {
            command,
            approve,
            cancel,
            tick_ms,
        } => {
            let mut session = Session::new(config, NarrativeExecutor);
            let approve = approves_governance(approve, cancel);
            for event in run_headless(&mut session, &command, approve, tick_ms) {
                print_event(&event);
            }
            Ok(())
        }
        Commands::Classify { command } => {
            let classification = classify(&command);
            println!("{}", serde_json::to_string_pretty(&classification)?);
            Ok(())
        }
    }
}

/// Approval is the default; `--cancel` turns it off.
fn approves_governance(approve: bool, cancel: bool) -> bool {
    approve || !cancel
}

fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return Config::load(path).with_context(|| format!("loading {}", path.display()));
    }
    let Some(path) = default_config_path() else {
        return Ok(Config::default());
    };
    let config = Config::load_or_default(&path)
        .with_context(|| format!("loading {}", path.display()))?;
    info!(path = %path.display(), "configuration loaded");
    Ok(config)
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("arc-command").join("config.toml"))
}

fn init_logging(verbose: u8, log_file: Option<&Path>, console: bool) -> Result<()> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        // The console owns the terminal; without a log file, logs are dropped.
        None if console => {}
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn print_event(event: &HeadlessEvent) {
    match event {
        HeadlessEvent::Navigated(view) => println!("-> {} :: {}", view.label(), view.summary()),
        HeadlessEvent::Notice(notice) => {
            print!("[{}] {}", notice.level.label(), notice.title);
            match &notice.description {
                Some(description) => println!(" ({description})"),
                None => println!(),
            }
        }
        HeadlessEvent::ApprovalRequired {
            request_id,
            category,
            value,
            risk,
        } => println!("governance {request_id}: {category} {value} (risk {risk})"),
        HeadlessEvent::ApprovalCancelled => println!("governance request cancelled"),
        HeadlessEvent::Line(line) => println!("> {line}"),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn bare_invocation_defaults_to_console() {
        let cli = Cli::try_parse_from(["arc"]).expect("parse");
        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn run_accepts_cancel_and_global_flags() {
        let cli = Cli::try_parse_from(["arc", "run", "waive fees", "--cancel", "-vv"])
            .expect("parse");
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Some(Commands::Run {
                command, cancel, ..
            }) => {
                assert_eq!(command, "waive fees");
                assert!(cancel);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn approve_and_cancel_conflict() {
        assert!(Cli::try_parse_from(["arc", "run", "x", "--approve", "--cancel"]).is_err());
    }

    #[test]
    fn governance_mode_follows_run_flags() {
        let mode = |args: &[&str]| match Cli::try_parse_from(args).expect("parse").command {
            Some(Commands::Run {
                approve, cancel, ..
            }) => approves_governance(approve, cancel),
            other => panic!("unexpected command: {other:?}"),
        };
        assert!(mode(&["arc", "run", "waive fees"]));
        assert!(mode(&["arc", "run", "waive fees", "--approve"]));
        assert!(!mode(&["arc", "run", "waive fees", "--cancel"]));
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(load_config(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn explicit_config_is_applied() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[execution]\nstep_delay_ms = 5\n").expect("write config");

        let config = load_config(Some(&path)).expect("config loads");
        assert_eq!(config.execution.step_delay_ms, 5);
        assert_eq!(config.execution.reset_delay_ms, 2_000);
    }
}
