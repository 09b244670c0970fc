//! Framebridge command-line front end.
//!
//! Runs the keyboard-matrix demo module in the terminal: frames are drawn
//! with half-block cells and keys are relayed from raw terminal input.

use clap::Parser;
use framebridge::input::KeyCode;
use framebridge::{BridgeConfig, BridgeError, MatrixDemo, Session, TerminalGuard, TerminalSurface};
use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

#[derive(Debug, Parser)]
#[command(version, about = "Present a simulated machine's frames and relay its keyboard")]
struct Args {
    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write log output to this file (the terminal is busy drawing frames).
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Comma-separated keys to play on startup, e.g. `KeyH,KeyI,Enter`.
    #[arg(long, conflicts_with = "smoke_test")]
    sequence: Option<String>,

    /// Play the smoke-test sequence (F7, then AltRight) on startup.
    #[arg(long)]
    smoke_test: bool,
}

fn init_logging(log_file: Option<&PathBuf>) -> std::io::Result<()> {
    let env = env_logger::Env::default();
    match log_file {
        Some(path) => {
            let file = File::create(path)?;
            env_logger::Builder::from_env(env.default_filter_or("info"))
                .target(env_logger::Target::Pipe(Box::new(file)))
                .init();
        }
        // Stderr shares the screen, so stay quiet unless asked
        None if std::env::var_os("RUST_LOG").is_some() => env_logger::Builder::from_env(env).init(),
        None => {}
    }
    Ok(())
}

fn run(args: &Args, sequence: Option<Vec<KeyCode>>) -> Result<(), BridgeError> {
    let config = BridgeConfig::load(args.config.as_deref())?;
    let surface = TerminalSurface::stdout()?;
    let guard = TerminalGuard::enter(config.display.alternate_screen)?;
    let synthesize_release = config.input.release_fallback && !guard.reports_releases();

    let mut session = Session::start(config, surface, || Ok::<_, BridgeError>(MatrixDemo::new()))?;
    session.attach_input(synthesize_release)?;

    let started = match sequence {
        Some(keys) => Some(session.run_sequence(keys, Instant::now())),
        None if args.smoke_test => Some(session.smoke_test(Instant::now())),
        None => None,
    };
    if let Some(Err(err)) = started {
        log::warn!("startup sequence not played: {err}");
    }

    let result = session.run();
    drop(session);
    drop(guard);
    result
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(err) = init_logging(args.log_file.as_ref()) {
        eprintln!("framebridge: cannot open log file: {err}");
        return ExitCode::FAILURE;
    }

    let sequence = match args.sequence.as_deref().map(KeyCode::parse_list).transpose() {
        Ok(sequence) => sequence,
        Err(err) => {
            eprintln!("framebridge: --sequence: {err}");
            return ExitCode::from(2);
        }
    };

    match run(&args, sequence) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            eprintln!("framebridge: {err}");
            ExitCode::FAILURE
        }
    }
}
