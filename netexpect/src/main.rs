//! `netexpect`: log in to one device, run commands, print their output.
//!
//! ```bash
//! netexpect --spawn "ssh -l admin 192.0.2.1" --profile cisco_ios --password-in \
//!     --record run.json "show version" "show ip interface brief"
//! netexpect --replay run.json --test
//! ```

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use log::warn;

use netexpect::config::{Cli, Options, Pragma};
use netexpect::harness::{Harness, Verdict};
use netexpect::{Error, logging};

/// Component name of the single session this command drives.
const SESSION: &str = "session";

const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let harness = match Harness::new(cli.mode()) {
        Ok(harness) => harness.strict(cli.strict),
        Err(e) => {
            eprintln!("netexpect: error: {e}");
            return ExitCode::FAILURE;
        }
    };
    logging::init(cli.verbose, harness.stderr());

    let status = tokio::select! {
        result = run(&cli, &harness) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                report(&harness, &e);
                ExitCode::FAILURE
            }
        },
        signal = shutdown_signal() => {
            warn!("interrupted by {signal}, finishing harness");
            ExitCode::from(EXIT_INTERRUPTED)
        }
    };

    match harness.finish() {
        Ok(Verdict::Failed(diffs)) => {
            for diff in &diffs {
                print!("{diff}");
            }
            ExitCode::FAILURE
        }
        Ok(_) => status,
        Err(e) => {
            eprintln!("netexpect: error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, harness: &Harness) -> Result<(), Error> {
    let recorded = harness
        .recorded_options()
        .map(|options| (options, harness.recorded_args()));
    let options = Options::resolve(cli, recorded, &Pragma::new());
    harness.record_options(options.redacted(), options.commands.clone());

    let config = options.session_builder()?.build()?;
    let mut session = harness.connect(SESSION, config)?;

    let result = async {
        session.login(&options.credentials()).await?;
        let mut stdout = harness.stdout();
        for command in &options.commands {
            let response = session.command(command).await?;
            if response.is_timeout() {
                warn!("{command:?} produced no prompt before the timeout");
            }
            if let Err(e) = write!(stdout, "{}", response.result) {
                warn!("failed to write output: {e}");
            }
        }
        Ok::<(), Error>(())
    }
    .await;

    session.close().await?;
    result
}

/// Errors go to the captured stderr; test runs do not echo it, so they also
/// print directly.
fn report(harness: &Harness, error: &Error) {
    let _ = writeln!(harness.stderr(), "netexpect: error: {error}");
    if harness.is_test() {
        eprintln!("netexpect: error: {error}");
    }
}

#[cfg(unix)]
async fn shutdown_signal() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => tokio::select! {
            _ = tokio::signal::ctrl_c() => "SIGINT",
            _ = terminate.recv() => "SIGTERM",
        },
        Err(_) => {
            let _ = tokio::signal::ctrl_c().await;
            "SIGINT"
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "Ctrl-C"
}
