//! Confirmation prompts example
//!
//! Spawns a real `ssh` session to a Cisco IOS device and schedules a
//! reload, answering the questions IOS asks along the way with prompt
//! rules. The reload is cancelled again before the session closes.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example reload_confirm -- --host 192.0.2.1 --user admin
//! ```
//!
//! The password is read from the terminal unless `--password` is given.

use std::env;
use std::time::Duration;

use netexpect::driver::{Credentials, Invocation, PromptRule, Reply, Session, SessionBuilder};
use netexpect::transport::SpawnConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    println!("=== netexpect Reload Confirmation Example ===\n");

    let spawn = SpawnConfig::new("ssh").with_args([
        "-o",
        "StrictHostKeyChecking=no",
        "-l",
        args.user.as_str(),
        args.host.as_str(),
    ]);
    let config = SessionBuilder::new()
        .platform("cisco_ios")
        .spawn(spawn)
        .timeout(Duration::from_secs(args.timeout))
        .build()?;

    let credentials = match &args.password {
        Some(password) => Credentials::new(&args.user, password),
        None => Credentials::none().with_password_prompt(),
    };

    println!("Connecting to {}...", args.host);
    let mut session = Session::spawn(&args.host, config)?;
    session.login(&credentials).await?;
    println!("Logged in at {:?}\n", session.prompt());

    // Refuse to save a modified config; confirm the reload itself.
    let reload = Invocation::new("reload in 60")
        .no_cache()
        .rule(PromptRule::send(r"System configuration has been modified", "no")?)
        .rule(PromptRule::decide(r"\[confirm\]", |_session, output| {
            if output.contains("Proceed with reload") {
                Reply::Send(String::new())
            } else {
                Reply::Stop
            }
        })?);

    let response = session.run(reload).await?;
    println!("--- reload in 60 ({:?}) ---", response.outcome);
    print!("{}", response.result);
    println!();

    let cancel = session.run(Invocation::new("reload cancel").no_cache()).await?;
    println!("--- reload cancel ---");
    print!("{}", cancel.result);

    session.close().await?;
    println!("\nDone!");

    Ok(())
}

/// Simple argument parser
struct Args {
    host: String,
    user: String,
    password: Option<String>,
    timeout: u64,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut host = "localhost".to_string();
        let mut user = env::var("USER").unwrap_or_else(|_| "admin".to_string());
        let mut password = None;
        let mut timeout = 30u64;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--host" | "-h" => {
                    i += 1;
                    if i < args.len() {
                        host = args[i].clone();
                    }
                }
                "--user" | "-u" => {
                    i += 1;
                    if i < args.len() {
                        user = args[i].clone();
                    }
                }
                "--password" | "-P" => {
                    i += 1;
                    if i < args.len() {
                        password = Some(args[i].clone());
                    }
                }
                "--timeout" | "-t" => {
                    i += 1;
                    if i < args.len() {
                        timeout = args[i].parse().unwrap_or(30);
                    }
                }
                "--help" => {
                    println!("Usage: reload_confirm --host HOST [--user USER] [--password PASS] [--timeout SECS]");
                    std::process::exit(0);
                }
                _ => {}
            }
            i += 1;
        }

        Self {
            host,
            user,
            password,
            timeout,
        }
    }
}
