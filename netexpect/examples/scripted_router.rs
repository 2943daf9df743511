//! Scripted router example
//!
//! Drives a session against an in-memory fake Cisco router, so it runs
//! without any device. Shows login with prompt learning, paging, the
//! command cache, and a confirmation question answered by a prompt rule.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example scripted_router
//! RUST_LOG=debug cargo run --example scripted_router
//! ```

use netexpect::driver::{Credentials, Invocation, PromptRule, Session, SessionBuilder};
use netexpect::transport::ScriptedTransport;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=== netexpect Scripted Router Example ===\n");

    let device = ScriptedTransport::new()
        .output("User Access Verification\r\n\r\nUsername: ")
        .on_write("admin", "admin\r\nPassword: ")
        .on_write("cisco", "\r\nedge1#")
        .on_write("\r", "\r\nedge1#")
        .on_write(
            "show interfaces description",
            "show interfaces description\r\nGi0/0  up  uplink\r\n --More-- ",
        )
        .on_write(" ", "\r\nGi0/1  down  spare\r\nedge1#")
        .on_write(
            "clear counters",
            "clear counters\r\nClear \"show interface\" counters on all interfaces [confirm]",
        )
        .on_write("y", "\r\nedge1#");

    let config = SessionBuilder::new().platform("cisco_ios").build()?;
    let mut session = Session::new("edge1", Box::new(device), config);

    session.login(&Credentials::new("admin", "cisco")).await?;
    println!("Logged in, prompt is {:?}\n", session.prompt());

    // Paging is answered automatically; the markers stay in the result.
    let response = session.command("show interfaces description").await?;
    println!("--- {} ({:?}) ---", response.command, response.elapsed);
    print!("{}", response.result);
    println!();

    // A repeat is served from the cache without touching the device.
    let again = session.command("show interfaces description").await?;
    println!("Second run cached: {}\n", again.cached);

    let clear = Invocation::new("clear counters").rule(PromptRule::send(r"\[confirm\]", "y")?);
    let response = session.run(clear).await?;
    println!("clear counters finished at prompt: {}", response.is_success());

    session.close().await?;
    println!("Done!");

    Ok(())
}
