//! Record a scripted session, then replay and test it without the device.

use std::io::Write;
use std::path::Path;

use clap::Parser;
use indexmap::IndexMap;
use tokio_test::assert_ok;

use netexpect::config::{Cli, Options, Pragma};
use netexpect::driver::{Credentials, Session, SessionBuilder};
use netexpect::harness::{DiffLine, Harness, Mode, TestCapture, TransportEvent, Verdict};
use netexpect::transport::ScriptedTransport;

const PASSWORD: &str = "s3cr3t!";

fn device() -> ScriptedTransport {
    ScriptedTransport::new()
        .output("Username: ")
        .on_write("admin", "admin\r\nPassword: ")
        .on_write(PASSWORD, "\r\nrouter#")
        .on_write("\r", "\r\nrouter#")
        .on_write(
            "show version",
            "show version\r\nCisco IOS Software, Version 15.2\r\nuptime is 3 weeks\r\nrouter#",
        )
}

/// The same script a user would write, against whatever session it is given.
async fn script(harness: &Harness, mut session: Session) {
    assert_ok!(session.login(&Credentials::new("admin", PASSWORD)).await);
    let response = assert_ok!(session.command("show version").await);
    assert_ok!(write!(harness.stdout(), "{}", response.result));
    assert_ok!(session.close().await);
}

async fn record(path: &Path) {
    let harness = Harness::new(Mode::Record {
        path: path.to_path_buf(),
    })
    .unwrap();
    let config = SessionBuilder::new().build().unwrap();
    let mut session = Session::new("router", Box::new(device()), config);
    session.attach_tap(harness.tap("router").unwrap());

    script(&harness, session).await;
    assert!(matches!(harness.finish().unwrap(), Verdict::Recorded(_)));
}

async fn replay(path: &Path) -> Verdict {
    let harness = Harness::new(Mode::Replay {
        path: path.to_path_buf(),
        test: true,
    })
    .unwrap();
    let config = SessionBuilder::new().build().unwrap();
    let session = harness.connect("router", config).unwrap();

    script(&harness, session).await;
    harness.finish().unwrap()
}

#[tokio::test]
async fn test_recording_masks_the_password() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.json");
    record(&path).await;

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(!text.contains(PASSWORD));

    let capture = TestCapture::load(&path).unwrap();
    let events = &capture.component("router").unwrap().events;
    assert!(matches!(events.first(), Some(TransportEvent::Read { .. })));
    assert_eq!(
        capture.harness.stdout_text(),
        "Cisco IOS Software, Version 15.2\nuptime is 3 weeks\n"
    );
}

#[tokio::test]
async fn test_replay_matches_recording() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.json");
    record(&path).await;

    let verdict = replay(&path).await;
    assert!(matches!(verdict, Verdict::Passed), "{verdict:?}");
}

#[tokio::test]
async fn test_altered_device_output_gives_one_line_diff() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.json");
    record(&path).await;

    // Pretend the device said something else when the run was recorded.
    let mut capture = TestCapture::load(&path).unwrap();
    for chunk in &mut capture.harness.stdout {
        *chunk = chunk.replace("3 weeks", "4 weeks");
    }
    capture.save(&path).unwrap();

    let verdict = replay(&path).await;
    assert!(!verdict.is_success());
    let Verdict::Failed(diffs) = verdict else {
        panic!("expected a failed verdict");
    };
    assert_eq!(diffs.len(), 1);

    let changed: Vec<_> = diffs[0]
        .entries()
        .iter()
        .filter(|line| !matches!(line, DiffLine::Same(_)))
        .collect();
    assert_eq!(changed.len(), 2);
    assert_eq!(diffs[0].removed().collect::<Vec<_>>(), ["uptime is 4 weeks"]);
    assert_eq!(diffs[0].added().collect::<Vec<_>>(), ["uptime is 3 weeks"]);
}

#[tokio::test]
async fn test_replay_needs_a_recorded_component() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.json");
    record(&path).await;

    let harness = Harness::new(Mode::Replay { path, test: false }).unwrap();
    let config = SessionBuilder::new().build().unwrap();
    assert!(harness.connect("switch", config).is_err());
}

#[tokio::test]
async fn test_replay_of_prompted_password_needs_no_terminal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.json");

    // A run where the password was typed at the terminal.
    {
        let harness = Harness::new(Mode::Record { path: path.clone() }).unwrap();
        let options: IndexMap<String, String> = [
            ("spawn", "ssh -l admin router"),
            ("username", "admin"),
            ("password_in", "true"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        harness.record_options(options, vec!["show version".to_string()]);

        let config = SessionBuilder::new().build().unwrap();
        let mut session = Session::new("session", Box::new(device()), config);
        session.attach_tap(harness.tap("session").unwrap());
        script(&harness, session).await;
        harness.finish().unwrap();
    }

    let cli = Cli::try_parse_from(["netexpect", "--replay", path.to_str().unwrap(), "--test"]).unwrap();
    let harness = Harness::new(cli.mode()).unwrap();
    let recorded = harness
        .recorded_options()
        .map(|options| (options, harness.recorded_args()));
    let options = Options::resolve(&cli, recorded, &Pragma::new());
    assert_eq!(options.commands, ["show version"]);

    let credentials = options.credentials();
    assert!(!credentials.password_in);

    let config = options.session_builder().unwrap().build().unwrap();
    let mut session = harness.connect("session", config).unwrap();
    assert_ok!(session.login(&credentials).await);
    for command in &options.commands {
        let response = assert_ok!(session.command(command).await);
        assert_ok!(write!(harness.stdout(), "{}", response.result));
    }
    assert_ok!(session.close().await);

    let verdict = harness.finish().unwrap();
    assert!(matches!(verdict, Verdict::Passed), "{verdict:?}");
}
