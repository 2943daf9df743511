//! Password entry on the controlling terminal.

use std::io::{self, Write};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use secrecy::SecretString;

use crate::error::ConfigError;

/// Print `prompt` to stderr and read one line with echo off.
///
/// The terminal leaves raw mode on every path, including Ctrl-C, which is
/// reported as an error instead of killing the process mid-read.
pub fn read_password(prompt: &str) -> Result<SecretString, ConfigError> {
    let mut stderr = io::stderr();
    write!(stderr, "{prompt}").map_err(prompt_error)?;
    stderr.flush().map_err(prompt_error)?;

    terminal::enable_raw_mode().map_err(prompt_error)?;
    let line = read_hidden_line();
    let restored = terminal::disable_raw_mode();
    writeln!(stderr).map_err(prompt_error)?;

    restored.map_err(prompt_error)?;
    line.map(SecretString::from)
}

fn read_hidden_line() -> Result<String, ConfigError> {
    let mut line = String::new();
    loop {
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind,
            ..
        }) = event::read().map_err(prompt_error)?
        else {
            continue;
        };
        if kind == KeyEventKind::Release {
            continue;
        }
        match code {
            KeyCode::Enter => return Ok(line),
            KeyCode::Char('c' | 'd') if modifiers.contains(KeyModifiers::CONTROL) => {
                return Err(ConfigError::PasswordPrompt("interrupted".to_string()));
            }
            KeyCode::Backspace => {
                line.pop();
            }
            KeyCode::Char(c) => line.push(c),
            _ => {}
        }
    }
}

fn prompt_error(e: io::Error) -> ConfigError {
    ConfigError::PasswordPrompt(e.to_string())
}
