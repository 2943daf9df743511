//! Command/response engine: send a command, answer what comes back, stop at the prompt.

use log::debug;
use regex::bytes::Regex;
use tokio::time::Instant;

use super::response::{Outcome, Response};
use super::rules::{Action, Invocation, Reply};
use super::session::{Expect, Session};
use crate::error::{DriverError, Result};

impl Session {
    /// Run a command with the session defaults and return its output.
    pub async fn command(&mut self, command: &str) -> Result<Response> {
        self.run(Invocation::new(command)).await
    }

    /// Run several commands in order, stopping at the first error.
    pub async fn commands(&mut self, commands: &[&str]) -> Result<Vec<Response>> {
        let mut responses = Vec::with_capacity(commands.len());
        for command in commands {
            responses.push(self.command(command).await?);
        }
        Ok(responses)
    }

    /// Run an invocation.
    ///
    /// Each wait cycle checks, in order: the pager marker, the invocation's
    /// rules, then the learned prompt. Paging markers and mid-stream rule
    /// matches stay in the output; the echo and the final prompt do not.
    pub async fn run(&mut self, invocation: Invocation) -> Result<Response> {
        self.ensure_logged_in()?;
        let prompt = self.prompt.clone().ok_or(DriverError::NotLoggedIn)?;

        if invocation.use_cache {
            if let Some(hit) = self.cache.get(&invocation.command) {
                debug!("[{}] cache hit for {:?}", self.name(), invocation.command);
                let mut response = hit.clone();
                response.cached = true;
                return Ok(response);
            }
        }

        let timeout = invocation.timeout.unwrap_or(self.timeout());
        let paging = self.config.paging_pattern.clone();
        let paging_key = self.config.paging_key.clone();

        let mut patterns: Vec<&Regex> = Vec::with_capacity(invocation.rules.len() + 2);
        if let Some(paging) = &paging {
            patterns.push(paging);
        }
        let first_rule = patterns.len();
        patterns.extend(invocation.rules.iter().map(|rule| &rule.pattern));
        let prompt_index = patterns.len();
        patterns.push(&prompt);

        let start = Instant::now();
        self.send_line(&invocation.command).await?;

        let mut raw = String::new();
        let mut pages = 0usize;
        loop {
            let m = match self.expect(&patterns, timeout).await? {
                Expect::Matched(m) => m,
                Expect::Timeout { pending } => {
                    raw.push_str(&pending);
                    debug!(
                        "[{}] {:?} produced no prompt within {:?}",
                        self.name(),
                        invocation.command,
                        timeout
                    );
                    return Ok(Response::timed_out(invocation.command, raw, start.elapsed()));
                }
            };
            raw.push_str(&m.before);

            if m.index == prompt_index {
                let result = self.normalize(&invocation.command, &raw, true);
                let response = Response::new(
                    invocation.command.as_str(),
                    result,
                    raw,
                    m.matched.trim(),
                    start.elapsed(),
                    Outcome::Prompt,
                );
                debug!(
                    "[{}] {:?} done in {:?} ({} pages)",
                    self.name(),
                    invocation.command,
                    response.elapsed,
                    pages
                );
                if invocation.use_cache {
                    self.cache.insert(invocation.command, response.clone());
                }
                return Ok(response);
            }

            raw.push_str(&m.matched);
            if paging.is_some() && m.index == 0 {
                pages += 1;
                self.send(&paging_key).await?;
                continue;
            }

            let reply = match &invocation.rules[m.index - first_rule].action {
                Action::Send(text) => Reply::Send(text.clone()),
                Action::Stop => Reply::Stop,
                Action::Decide(decide) => decide(&*self, &raw),
            };
            match reply {
                Reply::Send(text) => self.send_line(&text).await?,
                Reply::Continue => {}
                Reply::Stop => {
                    debug!("[{}] {:?} stopped by rule", self.name(), invocation.command);
                    let result = self.normalize(&invocation.command, &raw, false);
                    return Ok(Response::new(
                        invocation.command.as_str(),
                        result,
                        raw,
                        "",
                        start.elapsed(),
                        Outcome::Stopped,
                    ));
                }
            }
        }
    }

    /// Strip the echo, normalize line endings, apply the vendor hook.
    ///
    /// `at_prompt` means the output was cut at a prompt, whose match swallowed
    /// the line break ending the last output line.
    fn normalize(&self, command: &str, raw: &str, at_prompt: bool) -> String {
        let text = raw.replace("\r\n", "\n").replace('\r', "");
        let body = match text.split_once('\n') {
            Some((first, rest)) if first.trim_end().ends_with(command.trim()) => rest,
            None if text.trim() == command.trim() => "",
            _ => text.as_str(),
        };

        let mut body = body.to_string();
        if at_prompt && !body.is_empty() && !body.ends_with('\n') {
            body.push('\n');
        }
        self.behavior.post_process_output(&body)
    }
}
