//! Logger setup for the `netexpect` binary.

use env_logger::{Builder, Env, Target};

use crate::harness::HarnessWriter;

/// Default filter for a `-v` count. `RUST_LOG` takes precedence.
pub fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global logger, writing through the harness stderr stream.
///
/// Log lines land in the capture like any other stderr output; the
/// harness decides whether they are also echoed.
pub fn init(verbose: u8, stderr: HarnessWriter) {
    let result = Builder::from_env(Env::default().default_filter_or(default_filter(verbose)))
        .target(Target::Pipe(Box::new(stderr)))
        .try_init();
    if let Err(e) = result {
        log::debug!("logger already installed: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(default_filter(0), "warn");
        assert_eq!(default_filter(1), "info");
        assert_eq!(default_filter(2), "debug");
        assert_eq!(default_filter(9), "trace");
    }
}
