//! The invocation context: everything a run needs, fixed at startup

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

/// Where the Areca CLI is installed by the vendor's package
pub const DEFAULT_CLI: &str = "/usr/local/areca/bin/cli";

/// `PATH` handed to every subprocess, regardless of what we inherited
pub const SEARCH_PATH: &str = "/usr/local/bin:/usr/bin:";

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// The default privilege elevation prefix
pub const DEFAULT_ELEVATE: &str = "sudo";

/// Immutable settings for one run of the check
#[derive(Clone, Debug, PartialEq)]
pub struct Invocation {
    /// Path to the vendor CLI binary
    pub cli: PathBuf,
    /// How many controllers to query, `0` means ask the CLI
    pub cards: u32,
    /// Deadline for each subprocess, `None` waits forever
    pub timeout: Option<Duration>,
    /// `PATH` for subprocesses
    pub search_path: OsString,
    /// Command prefix used to gain the privileges the CLI needs
    pub elevate: Option<String>,
}

impl Invocation {
    /// Build an invocation with the pinned search path
    ///
    /// A `timeout_secs` of zero disables the deadline, and an empty or
    /// whitespace-only `elevate` is the same as no prefix.
    pub fn new<P: Into<PathBuf>>(
        cli: P,
        cards: u32,
        timeout_secs: u64,
        elevate: Option<String>,
    ) -> Invocation {
        Invocation {
            cli: cli.into(),
            cards,
            timeout: if timeout_secs == 0 {
                None
            } else {
                Some(Duration::from_secs(timeout_secs))
            },
            search_path: OsString::from(SEARCH_PATH),
            elevate: elevate
                .map(|e| e.trim().to_owned())
                .filter(|e| !e.is_empty()),
        }
    }

    /// The full shell command that runs the vendor CLI with `args`
    ///
    /// The CLI path is quoted for the shell if it needs to be.
    pub fn command(&self, args: &str) -> String {
        let cli = shell_quote(&self.cli.to_string_lossy());
        match self.elevate {
            Some(ref prefix) => format!("{} {} {}", prefix, cli, args),
            None => format!("{} {}", cli, args),
        }
    }

    /// The timeout in whole seconds, for messages
    pub fn timeout_secs(&self) -> u64 {
        self.timeout.map(|t| t.as_secs()).unwrap_or(0)
    }
}

/// Single-quote `word` unless it is made only of characters the shell leaves alone
fn shell_quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/._-+,:@%=".contains(c));
    if plain {
        word.to_owned()
    } else {
        format!("'{}'", word.replace('\'', "'\\''"))
    }
}

impl Default for Invocation {
    fn default() -> Invocation {
        Invocation::new(
            DEFAULT_CLI,
            0,
            DEFAULT_TIMEOUT_SECS,
            Some(DEFAULT_ELEVATE.to_owned()),
        )
    }
}
