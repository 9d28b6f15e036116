//! Monitoring checks for Areca hardware RAID controllers
//!
//! The checks in here follow the usual Nagios/Sensu plugin contract: a
//! single line of output on stdout and an exit status that the monitoring
//! supervisor interprets as one of [`Status`].
//!
//! The library is split along the plugin's pipeline:
//!
//! * [`config`] holds the immutable [`config::Invocation`] built from the
//!   command line
//! * [`preflight`] verifies that the vendor CLI can be run at all
//! * [`runner`] runs shell commands under a deadline
//! * [`areca`] knows which vendor CLI commands to issue
//! * [`volume`] turns the vendor CLI's table into a [`volume::Report`]

use std::fmt;
use std::process;
use std::str::FromStr;

use serde::Deserialize;

pub mod areca;
pub mod config;
pub mod preflight;
pub mod runner;
pub mod volume;

/// All possible exit statuses for a check
///
/// The variants are ordered by severity, so the worst of several statuses is
/// just `max(a, b)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl Status {
    /// The process exit code the monitoring supervisor expects
    pub fn code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::Warning => 1,
            Status::Critical => 2,
            Status::Unknown => 3,
        }
    }

    pub fn exit(self) -> ! {
        process::exit(self.code())
    }

    /// The values that are accepted by `from_str`, for argument parsers
    pub fn str_values() -> [&'static str; 4] {
        ["ok", "warning", "critical", "unknown"]
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match *self {
            Status::Ok => "OK",
            Status::Warning => "WARNING",
            Status::Critical => "CRITICAL",
            Status::Unknown => "UNKNOWN",
        };
        write!(f, "{}", msg)
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Status, String> {
        match s.to_ascii_lowercase().as_str() {
            "ok" => Ok(Status::Ok),
            "warn" | "warning" => Ok(Status::Warning),
            "crit" | "critical" => Ok(Status::Critical),
            "unknown" => Ok(Status::Unknown),
            _ => Err(format!(
                "Unexpected exit status: {} (expected one of {})",
                s,
                Status::str_values().join(", ")
            )),
        }
    }
}
