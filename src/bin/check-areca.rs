//! Check the volume sets of Areca RAID controllers

use std::path::PathBuf;
use std::process;

use log::{debug, LevelFilter};
use serde::Deserialize;
use structopt::StructOpt;

use areca_plugins::areca::collect;
use areca_plugins::config::{Invocation, DEFAULT_CLI, DEFAULT_ELEVATE};
use areca_plugins::preflight::check_cli;
use areca_plugins::runner::ShellRunner;
use areca_plugins::volume::Report;
use areca_plugins::Status;

static MANUAL: &str = "\
NAME
    check-areca - check the volume sets of Areca RAID controllers

SYNOPSIS
    check-areca [-A <path>] [-c <cards>] [-t <seconds>] [--elevate <cmd> | --no-elevate]

DESCRIPTION
    Runs the Areca command line utility once per controller and reports the
    state of every volume set it lists. Every volume set is printed on a
    single line as

        |Controller number: <n> RAID level: <level> Capacity: <cap> State: <state>|

    If any volume set is in a state other than 'Normal' the check is
    CRITICAL, otherwise it is OK.

    The utility is run through /bin/sh with PATH set to
    /usr/local/bin:/usr/bin: whatever the caller's PATH is, and prefixed with
    an elevation command (sudo by default) because it needs root.

OPTIONS
    -A, --arecacli <path>
        Path to the Areca CLI. Default: /usr/local/areca/bin/cli

    -c, --cards <count>
        Number of controllers to check. 0 (the default) asks the CLI with
        `cli main` and counts its 'Controller#NN(...)' lines.

    -t, --timeout <seconds>
        Give up on any single CLI call after this long and go CRITICAL. The
        call is killed. 0 waits forever. Default: 10

    --elevate <cmd>
        Command to prefix CLI calls with. Default: sudo

    --no-elevate
        Run the CLI directly, for when the check already runs as root.

    -v, --verbose
        Log what is being run to stderr. RUST_LOG is also honoured.

    -h, --help, --usage
        Print a short usage message and exit.

    --man
        Print this manual and exit.

    --version
        Print the version and license and exit with status 1.

EXIT STATUS
    0  OK        every volume set is Normal
    1  WARNING   never produced by the check itself
    2  CRITICAL  a volume set is not Normal, the CLI is missing or not
                 executable, the CLI failed, or the CLI timed out
    3  UNKNOWN   the CLI could not be run at all

EXAMPLES
    Check all controllers, allowing 30 seconds per CLI call:

        check-areca -t 30

    Check two cards with the 64 bit CLI, already running as root:

        check-areca -A /usr/local/sbin/cli64 -c 2 --no-elevate

    A matching sudoers entry for the monitoring user:

        nagios ALL=(root) NOPASSWD: /usr/local/areca/bin/cli
";

/// Check the volume sets of Areca RAID controllers.
///
/// Every volume set that is not in the 'Normal' state makes the check go
/// critical.
#[derive(StructOpt, Debug, Deserialize)]
#[structopt(
    name = "check-areca (part of areca-plugins)",
    raw(setting = "structopt::clap::AppSettings::ColoredHelp"),
    raw(global_setting = "structopt::clap::AppSettings::DisableVersion"),
    after_help = "See --man for exit statuses and examples."
)]
struct Args {
    #[structopt(
        short = "A",
        long = "arecacli",
        help = "Path to the Areca CLI",
        raw(default_value = "DEFAULT_CLI"),
        parse(from_os_str)
    )]
    arecacli: PathBuf,
    #[structopt(
        short = "c",
        long = "cards",
        help = "Number of controllers, 0 to detect them",
        default_value = "0"
    )]
    cards: u32,
    #[structopt(
        short = "t",
        long = "timeout",
        help = "Seconds to wait for each CLI call, 0 waits forever",
        default_value = "10"
    )]
    timeout: u64,
    #[structopt(
        long = "elevate",
        name = "cmd",
        help = "Command to prefix CLI calls with",
        raw(default_value = "DEFAULT_ELEVATE")
    )]
    elevate: String,
    #[structopt(long = "no-elevate", help = "Run the CLI without a prefix")]
    no_elevate: bool,
    #[structopt(short = "v", long = "verbose", help = "Log what is being run to stderr")]
    verbose: bool,

    #[structopt(long = "usage", help = "Prints help information")]
    usage: bool,
    #[structopt(long = "man", help = "Prints the full manual")]
    man: bool,
    #[structopt(long = "version", help = "Prints version and license, exits 1")]
    version: bool,
}

impl Args {
    fn invocation(&self) -> Invocation {
        let elevate = if self.no_elevate {
            None
        } else {
            Some(self.elevate.clone())
        };
        Invocation::new(self.arecacli.clone(), self.cards, self.timeout, elevate)
    }
}

#[cfg_attr(test, allow(dead_code))]
fn init_logging(verbose: bool) {
    let env = env_logger::Env::default().default_filter_or("warn");
    let mut builder = env_logger::Builder::from_env(env);
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
}

#[cfg_attr(test, allow(dead_code))]
fn print_version() {
    println!(
        "check-areca (part of areca-plugins) {}\n\
         Licensed under either of the MIT license or the Apache License, \
         Version 2.0, at your option.\n\
         This is free software, there is NO WARRANTY.",
        env!("CARGO_PKG_VERSION")
    );
}

/// Run the whole check, printing the summary or the reason it couldn't be made
#[cfg_attr(test, allow(dead_code))]
fn check(inv: &Invocation) -> Status {
    debug!("checking with {:?}", inv);
    if let Err(e) = check_cli(&inv.cli) {
        println!("{}: {}", e.status(), e);
        return e.status();
    }

    let runner = ShellRunner::from_invocation(inv);
    let lines = match collect(&runner, inv) {
        Ok(lines) => lines,
        Err(e) => {
            println!("{}: {}", e.status(), e);
            return e.status();
        }
    };

    let report = Report::from_lines(&lines);
    debug!(
        "{} volume set(s), {} abnormal",
        report.rows.len(),
        report.abnormal()
    );
    println!("{}", report);
    report.status()
}

#[cfg_attr(test, allow(dead_code))]
fn main() {
    let args = Args::from_args();
    init_logging(args.verbose);

    if args.version {
        print_version();
        process::exit(1);
    }
    if args.usage {
        if let Err(e) = Args::clap().print_long_help() {
            println!("UNKNOWN: unable to print help: {}", e);
            Status::Unknown.exit();
        }
        println!();
        Status::Ok.exit();
    }
    if args.man {
        print!("{}", MANUAL);
        Status::Ok.exit();
    }

    check(&args.invocation()).exit();
}

#[cfg(test)]
mod unit {
    use std::path::PathBuf;
    use std::time::Duration;

    use structopt::StructOpt;

    use super::{Args, DEFAULT_CLI, MANUAL};

    fn build_args(argv: Vec<&str>) -> Args {
        Args::from_iter(argv.into_iter())
    }

    #[test]
    fn defaults() {
        let args = build_args(vec!["check-areca"]);
        assert_eq!(args.arecacli, PathBuf::from(DEFAULT_CLI));
        assert_eq!(args.cards, 0);
        assert_eq!(args.timeout, 10);
        assert!(!args.version && !args.man && !args.usage);

        let inv = args.invocation();
        assert_eq!(inv.timeout, Some(Duration::from_secs(10)));
        assert_eq!(inv.elevate, Some("sudo".to_owned()));
    }

    #[test]
    fn short_flags() {
        let args = build_args(vec!["check-areca", "-A", "/opt/cli64", "-c", "2", "-t", "30"]);
        assert_eq!(args.arecacli, PathBuf::from("/opt/cli64"));
        assert_eq!(args.cards, 2);
        assert_eq!(args.timeout, 30);
    }

    #[test]
    fn long_flags() {
        let args = build_args(vec![
            "check-areca",
            "--arecacli=/opt/cli64",
            "--cards=1",
            "--timeout=0",
            "--no-elevate",
        ]);
        let inv = args.invocation();
        assert_eq!(inv.command("main"), "/opt/cli64 main");
        assert_eq!(inv.cards, 1);
        assert_eq!(inv.timeout, None);
    }

    #[test]
    fn custom_elevation() {
        let args = build_args(vec!["check-areca", "--elevate", "doas"]);
        assert_eq!(
            args.invocation().command("main"),
            format!("doas {} main", DEFAULT_CLI)
        );
    }

    #[test]
    fn informational_flags() {
        let args = build_args(vec!["check-areca", "--version"]);
        assert!(args.version);
        let args = build_args(vec!["check-areca", "--man", "--usage"]);
        assert!(args.man && args.usage);
    }

    #[test]
    fn manual_documents_every_option() {
        for flag in &[
            "--arecacli",
            "--cards",
            "--timeout",
            "--elevate",
            "--no-elevate",
            "--usage",
            "--man",
            "--version",
        ] {
            assert!(MANUAL.contains(flag), "manual is missing {}", flag);
        }
    }
}
