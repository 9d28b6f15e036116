//! The vendor CLI commands this check issues
//!
//! Two commands are used:
//!
//! * `cli main`, whose summary lists one `Controller#NN(...)` line per card
//! * `cli vsf info ctrl=N`, the volume set table for one card

use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;

use crate::config::Invocation;
use crate::runner::{Execute, RunError};

lazy_static! {
    static ref CONTROLLER: Regex = Regex::new(r"Controller#\d+\(").unwrap();
}

/// Count the controller lines in the output of `cli main`
pub fn count_controller_lines<S: AsRef<str>>(lines: &[S]) -> u32 {
    lines
        .iter()
        .filter(|line| CONTROLLER.is_match(line.as_ref()))
        .count() as u32
}

/// Ask the vendor CLI how many controllers are installed
pub fn count_controllers<E: Execute>(runner: &E, inv: &Invocation) -> Result<u32, RunError> {
    let lines = runner.run(&inv.command("main"))?;
    let count = count_controller_lines(&lines);
    debug!("detected {} controller(s)", count);
    Ok(count)
}

/// Raw volume set table for controller `index`
pub fn query_controller<E: Execute>(
    runner: &E,
    inv: &Invocation,
    index: u32,
) -> Result<Vec<String>, RunError> {
    runner.run(&inv.command(&format!("vsf info ctrl={}", index)))
}

/// The volume set tables of every controller, one after another
///
/// Controllers are numbered from 1, the way the vendor CLI numbers them. If
/// `inv.cards` is zero the count comes from [`count_controllers`].
pub fn collect<E: Execute>(runner: &E, inv: &Invocation) -> Result<Vec<String>, RunError> {
    let cards = if inv.cards == 0 {
        count_controllers(runner, inv)?
    } else {
        inv.cards
    };
    if cards == 0 {
        warn!("no controllers found by {}", inv.command("main"));
    }

    let mut lines = Vec::new();
    for index in 1..=cards {
        lines.extend(query_controller(runner, inv, index)?);
    }
    Ok(lines)
}
