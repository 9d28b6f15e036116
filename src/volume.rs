//! Parse the volume set table printed by `cli vsf info`
//!
//! The table looks like this:
//!
//! ```plain
//!   # Name             Raid Name       Level   Capacity Ch/Id/Lun  State
//! ===============================================================================
//!   1 ARC-1220-VOL#00  Raid Set # 00   Raid5   1000.0GB 00/00/00   Normal
//! ===============================================================================
//! GuiErrMsg<0x00>: Success.
//! ```
//!
//! Only rows containing a whitespace-bounded number are data rows. Fields are
//! picked by position because names may contain spaces.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use crate::Status;

lazy_static! {
    // Broader than the classic single digit `\s\d\s` filter on purpose, so
    // that volume numbers of 10 and up still count as data rows
    static ref DATA_ROW: Regex = Regex::new(r"\s\d+\s").unwrap();
}

// Column offsets as laid out by the Areca CLI. These have shifted between CLI
// versions before, check them against `cli vsf info` before changing
// anything. Offsets from the end count back from the last token.
const NUMBER_INDEX: usize = 0;
const LEVEL_FROM_END: usize = 4;
const CAPACITY_FROM_END: usize = 3;
const STATE_FROM_END: usize = 1;

/// One volume set, as reported by the vendor CLI
#[derive(Clone, Debug, PartialEq)]
pub struct VolumeRow {
    pub number: String,
    pub level: String,
    pub capacity: String,
    pub state: String,
}

impl VolumeRow {
    /// Pick the fields out of `line`, if it is a data row
    ///
    /// Fields missing because the row is too short come back empty.
    pub fn parse(line: &str) -> Option<VolumeRow> {
        if !DATA_ROW.is_match(line) {
            return None;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let from_end = |n: usize| -> String {
            tokens
                .len()
                .checked_sub(n)
                .and_then(|i| tokens.get(i))
                .map(|t| (*t).to_owned())
                .unwrap_or_default()
        };
        Some(VolumeRow {
            number: tokens
                .get(NUMBER_INDEX)
                .map(|t| (*t).to_owned())
                .unwrap_or_default(),
            level: from_end(LEVEL_FROM_END),
            capacity: from_end(CAPACITY_FROM_END),
            state: from_end(STATE_FROM_END),
        })
    }

    pub fn is_normal(&self) -> bool {
        self.state.eq_ignore_ascii_case("normal")
    }
}

impl fmt::Display for VolumeRow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "|Controller number: {} RAID level: {} Capacity: {} State: {}| ",
            self.number, self.level, self.capacity, self.state
        )
    }
}

/// Every volume set seen across all controllers
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Report {
    pub rows: Vec<VolumeRow>,
}

impl Report {
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Report {
        Report {
            rows: lines
                .iter()
                .filter_map(|line| VolumeRow::parse(line.as_ref()))
                .collect(),
        }
    }

    /// How many volume sets are in a state other than normal
    pub fn abnormal(&self) -> usize {
        self.rows.iter().filter(|row| !row.is_normal()).count()
    }

    /// Critical if any volume set is not normal
    ///
    /// There is no warning level, every abnormal state is critical.
    pub fn status(&self) -> Status {
        if self.abnormal() > 0 {
            Status::Critical
        } else {
            Status::Ok
        }
    }
}

/// All rows concatenated on one line
impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in &self.rows {
            write!(f, "{}", row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{Report, VolumeRow};
    use crate::Status;

    const HEALTHY: &str = "\
  # Name             Raid Name       Level   Capacity Ch/Id/Lun  State
===============================================================================
  1 ARC-1220-VOL#00  Raid Set # 00   Raid5   1000.0GB 00/00/00   Normal
  2 ARC-1220-VOL#01  Raid Set # 01   Raid1   500.0GB  00/00/01   NORMAL
===============================================================================
GuiErrMsg<0x00>: Success.";

    const DEGRADED: &str = "\
  # Name             Raid Name       Level   Capacity Ch/Id/Lun  State
===============================================================================
  1 ARC-1220-VOL#00  Raid Set # 00   Raid5   1000.0GB 00/00/00   Normal
  2 ARC-1220-VOL#01  Raid Set # 01   Raid6   2000.0GB 00/00/01   Degraded
===============================================================================
GuiErrMsg<0x00>: Success.";

    fn lines(s: &str) -> Vec<&str> {
        s.lines().collect()
    }

    #[test]
    fn picks_fields_by_position() {
        let row = VolumeRow::parse("  1 ARC-1220-VOL#00  Raid Set # 00   Raid5   1000.0GB 00/00/00   Normal")
            .unwrap();
        assert_eq!(
            row,
            VolumeRow {
                number: "1".to_owned(),
                level: "Raid5".to_owned(),
                capacity: "1000.0GB".to_owned(),
                state: "Normal".to_owned(),
            }
        );
        assert!(row.is_normal());
    }

    #[test]
    fn positional_rule_applies_to_short_rows() {
        let row = VolumeRow::parse("1   Raid Set # 000   1   2.5TB   Normal").unwrap();
        assert_eq!(row.number, "1");
        assert_eq!(row.level, "000");
        assert_eq!(row.capacity, "1");
        assert_eq!(row.state, "Normal");
        let report = Report::from_lines(&["1   Raid Set # 000   1   2.5TB   Normal"]);
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.abnormal(), 0);
    }

    #[test]
    fn headers_and_banners_are_skipped() {
        for line in &lines(HEALTHY)[..2] {
            assert_eq!(VolumeRow::parse(line), None);
        }
        assert_eq!(VolumeRow::parse("GuiErrMsg<0x00>: Success."), None);
        assert_eq!(VolumeRow::parse(""), None);
    }

    #[test]
    fn multi_digit_volume_numbers_are_rows() {
        let row = VolumeRow::parse(" 12 ARC-1880-VOL#11  Raid Set # 11   Raid1   500.0GB  00/01/03   Normal")
            .unwrap();
        assert_eq!(row.number, "12");
        assert_eq!(row.level, "Raid1");
    }

    #[test]
    fn too_short_rows_get_empty_fields() {
        let row = VolumeRow::parse(" 1 x").unwrap();
        assert_eq!(row.number, "1");
        assert_eq!(row.level, "");
        assert_eq!(row.capacity, "");
        assert_eq!(row.state, "x");
        assert!(!row.is_normal());
    }

    #[test]
    fn all_normal_is_ok() {
        let report = Report::from_lines(&lines(HEALTHY));
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.abnormal(), 0);
        assert_eq!(report.status(), Status::Ok);
        assert_eq!(
            report.to_string(),
            "|Controller number: 1 RAID level: Raid5 Capacity: 1000.0GB State: Normal| \
             |Controller number: 2 RAID level: Raid1 Capacity: 500.0GB State: NORMAL| "
        );
    }

    #[test]
    fn degraded_is_critical() {
        let report = Report::from_lines(&lines(DEGRADED));
        assert_eq!(report.abnormal(), 1);
        assert_eq!(report.status(), Status::Critical);
        assert!(report.to_string().contains(
            "|Controller number: 2 RAID level: Raid6 Capacity: 2000.0GB State: Degraded| "
        ));
    }

    #[test]
    fn parsing_is_repeatable() {
        let input = lines(DEGRADED);
        let first = Report::from_lines(&input);
        let second = Report::from_lines(&input);
        assert_eq!(first, second);
        assert_eq!(first.status(), second.status());
    }

    #[test]
    fn empty_input_is_ok() {
        let report = Report::from_lines::<&str>(&[]);
        assert_eq!(report.abnormal(), 0);
        assert_eq!(report.status(), Status::Ok);
        assert_eq!(report.to_string(), "");
    }
}
