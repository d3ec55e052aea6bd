use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
pub enum AttendanceStatus {
    #[serde(rename = "Present")]
    #[strum(serialize = "Present")]
    Present,

    #[serde(rename = "Late Check-in")]
    #[strum(serialize = "Late Check-in")]
    LateCheckIn,

    #[serde(rename = "Late Check-out")]
    #[strum(serialize = "Late Check-out")]
    LateCheckOut,

    #[serde(rename = "Late Check-in & Late Check-out")]
    #[strum(serialize = "Late Check-in & Late Check-out")]
    LateCheckInAndOut,

    #[serde(rename = "Low Work Hours")]
    #[strum(serialize = "Low Work Hours")]
    LowWorkHours,

    #[serde(rename = "Absent")]
    #[strum(serialize = "Absent")]
    Absent,

    #[serde(rename = "Leave")]
    #[strum(serialize = "Leave")]
    Leave,
}

/// Daily work window the statuses are measured against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkPolicy {
    pub work_start: NaiveTime,
    pub work_end: NaiveTime,
    pub min_work_hours: f64,
}

impl Default for WorkPolicy {
    fn default() -> Self {
        Self {
            work_start: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or_default(),
            work_end: NaiveTime::from_hms_opt(18, 30, 0).unwrap_or_default(),
            min_work_hours: 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckOutOutcome {
    pub status: AttendanceStatus,
    pub work_hours: f64,
}

/// Facts a check-out rule is evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct CheckOutFacts {
    pub prior: AttendanceStatus,
    pub work_hours: f64,
    pub min_work_hours: f64,
    pub late_out: bool,
}

pub struct CheckOutRule {
    pub name: &'static str,
    pub applies: fn(&CheckOutFacts) -> bool,
    pub status: fn(&CheckOutFacts) -> AttendanceStatus,
}

/// Check-out rules in precedence order; the first match wins and a
/// session that matches none keeps its check-in status.
pub const CHECK_OUT_RULES: [CheckOutRule; 3] = [
    CheckOutRule {
        name: "low_work_hours",
        applies: is_low_hours,
        status: low_work_hours,
    },
    CheckOutRule {
        name: "late_check_in_and_out",
        applies: is_late_in_and_out,
        status: late_in_and_out,
    },
    CheckOutRule {
        name: "late_check_out",
        applies: is_late_out,
        status: late_out,
    },
];

fn is_low_hours(facts: &CheckOutFacts) -> bool {
    facts.work_hours < facts.min_work_hours
}

fn is_late_in_and_out(facts: &CheckOutFacts) -> bool {
    facts.late_out && facts.prior == AttendanceStatus::LateCheckIn
}

fn is_late_out(facts: &CheckOutFacts) -> bool {
    facts.late_out
}

fn low_work_hours(_: &CheckOutFacts) -> AttendanceStatus {
    AttendanceStatus::LowWorkHours
}

fn late_in_and_out(_: &CheckOutFacts) -> AttendanceStatus {
    AttendanceStatus::LateCheckInAndOut
}

fn late_out(_: &CheckOutFacts) -> AttendanceStatus {
    AttendanceStatus::LateCheckOut
}

impl WorkPolicy {
    pub fn derive_check_in_status(&self, now: NaiveDateTime) -> AttendanceStatus {
        let work_start = now.date().and_time(self.work_start);

        if now > work_start {
            AttendanceStatus::LateCheckIn
        } else {
            AttendanceStatus::Present
        }
    }

    pub fn derive_check_out_status(
        &self,
        punch_in: NaiveDateTime,
        punch_out: NaiveDateTime,
        prior: AttendanceStatus,
    ) -> CheckOutOutcome {
        let work_hours = work_hours_between(punch_in, punch_out);
        let work_end = punch_out.date().and_time(self.work_end);

        let facts = CheckOutFacts {
            prior,
            work_hours,
            min_work_hours: self.min_work_hours,
            late_out: punch_out > work_end,
        };

        let status = CHECK_OUT_RULES
            .iter()
            .find(|rule| (rule.applies)(&facts))
            .map(|rule| {
                tracing::debug!(rule = rule.name, "check-out rule matched");
                (rule.status)(&facts)
            })
            .unwrap_or(prior);

        CheckOutOutcome { status, work_hours }
    }
}

/// Elapsed hours rounded to two decimals.
pub fn work_hours_between(punch_in: NaiveDateTime, punch_out: NaiveDateTime) -> f64 {
    let millis = (punch_out - punch_in).num_milliseconds() as f64;
    let hours = millis / 3_600_000.0;
    (hours * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn check_in_at_or_before_start_is_present() {
        let policy = WorkPolicy::default();
        assert_eq!(policy.derive_check_in_status(at(9, 0)), AttendanceStatus::Present);
        assert_eq!(policy.derive_check_in_status(at(9, 30)), AttendanceStatus::Present);
    }

    #[test]
    fn check_in_after_start_is_late() {
        let policy = WorkPolicy::default();
        assert_eq!(
            policy.derive_check_in_status(at(9, 45)),
            AttendanceStatus::LateCheckIn
        );
        let one_second_late = at(9, 30) + chrono::Duration::seconds(1);
        assert_eq!(
            policy.derive_check_in_status(one_second_late),
            AttendanceStatus::LateCheckIn
        );
    }

    #[test]
    fn late_check_out_after_on_time_check_in() {
        let outcome = WorkPolicy::default().derive_check_out_status(
            at(9, 0),
            at(18, 45),
            AttendanceStatus::Present,
        );
        assert_eq!(outcome.work_hours, 9.75);
        assert_eq!(outcome.status, AttendanceStatus::LateCheckOut);
    }

    #[test]
    fn late_in_and_late_out_combine() {
        let outcome = WorkPolicy::default().derive_check_out_status(
            at(9, 45),
            at(19, 0),
            AttendanceStatus::LateCheckIn,
        );
        assert_eq!(outcome.status, AttendanceStatus::LateCheckInAndOut);
        assert_eq!(outcome.work_hours, 9.25);
    }

    #[test]
    fn on_time_check_out_keeps_prior_status() {
        let policy = WorkPolicy::default();
        let present = policy.derive_check_out_status(at(9, 0), at(18, 30), AttendanceStatus::Present);
        assert_eq!(present.status, AttendanceStatus::Present);

        let late = policy.derive_check_out_status(at(9, 40), at(18, 0), AttendanceStatus::LateCheckIn);
        assert_eq!(late.status, AttendanceStatus::LateCheckIn);
    }

    #[test]
    fn short_day_is_low_work_hours() {
        let outcome = WorkPolicy::default().derive_check_out_status(
            at(9, 0),
            at(13, 0),
            AttendanceStatus::Present,
        );
        assert_eq!(outcome.work_hours, 4.0);
        assert_eq!(outcome.status, AttendanceStatus::LowWorkHours);
    }

    #[test]
    fn low_work_hours_overrides_lateness() {
        let policy = WorkPolicy::default();
        for prior in [AttendanceStatus::Present, AttendanceStatus::LateCheckIn] {
            let outcome = policy.derive_check_out_status(at(15, 0), at(19, 30), prior);
            assert!(outcome.work_hours < 5.0);
            assert_eq!(outcome.status, AttendanceStatus::LowWorkHours);
        }
    }

    #[test]
    fn work_hours_round_to_two_decimals() {
        let punch_in = at(9, 0);
        let punch_out = punch_in + chrono::Duration::seconds(5 * 3600 + 20);
        assert_eq!(work_hours_between(punch_in, punch_out), 5.01);
        assert_eq!(work_hours_between(punch_in, punch_in), 0.0);
    }

    #[test]
    fn rules_are_ordered_low_hours_first() {
        let names: Vec<_> = CHECK_OUT_RULES.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            ["low_work_hours", "late_check_in_and_out", "late_check_out"]
        );
    }

    #[test]
    fn status_labels_round_trip_through_strings() {
        for status in AttendanceStatus::iter() {
            let label = status.to_string();
            assert_eq!(AttendanceStatus::from_str(&label).unwrap(), status);
            assert_eq!(status.as_ref(), label);
        }
        assert_eq!(
            serde_json::to_string(&AttendanceStatus::LateCheckInAndOut).unwrap(),
            "\"Late Check-in & Late Check-out\""
        );
    }
}
