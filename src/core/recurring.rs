//! Recurring income rollover.
//!
//! Pure calendar math over income rows: the caller supplies "today" so the
//! whole evaluation is deterministic and testable. Persistence of the
//! outcomes (and any per-occurrence bookkeeping) stays with the caller.

use std::str::FromStr;

use chrono::{Days, Months, NaiveDate};
use serde::Serialize;
use thiserror::Error;

use crate::database::models::Income;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// A frequency value outside the four known periods. This is a
/// data-integrity error: the row must be skipped and reported, never
/// silently defaulted to some period.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown frequency '{0}'")]
pub struct UnknownFrequency(pub String);

impl FromStr for Frequency {
    type Err = UnknownFrequency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(UnknownFrequency(other.to_string())),
        }
    }
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

/// Adds exactly one period. Monthly and yearly steps clamp to the last
/// valid day when the target month is shorter (Jan 31 -> Feb 28/29).
/// The checked ops only fail near chrono's year limit; clamping to
/// `NaiveDate::MAX` there keeps `advance(d, f) > d`.
pub fn advance(date: NaiveDate, frequency: Frequency) -> NaiveDate {
    match frequency {
        Frequency::Daily => date.checked_add_days(Days::new(1)),
        Frequency::Weekly => date.checked_add_days(Days::new(7)),
        Frequency::Monthly => date.checked_add_months(Months::new(1)),
        Frequency::Yearly => date.checked_add_months(Months::new(12)),
    }
    .unwrap_or(NaiveDate::MAX)
}

/// The date on which a recurring row's next occurrence should be
/// recognised: the anchor `start_date` until the first rollover, then one
/// period past the last one applied.
pub fn next_due(row: &Income) -> Result<NaiveDate, UnknownFrequency> {
    let frequency = row
        .frequency
        .as_deref()
        .ok_or_else(|| UnknownFrequency(String::new()))?
        .parse::<Frequency>()?;

    Ok(match row.last_processed {
        Some(last) => advance(last, frequency),
        None => row.start_date,
    })
}

/// Evaluator verdict for one recurring row.
#[derive(Debug, Clone, Serialize)]
pub struct RolloverOutcome {
    pub income_id: i64,
    pub owner: String,
    pub name: String,
    pub due: bool,
    /// `today` when due, otherwise the row's previous value.
    pub last_processed: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationIssue {
    pub income_id: i64,
    pub reason: String,
}

#[derive(Debug, Default, Serialize)]
pub struct EvaluationReport {
    pub outcomes: Vec<RolloverOutcome>,
    pub issues: Vec<EvaluationIssue>,
}

impl EvaluationReport {
    pub fn due(&self) -> impl Iterator<Item = &RolloverOutcome> {
        self.outcomes.iter().filter(|o| o.due)
    }
}

/// Runs the rollover decision over a set of income rows.
///
/// Rows are independent of each other, so the pass is a single sequential
/// scan. Non-recurring rows are never due and produce no outcome. Rows
/// whose stored type or frequency does not parse are skipped and reported
/// in `issues`.
///
/// Idempotence: a due row's outcome carries `last_processed = today`; once
/// that is persisted, `advance(today, f) > today` makes the row not-due for
/// the rest of the day, so a second invocation on the same date is a no-op.
pub fn evaluate(today: NaiveDate, rows: &[Income]) -> EvaluationReport {
    let mut report = EvaluationReport::default();

    for row in rows {
        match row.income_type.as_str() {
            "recurring" => {}
            "non-recurring" => continue,
            other => {
                report.issues.push(EvaluationIssue {
                    income_id: row.income_id,
                    reason: format!("unknown income type '{other}'"),
                });
                continue;
            }
        }

        let due_on = match next_due(row) {
            Ok(date) => date,
            Err(err) => {
                report.issues.push(EvaluationIssue {
                    income_id: row.income_id,
                    reason: err.to_string(),
                });
                continue;
            }
        };

        let due = today >= due_on;
        report.outcomes.push(RolloverOutcome {
            income_id: row.income_id,
            owner: row.owner.clone(),
            name: row.name.clone(),
            due,
            last_processed: if due { Some(today) } else { row.last_processed },
        });
    }

    report
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn income(id: i64, frequency: Option<&str>, start: NaiveDate, last: Option<NaiveDate>) -> Income {
        Income {
            income_id: id,
            name: format!("income-{id}"),
            amount: Decimal::new(100, 0),
            income_type: "recurring".into(),
            frequency: frequency.map(str::to_string),
            start_date: start,
            end_date: None,
            last_processed: last,
            owner: "user@example.com".into(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn first_due_date_is_the_start_date() {
        let row = income(1, Some("monthly"), date(2024, 3, 15), None);
        assert_eq!(next_due(&row).unwrap(), date(2024, 3, 15));
    }

    #[test]
    fn advance_steps_one_period() {
        let d = date(2024, 3, 15);
        assert_eq!(advance(d, Frequency::Daily), date(2024, 3, 16));
        assert_eq!(advance(d, Frequency::Weekly), date(2024, 3, 22));
        assert_eq!(advance(d, Frequency::Monthly), date(2024, 4, 15));
        assert_eq!(advance(d, Frequency::Yearly), date(2025, 3, 15));
    }

    #[test]
    fn monthly_advance_clamps_to_short_months() {
        assert_eq!(advance(date(2023, 1, 31), Frequency::Monthly), date(2023, 2, 28));
        assert_eq!(advance(date(2024, 1, 31), Frequency::Monthly), date(2024, 2, 29));
        assert_eq!(advance(date(2024, 10, 31), Frequency::Monthly), date(2024, 11, 30));
    }

    #[test]
    fn yearly_advance_clamps_leap_day() {
        assert_eq!(advance(date(2024, 2, 29), Frequency::Yearly), date(2025, 2, 28));
    }

    #[test]
    fn row_past_its_due_date_rolls_over_to_today() {
        let today = date(2024, 4, 20);
        let row = income(1, Some("monthly"), date(2024, 1, 1), Some(date(2024, 3, 15)));
        let report = evaluate(today, &[row]);

        assert_eq!(report.outcomes.len(), 1);
        assert!(report.outcomes[0].due);
        assert_eq!(report.outcomes[0].last_processed, Some(today));
        assert!(report.issues.is_empty());
    }

    #[test]
    fn row_before_its_due_date_is_untouched() {
        let today = date(2024, 4, 10);
        let last = date(2024, 3, 15);
        let row = income(1, Some("monthly"), date(2024, 1, 1), Some(last));
        let report = evaluate(today, &[row]);

        assert!(!report.outcomes[0].due);
        assert_eq!(report.outcomes[0].last_processed, Some(last));
    }

    #[test]
    fn second_run_on_the_same_day_is_a_no_op() {
        let today = date(2024, 4, 20);
        let mut row = income(1, Some("daily"), date(2024, 1, 1), Some(date(2024, 4, 19)));

        let first = evaluate(today, std::slice::from_ref(&row));
        assert!(first.outcomes[0].due);
        row.last_processed = first.outcomes[0].last_processed;

        let second = evaluate(today, &[row]);
        assert!(!second.outcomes[0].due);
        assert_eq!(second.outcomes[0].last_processed, Some(today));
    }

    #[test]
    fn malformed_frequency_is_skipped_and_reported() {
        let today = date(2024, 4, 20);
        let bad = income(7, Some("fortnightly"), date(2024, 1, 1), None);
        let good = income(8, Some("daily"), date(2024, 1, 1), None);
        let report = evaluate(today, &[bad, good]);

        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].income_id, 8);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].income_id, 7);
        assert!(report.issues[0].reason.contains("fortnightly"));
    }

    #[test]
    fn non_recurring_rows_are_never_due() {
        let today = date(2024, 4, 20);
        let mut row = income(1, None, date(2024, 1, 1), None);
        row.income_type = "non-recurring".into();
        row.end_date = Some(date(2024, 2, 1));

        let report = evaluate(today, &[row]);
        assert!(report.outcomes.is_empty());
        assert!(report.issues.is_empty());
    }
}
