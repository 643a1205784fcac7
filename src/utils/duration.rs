use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

/// Elapsed-time breakdown between a student's study start and end dates.
/// Never stored; recomputed from the two dates on every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudyDuration {
    pub total_days: i64,
    pub years: i64,
    pub months: i64,
    pub days: i64,
    pub formatted: String,
}

/// Decomposes the whole-day difference into years (365-day), months (30-day)
/// and leftover days.
pub fn study_duration(start: NaiveDate, end: NaiveDate) -> StudyDuration {
    let total_days = (end - start).num_days();
    let years = total_days / 365;
    let months = (total_days % 365) / 30;
    let days = (total_days % 365) % 30;

    StudyDuration {
        total_days,
        years,
        months,
        days,
        formatted: format_duration(years, months, days),
    }
}

fn format_duration(years: i64, months: i64, days: i64) -> String {
    let mut parts = Vec::new();
    if years > 0 {
        parts.push(format!("{} year{}", years, plural(years)));
    }
    if months > 0 {
        parts.push(format!("{} month{}", months, plural(months)));
    }
    if days > 0 {
        parts.push(format!("{} day{}", days, plural(days)));
    }

    if parts.is_empty() {
        "0 days".to_string()
    } else {
        parts.join(", ")
    }
}

fn plural(n: i64) -> &'static str {
    if n == 1 { "" } else { "s" }
}
