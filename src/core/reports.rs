//! Weekly and monthly aggregation over stored entries.
//!
//! All sums run in integer hundredths of an hour, so per-category subtotals
//! always add up exactly to the grand total.

use crate::core::dates;
use crate::infrastructure::entities::{Category, TimeEntry};
use chrono::NaiveDate;
use serde::Serialize;

fn hundredths(hours: f64) -> i64 {
    (hours * 100.0).round() as i64
}

fn hours(hundredths: i64) -> f64 {
    hundredths as f64 / 100.0
}

/// One entry as it appears in report output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub date: NaiveDate,
    pub project: String,
    pub category: Category,
    pub description: String,
    pub hours: f64,
}

impl From<&TimeEntry> for ReportRow {
    fn from(entry: &TimeEntry) -> Self {
        ReportRow {
            date: entry.date,
            project: entry.project.clone(),
            category: entry.category,
            description: entry.description.clone(),
            hours: entry.estimated_hours,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category: Category,
    pub hours: f64,
}

/// Entries of one category within the week, date-ordered.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBucket {
    pub category: Category,
    pub hours: f64,
    pub rows: Vec<ReportRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyReport {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub buckets: Vec<CategoryBucket>,
    pub total_hours: f64,
}

impl Default for WeeklyReport {
    fn default() -> Self {
        weekly_summary(&[], NaiveDate::default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReport {
    pub year: i32,
    pub month: u32,
    pub rows: Vec<ReportRow>,
    pub subtotals: Vec<CategoryTotal>,
    pub total_hours: f64,
}

impl Default for MonthlyReport {
    fn default() -> Self {
        monthly_report(&[], 0, 0)
    }
}

/// Group the week `[week_start, week_start + 6]` by category, in enumeration
/// order, summing hours per category and overall. Entries outside the window
/// are ignored.
pub fn weekly_summary(entries: &[TimeEntry], week_start: NaiveDate) -> WeeklyReport {
    let week_end = dates::week_end(week_start);
    let mut total = 0i64;

    let buckets = Category::ALL
        .iter()
        .map(|&category| {
            let mut rows: Vec<ReportRow> = entries
                .iter()
                .filter(|e| {
                    e.category == category && e.date >= week_start && e.date <= week_end
                })
                .map(ReportRow::from)
                .collect();
            // Stable sort keeps creation order within a date.
            rows.sort_by_key(|row| row.date);

            let subtotal: i64 = rows.iter().map(|row| hundredths(row.hours)).sum();
            total += subtotal;
            CategoryBucket {
                category,
                hours: hours(subtotal),
                rows,
            }
        })
        .collect();

    WeeklyReport {
        week_start,
        week_end,
        buckets,
        total_hours: hours(total),
    }
}

/// One row per entry in the month, in the order the store returned them
/// (date ascending, then creation order), with per-category subtotals and the
/// grand total the encoding collaborator relies on.
pub fn monthly_report(entries: &[TimeEntry], year: i32, month: u32) -> MonthlyReport {
    let rows: Vec<ReportRow> = entries.iter().map(ReportRow::from).collect();

    let subtotals: Vec<CategoryTotal> = Category::ALL
        .iter()
        .map(|&category| {
            let subtotal: i64 = rows
                .iter()
                .filter(|row| row.category == category)
                .map(|row| hundredths(row.hours))
                .sum();
            CategoryTotal {
                category,
                hours: hours(subtotal),
            }
        })
        .collect();

    let total: i64 = rows.iter().map(|row| hundredths(row.hours)).sum();

    MonthlyReport {
        year,
        month,
        rows,
        subtotals,
        total_hours: hours(total),
    }
}
