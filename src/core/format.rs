//! User-facing reply rendering

use crate::core::reports::{MonthlyReport, WeeklyReport};
use crate::infrastructure::entities::{DraftEntry, TimeEntry};
use chrono::NaiveDate;

pub fn help() -> String {
    "Hi! I turn plain-language descriptions of your workday into time-tracking records.\n\n\
     Commands:\n\
     /record_today — record today's activities\n\
     /record_other_day — record a past day\n\
     /retrieve_by_date — show records for a date\n\
     /weekly_view — weekly summary\n\
     /monthly_report [MM/YYYY] — monthly report data\n\
     /delete_entry — delete a record\n\
     /cancel — cancel the current operation\n\n\
     Or just describe your day and I'll record it for today."
        .to_string()
}

fn total_hours(hours: impl Iterator<Item = f64>) -> f64 {
    let hundredths: i64 = hours.map(|h| (h * 100.0).round() as i64).sum();
    hundredths as f64 / 100.0
}

/// Numbered draft list shown while awaiting confirmation.
pub fn drafts_for_review(drafts: &[DraftEntry], date: NaiveDate) -> String {
    let mut lines = vec![format!("Here is what I extracted for {date}:"), String::new()];

    for (i, draft) in drafts.iter().enumerate() {
        lines.push(format!("{}. {} — {}", i + 1, draft.project, draft.description));
        lines.push(format!(
            "   {}h — {}",
            draft.estimated_hours,
            draft.category.label()
        ));
    }

    lines.push(String::new());
    lines.push(format!(
        "Total: {} hours",
        total_hours(drafts.iter().map(|d| d.estimated_hours))
    ));
    lines.push(String::new());
    lines.push(
        "Reply \"yes\" to save, \"edit\" to correct an entry, or /cancel to discard.".to_string(),
    );
    lines.join("\n")
}

/// Success message once a confirmation batch is persisted.
pub fn recorded_summary(drafts: &[DraftEntry], date: NaiveDate) -> String {
    format!(
        "✅ Recorded {} activit{} for {date}, {} hours total.",
        drafts.len(),
        if drafts.len() == 1 { "y" } else { "ies" },
        total_hours(drafts.iter().map(|d| d.estimated_hours))
    )
}

/// Numbered listing of stored entries for one date.
pub fn entries_list(entries: &[TimeEntry], date: NaiveDate) -> String {
    if entries.is_empty() {
        return format!("No records for {date}.");
    }

    let mut lines = vec![format!("Records for {date} ({}):", entries.len()), String::new()];

    for (i, entry) in entries.iter().enumerate() {
        lines.push(format!("{}. {} — {}", i + 1, entry.project, entry.description));
        lines.push(format!(
            "   {}h — {} [{}]",
            entry.estimated_hours,
            entry.category.label(),
            &entry.id.to_string()[..8]
        ));
    }

    lines.push(String::new());
    lines.push(format!(
        "Total: {} hours",
        total_hours(entries.iter().map(|e| e.estimated_hours))
    ));
    lines.join("\n")
}

pub fn weekly_text(report: &WeeklyReport) -> String {
    let mut lines = vec![
        format!(
            "Weekly summary {} to {}",
            report.week_start, report.week_end
        ),
        String::new(),
    ];

    for bucket in &report.buckets {
        lines.push(format!("{} — {}h", bucket.category.label(), bucket.hours));
        for row in &bucket.rows {
            lines.push(format!(
                "   {} {}: {} ({}h)",
                row.date, row.project, row.description, row.hours
            ));
        }
    }

    lines.push(String::new());
    lines.push(format!("Total: {} hours", report.total_hours));
    lines.join("\n")
}

pub fn monthly_text(report: &MonthlyReport) -> String {
    if report.rows.is_empty() {
        return format!("No records for {:02}/{}.", report.month, report.year);
    }

    let mut lines = vec![format!(
        "Report data for {:02}/{}: {} records, {} hours total.",
        report.month,
        report.year,
        report.rows.len(),
        report.total_hours
    )];

    for subtotal in &report.subtotals {
        lines.push(format!("   {}: {}h", subtotal.category.label(), subtotal.hours));
    }

    lines.push(String::new());
    lines.push(format!(
        "The spreadsheet is rendered from /reports/monthly?year={}&month={}.",
        report.year, report.month
    ));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::entities::Category;

    #[test]
    fn test_drafts_for_review_lists_every_draft() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let drafts = vec![
            DraftEntry {
                date,
                description: "Sprint planning".to_string(),
                project: "Alpha".to_string(),
                category: Category::BillableProject,
                estimated_hours: 2.0,
                original_text: "planning 2h".to_string(),
            },
            DraftEntry {
                date,
                description: "Daily standup".to_string(),
                project: "internal".to_string(),
                category: Category::OtherNonBillable,
                estimated_hours: 0.5,
                original_text: "planning 2h".to_string(),
            },
        ];

        let text = drafts_for_review(&drafts, date);
        assert!(text.contains("1. Alpha — Sprint planning"));
        assert!(text.contains("2. internal — Daily standup"));
        assert!(text.contains("Total: 2.5 hours"));
    }

    #[test]
    fn test_entries_list_empty() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(entries_list(&[], date), "No records for 2026-03-02.");
    }
}
