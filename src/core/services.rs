//! Implementations for the service the app needs.
//!
//! `MyTimeTrackingService` is the per-user session state machine: it routes
//! every inbound event by the session's current state, drives the record /
//! retrieve / delete flows, and owns the confirmation step that turns drafts
//! into persisted entries.

use crate::core::dates;
use crate::core::extractor::{self, ExtractionError};
use crate::core::format;
use crate::core::locks::UserLocks;
use crate::core::reports::{self, MonthlyReport, WeeklyReport};
use crate::core::traits::{EntryExtractor, TimeTrackingService};
use crate::infrastructure::entities::{
    Category, DateIntent, DraftEntry, PendingData, SessionState, TimeEntry, UserSession,
};
use crate::infrastructure::traits::{RecordRepository, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use di::{Ref, inject, injectable};
use log::{error, info, warn};
use std::env;

/// Recognised top-level commands of the chat surface.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    RecordToday,
    RecordOtherDay,
    RetrieveByDate,
    WeeklyView,
    MonthlyReport(Option<String>),
    DeleteEntry,
    Cancel,
    Unknown(String),
}

impl Command {
    /// Parse a leading slash-command. Returns `None` for plain text.
    pub fn parse(text: &str) -> Option<Command> {
        let rest = text.trim().strip_prefix('/')?;
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        let command = match name.to_ascii_lowercase().as_str() {
            "start" | "help" => Command::Start,
            "record_today" => Command::RecordToday,
            "record_other_day" => Command::RecordOtherDay,
            "retrieve_by_date" => Command::RetrieveByDate,
            "weekly_view" => Command::WeeklyView,
            "monthly_report" => Command::MonthlyReport(if arg.is_empty() {
                None
            } else {
                Some(arg.to_owned())
            }),
            "delete_entry" => Command::DeleteEntry,
            "cancel" => Command::Cancel,
            other => Command::Unknown(other.to_owned()),
        };
        Some(command)
    }
}

fn is_confirm(text: &str) -> bool {
    matches!(
        text.trim().to_ascii_lowercase().as_str(),
        "yes" | "y" | "confirm" | "ok" | "save"
    )
}

fn is_reject(text: &str) -> bool {
    matches!(text.trim().to_ascii_lowercase().as_str(), "no" | "n" | "edit")
}

fn store_failure_reply(error: &StoreError) -> String {
    match error {
        StoreError::NotFound => "No matching record.".to_string(),
        StoreError::WriteFailed(_) | StoreError::Unavailable(_) => {
            "⚠️ Storage is temporarily unavailable. Nothing was lost — please try again in a moment."
                .to_string()
        }
    }
}

fn extraction_error_reply(error: &ExtractionError) -> String {
    match error {
        ExtractionError::InvalidSchema(_) => {
            "I could not parse activities from that. Please describe your day again, e.g. \
             \"planning meeting 2h, code review for Alpha 1.5h\"."
                .to_string()
        }
        ExtractionError::EmptyResult => {
            "I found no activities in that text. Please describe what you did, e.g. \
             \"planning meeting 2h\"."
                .to_string()
        }
        ExtractionError::UnknownCategory(category) => format!(
            "The category \"{category}\" is not one I know. Please describe the activity as \
             billable project work, non-billable project work, or other non-billable time."
        ),
        ExtractionError::InvalidHours(hours) => format!(
            "The hours value \"{hours}\" is not usable — each activity needs more than 0 and at \
             most 24 hours. Please describe your day again."
        ),
        ExtractionError::ModelFailure(_) => {
            "I could not reach the language model. Please send your description again.".to_string()
        }
    }
}

/// Apply one `<number> <field> <value>` correction to the draft list.
fn apply_edit(drafts: &mut [DraftEntry], text: &str) -> Result<(), String> {
    const USAGE: &str =
        "Send: <number> <field> <new value>, where field is project, category, hours or \
         description. Example: 1 hours 3.5";

    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() < 3 {
        return Err(USAGE.to_string());
    }

    let index: usize = tokens[0].parse().map_err(|_| USAGE.to_string())?;
    if index == 0 || index > drafts.len() {
        return Err(format!("Pick an entry between 1 and {}.", drafts.len()));
    }

    let value = tokens[2..].join(" ");
    let draft = &mut drafts[index - 1];
    match tokens[1].to_ascii_lowercase().as_str() {
        "hours" => {
            draft.estimated_hours = extractor::validate_hours(&value).map_err(|_| {
                format!("\"{value}\" is not a valid hours value (more than 0, at most 24).")
            })?;
        }
        "category" => {
            draft.category = Category::from_loose(&value).ok_or_else(|| {
                "Category must be billableProject, nonBillableProject or otherNonBillable."
                    .to_string()
            })?;
        }
        "project" => draft.project = value,
        "description" => draft.description = value,
        _ => return Err("Field must be project, category, hours or description.".to_string()),
    }
    Ok(())
}

pub struct MyTimeTrackingService {
    repo: Ref<dyn RecordRepository>,
    extractor: Ref<dyn EntryExtractor>,
    locks: Ref<UserLocks>,
    timezone: Tz,
}

#[injectable(TimeTrackingService)]
impl MyTimeTrackingService {
    #[inject]
    pub fn create(
        repo: Ref<dyn RecordRepository>,
        extractor: Ref<dyn EntryExtractor>,
        locks: Ref<UserLocks>,
    ) -> MyTimeTrackingService {
        dotenvy::dotenv().ok();
        let timezone = env::var("TIMEZONE")
            .ok()
            .and_then(|tz| tz.parse().ok())
            .unwrap_or(chrono_tz::America::Bogota);

        MyTimeTrackingService::with_timezone(repo, extractor, locks, timezone)
    }
}

impl MyTimeTrackingService {
    pub fn with_timezone(
        repo: Ref<dyn RecordRepository>,
        extractor: Ref<dyn EntryExtractor>,
        locks: Ref<UserLocks>,
        timezone: Tz,
    ) -> MyTimeTrackingService {
        MyTimeTrackingService {
            repo,
            extractor,
            locks,
            timezone,
        }
    }

    fn today(&self, received_at: DateTime<Utc>) -> NaiveDate {
        received_at.with_timezone(&self.timezone).date_naive()
    }

    /// The session claims a flow but its collected data is gone. Reset rather
    /// than guessing; the user starts the flow over.
    fn lost_flow(&self, session: &mut UserSession) -> String {
        error!(
            "session for user {} was in {:?} without matching pending data",
            session.user_id, session.state
        );
        session.reset();
        "Sorry, I lost track of that operation. Please start it again.".to_string()
    }

    async fn handle_command(
        &self,
        session: &mut UserSession,
        command: Command,
        today: NaiveDate,
    ) -> String {
        if let Command::Unknown(name) = &command {
            return format!("Unknown command /{name}. Send /help for the list of commands.");
        }
        if command == Command::Cancel {
            let had_flow = session.state != SessionState::Idle;
            session.reset();
            return if had_flow {
                "Operation cancelled.".to_string()
            } else {
                "Nothing to cancel.".to_string()
            };
        }

        // A new top-level command mid-flow discards the stale flow, with a
        // warning so the user knows their collected data is gone.
        let mut warning = "";
        if session.state != SessionState::Idle {
            warn!(
                "user {} sent {:?} mid-flow; discarding pending data",
                session.user_id, command
            );
            session.reset();
            warning = "⚠️ Your previous operation was discarded.\n\n";
        }

        let reply = match command {
            Command::Start => format::help(),
            Command::RecordToday => {
                session.transition(
                    SessionState::AwaitingFreeText,
                    Some(PendingData::RecordDraft {
                        target_date: today,
                        drafts: Vec::new(),
                    }),
                );
                format!("What did you do today ({today})? Describe your activities in plain language.")
            }
            Command::RecordOtherDay => {
                session.transition(
                    SessionState::AwaitingDateChoice,
                    Some(PendingData::DateRequest {
                        intent: DateIntent::Record,
                    }),
                );
                "Which date do you want to record? Send YYYY-MM-DD, DD/MM/YYYY or DD-MM-YYYY."
                    .to_string()
            }
            Command::RetrieveByDate => {
                session.transition(
                    SessionState::AwaitingDateChoice,
                    Some(PendingData::DateRequest {
                        intent: DateIntent::Retrieve,
                    }),
                );
                "Which date do you want to look at? Send YYYY-MM-DD, DD/MM/YYYY or DD-MM-YYYY."
                    .to_string()
            }
            Command::WeeklyView => {
                let start = dates::week_start(today);
                match self
                    .repo
                    .find_by_user_and_date_range(session.user_id, start, dates::week_end(start))
                    .await
                {
                    Ok(entries) => format::weekly_text(&reports::weekly_summary(&entries, start)),
                    Err(e) => store_failure_reply(&e),
                }
            }
            Command::MonthlyReport(arg) => {
                let (year, month) = match arg {
                    None => (today.year(), today.month()),
                    Some(raw) => match dates::parse_month(&raw) {
                        Some(month) => month,
                        None => {
                            return format!(
                                "{warning}Invalid month. Send MM/YYYY, e.g. 02/2026."
                            );
                        }
                    },
                };
                match dates::month_bounds(year, month) {
                    Some((start, end)) => match self
                        .repo
                        .find_by_user_and_date_range(session.user_id, start, end)
                        .await
                    {
                        Ok(entries) => {
                            format::monthly_text(&reports::monthly_report(&entries, year, month))
                        }
                        Err(e) => store_failure_reply(&e),
                    },
                    None => "Invalid month. Send MM/YYYY, e.g. 02/2026.".to_string(),
                }
            }
            Command::DeleteEntry => {
                session.transition(
                    SessionState::AwaitingDateChoice,
                    Some(PendingData::DateRequest {
                        intent: DateIntent::Delete,
                    }),
                );
                "From which date do you want to delete a record? Send YYYY-MM-DD, DD/MM/YYYY or \
                 DD-MM-YYYY."
                    .to_string()
            }
            Command::Cancel | Command::Unknown(_) => unreachable!("handled above"),
        };

        format!("{warning}{reply}")
    }

    async fn handle_text(
        &self,
        session: &mut UserSession,
        text: &str,
        today: NaiveDate,
    ) -> String {
        if text.is_empty() {
            return "Please send some text.".to_string();
        }

        match session.state {
            SessionState::Idle => {
                // A stray confirmation after a completed flow must not start
                // an extraction of the word "yes".
                if is_confirm(text) {
                    return "Nothing to confirm.".to_string();
                }
                // Free text outside a flow is an implicit record-today.
                self.run_extraction(session, text, today).await
            }
            SessionState::AwaitingDateChoice => self.handle_date_choice(session, text, today).await,
            SessionState::AwaitingFreeText => {
                let Some(PendingData::RecordDraft { target_date, .. }) = session.pending().cloned()
                else {
                    return self.lost_flow(session);
                };
                self.run_extraction(session, text, target_date).await
            }
            SessionState::AwaitingConfirmation => self.handle_confirmation(session, text).await,
            SessionState::AwaitingEditSelection => self.handle_edit(session, text),
            SessionState::AwaitingDeleteTarget => self.handle_delete_choice(session, text).await,
        }
    }

    async fn run_extraction(
        &self,
        session: &mut UserSession,
        text: &str,
        target_date: NaiveDate,
    ) -> String {
        match self.extractor.extract(text, target_date).await {
            Ok(drafts) => {
                let reply = format::drafts_for_review(&drafts, target_date);
                session.transition(
                    SessionState::AwaitingConfirmation,
                    Some(PendingData::RecordDraft {
                        target_date,
                        drafts,
                    }),
                );
                reply
            }
            Err(e) => {
                // Recoverable: wait for a corrected description of the same day.
                session.transition(
                    SessionState::AwaitingFreeText,
                    Some(PendingData::RecordDraft {
                        target_date,
                        drafts: Vec::new(),
                    }),
                );
                extraction_error_reply(&e)
            }
        }
    }

    async fn handle_date_choice(
        &self,
        session: &mut UserSession,
        text: &str,
        today: NaiveDate,
    ) -> String {
        let Some(PendingData::DateRequest { intent }) = session.pending().cloned() else {
            return self.lost_flow(session);
        };

        let Some(date) = dates::parse_date(text) else {
            return "Invalid date. Use YYYY-MM-DD, DD/MM/YYYY or DD-MM-YYYY, or /cancel."
                .to_string();
        };

        match intent {
            DateIntent::Record => {
                if date > today {
                    return format!(
                        "{date} is in the future — you can only record days up to today. Send \
                         another date or /cancel."
                    );
                }
                session.transition(
                    SessionState::AwaitingFreeText,
                    Some(PendingData::RecordDraft {
                        target_date: date,
                        drafts: Vec::new(),
                    }),
                );
                format!("Recording for {date}. What did you do that day?")
            }
            DateIntent::Retrieve => {
                match self.repo.find_by_user_and_date(session.user_id, date).await {
                    Ok(entries) => {
                        session.reset();
                        format::entries_list(&entries, date)
                    }
                    Err(e) => store_failure_reply(&e),
                }
            }
            DateIntent::Delete => {
                match self.repo.find_by_user_and_date(session.user_id, date).await {
                    Ok(entries) if entries.is_empty() => {
                        session.reset();
                        format!("No records for {date}.")
                    }
                    Ok(entries) => {
                        let listing = format::entries_list(&entries, date);
                        let candidates = entries.iter().map(|e| e.id).collect();
                        session.transition(
                            SessionState::AwaitingDeleteTarget,
                            Some(PendingData::DeleteChoice { date, candidates }),
                        );
                        format!("{listing}\n\nSend the number of the record to delete, or /cancel.")
                    }
                    Err(e) => store_failure_reply(&e),
                }
            }
        }
    }

    async fn handle_confirmation(&self, session: &mut UserSession, text: &str) -> String {
        let Some(PendingData::RecordDraft {
            target_date,
            drafts,
        }) = session.pending().cloned()
        else {
            return self.lost_flow(session);
        };

        if is_confirm(text) {
            let now = Utc::now();
            let entries: Vec<TimeEntry> = drafts
                .iter()
                .cloned()
                .map(|draft| draft.into_entry(session.user_id, now))
                .collect();

            match self.repo.save_entries(&entries).await {
                Ok(()) => {
                    info!(
                        "saved {} entries for user {} on {}",
                        entries.len(),
                        session.user_id,
                        target_date
                    );
                    session.reset();
                    format::recorded_summary(&drafts, target_date)
                }
                Err(e) => {
                    // Drafts stay pending; the user retries the confirmation
                    // without re-describing their day.
                    warn!("save failed for user {}: {e}", session.user_id);
                    store_failure_reply(&e)
                }
            }
        } else if is_reject(text) {
            session.transition(
                SessionState::AwaitingEditSelection,
                Some(PendingData::RecordDraft {
                    target_date,
                    drafts,
                }),
            );
            "Which entry should I correct? Send: <number> <field> <new value>, where field is \
             project, category, hours or description. Example: 1 hours 3.5"
                .to_string()
        } else {
            "Please reply \"yes\" to save, \"edit\" to correct an entry, or /cancel to discard."
                .to_string()
        }
    }

    fn handle_edit(&self, session: &mut UserSession, text: &str) -> String {
        let Some(PendingData::RecordDraft {
            target_date,
            mut drafts,
        }) = session.pending().cloned()
        else {
            return self.lost_flow(session);
        };

        match apply_edit(&mut drafts, text) {
            Ok(()) => {
                let reply = format!(
                    "Updated.\n\n{}",
                    format::drafts_for_review(&drafts, target_date)
                );
                session.transition(
                    SessionState::AwaitingConfirmation,
                    Some(PendingData::RecordDraft {
                        target_date,
                        drafts,
                    }),
                );
                reply
            }
            Err(message) => message,
        }
    }

    async fn handle_delete_choice(&self, session: &mut UserSession, text: &str) -> String {
        let Some(PendingData::DeleteChoice { date, candidates }) = session.pending().cloned()
        else {
            return self.lost_flow(session);
        };

        let selection: usize = match text.trim().parse() {
            Ok(n) => n,
            Err(_) => {
                return "Send just the number of the record to delete, or /cancel.".to_string();
            }
        };
        if selection == 0 || selection > candidates.len() {
            return format!("Pick a number between 1 and {}, or /cancel.", candidates.len());
        }

        match self
            .repo
            .delete_entry(candidates[selection - 1], session.user_id)
            .await
        {
            Ok(()) => {
                session.reset();
                format!("Deleted record {selection} from {date}.")
            }
            Err(StoreError::NotFound) => {
                session.reset();
                "That record no longer exists.".to_string()
            }
            Err(e) => store_failure_reply(&e),
        }
    }
}

#[async_trait]
impl TimeTrackingService for MyTimeTrackingService {
    async fn handle_message(
        &self,
        user_id: i64,
        text: &str,
        received_at: DateTime<Utc>,
    ) -> Result<String, StoreError> {
        let _guard = self.locks.acquire(user_id).await;

        let mut session = self.repo.get_session(user_id).await?;
        let today = self.today(received_at);
        let text = text.trim();

        let reply = match Command::parse(text) {
            Some(command) => self.handle_command(&mut session, command, today).await,
            None => self.handle_text(&mut session, text, today).await,
        };

        self.repo.save_session(&session).await?;
        Ok(reply)
    }

    async fn weekly_summary(
        &self,
        user_id: i64,
        week_start: Option<NaiveDate>,
    ) -> Result<WeeklyReport, StoreError> {
        let start = dates::week_start(week_start.unwrap_or_else(|| self.today(Utc::now())));
        let entries = self
            .repo
            .find_by_user_and_date_range(user_id, start, dates::week_end(start))
            .await?;
        Ok(reports::weekly_summary(&entries, start))
    }

    async fn monthly_report(
        &self,
        user_id: i64,
        year: i32,
        month: u32,
    ) -> Result<MonthlyReport, StoreError> {
        let Some((start, end)) = dates::month_bounds(year, month) else {
            return Ok(reports::monthly_report(&[], year, month));
        };
        let entries = self
            .repo
            .find_by_user_and_date_range(user_id, start, end)
            .await?;
        Ok(reports::monthly_report(&entries, year, month))
    }
}
