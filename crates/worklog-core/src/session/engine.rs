//! The conversation state machine.
//!
//! One inbound event at a time: the engine loads the user's session,
//! applies the transition and persists the outcome before handing
//! back what to render. Events that are not legal for the current
//! state re-render the current screen and mutate nothing, so the
//! machine is total over (state, event).

use indoc::formatdoc;

use crate::clock::{Clock, SystemClock, Timestamp};
use crate::error::Result;
use crate::events::{Action, Button, CsvExport, EventKind, InboundEvent, Reply};
use crate::log::LogEntry;
use crate::profile::{ProfileDefaults, UserProfile};
use crate::report;
use crate::storage::{Database, LogEffect};
use crate::timefmt::{format_duration, format_stamp, format_stamp_full};

use super::{Session, SessionState, Timer};

/// Filename suggested for the export document.
const EXPORT_FILENAME: &str = "export.csv";

/// Inbound event decoded against the action vocabulary.
enum Input {
    /// The explicit restart command.
    Restart,
    /// A recognized button token.
    Act(Action),
    /// A free-text reply.
    Text(String),
    /// Unknown command or unknown token.
    Noise,
}

/// One applied transition, ready to persist.
struct Turn {
    profile: UserProfile,
    session: Session,
    effect: LogEffect,
    reply: Reply,
}

/// Drives one user's conversation over the backing store.
///
/// The engine caches nothing between events: every call re-reads the
/// authoritative session, so one engine per worker over a shared store
/// is fine as long as events for the same user arrive serialized.
pub struct SessionEngine<C = SystemClock> {
    db: Database,
    defaults: ProfileDefaults,
    clock: C,
}

impl SessionEngine<SystemClock> {
    /// Engine over the system clock.
    pub fn new(db: Database, defaults: ProfileDefaults) -> Self {
        Self::with_clock(db, defaults, SystemClock)
    }
}

impl<C: Clock> SessionEngine<C> {
    pub fn with_clock(db: Database, defaults: ProfileDefaults, clock: C) -> Self {
        Self { db, defaults, clock }
    }

    /// The backing store.
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Apply one inbound event and persist the outcome atomically.
    pub fn handle(&mut self, event: &InboundEvent) -> Result<Reply> {
        let profile = self.db.get_or_create(&event.user_id, &self.defaults)?;
        let mut session = self.db.load_session(&event.user_id)?;
        if session.normalize() {
            tracing::warn!("repaired inconsistent session for user {}", event.user_id);
        }

        let now = self.clock.now();
        let turn = self.apply(profile, session, decode(event), now)?;
        self.db.save_turn(&turn.profile, &turn.session, &turn.effect)?;
        Ok(turn.reply)
    }

    /// Render the current screen without applying any transition.
    pub fn snapshot(&self, user_id: &str) -> Result<Reply> {
        let profile = self.db.get_or_create(user_id, &self.defaults)?;
        let mut session = self.db.load_session(user_id)?;
        session.normalize();
        self.render_current(&profile, &session, self.clock.now())
    }

    /// Export rows for all of the user's entries, header row first.
    pub fn export(&self, user_id: &str) -> Result<CsvExport> {
        let profile = self.db.get_or_create(user_id, &self.defaults)?;
        let entries = self.db.list_logs(user_id)?;
        Ok(CsvExport {
            filename: EXPORT_FILENAME.to_string(),
            rows: report::export_rows(&entries, profile.timezone),
        })
    }

    fn apply(
        &self,
        mut profile: UserProfile,
        mut session: Session,
        input: Input,
        now: Timestamp,
    ) -> Result<Turn> {
        let mut effect = LogEffect::None;

        let reply = match (session.state, input) {
            // The restart command escapes every state. An in-flight
            // recording is dropped, not finalized: only an explicit
            // stop produces a log entry.
            (_, Input::Restart) => {
                if !session.timer.is_idle() {
                    tracing::warn!(
                        "restart discarded an in-flight recording for user {}",
                        profile.user_id
                    );
                }
                session = Session::default();
                render_welcome()
            }

            (SessionState::Idle, Input::Act(Action::Record)) => {
                session.state = SessionState::ProjectChooser;
                render_chooser(&profile)
            }
            (SessionState::Idle, Input::Act(Action::ViewLogs)) => {
                session.state = SessionState::LogMenu;
                render_summary(&self.db.list_logs(&profile.user_id)?)
            }
            (SessionState::Idle, Input::Act(Action::OpenSettings)) => {
                session.state = SessionState::SettingsMenu;
                render_settings(&profile)
            }

            (SessionState::ProjectChooser, Input::Act(Action::Select(name))) => {
                if profile.has_project(&name) {
                    tracing::info!("timer started for user {} on {}", profile.user_id, name);
                    session.timer = Timer::start(&name, now);
                    session.state = SessionState::TimerRunning;
                    render_started(&name, now, profile.timezone)
                } else {
                    render_chooser(&profile)
                }
            }
            (SessionState::ProjectChooser, Input::Act(Action::Back)) => {
                session.state = SessionState::Idle;
                render_welcome()
            }

            (SessionState::TimerRunning, Input::Act(Action::Pause)) => {
                session.timer = std::mem::take(&mut session.timer).pause(now);
                session.state = SessionState::TimerPaused;
                render_paused(&session.timer, profile.timezone)
            }
            (SessionState::TimerRunning, Input::Act(Action::Stop)) => {
                match std::mem::take(&mut session.timer).finish(now) {
                    Some(entry) => {
                        tracing::info!(
                            "log entry recorded for user {}: {} {}s",
                            profile.user_id,
                            entry.project,
                            entry.duration()
                        );
                        session.state = SessionState::Idle;
                        let reply = render_stopped(&entry, profile.timezone);
                        effect = LogEffect::Append(entry);
                        reply
                    }
                    None => {
                        session.state = SessionState::Idle;
                        render_welcome()
                    }
                }
            }

            (SessionState::TimerPaused, Input::Act(Action::Resume)) => {
                session.timer = std::mem::take(&mut session.timer).resume(now);
                session.state = SessionState::TimerRunning;
                render_resumed(&session.timer, profile.timezone)
            }

            (SessionState::LogMenu, Input::Act(Action::ListLogs)) => {
                render_listing(&self.db.list_logs(&profile.user_id)?, profile.timezone)
            }
            (SessionState::LogMenu, Input::Act(Action::ExportLogs)) => {
                render_export(&self.db.list_logs(&profile.user_id)?, profile.timezone)
            }
            (SessionState::LogMenu, Input::Act(Action::ResetLogs)) => {
                tracing::info!("logs cleared for user {}", profile.user_id);
                effect = LogEffect::Clear;
                session = Session::default();
                render_cleared()
            }
            (SessionState::LogMenu, Input::Act(Action::Back)) => {
                session.state = SessionState::Idle;
                render_welcome()
            }

            (SessionState::SettingsMenu, Input::Act(Action::AddProject)) => {
                session.state = SessionState::AwaitingNewProjectName;
                render_add_prompt()
            }
            (SessionState::SettingsMenu, Input::Act(Action::RemoveProject)) => {
                session.state = SessionState::AwaitingProjectToRemove;
                render_remove_chooser(&profile)
            }
            (SessionState::SettingsMenu, Input::Act(Action::SetTimezone)) => {
                session.state = SessionState::AwaitingTimezoneInput;
                render_timezone_prompt(profile.timezone)
            }
            (SessionState::SettingsMenu, Input::Act(Action::Back)) => {
                session.state = SessionState::Idle;
                render_welcome()
            }

            (SessionState::AwaitingNewProjectName, Input::Text(name)) => {
                // Names are stored exactly as typed; only an empty reply re-prompts.
                if name.is_empty() {
                    render_add_prompt()
                } else {
                    if profile.add_project(&name) {
                        tracing::info!("project added for user {}: {}", profile.user_id, name);
                    }
                    session.state = SessionState::Idle;
                    render_welcome()
                }
            }

            (SessionState::AwaitingProjectToRemove, Input::Act(Action::Select(name))) => {
                if profile.remove_project(&name) {
                    tracing::info!("project removed for user {}: {}", profile.user_id, name);
                    session.state = SessionState::Idle;
                    render_welcome()
                } else {
                    render_remove_chooser(&profile)
                }
            }

            (SessionState::AwaitingTimezoneInput, Input::Text(value)) => {
                match value.trim().parse::<i64>() {
                    Ok(offset) => {
                        profile.timezone = offset;
                        session.state = SessionState::Idle;
                        render_welcome()
                    }
                    Err(_) => render_timezone_prompt(profile.timezone),
                }
            }

            // Everything else is illegal for the current state:
            // re-render the screen, mutate nothing.
            _ => self.render_current(&profile, &session, now)?,
        };

        Ok(Turn { profile, session, effect, reply })
    }

    /// The screen for the session as it stands.
    fn render_current(
        &self,
        profile: &UserProfile,
        session: &Session,
        now: Timestamp,
    ) -> Result<Reply> {
        Ok(match session.state {
            SessionState::Idle => render_welcome(),
            SessionState::ProjectChooser => render_chooser(profile),
            SessionState::TimerRunning => render_running(&session.timer, profile.timezone, now),
            SessionState::TimerPaused => render_paused(&session.timer, profile.timezone),
            SessionState::LogMenu => render_summary(&self.db.list_logs(&profile.user_id)?),
            SessionState::SettingsMenu => render_settings(profile),
            SessionState::AwaitingNewProjectName => render_add_prompt(),
            SessionState::AwaitingProjectToRemove => render_remove_chooser(profile),
            SessionState::AwaitingTimezoneInput => render_timezone_prompt(profile.timezone),
        })
    }
}

fn decode(event: &InboundEvent) -> Input {
    let payload = event.payload.as_deref().unwrap_or("");
    match event.kind {
        EventKind::Command => {
            if payload.trim_start_matches('/') == "start" {
                Input::Restart
            } else {
                Input::Noise
            }
        }
        EventKind::Button => match Action::parse(payload) {
            Some(action) => Input::Act(action),
            None => Input::Noise,
        },
        EventKind::Text => Input::Text(payload.to_string()),
    }
}

// ── Screens ──────────────────────────────────────────────────────

fn idle_actions() -> Vec<Button> {
    vec![
        Button::new("⏺ Record", &Action::Record),
        Button::new("📊 Logs", &Action::ViewLogs),
        Button::new("⚙️", &Action::OpenSettings),
    ]
}

fn timer_actions() -> Vec<Button> {
    vec![
        Button::new("⏸", &Action::Pause),
        Button::new("⏹", &Action::Stop),
    ]
}

fn log_menu_actions() -> Vec<Button> {
    vec![
        Button::new("List all logs", &Action::ListLogs),
        Button::new("Export as CSV", &Action::ExportLogs),
        Button::new("🗑 Reset", &Action::ResetLogs),
        Button::new("↩ Back", &Action::Back),
    ]
}

fn render_welcome() -> Reply {
    Reply::with_actions("Welcome to Time Tracker", idle_actions())
}

fn render_chooser(profile: &UserProfile) -> Reply {
    let mut actions: Vec<Button> = profile
        .projects
        .iter()
        .map(|name| Button::new(name, &Action::Select(name.clone())))
        .collect();
    actions.push(Button::new("↩ Back", &Action::Back));
    Reply::with_actions("Select project to track", actions)
}

fn render_started(project: &str, started_at: Timestamp, tz: i64) -> Reply {
    let text = formatdoc! {"
        Timer started
        📝 project: {project}
        📅 start: {start}",
        start = format_stamp_full(started_at, tz),
    };
    Reply::with_actions(text, timer_actions())
}

fn render_running(timer: &Timer, tz: i64, now: Timestamp) -> Reply {
    match timer {
        Timer::Running { project, started_at, .. } => {
            let text = formatdoc! {"
                Recording
                📝 project: {project}
                📅 start: {start}
                🕓 duration: {duration}",
                start = format_stamp_full(*started_at, tz),
                duration = format_duration(timer.elapsed(now)),
            };
            Reply::with_actions(text, timer_actions())
        }
        _ => render_welcome(),
    }
}

fn render_paused(timer: &Timer, tz: i64) -> Reply {
    match timer {
        Timer::Paused { project, started_at, paused_at, .. } => {
            let text = formatdoc! {"
                Timer paused:
                📝 project: {project}
                📅 start: {start}
                📅 paused: {paused}",
                start = format_stamp(*started_at, tz),
                paused = format_stamp(*paused_at, tz),
            };
            Reply::with_actions(text, vec![Button::new("⏯", &Action::Resume)])
        }
        _ => render_welcome(),
    }
}

fn render_resumed(timer: &Timer, tz: i64) -> Reply {
    match timer {
        Timer::Running { project, started_at, pause_accum } => {
            let text = formatdoc! {"
                Timer resumed:
                📝 project: {project}
                📅 start: {start}
                🕓 pause: {pause}",
                start = format_stamp(*started_at, tz),
                pause = format_duration(*pause_accum),
            };
            Reply::with_actions(text, timer_actions())
        }
        _ => render_welcome(),
    }
}

fn render_stopped(entry: &LogEntry, tz: i64) -> Reply {
    let text = formatdoc! {"
        Timer stopped. Log created:
        📝 project: {project}
        📅 start: {start}
        📅 stop: {stop}
        🕓 pause: {pause}
        🕓 duration: {duration}",
        project = entry.project,
        start = format_stamp(entry.start, tz),
        stop = format_stamp(entry.stop, tz),
        pause = format_duration(entry.pause_total),
        duration = format_duration(entry.duration()),
    };
    Reply::with_actions(text, idle_actions())
}

fn render_summary(entries: &[LogEntry]) -> Reply {
    Reply::with_actions(report::summary_text(entries), log_menu_actions())
}

fn render_listing(entries: &[LogEntry], tz: i64) -> Reply {
    Reply::with_actions(report::listing_text(entries, tz), log_menu_actions())
}

fn render_export(entries: &[LogEntry], tz: i64) -> Reply {
    let mut reply = Reply::with_actions(
        format!("Export ready: {} entries.", entries.len()),
        log_menu_actions(),
    );
    reply.attachment = Some(CsvExport {
        filename: EXPORT_FILENAME.to_string(),
        rows: report::export_rows(entries, tz),
    });
    reply
}

fn render_cleared() -> Reply {
    Reply::with_actions("User Logs were cleared", idle_actions())
}

fn render_settings(profile: &UserProfile) -> Reply {
    let mut names: Vec<&str> = profile.projects.iter().map(String::as_str).collect();
    names.sort_unstable();
    let mut text = format!(
        "Settings:\n{}\nTimezone: {:+} GMT\nProjects:",
        "-".repeat(60),
        profile.timezone
    );
    for name in names {
        text.push_str("\n  ");
        text.push_str(name);
    }
    let actions = vec![
        Button::new("Add Project", &Action::AddProject),
        Button::new("Remove Project", &Action::RemoveProject),
        Button::new("Timezone", &Action::SetTimezone),
        Button::new("↩ Back", &Action::Back),
    ];
    Reply::with_actions(text, actions)
}

fn render_add_prompt() -> Reply {
    Reply::message("Please type a name of your new project")
}

fn render_remove_chooser(profile: &UserProfile) -> Reply {
    let mut names: Vec<&String> = profile.projects.iter().collect();
    names.sort_unstable();
    let actions = names
        .into_iter()
        .map(|name| Button::new(name, &Action::Select(name.clone())))
        .collect();
    Reply::with_actions(
        "Choose a project to delete from database (entries will be preserved)",
        actions,
    )
}

fn render_timezone_prompt(tz: i64) -> Reply {
    Reply::message(format!(
        "Current timezone: {tz:+} GMT.\n\nPlease enter new timezone (set 0 for UTC)"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn engine_at(now: i64) -> (SessionEngine<ManualClock>, ManualClock) {
        let clock = ManualClock::new(now);
        let db = Database::open_memory().unwrap();
        let engine = SessionEngine::with_clock(db, ProfileDefaults::default(), clock.clone());
        (engine, clock)
    }

    #[test]
    fn illegal_events_rerender_without_mutation() {
        let (mut engine, _clock) = engine_at(0);
        let reply = engine.handle(&InboundEvent::button("u1", "pause")).unwrap();
        assert_eq!(reply.text, "Welcome to Time Tracker");
        assert_eq!(engine.db().load_session("u1").unwrap(), Session::default());
    }

    #[test]
    fn unknown_button_tokens_are_noise() {
        let (mut engine, _clock) = engine_at(0);
        engine.handle(&InboundEvent::button("u1", "record")).unwrap();
        let reply = engine.handle(&InboundEvent::button("u1", "logs:purge")).unwrap();
        assert_eq!(reply.text, "Select project to track");
        let session = engine.db().load_session("u1").unwrap();
        assert_eq!(session.state, SessionState::ProjectChooser);
    }

    #[test]
    fn restart_discards_an_inflight_recording() {
        let (mut engine, clock) = engine_at(1000);
        engine.handle(&InboundEvent::command("u1", "/start")).unwrap();
        engine.handle(&InboundEvent::button("u1", "record")).unwrap();
        engine.handle(&InboundEvent::button("u1", "pick:Work")).unwrap();
        clock.advance(60);
        engine.handle(&InboundEvent::command("u1", "/start")).unwrap();

        assert_eq!(engine.db().load_session("u1").unwrap(), Session::default());
        assert!(engine.db().list_logs("u1").unwrap().is_empty());
    }

    #[test]
    fn free_text_is_ignored_outside_text_prompts() {
        let (mut engine, _clock) = engine_at(0);
        let reply = engine.handle(&InboundEvent::text("u1", "hello there")).unwrap();
        assert_eq!(reply.text, "Welcome to Time Tracker");
        assert_eq!(engine.db().load_session("u1").unwrap(), Session::default());
    }

    #[test]
    fn snapshot_does_not_mutate() {
        let (engine, _clock) = engine_at(0);
        let reply = engine.snapshot("u1").unwrap();
        assert_eq!(reply.text, "Welcome to Time Tracker");
        assert_eq!(engine.db().load_session("u1").unwrap(), Session::default());
    }
}
