//! Per-user conversation state.
//!
//! A [`Session`] is everything mutable about one user's conversation:
//! which screen they are on and the in-flight timer, if any. A paused
//! timer carries its pause timestamp in the variant itself, so a
//! paused recording without one is unrepresentable.

mod engine;

pub use engine::SessionEngine;

use crate::clock::Timestamp;
use crate::log::LogEntry;

/// Which screen the conversation is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    ProjectChooser,
    TimerRunning,
    TimerPaused,
    LogMenu,
    SettingsMenu,
    AwaitingNewProjectName,
    AwaitingProjectToRemove,
    AwaitingTimezoneInput,
}

/// In-flight timer for one user.
///
/// `pause_accum` only ever changes on resume, when the closed pause
/// interval is folded in. While paused, the open interval lives in
/// `paused_at` alone.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Timer {
    #[default]
    Idle,
    Running {
        project: String,
        started_at: Timestamp,
        pause_accum: i64,
    },
    Paused {
        project: String,
        started_at: Timestamp,
        pause_accum: i64,
        paused_at: Timestamp,
    },
}

impl Timer {
    /// Fresh running timer for `project`.
    pub fn start(project: &str, now: Timestamp) -> Self {
        Timer::Running {
            project: project.to_string(),
            started_at: now,
            pause_accum: 0,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Timer::Idle)
    }

    /// Running to Paused, stamping the pause start. Other shapes pass
    /// through unchanged.
    pub fn pause(self, now: Timestamp) -> Self {
        match self {
            Timer::Running { project, started_at, pause_accum } => Timer::Paused {
                project,
                started_at,
                pause_accum,
                paused_at: now,
            },
            other => other,
        }
    }

    /// Paused to Running, folding the open pause into the accumulator.
    pub fn resume(self, now: Timestamp) -> Self {
        match self {
            Timer::Paused { project, started_at, pause_accum, paused_at } => Timer::Running {
                project,
                started_at,
                pause_accum: pause_accum + (now - paused_at).max(0),
            },
            other => other,
        }
    }

    /// Finalize a running timer into a log entry. A paused timer must
    /// be resumed first; anything but Running yields `None`.
    pub fn finish(self, now: Timestamp) -> Option<LogEntry> {
        match self {
            Timer::Running { project, started_at, pause_accum } => {
                Some(LogEntry::new(&project, started_at, now, pause_accum))
            }
            _ => None,
        }
    }

    /// Net recorded seconds so far, were the timer stopped at `now`.
    /// Frozen while paused.
    pub fn elapsed(&self, now: Timestamp) -> i64 {
        match self {
            Timer::Idle => 0,
            Timer::Running { started_at, pause_accum, .. } => {
                (now - started_at - pause_accum).max(0)
            }
            Timer::Paused { started_at, pause_accum, paused_at, .. } => {
                (paused_at - started_at - pause_accum).max(0)
            }
        }
    }

    /// Paused seconds so far, counting an open pause up to `now`.
    pub fn pause_so_far(&self, now: Timestamp) -> i64 {
        match self {
            Timer::Idle => 0,
            Timer::Running { pause_accum, .. } => *pause_accum,
            Timer::Paused { pause_accum, paused_at, .. } => {
                pause_accum + (now - paused_at).max(0)
            }
        }
    }
}

/// The complete mutable session for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub state: SessionState,
    pub timer: Timer,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            state: SessionState::Idle,
            timer: Timer::Idle,
        }
    }
}

impl Session {
    /// Restore the state/timer correspondence if a stored session has
    /// drifted (manual edits, version skew). Returns true if the
    /// session was reset.
    pub fn normalize(&mut self) -> bool {
        let consistent = match (self.state, &self.timer) {
            (SessionState::TimerRunning, Timer::Running { .. }) => true,
            (SessionState::TimerPaused, Timer::Paused { .. }) => true,
            (SessionState::TimerRunning | SessionState::TimerPaused, _) => false,
            (_, Timer::Idle) => true,
            _ => false,
        };
        if !consistent {
            *self = Session::default();
        }
        !consistent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pause_intervals_add_up() {
        let timer = Timer::start("Work", 1000)
            .pause(1100)
            .resume(1130)
            .pause(1200)
            .resume(1245);
        assert_eq!(timer.pause_so_far(1245), 75);
        assert_eq!(timer.elapsed(1300), 225);
    }

    #[test]
    fn elapsed_freezes_while_paused() {
        let timer = Timer::start("Work", 1000).pause(1100);
        assert_eq!(timer.elapsed(1100), 100);
        assert_eq!(timer.elapsed(9999), 100);
        assert_eq!(timer.pause_so_far(1160), 60);
    }

    #[test]
    fn pause_and_resume_ignore_wrong_shapes() {
        assert_eq!(Timer::Idle.pause(10), Timer::Idle);
        assert_eq!(Timer::Idle.resume(10), Timer::Idle);
        let running = Timer::start("Work", 0);
        assert_eq!(running.clone().resume(10), running);
        let paused = Timer::start("Work", 0).pause(5);
        assert_eq!(paused.clone().pause(10), paused);
    }

    #[test]
    fn finish_only_works_from_running() {
        let entry = Timer::start("Work", 1000).finish(1300).unwrap();
        assert_eq!(entry.duration(), 300);
        assert!(Timer::Idle.finish(10).is_none());
        assert!(Timer::start("Work", 0).pause(5).finish(10).is_none());
    }

    #[test]
    fn backwards_clock_clamps_to_zero() {
        let timer = Timer::start("Work", 1000);
        assert_eq!(timer.elapsed(900), 0);
        let timer = timer.pause(1100).resume(1050);
        assert_eq!(timer.pause_so_far(1050), 0);
    }

    #[test]
    fn normalize_repairs_mismatched_sessions() {
        let mut session = Session {
            state: SessionState::TimerRunning,
            timer: Timer::Idle,
        };
        assert!(session.normalize());
        assert_eq!(session, Session::default());

        let mut session = Session {
            state: SessionState::LogMenu,
            timer: Timer::start("Work", 0),
        };
        assert!(session.normalize());
        assert_eq!(session, Session::default());

        let mut session = Session {
            state: SessionState::TimerPaused,
            timer: Timer::start("Work", 0).pause(5),
        };
        assert!(!session.normalize());
        assert_eq!(session.state, SessionState::TimerPaused);
    }
}
