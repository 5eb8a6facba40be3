//! Worklog Core Library
//!
//! Conversational time tracking: a per-user session state machine over
//! a SQLite store, with pause-aware timers, per-project reports and
//! CSV export tables.
//!
//! # Components
//!
//! - `session`: the conversation state machine and timer arithmetic
//! - `storage`: SQLite persistence and TOML configuration
//! - `events`: wire types between a transport and the engine
//! - `report`: aggregation, display tables and the export contract
//! - `clock`: the time source abstraction used for testing

pub mod clock;
pub mod error;
pub mod events;
pub mod log;
pub mod profile;
pub mod report;
pub mod session;
pub mod storage;
pub mod timefmt;

pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use error::{ConfigError, CoreError, Result, StoreError};
pub use events::{Action, Button, CsvExport, EventKind, InboundEvent, Reply};
pub use log::LogEntry;
pub use profile::{ProfileDefaults, UserProfile};
pub use session::{Session, SessionEngine, SessionState, Timer};
pub use storage::{Config, Database, LogEffect};
