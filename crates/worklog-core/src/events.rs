//! Wire types between a chat transport and the session engine.
//!
//! A transport delivers one [`InboundEvent`] at a time and renders the
//! returned [`Reply`]. Buttons carry opaque action tokens; pressing a
//! button means echoing its token back as the payload of the next
//! event.

use serde::{Deserialize, Serialize};

/// Kind of inbound chat event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Command,
    Button,
    Text,
}

/// One event from the transport, addressed by opaque user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEvent {
    pub user_id: String,
    pub kind: EventKind,
    #[serde(default)]
    pub payload: Option<String>,
}

impl InboundEvent {
    pub fn command(user_id: &str, name: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            kind: EventKind::Command,
            payload: Some(name.to_string()),
        }
    }

    pub fn button(user_id: &str, token: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            kind: EventKind::Button,
            payload: Some(token.to_string()),
        }
    }

    pub fn text(user_id: &str, text: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            kind: EventKind::Text,
            payload: Some(text.to_string()),
        }
    }
}

/// Everything a button press can ask the engine to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Record,
    ViewLogs,
    OpenSettings,
    Pause,
    Stop,
    Resume,
    ListLogs,
    ExportLogs,
    ResetLogs,
    AddProject,
    RemoveProject,
    SetTimezone,
    Back,
    /// Pick an entry from a chooser keyboard by name.
    Select(String),
}

impl Action {
    /// The token a transport must echo back when this action's button
    /// is pressed.
    pub fn token(&self) -> String {
        match self {
            Action::Record => "record".to_string(),
            Action::ViewLogs => "logs".to_string(),
            Action::OpenSettings => "settings".to_string(),
            Action::Pause => "pause".to_string(),
            Action::Stop => "stop".to_string(),
            Action::Resume => "resume".to_string(),
            Action::ListLogs => "logs:list".to_string(),
            Action::ExportLogs => "logs:export".to_string(),
            Action::ResetLogs => "logs:reset".to_string(),
            Action::AddProject => "settings:add".to_string(),
            Action::RemoveProject => "settings:remove".to_string(),
            Action::SetTimezone => "settings:tz".to_string(),
            Action::Back => "back".to_string(),
            Action::Select(name) => format!("pick:{name}"),
        }
    }

    /// Decode a token back into an action. Unknown tokens yield `None`.
    pub fn parse(token: &str) -> Option<Action> {
        if let Some(name) = token.strip_prefix("pick:") {
            return Some(Action::Select(name.to_string()));
        }
        match token {
            "record" => Some(Action::Record),
            "logs" => Some(Action::ViewLogs),
            "settings" => Some(Action::OpenSettings),
            "pause" => Some(Action::Pause),
            "stop" => Some(Action::Stop),
            "resume" => Some(Action::Resume),
            "logs:list" => Some(Action::ListLogs),
            "logs:export" => Some(Action::ExportLogs),
            "logs:reset" => Some(Action::ResetLogs),
            "settings:add" => Some(Action::AddProject),
            "settings:remove" => Some(Action::RemoveProject),
            "settings:tz" => Some(Action::SetTimezone),
            "back" => Some(Action::Back),
            _ => None,
        }
    }
}

/// A button offered to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub token: String,
}

impl Button {
    pub fn new(label: &str, action: &Action) -> Self {
        Self {
            label: label.to_string(),
            token: action.token(),
        }
    }
}

/// Rows for the CSV document produced by the export action. The
/// transport owns the actual serialization; cells here are plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvExport {
    pub filename: String,
    pub rows: Vec<Vec<String>>,
}

/// What the transport should render after one event: message text,
/// buttons in display order, and an optional document to deliver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    pub actions: Vec<Button>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<CsvExport>,
}

impl Reply {
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            actions: Vec::new(),
            attachment: None,
        }
    }

    pub fn with_actions(text: impl Into<String>, actions: Vec<Button>) -> Self {
        Self {
            text: text.into(),
            actions,
            attachment: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_round_trip() {
        let actions = [
            Action::Record,
            Action::ViewLogs,
            Action::OpenSettings,
            Action::Pause,
            Action::Stop,
            Action::Resume,
            Action::ListLogs,
            Action::ExportLogs,
            Action::ResetLogs,
            Action::AddProject,
            Action::RemoveProject,
            Action::SetTimezone,
            Action::Back,
            Action::Select("Work".to_string()),
        ];
        for action in actions {
            assert_eq!(Action::parse(&action.token()), Some(action));
        }
    }

    #[test]
    fn select_token_keeps_the_name_verbatim() {
        let action = Action::parse("pick:side: project").unwrap();
        assert_eq!(action, Action::Select("side: project".to_string()));
    }

    #[test]
    fn unknown_tokens_are_rejected() {
        assert_eq!(Action::parse("pick"), None);
        assert_eq!(Action::parse("logs:purge"), None);
        assert_eq!(Action::parse(""), None);
    }
}
