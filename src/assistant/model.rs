//! Assistant data model: chat messages, panels and broadcast events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::weather::WeatherReport;

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Bot,
}

/// One entry in the chat transcript. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Sequential within the session, starting at 1 for the greeting.
    pub id: u64,
    pub text: String,
    pub sender: Sender,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(id: u64, text: impl Into<String>, sender: Sender) -> Self {
        Self {
            id,
            text: text.into(),
            sender,
            created_at: Utc::now(),
        }
    }
}

/// The two popup panels. At most one is open at a time.
///
/// Each panel fronts one request lane of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Panel {
    Chat,
    Weather,
}

impl std::fmt::Display for Panel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Chat => write!(f, "chat"),
            Self::Weather => write!(f, "weather"),
        }
    }
}

/// A key press forwarded from the focused panel input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPress {
    pub key: String,
    #[serde(default)]
    pub shift: bool,
}

impl KeyPress {
    pub fn enter() -> Self {
        Self {
            key: "Enter".to_string(),
            shift: false,
        }
    }

    /// Plain Enter (no shift) submits the open panel.
    pub fn is_submit(&self) -> bool {
        self.key == "Enter" && !self.shift
    }
}

/// State changes pushed to session subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssistantEvent {
    MessageAppended { message: ChatMessage },
    LoadingChanged { lane: Panel, loading: bool },
    WeatherUpdated { report: WeatherReport },
    PanelChanged { open: Option<Panel> },
    ChatInputPrefilled { text: String },
}
