//! Per-lane request state with pure transitions.
//!
//! A lane is started with `begin` (which validates the input and records the
//! request) and finished with `complete` once the responder resolves. The
//! controller holds the lock only inside these calls, never across a request.

use super::model::{ChatMessage, Sender};
use super::weather::WeatherReport;

/// First bot message of every session.
pub const GREETING: &str = "Hello! I'm your AI Outfit Planner. Tell me about an event or weather conditions, and I'll suggest perfect outfits!";

/// Reply appended when the AI responder fails.
pub const APOLOGY: &str = "Sorry, I encountered an error. Please try again.";

/// Chat lane: input buffer, in-flight count, and transcript.
#[derive(Debug, Clone)]
pub struct ChatLane {
    input: String,
    in_flight: usize,
    history: Vec<ChatMessage>,
    next_id: u64,
}

impl Default for ChatLane {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatLane {
    /// New lane seeded with the greeting (id 1).
    pub fn new() -> Self {
        let mut lane = Self {
            input: String::new(),
            in_flight: 0,
            history: Vec::new(),
            next_id: 1,
        };
        lane.append(GREETING, Sender::Bot);
        lane
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    /// Record a user submission. Returns the user message, or `None` (and
    /// leaves the lane untouched) for blank input.
    pub fn begin(&mut self, text: &str) -> Option<ChatMessage> {
        if text.trim().is_empty() {
            return None;
        }
        let message = self.append(text, Sender::User);
        self.input.clear();
        self.in_flight += 1;
        Some(message)
    }

    /// Record the responder outcome as a bot message.
    pub fn complete<E>(&mut self, outcome: Result<String, E>) -> ChatMessage {
        let text = outcome.unwrap_or_else(|_| APOLOGY.to_string());
        self.in_flight = self.in_flight.saturating_sub(1);
        self.append(text, Sender::Bot)
    }

    fn append(&mut self, text: impl Into<String>, sender: Sender) -> ChatMessage {
        let message = ChatMessage::new(self.next_id, text, sender);
        self.next_id += 1;
        self.history.push(message.clone());
        message
    }
}

/// Weather lane: input buffer, in-flight count, and the latest report.
#[derive(Debug, Clone, Default)]
pub struct WeatherLane {
    input: String,
    in_flight: usize,
    last_report: Option<WeatherReport>,
}

impl WeatherLane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn last_report(&self) -> Option<&WeatherReport> {
        self.last_report.as_ref()
    }

    /// Record a lookup request. Returns the city to query, or `None` for
    /// blank input. The input buffer is kept so the city stays visible.
    pub fn begin(&mut self, city: &str) -> Option<String> {
        if city.trim().is_empty() {
            return None;
        }
        self.in_flight += 1;
        Some(city.to_string())
    }

    /// Replace the last report with `report`.
    pub fn complete(&mut self, report: WeatherReport) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.last_report = Some(report);
    }
}
