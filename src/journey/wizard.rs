//! The five-step onboarding form controller.

use serde::Serialize;
use tracing::{debug, info};

use super::model::{ProfileField, ReviewLine, SelectionField, SkinTone, StyleProfile};
use super::sink::ProfileSink;
use super::step::{JourneyStep, StepStatus};

/// Owned wizard state: the current step plus the profile being filled in.
///
/// Every transition is total; nothing here can fail. Closing the wizard
/// consumes it (`submit` or `cancel`).
#[derive(Debug, Clone, Default)]
pub struct StyleJourney {
    step: JourneyStep,
    profile: StyleProfile,
}

/// Indicator entry for one step.
#[derive(Debug, Clone, Serialize)]
pub struct StepIndicator {
    pub number: u8,
    pub label: &'static str,
    pub status: StepStatus,
}

/// Render-ready view of the wizard.
#[derive(Debug, Clone, Serialize)]
pub struct JourneyView {
    pub step: JourneyStep,
    pub step_number: u8,
    pub title: &'static str,
    pub progress: f32,
    pub steps: Vec<StepIndicator>,
    pub can_retreat: bool,
    pub can_advance: bool,
    pub can_submit: bool,
    pub profile: StyleProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<Vec<ReviewLine>>,
}

impl StyleJourney {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> JourneyStep {
        self.step
    }

    pub fn profile(&self) -> &StyleProfile {
        &self.profile
    }

    /// Move forward one step; no-op on the last step. Never gated on input.
    pub fn advance(&mut self) -> JourneyStep {
        if let Some(next) = self.step.next() {
            debug!(from = %self.step, to = %next, "Journey advanced");
            self.step = next;
        }
        self.step
    }

    /// Move back one step; no-op on the first step.
    pub fn retreat(&mut self) -> JourneyStep {
        if let Some(prev) = self.step.prev() {
            debug!(from = %self.step, to = %prev, "Journey retreated");
            self.step = prev;
        }
        self.step
    }

    pub fn set_field(&mut self, field: ProfileField, value: impl Into<String>) {
        self.profile.set_field(field, value);
    }

    /// Toggle membership of `value` in a multi-select field.
    pub fn toggle(&mut self, field: SelectionField, value: &str) -> bool {
        self.profile.toggle(field, value)
    }

    pub fn select_skin_tone(&mut self, tone: SkinTone) {
        self.profile.skin_tone = Some(tone);
    }

    /// Hand the profile, complete or not, to `sink` and close the wizard.
    pub fn submit(self, sink: &dyn ProfileSink) {
        info!(step = %self.step, "Style journey submitted");
        sink.submit(self.profile);
    }

    /// Close the wizard, discarding everything entered.
    pub fn cancel(self) {
        info!(step = %self.step, "Style journey cancelled");
    }

    pub fn view(&self) -> JourneyView {
        let steps = JourneyStep::ALL
            .iter()
            .map(|s| StepIndicator {
                number: s.number(),
                label: s.label(),
                status: self.step.status_of(*s),
            })
            .collect();

        JourneyView {
            step: self.step,
            step_number: self.step.number(),
            title: self.step.title(),
            progress: self.step.progress(),
            steps,
            can_retreat: self.step.prev().is_some(),
            can_advance: !self.step.is_terminal(),
            can_submit: self.step.is_terminal(),
            profile: self.profile.clone(),
            review: self
                .step
                .is_terminal()
                .then(|| self.profile.review_lines()),
        }
    }
}
