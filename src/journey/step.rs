//! Wizard steps and their linear 1..=5 progression.

use serde::{Deserialize, Serialize};

/// The steps of the Style Journey wizard.
///
/// Progresses linearly: Profile → Style → Colors → Location → Review.
/// `Review` is terminal; only submit or retreat leave it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JourneyStep {
    Profile,
    Style,
    Colors,
    Location,
    Review,
}

/// Where a step sits relative to the current one, for the step indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Completed,
    Current,
    Upcoming,
}

impl JourneyStep {
    pub const ALL: [JourneyStep; 5] = [
        JourneyStep::Profile,
        JourneyStep::Style,
        JourneyStep::Colors,
        JourneyStep::Location,
        JourneyStep::Review,
    ];

    pub const FIRST: JourneyStep = JourneyStep::Profile;
    pub const LAST: JourneyStep = JourneyStep::Review;

    /// 1-based position of the step.
    pub fn number(&self) -> u8 {
        match self {
            Self::Profile => 1,
            Self::Style => 2,
            Self::Colors => 3,
            Self::Location => 4,
            Self::Review => 5,
        }
    }

    /// Step for a 1-based position, if in range.
    pub fn from_number(n: u8) -> Option<JourneyStep> {
        Self::ALL.get(usize::from(n).checked_sub(1)?).copied()
    }

    /// Label shown under the step indicator.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Profile => "Profile",
            Self::Style => "Style",
            Self::Colors => "Colors",
            Self::Location => "Location",
            Self::Review => "Review",
        }
    }

    /// Heading shown above the step's form.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Profile => "Tell Us About Yourself",
            Self::Style => "Your Style Preferences",
            Self::Colors => "Your Color Preferences",
            Self::Location => "Location & Occasion",
            Self::Review => "Review Your Style Profile",
        }
    }

    /// Next step, if any.
    pub fn next(&self) -> Option<JourneyStep> {
        Self::from_number(self.number() + 1)
    }

    /// Previous step, if any.
    pub fn prev(&self) -> Option<JourneyStep> {
        Self::from_number(self.number() - 1)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Review)
    }

    /// Completion ratio `(n - 1) / 4`, in `[0.0, 1.0]`.
    pub fn progress(&self) -> f32 {
        f32::from(self.number() - 1) / f32::from(Self::LAST.number() - 1)
    }

    /// Status of `step` when `self` is the current step.
    pub fn status_of(&self, step: JourneyStep) -> StepStatus {
        use std::cmp::Ordering::*;
        match step.number().cmp(&self.number()) {
            Less => StepStatus::Completed,
            Equal => StepStatus::Current,
            Greater => StepStatus::Upcoming,
        }
    }
}

impl Default for JourneyStep {
    fn default() -> Self {
        Self::FIRST
    }
}

impl std::fmt::Display for JourneyStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Profile => "profile",
            Self::Style => "style",
            Self::Colors => "colors",
            Self::Location => "location",
            Self::Review => "review",
        };
        write!(f, "{s}")
    }
}
