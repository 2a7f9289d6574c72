//! Style Journey, the multi-step onboarding form.
//!
//! A linear five-step wizard collects a `StyleProfile`. Navigation is never
//! gated on input; the profile is handed to a `ProfileSink` on submit.

pub mod model;
pub mod sink;
pub mod step;
pub mod wizard;

pub use model::{ProfileField, SelectionField, SkinTone, StyleProfile};
pub use sink::{LogProfileSink, ProfileSink};
pub use step::{JourneyStep, StepStatus};
pub use wizard::{JourneyView, StyleJourney};
