//! Where a completed style profile goes.

use tracing::info;

use super::model::StyleProfile;

/// Receives the profile once, when the journey is submitted.
pub trait ProfileSink: Send + Sync {
    fn submit(&self, profile: StyleProfile);
}

/// Default sink: records the submission in the trace log.
pub struct LogProfileSink;

impl ProfileSink for LogProfileSink {
    fn submit(&self, profile: StyleProfile) {
        match serde_json::to_string(&profile) {
            Ok(json) => info!(profile = %json, "Style profile submitted"),
            Err(e) => info!(error = %e, name = %profile.name, "Style profile submitted"),
        }
    }
}

impl<F> ProfileSink for F
where
    F: Fn(StyleProfile) + Send + Sync,
{
    fn submit(&self, profile: StyleProfile) {
        self(profile)
    }
}
