//! AI responder seam and its canned mock.
//!
//! A real integration implements `AiResponder` against a language model; the
//! mock answers from a few keyword rules after a fixed delay.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::ResponderError;

/// System prompt prepended to every query.
pub const SYSTEM_PROMPT: &str = "You are a professional outfit planner AI. Provide detailed, personalized outfit recommendations based on the user's request. Consider weather, occasion, and personal style. Offer multiple options when possible.";

pub const PARTY_REPLY: &str = "For a party, here are 3 great options:\n1. Sleek black dress with statement jewelry and heels\n2. Jumpsuit with metallic accessories\n3. Tailored suit with a silk blouse\n\nWhich style do you prefer?";

pub const WORK_REPLY: &str = "Professional outfit ideas:\n- Navy blazer with white shirt and gray trousers\n- Pencil skirt with blouse and cardigan\n- Dress pants with a shell top and blazer\n\nWould you like suggestions for accessories too?";

pub const WEATHER_REPLY: &str = "For the current weather conditions, I recommend:\n- Waterproof jacket or trench coat\n- Layered clothing for temperature changes\n- Comfortable waterproof footwear\n\nWould you like more specific suggestions?";

pub const CLARIFY_REPLY: &str = "I'd be happy to help plan your outfit! Could you tell me:\n1. The occasion or activity\n2. Your location or weather conditions\n3. Any preferred colors or styles?";

/// Answers a free-text outfit question.
#[async_trait]
pub trait AiResponder: Send + Sync {
    /// Responder name for logs.
    fn name(&self) -> &str;

    /// Send the raw query text, get a plain-text reply.
    async fn respond(&self, query: &str) -> Result<String, ResponderError>;
}

/// Full prompt a model-backed responder would send.
pub fn build_prompt(query: &str) -> String {
    format!("{SYSTEM_PROMPT}\n\nUser: {query}")
}

/// Pick the canned reply for a query.
///
/// "outfit for" queries get the party or work list when those words appear,
/// otherwise the clarifying reply. Only queries without "outfit for" are
/// checked for weather words.
pub fn canned_reply(query: &str) -> &'static str {
    let q = query.to_lowercase();
    if q.contains("outfit for") {
        if q.contains("party") {
            return PARTY_REPLY;
        }
        if q.contains("work") {
            return WORK_REPLY;
        }
    } else if ["weather", "rain", "cold"].iter().any(|w| q.contains(w)) {
        return WEATHER_REPLY;
    }
    CLARIFY_REPLY
}

/// Keyword-matching responder with simulated latency. Never fails.
pub struct MockAiResponder {
    delay: Duration,
}

impl MockAiResponder {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl AiResponder for MockAiResponder {
    fn name(&self) -> &str {
        "mock-ai"
    }

    async fn respond(&self, query: &str) -> Result<String, ResponderError> {
        tokio::time::sleep(self.delay).await;
        debug!(prompt = %build_prompt(query), "Sending to AI");
        Ok(canned_reply(query).to_string())
    }
}
