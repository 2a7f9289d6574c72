//! The chat and weather popups.
//!
//! Two independent request lanes share one controller:
//! - **Chat**: free-text questions answered by an `AiResponder`.
//! - **Weather**: city lookups answered by a `WeatherResponder`.
//!
//! Only one of the two panels is open at a time. A finished weather lookup
//! can be turned into a prefilled chat question.

pub mod controller;
pub mod lanes;
pub mod model;
pub mod responder;
pub mod weather;

pub use controller::{AssistantController, AssistantView};
pub use model::{AssistantEvent, ChatMessage, KeyPress, Panel, Sender};
pub use responder::{AiResponder, MockAiResponder};
pub use weather::{
    MockWeatherResponder, WeatherCondition, WeatherReport, WeatherResponder, WeatherResult,
};
