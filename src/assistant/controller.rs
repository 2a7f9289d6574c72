//! Drives the chat and weather lanes for one session.
//!
//! Requests run without holding the state lock, so the session stays
//! responsive (panel toggles, typing, the other lane) while a reply is
//! pending. Every change is also broadcast as an `AssistantEvent`, sent
//! while the write guard is still held so subscribers see changes in the
//! order they were applied.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info, warn};

use super::lanes::{ChatLane, WeatherLane};
use super::model::{AssistantEvent, ChatMessage, KeyPress, Panel};
use super::responder::AiResponder;
use super::weather::{WeatherReport, WeatherResponder};

/// Default broadcast channel capacity.
const DEFAULT_BROADCAST_CAPACITY: usize = 256;

#[derive(Debug, Default)]
struct AssistantState {
    chat: ChatLane,
    weather: WeatherLane,
    /// `None` when both panels are closed. Never both open.
    open_panel: Option<Panel>,
}

/// Render-ready snapshot of the assistant.
#[derive(Debug, Clone, Serialize)]
pub struct AssistantView {
    pub open_panel: Option<Panel>,
    pub chat_input: String,
    pub chat_loading: bool,
    pub messages: Vec<ChatMessage>,
    pub weather_input: String,
    pub weather_loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherReport>,
}

pub struct AssistantController {
    state: RwLock<AssistantState>,
    ai: Arc<dyn AiResponder>,
    weather: Arc<dyn WeatherResponder>,
    tx: broadcast::Sender<AssistantEvent>,
}

impl AssistantController {
    pub fn new(ai: Arc<dyn AiResponder>, weather: Arc<dyn WeatherResponder>) -> Self {
        let (tx, _rx) = broadcast::channel(DEFAULT_BROADCAST_CAPACITY);
        Self {
            state: RwLock::new(AssistantState::default()),
            ai,
            weather,
            tx,
        }
    }

    /// Subscribe to state-change events.
    pub fn subscribe(&self) -> broadcast::Receiver<AssistantEvent> {
        self.tx.subscribe()
    }

    /// Callers hold the state write guard.
    fn emit(&self, event: AssistantEvent) {
        // ok if nobody is listening
        let _ = self.tx.send(event);
    }

    // ── Panels ──────────────────────────────────────────────────────────

    pub async fn open_panel(&self) -> Option<Panel> {
        self.state.read().await.open_panel
    }

    /// Open `panel`, closing the other one.
    pub async fn open(&self, panel: Panel) {
        let mut state = self.state.write().await;
        if state.open_panel != Some(panel) {
            state.open_panel = Some(panel);
            self.emit(AssistantEvent::PanelChanged { open: Some(panel) });
        }
    }

    /// Close `panel` if it is the open one.
    pub async fn close(&self, panel: Panel) {
        let mut state = self.state.write().await;
        if state.open_panel == Some(panel) {
            state.open_panel = None;
            self.emit(AssistantEvent::PanelChanged { open: None });
        }
    }

    /// Flip `panel`; the other panel always ends up closed.
    pub async fn toggle(&self, panel: Panel) -> Option<Panel> {
        let mut state = self.state.write().await;
        let next = if state.open_panel == Some(panel) {
            None
        } else {
            Some(panel)
        };
        state.open_panel = next;
        debug!(panel = %panel, open = ?next, "Panel toggled");
        self.emit(AssistantEvent::PanelChanged { open: next });
        next
    }

    // ── Input buffers ───────────────────────────────────────────────────

    pub async fn set_chat_input(&self, text: impl Into<String>) {
        self.state.write().await.chat.set_input(text);
    }

    pub async fn set_weather_input(&self, text: impl Into<String>) {
        self.state.write().await.weather.set_input(text);
    }

    // ── Chat lane ───────────────────────────────────────────────────────

    /// Submit `text` to the AI responder and wait for the bot reply.
    ///
    /// Blank text is ignored (`None`). Responder failures are turned into an
    /// apology message; the returned message is always the bot reply.
    pub async fn submit_chat(&self, text: &str) -> Option<ChatMessage> {
        let user_message = {
            let mut state = self.state.write().await;
            self.begin_chat(&mut state, text)?
        };
        Some(self.finish_chat(&user_message.text).await)
    }

    /// Record the user message now and resolve the reply in the background.
    /// Returns the user message, or `None` for blank text.
    pub async fn start_chat(self: &Arc<Self>, text: &str) -> Option<ChatMessage> {
        let user_message = {
            let mut state = self.state.write().await;
            self.begin_chat(&mut state, text)?
        };
        self.spawn_chat_reply(user_message.text.clone());
        Some(user_message)
    }

    /// Submit whatever is in the chat input buffer.
    pub async fn submit_chat_input(&self) -> Option<ChatMessage> {
        let user_message = {
            let mut state = self.state.write().await;
            let text = state.chat.input().to_string();
            self.begin_chat(&mut state, &text)?
        };
        Some(self.finish_chat(&user_message.text).await)
    }

    fn begin_chat(&self, state: &mut AssistantState, text: &str) -> Option<ChatMessage> {
        let user_message = state.chat.begin(text)?;
        info!(message_id = user_message.id, "Chat submitted");
        self.emit(AssistantEvent::MessageAppended {
            message: user_message.clone(),
        });
        self.emit(AssistantEvent::LoadingChanged {
            lane: Panel::Chat,
            loading: true,
        });
        Some(user_message)
    }

    fn spawn_chat_reply(self: &Arc<Self>, text: String) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.finish_chat(&text).await;
        });
    }

    async fn finish_chat(&self, text: &str) -> ChatMessage {
        let outcome = self.ai.respond(text).await;
        if let Err(ref e) = outcome {
            warn!(responder = self.ai.name(), error = %e, "AI responder failed");
        }

        let mut state = self.state.write().await;
        let reply = state.chat.complete(outcome);
        self.emit(AssistantEvent::MessageAppended {
            message: reply.clone(),
        });
        self.emit(AssistantEvent::LoadingChanged {
            lane: Panel::Chat,
            loading: state.chat.is_loading(),
        });
        reply
    }

    // ── Weather lane ────────────────────────────────────────────────────

    /// Look up weather for `city` and store the report. Blank input is
    /// ignored (`None`).
    pub async fn submit_weather(&self, city: &str) -> Option<WeatherReport> {
        let city = {
            let mut state = self.state.write().await;
            self.begin_weather(&mut state, city)?
        };
        Some(self.finish_weather(&city).await)
    }

    /// Start a lookup and resolve it in the background. Returns whether the
    /// request was accepted.
    pub async fn start_weather(self: &Arc<Self>, city: &str) -> bool {
        let city = {
            let mut state = self.state.write().await;
            self.begin_weather(&mut state, city)
        };
        match city {
            Some(city) => {
                self.spawn_weather_lookup(city);
                true
            }
            None => false,
        }
    }

    /// Look up the city in the weather input buffer.
    pub async fn submit_weather_input(&self) -> Option<WeatherReport> {
        let city = {
            let mut state = self.state.write().await;
            let input = state.weather.input().to_string();
            self.begin_weather(&mut state, &input)?
        };
        Some(self.finish_weather(&city).await)
    }

    fn begin_weather(&self, state: &mut AssistantState, city: &str) -> Option<String> {
        let city = state.weather.begin(city)?;
        info!(city = %city, "Weather lookup started");
        self.emit(AssistantEvent::LoadingChanged {
            lane: Panel::Weather,
            loading: true,
        });
        Some(city)
    }

    fn spawn_weather_lookup(self: &Arc<Self>, city: String) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.finish_weather(&city).await;
        });
    }

    async fn finish_weather(&self, city: &str) -> WeatherReport {
        let outcome = self.weather.lookup(city).await;
        if let Err(ref e) = outcome {
            warn!(responder = self.weather.name(), error = %e, "Weather responder failed");
        }
        let report = WeatherReport::from(outcome);

        let mut state = self.state.write().await;
        state.weather.complete(report.clone());
        self.emit(AssistantEvent::WeatherUpdated {
            report: report.clone(),
        });
        self.emit(AssistantEvent::LoadingChanged {
            lane: Panel::Weather,
            loading: state.weather.is_loading(),
        });
        report
    }

    /// Turn the last successful weather reading into a chat prompt: close
    /// the weather panel, open chat, and prefill (not submit) the input.
    ///
    /// Returns the prompt, or `None` when there is no usable reading.
    pub async fn use_result_for_chat_prompt(&self) -> Option<String> {
        let mut state = self.state.write().await;
        let prompt = state.weather.last_report()?.result()?.chat_prompt();
        state.chat.set_input(prompt.clone());
        state.open_panel = Some(Panel::Chat);
        self.emit(AssistantEvent::PanelChanged {
            open: Some(Panel::Chat),
        });
        self.emit(AssistantEvent::ChatInputPrefilled {
            text: prompt.clone(),
        });
        Some(prompt)
    }

    // ── Keys ────────────────────────────────────────────────────────────

    /// Route a submit key to the open panel's lane and wait for the reply.
    /// Returns the lane that was submitted, if any.
    pub async fn handle_key(&self, key: &KeyPress) -> Option<Panel> {
        if !key.is_submit() {
            return None;
        }
        match self.open_panel().await? {
            Panel::Chat => self.submit_chat_input().await.map(|_| Panel::Chat),
            Panel::Weather => self.submit_weather_input().await.map(|_| Panel::Weather),
        }
    }

    /// Like `handle_key`, but the request resolves in the background. The
    /// buffer is read and submitted under one write guard.
    pub async fn start_key(self: &Arc<Self>, key: &KeyPress) -> Option<Panel> {
        if !key.is_submit() {
            return None;
        }
        let mut state = self.state.write().await;
        match state.open_panel? {
            Panel::Chat => {
                let text = state.chat.input().to_string();
                let user_message = self.begin_chat(&mut state, &text)?;
                drop(state);
                self.spawn_chat_reply(user_message.text);
                Some(Panel::Chat)
            }
            Panel::Weather => {
                let input = state.weather.input().to_string();
                let city = self.begin_weather(&mut state, &input)?;
                drop(state);
                self.spawn_weather_lookup(city);
                Some(Panel::Weather)
            }
        }
    }

    pub async fn view(&self) -> AssistantView {
        let state = self.state.read().await;
        AssistantView {
            open_panel: state.open_panel,
            chat_input: state.chat.input().to_string(),
            chat_loading: state.chat.is_loading(),
            messages: state.chat.history().to_vec(),
            weather_input: state.weather.input().to_string(),
            weather_loading: state.weather.is_loading(),
            weather: state.weather.last_report().cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::assistant::lanes::APOLOGY;
    use crate::assistant::model::Sender;
    use crate::assistant::responder::{MockAiResponder, PARTY_REPLY, WORK_REPLY};
    use crate::assistant::weather::{
        MockWeatherResponder, WEATHER_ERROR, WeatherCondition, WeatherResult,
    };
    use crate::error::ResponderError;

    struct FailingAi;

    #[async_trait]
    impl AiResponder for FailingAi {
        fn name(&self) -> &str {
            "failing"
        }
        async fn respond(&self, _query: &str) -> Result<String, ResponderError> {
            Err(ResponderError::RequestFailed {
                responder: "failing".into(),
                reason: "offline".into(),
            })
        }
    }

    /// Fixed reading, counts calls.
    struct FixedWeather {
        result: WeatherResult,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl WeatherResponder for FixedWeather {
        fn name(&self) -> &str {
            "fixed"
        }
        async fn lookup(&self, city: &str) -> Result<WeatherResult, ResponderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(WeatherResult {
                city: city.to_string(),
                ..self.result.clone()
            })
        }
    }

    struct FailingWeather;

    #[async_trait]
    impl WeatherResponder for FailingWeather {
        fn name(&self) -> &str {
            "failing-weather"
        }
        async fn lookup(&self, _city: &str) -> Result<WeatherResult, ResponderError> {
            Err(ResponderError::InvalidResponse {
                responder: "failing-weather".into(),
                reason: "city not found".into(),
            })
        }
    }

    fn mock_controller() -> Arc<AssistantController> {
        Arc::new(AssistantController::new(
            Arc::new(MockAiResponder::new(Duration::from_millis(1500))),
            Arc::new(MockWeatherResponder::new(Duration::from_millis(1000))),
        ))
    }

    fn tokyo_rainy() -> Arc<FixedWeather> {
        Arc::new(FixedWeather {
            result: WeatherResult {
                city: String::new(),
                temperature_celsius: 18,
                condition: WeatherCondition::Rainy,
                humidity_percent: 65,
            },
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn panels_are_exclusive() {
        let c = mock_controller();
        assert_eq!(c.open_panel().await, None);

        c.open(Panel::Chat).await;
        assert_eq!(c.open_panel().await, Some(Panel::Chat));
        c.open(Panel::Weather).await;
        assert_eq!(c.open_panel().await, Some(Panel::Weather));

        assert_eq!(c.toggle(Panel::Chat).await, Some(Panel::Chat));
        assert_eq!(c.toggle(Panel::Chat).await, None);

        c.open(Panel::Weather).await;
        c.close(Panel::Chat).await;
        assert_eq!(c.open_panel().await, Some(Panel::Weather));
        c.close(Panel::Weather).await;
        assert_eq!(c.open_panel().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn chat_party_scenario() {
        let c = mock_controller();
        let reply = c.submit_chat("outfit for a party").await.unwrap();
        assert_eq!(reply.text, PARTY_REPLY);
        assert_eq!(reply.sender, Sender::Bot);

        let view = c.view().await;
        assert_eq!(view.messages.len(), 3);
        assert_eq!(view.messages[1].text, "outfit for a party");
        assert_eq!(view.messages[1].sender, Sender::User);
        assert!(!view.chat_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn chat_work_scenario() {
        let c = mock_controller();
        let reply = c.submit_chat("outfit for work").await.unwrap();
        assert_eq!(reply.text, WORK_REPLY);
    }

    #[tokio::test(start_paused = true)]
    async fn pending_chat_shows_user_message_and_loading() {
        let c = mock_controller();
        c.set_chat_input("outfit for work").await;

        let task = {
            let c = Arc::clone(&c);
            tokio::spawn(async move { c.submit_chat_input().await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;

        let view = c.view().await;
        assert_eq!(view.messages.len(), 2);
        assert!(view.chat_loading);
        assert!(view.chat_input.is_empty());

        // still responsive while pending
        c.open(Panel::Weather).await;
        assert_eq!(c.open_panel().await, Some(Panel::Weather));

        task.await.unwrap().unwrap();
        let view = c.view().await;
        assert_eq!(view.messages.len(), 3);
        assert!(!view.chat_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn blank_submissions_do_nothing() {
        let weather = tokyo_rainy();
        let c = Arc::new(AssistantController::new(
            Arc::new(MockAiResponder::new(Duration::from_millis(1500))),
            weather.clone(),
        ));
        let mut rx = c.subscribe();
        assert!(c.submit_chat("   ").await.is_none());
        assert!(c.submit_weather("").await.is_none());
        assert!(c.submit_weather(" \t ").await.is_none());
        assert!(!c.start_weather("   ").await);
        assert_eq!(weather.calls.load(Ordering::SeqCst), 0);

        let view = c.view().await;
        assert_eq!(view.messages.len(), 1);
        assert!(view.weather.is_none());
        assert!(!view.chat_loading && !view.weather_loading);
        assert!(rx.try_recv().is_err(), "no events for ignored input");
    }

    #[tokio::test]
    async fn chat_failure_appends_apology() {
        let c = AssistantController::new(Arc::new(FailingAi), tokyo_rainy());
        let reply = c.submit_chat("anything").await.unwrap();
        assert_eq!(reply.text, APOLOGY);
        let view = c.view().await;
        assert_eq!(view.messages.len(), 3);
        assert!(!view.chat_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_double_submit_keeps_order_and_ids() {
        let c = mock_controller();
        let first = {
            let c = Arc::clone(&c);
            tokio::spawn(async move { c.submit_chat("outfit for a party").await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = {
            let c = Arc::clone(&c);
            tokio::spawn(async move { c.submit_chat("outfit for work").await })
        };
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        let view = c.view().await;
        let ids: Vec<u64> = view.messages.iter().map(|m| m.id).collect();
        assert_eq!(ids, [1, 2, 3, 4, 5]);
        let senders: Vec<Sender> = view.messages.iter().map(|m| m.sender).collect();
        assert_eq!(
            senders,
            [Sender::Bot, Sender::User, Sender::User, Sender::Bot, Sender::Bot]
        );
        assert_eq!(view.messages[3].text, PARTY_REPLY);
        assert_eq!(view.messages[4].text, WORK_REPLY);
        assert!(!view.chat_loading);
    }

    #[tokio::test]
    async fn weather_then_chat_prompt() {
        let weather = tokyo_rainy();
        let c = AssistantController::new(
            Arc::new(MockAiResponder::new(Duration::ZERO)),
            weather.clone(),
        );
        c.open(Panel::Weather).await;
        c.set_weather_input("Tokyo").await;
        let report = c.submit_weather_input().await.unwrap();
        assert_eq!(report.result().unwrap().city, "Tokyo");
        assert_eq!(weather.calls.load(Ordering::SeqCst), 1);

        let prompt = c.use_result_for_chat_prompt().await.unwrap();
        assert_eq!(prompt, "What should I wear in Tokyo with rainy weather at 18°C?");

        let view = c.view().await;
        assert_eq!(view.open_panel, Some(Panel::Chat));
        assert_eq!(view.chat_input, prompt);
        assert_eq!(view.messages.len(), 1, "prefill does not submit");
    }

    #[tokio::test]
    async fn chat_prompt_needs_successful_reading() {
        let c = AssistantController::new(Arc::new(FailingAi), Arc::new(FailingWeather));
        c.open(Panel::Weather).await;
        assert!(c.use_result_for_chat_prompt().await.is_none());

        let report = c.submit_weather("Atlantis").await.unwrap();
        assert_eq!(report, WeatherReport::Error { error: WEATHER_ERROR.to_string() });
        assert!(c.use_result_for_chat_prompt().await.is_none());
        assert_eq!(c.open_panel().await, Some(Panel::Weather));
        assert!(c.view().await.chat_input.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn enter_routes_to_open_panel() {
        let weather = tokyo_rainy();
        let c = AssistantController::new(
            Arc::new(MockAiResponder::new(Duration::from_millis(1500))),
            weather.clone(),
        );

        // nothing open
        assert_eq!(c.handle_key(&KeyPress::enter()).await, None);

        c.open(Panel::Weather).await;
        c.set_weather_input("Oslo").await;
        c.set_chat_input("outfit for work").await;
        let shift_enter = KeyPress {
            key: "Enter".into(),
            shift: true,
        };
        assert_eq!(c.handle_key(&shift_enter).await, None);
        assert_eq!(c.handle_key(&KeyPress::enter()).await, Some(Panel::Weather));
        assert_eq!(weather.calls.load(Ordering::SeqCst), 1);
        assert_eq!(c.view().await.messages.len(), 1);

        c.open(Panel::Chat).await;
        assert_eq!(c.handle_key(&KeyPress::enter()).await, Some(Panel::Chat));
        assert_eq!(c.view().await.messages.len(), 3);
        assert_eq!(weather.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn start_chat_returns_before_reply() {
        let c = mock_controller();
        let user = c.start_chat("outfit for a party").await.unwrap();
        assert_eq!(user.id, 2);
        let view = c.view().await;
        assert_eq!(view.messages.len(), 2);
        assert!(view.chat_loading);

        tokio::time::sleep(Duration::from_millis(1600)).await;
        let view = c.view().await;
        assert_eq!(view.messages.len(), 3);
        assert_eq!(view.messages[2].text, PARTY_REPLY);
        assert!(!view.chat_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn start_key_submits_weather_in_background() {
        let c = mock_controller();
        c.open(Panel::Weather).await;
        c.set_weather_input("Nairobi").await;
        assert_eq!(c.start_key(&KeyPress::enter()).await, Some(Panel::Weather));
        assert!(c.view().await.weather_loading);

        tokio::time::sleep(Duration::from_millis(1100)).await;
        let view = c.view().await;
        assert!(!view.weather_loading);
        assert_eq!(view.weather.unwrap().result().unwrap().city, "Nairobi");
    }

    #[tokio::test(start_paused = true)]
    async fn start_key_submits_buffer_once() {
        let c = mock_controller();
        c.open(Panel::Chat).await;
        c.set_chat_input("outfit for work").await;
        assert_eq!(c.start_key(&KeyPress::enter()).await, Some(Panel::Chat));

        let view = c.view().await;
        assert!(view.chat_input.is_empty());
        assert_eq!(view.messages[1].text, "outfit for work");
        // buffer already consumed
        assert_eq!(c.start_key(&KeyPress::enter()).await, None);

        tokio::time::sleep(Duration::from_millis(1600)).await;
        let view = c.view().await;
        assert_eq!(view.messages.len(), 3);
        assert_eq!(view.messages[2].text, WORK_REPLY);
    }

    #[tokio::test(start_paused = true)]
    async fn loading_events_track_overlapping_requests() {
        let c = mock_controller();
        let mut rx = c.subscribe();
        c.start_chat("outfit for a party").await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        c.start_chat("outfit for work").await.unwrap();
        tokio::time::sleep(Duration::from_millis(1600)).await;

        let loading: Vec<bool> = std::iter::from_fn(|| rx.try_recv().ok())
            .filter_map(|event| match event {
                AssistantEvent::LoadingChanged {
                    lane: Panel::Chat,
                    loading,
                } => Some(loading),
                _ => None,
            })
            .collect();
        // first reply lands while the second is still pending
        assert_eq!(loading, [true, true, true, false]);
        assert!(!c.view().await.chat_loading);
    }

    #[tokio::test]
    async fn start_key_ignores_blank_input() {
        let c = mock_controller();
        c.open(Panel::Chat).await;
        assert_eq!(c.start_key(&KeyPress::enter()).await, None);
        assert_eq!(c.view().await.messages.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn events_follow_chat_lifecycle() {
        let c = mock_controller();
        let mut rx = c.subscribe();
        c.submit_chat("will it rain").await.unwrap();

        let kinds: Vec<String> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| serde_json::to_value(&e).unwrap()["type"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            kinds,
            ["message_appended", "loading_changed", "message_appended", "loading_changed"]
        );
    }
}
