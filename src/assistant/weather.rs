//! Weather lookup seam and its randomized mock.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ResponderError;

/// Shown when a lookup fails.
pub const WEATHER_ERROR: &str = "Couldn't fetch weather data";

/// Inclusive temperature range of the mock, in °C.
pub const MOCK_TEMPERATURE_RANGE: std::ops::RangeInclusive<i32> = 10..=39;
/// Inclusive humidity range of the mock, in percent.
pub const MOCK_HUMIDITY_RANGE: std::ops::RangeInclusive<u8> = 30..=79;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeatherCondition {
    Sunny,
    Cloudy,
    Rainy,
    Snowy,
}

impl WeatherCondition {
    pub const ALL: [WeatherCondition; 4] = [
        WeatherCondition::Sunny,
        WeatherCondition::Cloudy,
        WeatherCondition::Rainy,
        WeatherCondition::Snowy,
    ];

    /// Icon name rendered next to the reading.
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Sunny => "sun",
            Self::Cloudy => "cloud",
            Self::Rainy => "cloud-rain",
            Self::Snowy => "snowflake",
        }
    }
}

impl std::fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Sunny => "Sunny",
            Self::Cloudy => "Cloudy",
            Self::Rainy => "Rainy",
            Self::Snowy => "Snowy",
        };
        write!(f, "{s}")
    }
}

/// A successful reading. Serialized with the condition's `icon` alongside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", into = "ReadingJson")]
pub struct WeatherResult {
    pub city: String,
    pub temperature_celsius: i32,
    pub condition: WeatherCondition,
    pub humidity_percent: u8,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadingJson {
    city: String,
    temperature_celsius: i32,
    condition: WeatherCondition,
    humidity_percent: u8,
    icon: &'static str,
}

impl From<WeatherResult> for ReadingJson {
    fn from(result: WeatherResult) -> Self {
        Self {
            icon: result.condition.icon(),
            city: result.city,
            temperature_celsius: result.temperature_celsius,
            condition: result.condition,
            humidity_percent: result.humidity_percent,
        }
    }
}

impl WeatherResult {
    /// Chat prompt asking what to wear in this weather.
    pub fn chat_prompt(&self) -> String {
        format!(
            "What should I wear in {} with {} weather at {}°C?",
            self.city,
            self.condition.to_string().to_lowercase(),
            self.temperature_celsius
        )
    }
}

/// What the weather panel displays: a reading or an error marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WeatherReport {
    Error { error: String },
    Ok(WeatherResult),
}

impl WeatherReport {
    pub fn result(&self) -> Option<&WeatherResult> {
        match self {
            Self::Ok(result) => Some(result),
            Self::Error { .. } => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

impl From<Result<WeatherResult, ResponderError>> for WeatherReport {
    fn from(result: Result<WeatherResult, ResponderError>) -> Self {
        match result {
            Ok(result) => Self::Ok(result),
            Err(_) => Self::Error {
                error: WEATHER_ERROR.to_string(),
            },
        }
    }
}

/// Looks up current weather for a city.
#[async_trait]
pub trait WeatherResponder: Send + Sync {
    fn name(&self) -> &str;

    async fn lookup(&self, city: &str) -> Result<WeatherResult, ResponderError>;
}

/// Draw a uniformly random reading for `city`.
pub fn random_reading(rng: &mut impl Rng, city: &str) -> WeatherResult {
    let condition = WeatherCondition::ALL[rng.gen_range(0..WeatherCondition::ALL.len())];
    WeatherResult {
        city: city.to_string(),
        temperature_celsius: rng.gen_range(MOCK_TEMPERATURE_RANGE),
        condition,
        humidity_percent: rng.gen_range(MOCK_HUMIDITY_RANGE),
    }
}

/// Random readings after a fixed delay. Never fails.
pub struct MockWeatherResponder {
    delay: Duration,
}

impl MockWeatherResponder {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl WeatherResponder for MockWeatherResponder {
    fn name(&self) -> &str {
        "mock-weather"
    }

    async fn lookup(&self, city: &str) -> Result<WeatherResult, ResponderError> {
        let reading = random_reading(&mut rand::thread_rng(), city);
        tokio::time::sleep(self.delay).await;
        Ok(reading)
    }
}
