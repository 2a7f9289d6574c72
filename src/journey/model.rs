//! Style profile and the option catalogs offered by the journey form.

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Colors offered on the Colors step.
pub const COLORS: [&str; 9] = [
    "Red", "Blue", "Green", "Black", "White", "Gray", "Pink", "Purple", "Yellow",
];

/// Styles offered on the Style step.
pub const STYLES: [&str; 7] = [
    "Casual",
    "Formal",
    "Sporty",
    "Bohemian",
    "Streetwear",
    "Vintage",
    "Minimalist",
];

/// `(value, label)` pairs for the gender select.
pub const GENDERS: [(&str, &str); 3] = [("male", "Male"), ("female", "Female"), ("other", "Other")];

/// `(value, label)` pairs for the occasion select.
pub const OCCASIONS: [(&str, &str); 6] = [
    ("work", "Work/Office"),
    ("wedding", "Wedding"),
    ("party", "Party/Night Out"),
    ("date", "Date Night"),
    ("interview", "Job Interview"),
    ("vacation", "Vacation"),
];

const NOT_PROVIDED: &str = "Not provided";
const NONE_SELECTED: &str = "None selected";

/// Skin tone picked on the Style step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkinTone {
    Light,
    Medium,
    Dark,
    Olive,
    Tan,
}

impl SkinTone {
    pub const ALL: [SkinTone; 5] = [
        SkinTone::Light,
        SkinTone::Medium,
        SkinTone::Dark,
        SkinTone::Olive,
        SkinTone::Tan,
    ];

    /// Swatch color used by the front end.
    pub fn swatch(&self) -> &'static str {
        match self {
            Self::Light => "#f5d0b9",
            Self::Medium => "#e5b887",
            Self::Dark => "#8d5524",
            Self::Olive => "#b5a642",
            Self::Tan => "#d2b48c",
        }
    }
}

impl std::fmt::Display for SkinTone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Light => "Light",
            Self::Medium => "Medium",
            Self::Dark => "Dark",
            Self::Olive => "Olive",
            Self::Tan => "Tan",
        };
        write!(f, "{s}")
    }
}

/// Scalar text fields of the profile that `set_field` may overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProfileField {
    Name,
    Gender,
    Height,
    Weight,
    #[serde(alias = "weather_location")]
    WeatherLocation,
    Occasion,
}

impl std::str::FromStr for ProfileField {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "gender" => Ok(Self::Gender),
            "height" => Ok(Self::Height),
            "weight" => Ok(Self::Weight),
            "weatherLocation" | "weather_location" => Ok(Self::WeatherLocation),
            "occasion" => Ok(Self::Occasion),
            other => Err(SessionError::InvalidField(other.to_string())),
        }
    }
}

/// Multi-select fields of the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectionField {
    PreferredColors,
    StylePreferences,
}

/// Everything collected by the Style Journey.
///
/// Numeric inputs (height, weight) are kept as the raw text the user typed.
/// No field is mandatory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleProfile {
    pub name: String,
    pub gender: String,
    pub height: String,
    pub weight: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skin_tone: Option<SkinTone>,
    /// First-selected-first order.
    pub preferred_colors: Vec<String>,
    /// First-selected-first order.
    pub style_preferences: Vec<String>,
    pub weather_location: String,
    pub occasion: String,
}

/// One row of the review step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewLine {
    pub label: &'static str,
    pub value: String,
}

impl ReviewLine {
    fn new(label: &'static str, value: String) -> Self {
        Self { label, value }
    }
}

impl StyleProfile {
    pub fn field(&self, field: ProfileField) -> &str {
        match field {
            ProfileField::Name => &self.name,
            ProfileField::Gender => &self.gender,
            ProfileField::Height => &self.height,
            ProfileField::Weight => &self.weight,
            ProfileField::WeatherLocation => &self.weather_location,
            ProfileField::Occasion => &self.occasion,
        }
    }

    pub fn set_field(&mut self, field: ProfileField, value: impl Into<String>) {
        let slot = match field {
            ProfileField::Name => &mut self.name,
            ProfileField::Gender => &mut self.gender,
            ProfileField::Height => &mut self.height,
            ProfileField::Weight => &mut self.weight,
            ProfileField::WeatherLocation => &mut self.weather_location,
            ProfileField::Occasion => &mut self.occasion,
        };
        *slot = value.into();
    }

    pub fn selection(&self, field: SelectionField) -> &[String] {
        match field {
            SelectionField::PreferredColors => &self.preferred_colors,
            SelectionField::StylePreferences => &self.style_preferences,
        }
    }

    /// Remove `value` if present, otherwise append it. Returns whether it is
    /// now selected.
    pub fn toggle(&mut self, field: SelectionField, value: &str) -> bool {
        let list = match field {
            SelectionField::PreferredColors => &mut self.preferred_colors,
            SelectionField::StylePreferences => &mut self.style_preferences,
        };
        toggle_member(list, value)
    }

    /// Rows rendered on the review step.
    pub fn review_lines(&self) -> Vec<ReviewLine> {
        let text = |field: ProfileField| {
            let value = self.field(field);
            if value.is_empty() {
                NOT_PROVIDED.to_string()
            } else {
                value.to_string()
            }
        };
        let measure = |field: ProfileField, unit: &str| {
            let value = self.field(field);
            if value.is_empty() {
                NOT_PROVIDED.to_string()
            } else {
                format!("{value} {unit}")
            }
        };
        let list = |field: SelectionField| {
            let items = self.selection(field);
            if items.is_empty() {
                NONE_SELECTED.to_string()
            } else {
                items.join(", ")
            }
        };
        let skin_tone = self
            .skin_tone
            .map(|t| t.to_string())
            .unwrap_or_else(|| NOT_PROVIDED.to_string());
        let styles = list(SelectionField::StylePreferences);
        let colors = list(SelectionField::PreferredColors);

        vec![
            ReviewLine::new("Name", text(ProfileField::Name)),
            ReviewLine::new("Gender", text(ProfileField::Gender)),
            ReviewLine::new("Height", measure(ProfileField::Height, "cm")),
            ReviewLine::new("Weight", measure(ProfileField::Weight, "kg")),
            ReviewLine::new("Skin Tone", skin_tone),
            ReviewLine::new("Preferred Styles", styles),
            ReviewLine::new("Preferred Colors", colors),
            ReviewLine::new("Location", text(ProfileField::WeatherLocation)),
            ReviewLine::new("Occasion", text(ProfileField::Occasion)),
        ]
    }
}

/// Order-preserving set toggle over a `Vec`.
pub fn toggle_member(list: &mut Vec<String>, value: &str) -> bool {
    if let Some(pos) = list.iter().position(|v| v == value) {
        list.remove(pos);
        false
    } else {
        list.push(value.to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn default_profile_is_empty() {
        let p = StyleProfile::default();
        assert!(p.name.is_empty());
        assert!(p.skin_tone.is_none());
        assert!(p.preferred_colors.is_empty());
        assert!(p.style_preferences.is_empty());
    }

    #[test]
    fn toggle_appends_then_removes_preserving_order() {
        let mut list = strings(&["Red", "Blue", "Green"]);
        assert!(!toggle_member(&mut list, "Blue"));
        assert_eq!(list, strings(&["Red", "Green"]));
        assert!(toggle_member(&mut list, "Blue"));
        assert_eq!(list, strings(&["Red", "Green", "Blue"]));
    }

    #[test]
    fn toggle_twice_restores_absent_value() {
        for value in ["Casual", "Bohemian", "Not-in-catalog"] {
            let mut p = StyleProfile {
                style_preferences: strings(&["Formal", "Vintage", "Sporty"]),
                ..Default::default()
            };
            let before = p.clone();
            assert!(p.toggle(SelectionField::StylePreferences, value));
            assert!(!p.toggle(SelectionField::StylePreferences, value));
            assert_eq!(p, before);
        }
    }

    #[test]
    fn toggle_twice_restores_last_selected() {
        let mut p = StyleProfile {
            preferred_colors: strings(&["Red", "Pink"]),
            ..Default::default()
        };
        p.toggle(SelectionField::PreferredColors, "Pink");
        p.toggle(SelectionField::PreferredColors, "Pink");
        assert_eq!(p.selection(SelectionField::PreferredColors), strings(&["Red", "Pink"]));
    }

    #[test]
    fn reselecting_moves_to_end() {
        let mut list = strings(&["Formal", "Vintage", "Sporty"]);
        toggle_member(&mut list, "Vintage");
        toggle_member(&mut list, "Vintage");
        assert_eq!(list, strings(&["Formal", "Sporty", "Vintage"]));
    }

    #[test]
    fn set_field_overwrites_raw_value() {
        let mut p = StyleProfile::default();
        p.set_field(ProfileField::Height, "172.5");
        p.set_field(ProfileField::WeatherLocation, "Tokyo, Japan");
        p.set_field(ProfileField::Height, "");
        assert_eq!(p.field(ProfileField::Height), "");
        assert_eq!(p.field(ProfileField::WeatherLocation), "Tokyo, Japan");
    }

    #[test]
    fn profile_field_parses_both_spellings() {
        assert_eq!(
            "weatherLocation".parse::<ProfileField>().unwrap(),
            ProfileField::WeatherLocation
        );
        assert_eq!(
            "weather_location".parse::<ProfileField>().unwrap(),
            ProfileField::WeatherLocation
        );
        assert!(matches!(
            "skinTone".parse::<ProfileField>(),
            Err(SessionError::InvalidField(f)) if f == "skinTone"
        ));
    }

    #[test]
    fn review_lines_fill_missing_values() {
        let p = StyleProfile {
            name: "Ada".to_string(),
            height: "170".to_string(),
            preferred_colors: strings(&["Black", "White"]),
            ..Default::default()
        };
        let lines = p.review_lines();
        let value = |label: &str| lines.iter().find(|l| l.label == label).unwrap().value.clone();
        assert_eq!(value("Name"), "Ada");
        assert_eq!(value("Gender"), "Not provided");
        assert_eq!(value("Height"), "170 cm");
        assert_eq!(value("Weight"), "Not provided");
        assert_eq!(value("Skin Tone"), "Not provided");
        assert_eq!(value("Preferred Colors"), "Black, White");
        assert_eq!(value("Preferred Styles"), "None selected");
    }

    #[test]
    fn profile_serializes_camel_case() {
        let p = StyleProfile {
            skin_tone: Some(SkinTone::Olive),
            weather_location: "Lisbon".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["skinTone"], "Olive");
        assert_eq!(json["weatherLocation"], "Lisbon");
        assert!(json["preferredColors"].as_array().unwrap().is_empty());
    }

    #[test]
    fn skin_tone_swatches_are_distinct() {
        let mut swatches: Vec<&str> = SkinTone::ALL.iter().map(|t| t.swatch()).collect();
        swatches.sort();
        swatches.dedup();
        assert_eq!(swatches.len(), SkinTone::ALL.len());
    }
}
