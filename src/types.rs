use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Entry type. Types this client never writes are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub(crate) enum EntryKind {
    Message,
    QuickCapture,
    Other(String),
}

impl From<String> for EntryKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "message" => EntryKind::Message,
            "quick_capture" => EntryKind::QuickCapture,
            _ => EntryKind::Other(value),
        }
    }
}

impl From<EntryKind> for String {
    fn from(kind: EntryKind) -> Self {
        match kind {
            EntryKind::Message => "message".to_string(),
            EntryKind::QuickCapture => "quick_capture".to_string(),
            EntryKind::Other(value) => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Entry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default)]
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// A mood check-in value. Values written by older or foreign clients are kept
/// verbatim in `Unknown` so that loading a profile never drops them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub(crate) enum Mood {
    Great,
    Good,
    Okay,
    Low,
    Stressed,
    Unknown(String),
}

impl Mood {
    pub fn score(&self) -> u32 {
        match self {
            Mood::Great => 5,
            Mood::Good => 4,
            Mood::Okay => 3,
            Mood::Low => 2,
            Mood::Stressed => 1,
            Mood::Unknown(_) => 3,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Mood::Great => "😊",
            Mood::Good => "🙂",
            Mood::Low => "😔",
            Mood::Stressed => "😰",
            Mood::Okay | Mood::Unknown(_) => "😐",
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Mood::Great => "great",
            Mood::Good => "good",
            Mood::Okay => "okay",
            Mood::Low => "low",
            Mood::Stressed => "stressed",
            Mood::Unknown(value) => value,
        }
    }
}

impl From<String> for Mood {
    fn from(value: String) -> Self {
        match value.as_str() {
            "great" => Mood::Great,
            "good" => Mood::Good,
            "okay" => Mood::Okay,
            "low" => Mood::Low,
            "stressed" => Mood::Stressed,
            _ => Mood::Unknown(value),
        }
    }
}

impl From<Mood> for String {
    fn from(mood: Mood) -> Self {
        mood.as_str().to_string()
    }
}

impl Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum MoodTag {
    #[default]
    Mood,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct MoodEntry {
    #[serde(rename = "type", default)]
    pub kind: MoodTag,
    pub value: Mood,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Theme {
    #[default]
    Light,
    Dark,
    System,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct Settings {
    #[serde(default)]
    pub theme: Theme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ChatTurn {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct Profile {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_records")]
    pub entries: Vec<Entry>,
    #[serde(default, deserialize_with = "lenient_records")]
    pub moods: Vec<MoodEntry>,
    #[serde(default)]
    pub patterns: Vec<serde_json::Value>,
    #[serde(default)]
    pub decisions: Vec<serde_json::Value>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default, deserialize_with = "lenient_records")]
    pub history: Vec<ChatTurn>,
}

/// Decodes a list one record at a time. A record that does not fit is logged
/// and skipped; the rest of the list and the profile survive.
fn lenient_records<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!("skipping unreadable saved record: {}", err);
                None
            }
        })
        .collect())
}

impl Profile {
    /// Most recent `n` moods, oldest first.
    pub fn recent_moods(&self, n: usize) -> &[MoodEntry] {
        &self.moods[self.moods.len().saturating_sub(n)..]
    }

    /// Most recent `n` entries, oldest first.
    pub fn recent_entries(&self, n: usize) -> &[Entry] {
        &self.entries[self.entries.len().saturating_sub(n)..]
    }
}

/// Arithmetic mean of the scores of `moods`, `None` when empty.
pub(crate) fn mood_average(moods: &[MoodEntry]) -> Option<f64> {
    if moods.is_empty() {
        return None;
    }
    let sum: u32 = moods.iter().map(|m| m.value.score()).sum();
    Some(sum as f64 / moods.len() as f64)
}

/// One decimal place with halves rounded up, so 3.25 reads "3.3".
pub(crate) fn format_score(score: f64) -> String {
    format!("{:.1}", (score * 10.0 + 0.5).floor() / 10.0)
}
