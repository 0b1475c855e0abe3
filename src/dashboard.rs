use std::fmt::Display;

use chrono::{DateTime, Local, Utc};

use crate::types::{format_score, mood_average, EntryKind, Profile};

const SCORE_MOODS: usize = 7;
const RECENT_ENTRIES: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecentEntry {
    pub kind: EntryKind,
    pub content: String,
    pub when: String,
}

/// Display metrics derived from the profile. Recomputed from scratch on
/// every call; pattern and growth counts are placeholder heuristics.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Dashboard {
    pub entry_count: usize,
    pub mood_count: usize,
    pub mood_score: Option<f64>,
    pub pattern_count: usize,
    pub growth_score: usize,
    pub recent: Vec<RecentEntry>,
}

impl Dashboard {
    pub fn compute(profile: &Profile, now: DateTime<Utc>) -> Self {
        let entry_count = profile.entries.len();
        let mood_count = profile.moods.len();

        let recent = profile
            .recent_entries(RECENT_ENTRIES)
            .iter()
            .rev()
            .map(|e| RecentEntry {
                kind: e.kind.clone(),
                content: e.content.clone(),
                when: relative_time(e.timestamp, now),
            })
            .collect();

        Self {
            entry_count,
            mood_count,
            mood_score: mood_average(profile.recent_moods(SCORE_MOODS)),
            pattern_count: (entry_count / 5).min(10),
            growth_score: (10 + entry_count * 2 + mood_count).min(100),
            recent,
        }
    }

    pub fn mood_score_label(&self) -> String {
        match self.mood_score {
            Some(score) => format_score(score),
            None => "--".to_string(),
        }
    }
}

impl Display for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "entries: {}", self.entry_count)?;
        writeln!(f, "mood score: {}", self.mood_score_label())?;
        writeln!(f, "patterns: {}", self.pattern_count)?;
        writeln!(f, "growth: {}", self.growth_score)?;
        if self.recent.is_empty() {
            return writeln!(f, "📝 No entries yet. Start a conversation with LifeSync!");
        }
        writeln!(f, "recent:")?;
        for entry in &self.recent {
            let icon = match &entry.kind {
                EntryKind::QuickCapture => "📝",
                EntryKind::Other(kind) if kind == "mood" => "😊",
                EntryKind::Message | EntryKind::Other(_) => "💭",
            };
            writeln!(f, "  {} {} ({})", icon, entry.content, entry.when)?;
        }
        Ok(())
    }
}

/// "Just now", "Nm ago", "Nh ago", or the local calendar date.
pub(crate) fn relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(timestamp);
    let minutes = elapsed.num_minutes();
    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if elapsed.num_hours() < 24 {
        format!("{}h ago", elapsed.num_hours())
    } else {
        timestamp
            .with_timezone(&Local)
            .format("%-m/%-d/%Y")
            .to_string()
    }
}

/// Time-of-day greeting with the user's name when set.
pub(crate) fn greeting(name: &str, hour: u32) -> String {
    let (salutation, icon) = match hour {
        0..=11 => ("Good morning", "☀️"),
        12..=16 => ("Good afternoon", "☀️"),
        _ => ("Good evening", "🌙"),
    };
    if name.is_empty() {
        format!("{}! {}", salutation, icon)
    } else {
        format!("{}, {}! {}", salutation, name, icon)
    }
}

pub(crate) fn greeting_subtitle(hour: u32) -> &'static str {
    match hour {
        0..=11 => "What's on your mind today?",
        12..=16 => "How is your day going?",
        _ => "Time to reflect on your day.",
    }
}
