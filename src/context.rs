use crate::types::{format_score, mood_average, Profile};

const CONTEXT_MOODS: usize = 7;
const CONTEXT_ENTRIES: usize = 5;
const ENTRY_PREVIEW_CHARS: usize = 50;

/// Summarizes the profile for the remote prompt: name, the last moods with
/// their average and short previews of the last entries. Empty sections are
/// left out, so a fresh profile produces an empty string.
pub(crate) fn build_context(profile: &Profile) -> String {
    let mut sections = Vec::new();

    if !profile.name.is_empty() {
        sections.push(format!("User's name: {}.", profile.name));
    }

    let moods = profile.recent_moods(CONTEXT_MOODS);
    if let Some(average) = mood_average(moods) {
        let values: Vec<&str> = moods.iter().map(|m| m.value.as_str()).collect();
        sections.push(format!(
            "Recent moods: {} (average {}/5).",
            values.join(", "),
            format_score(average)
        ));
    }

    let entries = profile.recent_entries(CONTEXT_ENTRIES);
    if !entries.is_empty() {
        let previews: Vec<String> = entries.iter().map(|e| preview(&e.content)).collect();
        sections.push(format!("Recent entries: {}", previews.join("; ")));
    }

    sections.join("\n")
}

fn preview(content: &str) -> String {
    match content.char_indices().nth(ENTRY_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Entry, EntryKind, Mood, MoodEntry, MoodTag};
    use chrono::Utc;

    fn with_entry(profile: &mut Profile, content: &str) {
        profile.entries.push(Entry {
            kind: EntryKind::Message,
            content: content.to_string(),
            timestamp: Utc::now(),
        });
    }

    fn with_mood(profile: &mut Profile, value: Mood) {
        profile.moods.push(MoodEntry {
            kind: MoodTag::Mood,
            value,
            timestamp: Utc::now(),
        });
    }

    #[test]
    fn empty_profile_has_no_context() {
        assert_eq!(build_context(&Profile::default()), "");
    }

    #[test]
    fn long_entries_are_cut_at_fifty_chars() {
        let mut profile = Profile::default();
        let long = "a".repeat(50) + "bcdef";
        with_entry(&mut profile, &long);
        with_entry(&mut profile, &"x".repeat(50));

        let context = build_context(&profile);

        let expected = format!("Recent entries: {}...; {}", "a".repeat(50), "x".repeat(50));
        assert_eq!(context, expected);
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let content = "é".repeat(60);
        assert_eq!(preview(&content), format!("{}...", "é".repeat(50)));
    }

    #[test]
    fn includes_name_moods_and_last_five_entries() {
        let mut profile = Profile {
            name: "Sam".to_string(),
            ..Default::default()
        };
        with_mood(&mut profile, Mood::Great);
        with_mood(&mut profile, Mood::Low);
        for i in 0..7 {
            with_entry(&mut profile, &format!("note {i}"));
        }

        let context = build_context(&profile);

        assert_eq!(
            context,
            "User's name: Sam.\n\
             Recent moods: great, low (average 3.5/5).\n\
             Recent entries: note 2; note 3; note 4; note 5; note 6"
        );
    }

    #[test]
    fn only_last_seven_moods_count() {
        let mut profile = Profile::default();
        for _ in 0..3 {
            with_mood(&mut profile, Mood::Stressed);
        }
        for _ in 0..7 {
            with_mood(&mut profile, Mood::Great);
        }

        assert!(build_context(&profile).ends_with("(average 5.0/5)."));
    }
}
