use chrono::Utc;

use crate::companion::{Companion, Reply};
use crate::dashboard::Dashboard;
use crate::error::AppError;
use crate::store::ProfileStore;
use crate::types::{ChatTurn, Entry, EntryKind, Mood, MoodEntry, MoodTag, Profile, Role, Theme};

/// Every way the profile can change.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Action {
    SetName(String),
    SetTheme(Theme),
    RecordMood(Mood),
    QuickCapture(String),
    /// A chat message: logged as an entry and as a user turn.
    UserMessage(String),
    AssistantReply(String),
    ClearAll,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Outcome {
    Updated,
    /// Empty input; nothing was recorded.
    Ignored,
    MoodRecorded(Mood),
    Captured,
    Cleared,
}

impl Outcome {
    /// Confirmation line for the user, if this outcome has one.
    pub fn confirmation(&self) -> Option<String> {
        match self {
            Outcome::MoodRecorded(mood) => Some(format!("Mood recorded: {} {}", mood.emoji(), mood)),
            Outcome::Captured => Some("Thought captured! 📝".to_string()),
            Outcome::Cleared => Some("All data cleared.".to_string()),
            Outcome::Updated | Outcome::Ignored => None,
        }
    }
}

/// Result of one conversation turn. `save_error` carries the first failed
/// save; the turn itself still completes in memory.
#[derive(Debug)]
pub(crate) enum Exchange {
    Ignored,
    Replied {
        reply: Reply,
        save_error: Option<AppError>,
    },
}

/// Owns the profile and its store. All mutations go through [`App::update`],
/// which persists the whole profile after each accepted change.
pub(crate) struct App {
    profile: Profile,
    store: ProfileStore,
}

impl App {
    pub fn open(store: ProfileStore) -> Self {
        let profile = store.load();
        Self { profile, store }
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn dashboard(&self) -> Dashboard {
        Dashboard::compute(&self.profile, Utc::now())
    }

    pub fn update(&mut self, action: Action) -> Result<Outcome, AppError> {
        let now = Utc::now();
        let outcome = match action {
            Action::SetName(name) => {
                self.profile.name = name.trim().to_string();
                Outcome::Updated
            }
            Action::SetTheme(theme) => {
                self.profile.settings.theme = theme;
                Outcome::Updated
            }
            Action::RecordMood(value) => {
                self.profile.moods.push(MoodEntry {
                    kind: MoodTag::Mood,
                    value: value.clone(),
                    timestamp: now,
                });
                Outcome::MoodRecorded(value)
            }
            Action::QuickCapture(content) => {
                let Some(content) = non_empty(content) else {
                    return Ok(Outcome::Ignored);
                };
                self.profile.entries.push(Entry {
                    kind: EntryKind::QuickCapture,
                    content,
                    timestamp: now,
                });
                Outcome::Captured
            }
            Action::UserMessage(content) => {
                let Some(content) = non_empty(content) else {
                    return Ok(Outcome::Ignored);
                };
                self.profile.entries.push(Entry {
                    kind: EntryKind::Message,
                    content: content.clone(),
                    timestamp: now,
                });
                self.profile.history.push(ChatTurn {
                    role: Role::User,
                    content,
                });
                Outcome::Updated
            }
            // Replies go to the conversation history only; `entries` holds
            // what the user wrote.
            Action::AssistantReply(content) => {
                self.profile.history.push(ChatTurn {
                    role: Role::Assistant,
                    content,
                });
                Outcome::Updated
            }
            Action::ClearAll => {
                self.store.clear()?;
                self.profile = Profile::default();
                tracing::info!("cleared all data");
                return Ok(Outcome::Cleared);
            }
        };

        self.store.save(&self.profile)?;
        Ok(outcome)
    }

    /// Runs one conversation turn. Holding `&mut self` for the whole turn
    /// means a second send cannot start while a reply is pending.
    /// Save failures do not interrupt the turn.
    pub async fn send(&mut self, companion: &Companion, message: &str) -> Exchange {
        let message = message.trim();
        if message.is_empty() {
            tracing::debug!("ignored empty message");
            return Exchange::Ignored;
        }

        let mut save_error = self.update(Action::UserMessage(message.to_string())).err();

        let reply = companion.respond(&self.profile, message).await;
        tracing::info!(source = ?reply.source, "assistant replied");

        if let Err(err) = self.update(Action::AssistantReply(reply.content.clone())) {
            save_error.get_or_insert(err);
        }
        if let Some(err) = &save_error {
            tracing::warn!("conversation turn was not saved: {}", err);
        }
        Exchange::Replied { reply, save_error }
    }
}

fn non_empty(content: String) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::companion::ReplySource;
    use crate::fallback::CATEGORIES;
    use crate::store;
    use tempfile::TempDir;

    fn open(dir: &TempDir) -> App {
        App::open(ProfileStore::in_dir(dir.path()))
    }

    #[test]
    fn n_appends_give_n_entries_and_persist() {
        let dir = TempDir::new().unwrap();
        let mut app = open(&dir);

        for i in 0..9 {
            let action = if i % 3 == 0 {
                Action::QuickCapture(format!("capture {i}"))
            } else {
                Action::UserMessage(format!("message {i}"))
            };
            app.update(action).unwrap();
        }

        assert_eq!(app.profile().entries.len(), 9);
        assert_eq!(app.dashboard().entry_count, 9);
        assert_eq!(open(&dir).profile().entries.len(), 9);
        assert_eq!(app.profile().entries[3].content, "capture 3");
    }

    #[test]
    fn blank_input_is_ignored_without_a_record() {
        let dir = TempDir::new().unwrap();
        let mut app = open(&dir);

        assert_eq!(app.update(Action::QuickCapture("   ".into())).unwrap(), Outcome::Ignored);
        assert_eq!(app.update(Action::UserMessage(String::new())).unwrap(), Outcome::Ignored);

        assert!(app.profile().entries.is_empty());
        assert!(app.profile().history.is_empty());
        assert!(!ProfileStore::in_dir(dir.path()).path().exists());
    }

    #[test]
    fn mood_outcome_has_confirmation() {
        let dir = TempDir::new().unwrap();
        let mut app = open(&dir);

        let outcome = app.update(Action::RecordMood(Mood::Good)).unwrap();

        assert_eq!(outcome.confirmation().unwrap(), "Mood recorded: 🙂 good");
        assert_eq!(app.profile().moods.len(), 1);
        assert_eq!(open(&dir).profile().moods[0].value, Mood::Good);
    }

    #[test]
    fn settings_changes_persist() {
        let dir = TempDir::new().unwrap();
        let mut app = open(&dir);

        app.update(Action::SetName("  Sam ".into())).unwrap();
        app.update(Action::SetTheme(Theme::Dark)).unwrap();

        let reloaded = open(&dir);
        assert_eq!(reloaded.profile().name, "Sam");
        assert_eq!(reloaded.profile().settings.theme, Theme::Dark);
    }

    #[test]
    fn clear_all_resets_profile_and_slot() {
        let dir = TempDir::new().unwrap();
        let mut app = open(&dir);
        app.update(Action::QuickCapture("something".into())).unwrap();

        assert_eq!(app.update(Action::ClearAll).unwrap(), Outcome::Cleared);

        assert_eq!(app.profile(), &Profile::default());
        assert!(!ProfileStore::in_dir(dir.path()).path().exists());
    }

    #[tokio::test]
    async fn offline_send_appends_one_assistant_turn() {
        let dir = TempDir::new().unwrap();
        let mut app = open(&dir);

        let exchange = app
            .send(&Companion::offline(), "I feel really anxious about tomorrow")
            .await;

        let Exchange::Replied { reply, save_error } = exchange else {
            panic!("expected a reply");
        };
        assert!(save_error.is_none());
        assert_eq!(reply.content, CATEGORIES[0].reply);
        assert_eq!(reply.source, ReplySource::Fallback);

        let history = &app.profile().history;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(
            history.iter().filter(|t| t.role == Role::Assistant).count(),
            1
        );
        assert_eq!(history[1].content, CATEGORIES[0].reply);
        assert_eq!(app.profile().entries.len(), 1);
        assert_eq!(open(&dir).profile().history.len(), 2);
    }

    #[tokio::test]
    async fn empty_send_creates_nothing() {
        let dir = TempDir::new().unwrap();
        let mut app = open(&dir);

        let exchange = app.send(&Companion::offline(), "  \n").await;

        assert!(matches!(exchange, Exchange::Ignored));
        assert!(app.profile().history.is_empty());
    }

    #[tokio::test]
    async fn unwritable_slot_still_completes_the_turn() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        let mut app = App::open(ProfileStore::in_dir(&blocker));

        let exchange = app.send(&Companion::offline(), "so tired today").await;

        let Exchange::Replied { reply, save_error } = exchange else {
            panic!("expected a reply");
        };
        assert_eq!(reply.content, CATEGORIES[3].reply);
        assert!(matches!(save_error, Some(AppError::Store(_))));
        let history = &app.profile().history;
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(app.profile().entries.len(), 1);
    }

    #[test]
    fn export_after_updates_contains_all_records() {
        let dir = TempDir::new().unwrap();
        let mut app = open(&dir);
        for text in ["one", "two", "three"] {
            app.update(Action::UserMessage(text.into())).unwrap();
        }
        app.update(Action::RecordMood(Mood::Low)).unwrap();
        app.update(Action::RecordMood(Mood::Great)).unwrap();

        let path = store::export(app.profile(), dir.path(), Utc::now().date_naive()).unwrap();

        let doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(doc["entries"].as_array().unwrap().len(), 3);
        assert_eq!(doc["moods"].as_array().unwrap().len(), 2);
    }
}
