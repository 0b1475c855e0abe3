use std::fmt::Display;
use std::sync::Arc;

use crate::client::ChatBackend;
use crate::context::build_context;
use crate::error::RemoteError;
use crate::fallback::local_reply;
use crate::types::{ChatTurn, Profile, Role};

/// Turns sent to the remote endpoint; older history stays on disk only.
pub(crate) const HISTORY_WINDOW: usize = 10;

static SYSTEM_PROMPT: &str = "You are LifeSync, a warm and supportive journaling companion. \
Help the user reflect on their thoughts, moods and decisions. \
Keep replies short, kind and curious, and ask at most one question at a time.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReplySource {
    Remote,
    Fallback,
}

/// User-visible copy for remote failures that deserve more than a silent fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Notice {
    ConfigurationIssue,
    Busy,
}

impl Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Notice::ConfigurationIssue => {
                "There's a configuration issue with the AI service, so I'm using offline replies for now."
            }
            Notice::Busy => "The AI service is busy right now. Please try again in a moment.",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Reply {
    pub content: String,
    pub source: ReplySource,
    pub notice: Option<Notice>,
}

/// Produces assistant replies, remotely when a backend is configured and
/// locally otherwise or whenever the remote call fails.
pub(crate) struct Companion {
    backend: Option<Arc<dyn ChatBackend>>,
}

impl Companion {
    pub fn new(backend: Option<Arc<dyn ChatBackend>>) -> Self {
        Self { backend }
    }

    pub fn offline() -> Self {
        Self { backend: None }
    }

    pub fn is_remote(&self) -> bool {
        self.backend.is_some()
    }

    /// Replies to `message`. `profile.history` is expected to already end with
    /// the user's turn for `message`. Never fails; each remote failure is
    /// handled once, without retrying.
    pub async fn respond(&self, profile: &Profile, message: &str) -> Reply {
        let Some(backend) = &self.backend else {
            return Self::fallback(message, None);
        };

        match backend.complete(prompt_messages(profile)).await {
            Ok(content) => Reply {
                content,
                source: ReplySource::Remote,
                notice: None,
            },
            Err(err) => {
                let notice = match &err {
                    RemoteError::Unauthorized(_) => Some(Notice::ConfigurationIssue),
                    RemoteError::RateLimited => Some(Notice::Busy),
                    _ => None,
                };
                tracing::warn!("remote reply failed, using local reply: {}", err);
                Self::fallback(message, notice)
            }
        }
    }

    fn fallback(message: &str, notice: Option<Notice>) -> Reply {
        Reply {
            content: local_reply(message, &mut rand::thread_rng()).to_string(),
            source: ReplySource::Fallback,
            notice,
        }
    }
}

/// System prompt, then the profile context, then the most recent turns.
pub(crate) fn prompt_messages(profile: &Profile) -> Vec<ChatTurn> {
    let mut messages = vec![ChatTurn {
        role: Role::System,
        content: SYSTEM_PROMPT.to_string(),
    }];

    let context = build_context(profile);
    if !context.is_empty() {
        messages.push(ChatTurn {
            role: Role::System,
            content: format!("Context about the user:\n{}", context),
        });
    }

    let start = profile.history.len().saturating_sub(HISTORY_WINDOW);
    messages.extend(profile.history[start..].iter().cloned());
    messages
}
