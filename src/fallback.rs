use rand::seq::SliceRandom;
use rand::Rng;

pub(crate) struct Category {
    pub name: &'static str,
    keywords: &'static [&'static str],
    pub reply: &'static str,
}

/// Checked top to bottom; the first category with a keyword in the message wins.
pub(crate) static CATEGORIES: &[Category] = &[
    Category {
        name: "anxiety",
        keywords: &["anxious", "anxiety", "worried"],
        reply: "I hear you're feeling anxious. That's completely valid. 💙 Would you like to explore what's triggering these feelings? Sometimes writing it out helps us see things more clearly.",
    },
    Category {
        name: "happiness",
        keywords: &["happy", "great", "excited"],
        reply: "That's wonderful! 🎉 I love hearing about the good moments. What's contributing to this positive feeling? I'll remember this so we can identify patterns in what brings you joy.",
    },
    Category {
        name: "decision",
        keywords: &["decision", "decide", "choose"],
        reply: "Making decisions can be challenging. Let's break this down together. 🤔 What are your options, and what matters most to you in this choice? I'll save this so we can review the outcome later.",
    },
    Category {
        name: "fatigue",
        keywords: &["tired", "exhausted", "sleep"],
        reply: "Rest is so important for mental clarity. 😴 Have you noticed any patterns in what affects your energy levels? I can help track this over time.",
    },
    Category {
        name: "goal",
        keywords: &["goal", "want to", "wish"],
        reply: "Setting intentions is powerful! ✨ I've noted this as something important to you. What's one small step you could take toward this today?",
    },
    Category {
        name: "sadness",
        keywords: &["sad", "lonely", "depressed", "upset"],
        reply: "I'm sorry you're feeling down. 🫂 It's okay to sit with these feelings for a while. Would it help to talk about what's been weighing on you?",
    },
    Category {
        name: "stress",
        keywords: &["stress", "overwhelm", "pressure", "too much"],
        reply: "It sounds like a lot is on your plate right now. 🌿 Let's take it one piece at a time. What feels most urgent, and what could wait until later?",
    },
];

pub(crate) static GENERIC_REPLIES: &[&str] = &[
    "Thank you for sharing that with me. 💭 I'm here to listen and help you understand your patterns over time. Tell me more about how this makes you feel.",
    "I appreciate you opening up. 🌱 Every thought you share helps me understand you better. What else is on your mind?",
    "That's really insightful. 💡 I'm noting this as part of your journey. How does reflecting on this make you feel?",
    "I'm listening. 🎯 Your thoughts and feelings matter. Is there anything specific you'd like to explore about this?",
];

pub(crate) fn match_category(message: &str) -> Option<&'static Category> {
    let lower = message.to_lowercase();
    CATEGORIES
        .iter()
        .find(|c| c.keywords.iter().any(|k| lower.contains(k)))
}

/// Canned reply for `message`: the matching category's reply, or a random
/// generic acknowledgement.
pub(crate) fn local_reply<R: Rng + ?Sized>(message: &str, rng: &mut R) -> &'static str {
    match match_category(message) {
        Some(category) => {
            tracing::debug!(category = category.name, "matched fallback category");
            category.reply
        }
        None => GENERIC_REPLIES.choose(rng).copied().unwrap_or(GENERIC_REPLIES[0]),
    }
}
