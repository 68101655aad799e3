//! Conversation model and request normalization.
//!
//! Incoming requests carry an ordered list of [`ChatMessage`]s plus an
//! optional [`UserContext`]. The provider has no native system role, so
//! [`normalize`] folds all system content (the built-in wellness preamble,
//! caller-supplied system messages, and any personalization) into the first
//! user turn before the conversation goes upstream.

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

/// Role of a message inside a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn of a conversation, as supplied by the caller.
///
/// Immutable once constructed; the ordered sequence forms the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Optional per-request context used for personalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserContext {
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub mood_history: Vec<String>,
}

impl UserContext {
    /// Returns the most recent mood label, if any.
    pub fn latest_mood(&self) -> Option<&str> {
        self.mood_history.last().map(String::as_str)
    }
}

/// Provider-facing role. The provider only understands `user` and `model`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    User,
    Model,
}

/// One provider-facing turn after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTurn {
    pub role: PromptRole,
    pub text: String,
}

/// Output of [`normalize`]: the provider-shaped conversation plus whether
/// any personalization was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPrompt {
    pub turns: Vec<PromptTurn>,
    pub personalized: bool,
}

/// Built-in supportive-counselor preamble prepended to every conversation.
const WELLNESS_PREAMBLE: &str = "You are a warm, supportive mental-wellness companion. \
Listen carefully, validate feelings, and offer gentle, practical suggestions such as \
breathing exercises, journaling, or grounding techniques. Keep replies concise and \
conversational. You are not a medical professional and must never diagnose; if the \
user mentions self-harm or crisis, encourage them to reach out to a crisis line or a \
trusted person immediately.";

/// Converts a caller conversation into provider turns.
///
/// System content is merged into the first user turn (the provider has no
/// system role): the wellness preamble comes first, then caller-supplied
/// system messages in order, then personalization derived from `ctx`, and
/// finally the original user text. Assistant turns map to the provider's
/// `model` role. A conversation with no user turn gets a synthetic leading
/// user turn carrying only the merged system content.
pub fn normalize(messages: &[ChatMessage], ctx: Option<&UserContext>) -> NormalizedPrompt {
    let mut preamble_parts: Vec<String> = vec![WELLNESS_PREAMBLE.to_string()];

    for msg in messages {
        if msg.role == Role::System && !msg.content.trim().is_empty() {
            preamble_parts.push(msg.content.trim().to_string());
        }
    }

    let mut personalized = false;
    if let Some(ctx) = ctx {
        let mut notes: Vec<String> = Vec::new();
        if let Some(name) = ctx.user_name.as_deref().filter(|n| !n.trim().is_empty()) {
            notes.push(format!("The user's name is {}.", name.trim()));
        }
        if let Some(mood) = ctx.latest_mood().filter(|m| !m.trim().is_empty()) {
            notes.push(format!("They recently described their mood as \"{}\".", mood.trim()));
        }
        if !notes.is_empty() {
            personalized = true;
            preamble_parts.push(notes.join(" "));
        }
    }

    let preamble = preamble_parts.join("\n\n");

    let mut turns: Vec<PromptTurn> = Vec::with_capacity(messages.len());
    let mut preamble_pending = true;

    for msg in messages {
        match msg.role {
            Role::System => {}
            Role::User => {
                let text = if preamble_pending {
                    preamble_pending = false;
                    format!("{}\n\n{}", preamble, msg.content)
                } else {
                    msg.content.clone()
                };
                turns.push(PromptTurn {
                    role: PromptRole::User,
                    text,
                });
            }
            Role::Assistant => {
                turns.push(PromptTurn {
                    role: PromptRole::Model,
                    text: msg.content.clone(),
                });
            }
        }
    }

    // No user turn anywhere: the merged system content still has to reach
    // the provider as a user turn.
    if preamble_pending {
        turns.insert(
            0,
            PromptTurn {
                role: PromptRole::User,
                text: preamble,
            },
        );
    }

    NormalizedPrompt {
        turns,
        personalized,
    }
}
