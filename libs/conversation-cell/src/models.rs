use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }
}

/// Appends one user/assistant exchange and keeps only the newest `max_turns`.
pub fn append_exchange(
    mut transcript: Vec<ChatTurn>,
    user: &str,
    assistant: &str,
    max_turns: usize,
) -> Vec<ChatTurn> {
    transcript.push(ChatTurn::user(user));
    transcript.push(ChatTurn::assistant(assistant));

    if transcript.len() > max_turns {
        transcript.drain(..transcript.len() - max_turns);
    }
    transcript
}

/// Row of the `conversations` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub phone: String,
    /// JSON-encoded `Vec<ChatTurn>`.
    pub transcript: String,
    pub last_updated_at: DateTime<Utc>,
    pub snoozed_until: Option<DateTime<Utc>>,
}

impl ConversationRecord {
    pub fn is_snoozed(&self, now: DateTime<Utc>) -> bool {
        self.snoozed_until.is_some_and(|until| until > now)
    }

    pub fn is_stale(&self, now: DateTime<Utc>, stale_after: Duration) -> bool {
        now - self.last_updated_at >= stale_after
    }

    pub fn turns(&self) -> Vec<ChatTurn> {
        serde_json::from_str(&self.transcript).unwrap_or_else(|e| {
            warn!("Discarding unreadable transcript for {}: {}", self.phone, e);
            Vec::new()
        })
    }
}

/// Where a conversation stands when a new inbound message arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationState {
    /// A human operator took over; automated replies are suspended.
    Snoozed { until: DateTime<Utc> },
    /// First contact, or the previous exchange went stale.
    NoHistory,
    InProgress(Vec<ChatTurn>),
}

impl ConversationState {
    pub fn resolve(record: Option<&ConversationRecord>, now: DateTime<Utc>, stale_after: Duration) -> Self {
        let record = match record {
            Some(record) => record,
            None => return ConversationState::NoHistory,
        };

        if let Some(until) = record.snoozed_until.filter(|_| record.is_snoozed(now)) {
            return ConversationState::Snoozed { until };
        }

        if record.is_stale(now, stale_after) {
            return ConversationState::NoHistory;
        }

        match record.turns() {
            turns if turns.is_empty() => ConversationState::NoHistory,
            turns => ConversationState::InProgress(turns),
        }
    }

    pub fn from_history(history: Vec<ChatTurn>) -> Self {
        if history.is_empty() {
            ConversationState::NoHistory
        } else {
            ConversationState::InProgress(history)
        }
    }
}

/// Result of one orchestrated turn, ready to be persisted by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    pub reply: String,
    pub transcript: Vec<ChatTurn>,
}
