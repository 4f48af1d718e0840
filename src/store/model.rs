//! Persisted records: cards, feedback entries and user accounts
//!
//! These shapes are what both store backends read and write. Field names are
//! the on-disk JSON names.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Store-assigned card identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(String);

impl CardId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CardId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Content identity of a card: the (question, subject, topic) triple.
///
/// History recorded before cards carried ids can only be matched this way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentKey<'a> {
    pub question: &'a str,
    pub subject: &'a str,
    pub topic: &'a str,
}

/// Which card collection an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection<'a> {
    /// Administrator-curated pool visible to every user
    Shared,
    /// A single user's own cards
    User(&'a str),
}

impl fmt::Display for Collection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collection::Shared => f.write_str("shared pool"),
            Collection::User(name) => write!(f, "{name}'s cards"),
        }
    }
}

/// Validation failures for card content
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CardError {
    /// A content field is empty after trimming
    #[error("The {0} field must not be empty")]
    EmptyField(&'static str),
}

/// A question/expected-answer study unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Store-assigned identifier
    pub id: CardId,
    pub subject: String,
    pub topic: String,
    pub question: String,
    pub expected_answer: String,
}

impl Card {
    /// Build a card from validated content
    pub fn new(id: CardId, draft: CardDraft) -> Self {
        Self {
            id,
            subject: draft.subject,
            topic: draft.topic,
            question: draft.question,
            expected_answer: draft.expected_answer,
        }
    }

    pub fn content_key(&self) -> ContentKey<'_> {
        ContentKey { question: &self.question, subject: &self.subject, topic: &self.topic }
    }

    /// Replace the content, keeping the id
    pub fn apply(&mut self, draft: CardDraft) {
        self.subject = draft.subject;
        self.topic = draft.topic;
        self.question = draft.question;
        self.expected_answer = draft.expected_answer;
    }
}

/// Card content as entered by the user, before the store assigns an id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardDraft {
    pub subject: String,
    pub topic: String,
    pub question: String,
    pub expected_answer: String,
}

impl CardDraft {
    pub fn new(
        subject: impl Into<String>,
        topic: impl Into<String>,
        question: impl Into<String>,
        expected_answer: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            topic: topic.into(),
            question: question.into(),
            expected_answer: expected_answer.into(),
        }
    }

    /// Trim every field and reject empty ones
    pub fn validate(self) -> Result<Self, CardError> {
        let field = |value: String, name: &'static str| {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Err(CardError::EmptyField(name))
            } else {
                Ok(trimmed.to_string())
            }
        };

        Ok(Self {
            subject: field(self.subject, "subject")?,
            topic: field(self.topic, "topic")?,
            question: field(self.question, "question")?,
            expected_answer: field(self.expected_answer, "expected answer")?,
        })
    }
}

impl From<&Card> for CardDraft {
    fn from(card: &Card) -> Self {
        Self {
            subject: card.subject.clone(),
            topic: card.topic.clone(),
            question: card.question.clone(),
            expected_answer: card.expected_answer.clone(),
        }
    }
}

/// One graded attempt, as kept in a user's history log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    /// Id of the answered card; absent in history recorded before ids existed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_id: Option<CardId>,
    pub subject: String,
    pub topic: String,
    pub question: String,
    /// Meaning score (0-100) extracted from the grader's reply
    pub score: Option<u32>,
    pub content_gaps: Option<String>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
}

impl FeedbackEntry {
    /// Record an attempt at `card` made now
    pub fn for_card(card: &Card, score: Option<u32>, content_gaps: Option<String>) -> Self {
        Self {
            card_id: Some(card.id.clone()),
            subject: card.subject.clone(),
            topic: card.topic.clone(),
            question: card.question.clone(),
            score,
            content_gaps,
            timestamp: Utc::now(),
        }
    }

    pub fn content_key(&self) -> ContentKey<'_> {
        ContentKey { question: &self.question, subject: &self.subject, topic: &self.topic }
    }
}

mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, de::Error};

    /// Accept RFC 3339 instants and offset-less ISO-8601 local times (read as UTC)
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(D::Error::custom)
    }
}

/// A registered account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    /// PHC-format argon2 hash, or a legacy hex SHA-256 digest
    pub password_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}
