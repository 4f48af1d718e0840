//! Request and response shapes of the messages API

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Models that can grade answers
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ClaudeModel {
    /// Fast and cheap; the default grader
    #[default]
    #[serde(rename = "haiku", alias = "Haiku45")]
    Haiku45,
    #[serde(rename = "haiku3", alias = "Haiku3")]
    Haiku3,
    #[serde(rename = "sonnet4", alias = "Sonnet4")]
    Sonnet4,
    #[serde(rename = "sonnet", alias = "Sonnet45")]
    Sonnet45,
    /// Most careful grading, slowest and most expensive
    #[serde(rename = "opus", alias = "Opus45")]
    Opus45,
}

impl ClaudeModel {
    const ALL: [ClaudeModel; 5] =
        [Self::Haiku45, Self::Haiku3, Self::Sonnet4, Self::Sonnet45, Self::Opus45];

    /// Identifier sent in the request body
    pub fn model_id(&self) -> &'static str {
        match self {
            Self::Haiku45 => "claude-haiku-4-5-20251001",
            Self::Haiku3 => "claude-3-haiku-20240307",
            Self::Sonnet4 => "claude-sonnet-4-20250514",
            Self::Sonnet45 => "claude-sonnet-4-5-20250929",
            Self::Opus45 => "claude-opus-4-5-20251101",
        }
    }

    /// Names accepted on the command line; the first is the one written to the config
    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::Haiku45 => &["haiku", "haiku45", "haiku4.5"],
            Self::Haiku3 => &["haiku3"],
            Self::Sonnet4 => &["sonnet4"],
            Self::Sonnet45 => &["sonnet", "sonnet45", "sonnet4.5"],
            Self::Opus45 => &["opus", "opus45", "opus4.5"],
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Haiku45 => "Claude Haiku 4.5",
            Self::Haiku3 => "Claude Haiku 3",
            Self::Sonnet4 => "Claude Sonnet 4",
            Self::Sonnet45 => "Claude Sonnet 4.5",
            Self::Opus45 => "Claude Opus 4.5",
        }
    }

    /// Parse an alias or a full model id, case-insensitive
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|m| s == m.model_id() || m.aliases().contains(&s.as_str()))
    }
}

impl FromStr for ClaudeModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            let options: Vec<&str> = Self::ALL.iter().map(|m| m.aliases()[0]).collect();
            format!("Unknown model: {}. Options: {}", s, options.join(", "))
        })
    }
}

impl fmt::Display for ClaudeModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A user turn; grading is a single-turn exchange
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    role: &'static str,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user", content: content.into() }
    }
}

/// Request body for the messages API
#[derive(Debug, Clone, Serialize)]
pub struct CreateMessageRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

impl CreateMessageRequest {
    pub fn new(model: ClaudeModel, messages: Vec<Message>) -> Self {
        Self { model: model.model_id().to_string(), max_tokens: 4096, messages, system: None }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Response of the messages API
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub id: String,
    pub content: Vec<ContentBlock>,
    pub stop_reason: Option<String>,
    pub usage: Usage,
}

impl MessageResponse {
    /// Concatenated text of all text blocks
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text.as_deref())
            .collect()
    }

    /// Whether the reply stopped at the token limit, so later sections may be missing
    pub fn is_truncated(&self) -> bool {
        self.stop_reason.as_deref() == Some("max_tokens")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn model_parse() {
        assert_eq!(ClaudeModel::parse("haiku"), Some(ClaudeModel::Haiku45));
        assert_eq!(ClaudeModel::parse("haiku45"), Some(ClaudeModel::Haiku45));
        assert_eq!(ClaudeModel::parse("haiku3"), Some(ClaudeModel::Haiku3));
        assert_eq!(ClaudeModel::parse("sonnet4"), Some(ClaudeModel::Sonnet4));
        assert_eq!(ClaudeModel::parse("sonnet"), Some(ClaudeModel::Sonnet45));
        assert_eq!(ClaudeModel::parse("sonnet45"), Some(ClaudeModel::Sonnet45));
        assert_eq!(ClaudeModel::parse("Opus"), Some(ClaudeModel::Opus45));
        assert_eq!(ClaudeModel::parse("claude-3-haiku-20240307"), Some(ClaudeModel::Haiku3));
        assert_eq!(ClaudeModel::parse("unknown"), None);
    }

    #[test]
    fn unknown_model_lists_options() {
        let err = "gpt".parse::<ClaudeModel>().unwrap_err();
        assert_eq!(err, "Unknown model: gpt. Options: haiku, haiku3, sonnet4, sonnet, opus");
    }

    #[test]
    fn model_serializes_as_short_name() {
        let json = serde_json::to_string(&ClaudeModel::Sonnet45).unwrap();
        assert_eq!(json, "\"sonnet\"");
        let old: ClaudeModel = serde_json::from_str("\"Opus45\"").unwrap();
        assert_eq!(old, ClaudeModel::Opus45);
    }

    #[test]
    fn request_serializes_without_empty_system() {
        let request = CreateMessageRequest::new(ClaudeModel::Haiku45, vec![Message::user("Hi")])
            .with_max_tokens(1000);
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("system").is_none());
        assert_eq!(json["model"], "claude-haiku-4-5-20251001");
        assert_eq!(json["max_tokens"], 1000);
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn response_text_joins_text_blocks() {
        let body = r#"{
            "id": "msg_1",
            "content": [
                {"type": "text", "text": "**1. Meaning Score (0-100):** 80"},
                {"type": "tool_use"},
                {"type": "text", "text": "\n**2. Main Meaning Assessment:** Good."}
            ],
            "stop_reason": "max_tokens",
            "usage": {"input_tokens": 120, "output_tokens": 40}
        }"#;
        let response: MessageResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            response.text(),
            "**1. Meaning Score (0-100):** 80\n**2. Main Meaning Assessment:** Good."
        );
        assert!(response.is_truncated());
    }
}
