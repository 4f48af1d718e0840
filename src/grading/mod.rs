//! Answer grading
//!
//! The gateway sends (question, answer, expected answer) to a language model
//! that replies in a fixed five-section format; the parser turns that reply
//! into structured feedback and a numeric score.

pub mod gateway;
pub mod parser;
pub mod prompt;
pub mod sections;

pub use gateway::{ClaudeGrader, GatewayReply, GradedAnswer, Grader, GradingGateway};
pub use parser::{FeedbackSections, ParseError, ParsedFeedback, extract_score, parse_feedback};
pub use prompt::GradingRequest;
pub use sections::{Language, SectionKey, SectionSet};
