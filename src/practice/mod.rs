//! Practice: ranking, queues and the per-user session
//!
//! The ranking decides the order cards are practiced in and which ones are
//! difficult. Each queue adds filters and navigation on top of an ordering,
//! and the [`Session`] ties queues, history and the store together.

pub mod queue;
pub mod ranking;
pub mod session;
pub mod stats;

pub use queue::{
    FeedbackBody, NavOutcome, PendingFeedback, PracticeQueue, QueueKind, cycle_option,
};
pub use ranking::{DIFFICULTY_THRESHOLD, Ranking, RankingMode, ScoreIndex, is_difficult};
pub use session::{CardScope, Session, SessionError, SubmitOutcome};
pub use stats::HistoryStats;
