//! Discursiva - a terminal flashcard trainer for open-ended questions
//!
//! Each card holds a question and its expected answer. You answer in your own
//! words, Claude grades the answer against the expected one, and the cards you
//! struggle with come back first.

pub mod accounts;
pub mod app;
pub mod claude;
pub mod config;
pub mod grading;
pub mod practice;
pub mod store;
pub mod theme;
pub mod ui;

pub use app::App;
pub use config::Config;
pub use theme::Theme;
