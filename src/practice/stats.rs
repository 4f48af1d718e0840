//! Summary of a user's graded answers

use std::collections::BTreeSet;

use crate::store::FeedbackEntry;

/// Filtered view of a history with its aggregate figures
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryStats<'h> {
    /// Matching entries, newest first
    pub entries: Vec<&'h FeedbackEntry>,
    /// Number of matching entries
    pub total: usize,
    /// Number of matching entries that carry a score
    pub scored: usize,
    /// Mean score rounded to one decimal; `None` when nothing is scored
    pub average: Option<f64>,
    /// Subjects present in the whole history, sorted
    pub subjects: Vec<&'h str>,
    /// Topics present under the subject filter, sorted
    pub topics: Vec<&'h str>,
}

impl<'h> HistoryStats<'h> {
    /// Filter `history` (oldest first) by subject, then by topic
    pub fn compute(
        history: &'h [FeedbackEntry],
        subject: Option<&str>,
        topic: Option<&str>,
    ) -> Self {
        let subjects: BTreeSet<&str> = history.iter().map(|e| e.subject.as_str()).collect();

        let by_subject: Vec<&FeedbackEntry> =
            history.iter().filter(|e| subject.is_none_or(|s| e.subject == s)).collect();
        let topics: BTreeSet<&str> = by_subject.iter().map(|e| e.topic.as_str()).collect();

        let entries: Vec<&FeedbackEntry> = by_subject
            .into_iter()
            .rev()
            .filter(|e| topic.is_none_or(|t| e.topic == t))
            .collect();

        let scores: Vec<u32> = entries.iter().filter_map(|e| e.score).collect();
        let average = (!scores.is_empty()).then(|| {
            let mean = scores.iter().map(|s| f64::from(*s)).sum::<f64>() / scores.len() as f64;
            (mean * 10.0).round() / 10.0
        });

        Self {
            total: entries.len(),
            scored: scores.len(),
            average,
            entries,
            subjects: subjects.into_iter().collect(),
            topics: topics.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Card, CardDraft, CardId};
    use pretty_assertions::assert_eq;

    fn entry(subject: &str, topic: &str, score: Option<u32>) -> FeedbackEntry {
        let card = Card::new(
            CardId::generate(),
            CardDraft::new(subject, topic, format!("{subject}/{topic}"), "answer"),
        );
        FeedbackEntry::for_card(&card, score, None)
    }

    fn history() -> Vec<FeedbackEntry> {
        vec![
            entry("Civil", "Posse", Some(70)),
            entry("Penal", "Dolo", Some(85)),
            entry("Penal", "Culpa", None),
            entry("Penal", "Dolo", Some(60)),
        ]
    }

    #[test]
    fn unfiltered_summary() {
        let history = history();
        let stats = HistoryStats::compute(&history, None, None);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.scored, 3);
        assert_eq!(stats.average, Some(71.7));
        assert_eq!(stats.subjects, vec!["Civil", "Penal"]);
        assert_eq!(stats.topics, vec!["Culpa", "Dolo", "Posse"]);
        // Newest first
        assert_eq!(stats.entries[0].score, Some(60));
        assert_eq!(stats.entries[3].subject, "Civil");
    }

    #[test]
    fn subject_then_topic() {
        let history = history();
        let stats = HistoryStats::compute(&history, Some("Penal"), None);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.topics, vec!["Culpa", "Dolo"]);
        assert_eq!(stats.average, Some(72.5));

        let stats = HistoryStats::compute(&history, Some("Penal"), Some("Culpa"));
        assert_eq!(stats.total, 1);
        assert_eq!(stats.scored, 0);
        assert_eq!(stats.average, None);
    }

    #[test]
    fn empty_history() {
        let stats = HistoryStats::compute(&[], Some("Civil"), None);
        assert!(stats.is_empty());
        assert_eq!(stats.average, None);
        assert!(stats.subjects.is_empty());
    }
}
