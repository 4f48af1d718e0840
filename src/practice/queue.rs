//! Navigation and filter state for one practice queue

use std::collections::BTreeSet;

use crate::grading::GradedAnswer;
use crate::store::{Card, CardId};

/// Which of the session's two queues
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueueKind {
    /// Every card, weakest first
    #[default]
    Main,
    /// Cards whose latest score is below the difficulty threshold
    Difficult,
}

impl QueueKind {
    pub fn other(self) -> Self {
        match self {
            QueueKind::Main => QueueKind::Difficult,
            QueueKind::Difficult => QueueKind::Main,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            QueueKind::Main => "Practice",
            QueueKind::Difficult => "Difficult",
        }
    }
}

/// Result of a navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    Moved,
    /// `previous` at the first card; nothing changed
    AtStart,
    /// `next` at the last card; nothing changed
    AtEnd,
    /// The filtered list is empty
    Empty,
}

impl NavOutcome {
    /// User-facing notice for a navigation that did not move
    pub fn notice(self) -> Option<&'static str> {
        match self {
            NavOutcome::Moved => None,
            NavOutcome::AtStart => Some("Already at the first card."),
            NavOutcome::AtEnd => Some("Already at the last card."),
            NavOutcome::Empty => Some("No cards match the current filters."),
        }
    }
}

/// What the grader had to say about a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackBody {
    Graded(GradedAnswer),
    /// The answer was blank; carries the prompt shown instead of feedback
    MissingInput(&'static str),
}

/// Feedback waiting to be shown, bound to the card it was produced for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFeedback {
    pub card_id: CardId,
    pub question: String,
    pub body: FeedbackBody,
}

impl PendingFeedback {
    pub fn new(card: &Card, body: FeedbackBody) -> Self {
        Self { card_id: card.id.clone(), question: card.question.clone(), body }
    }

    /// Whether this feedback belongs to `card`
    pub fn is_for(&self, card: &Card) -> bool {
        self.card_id == card.id && self.question == card.question
    }
}

/// Filtered, navigable view over an ordered card list
#[derive(Debug, Clone, Default)]
pub struct PracticeQueue {
    cards: Vec<Card>,
    filter_subject: Option<String>,
    filter_topic: Option<String>,
    index: usize,
    pending: Option<PendingFeedback>,
    reveal: bool,
}

impl PracticeQueue {
    pub fn new(cards: Vec<Card>) -> Self {
        Self { cards, ..Self::default() }
    }

    /// Replace the underlying cards, keeping filters and pending feedback.
    ///
    /// The queue stays on the card it was showing if that card survives the
    /// filters; otherwise an out-of-range index falls back to the first card.
    pub fn set_cards(&mut self, cards: Vec<Card>) {
        let shown = self.current().map(|card| card.id.clone());
        self.cards = cards;

        if self.filter_subject.as_deref().is_some_and(|s| !self.subjects().contains(&s)) {
            self.filter_subject = None;
            self.filter_topic = None;
        }
        if self.filter_topic.as_deref().is_some_and(|t| !self.topics().contains(&t)) {
            self.filter_topic = None;
        }

        let position =
            shown.and_then(|id| self.filtered().iter().position(|card| card.id == id));
        if let Some(position) = position {
            self.index = position;
        }
        self.clamp();
    }

    /// Every card in queue order, ignoring filters
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Cards passing the subject filter, then the topic filter
    pub fn filtered(&self) -> Vec<&Card> {
        self.subject_filtered()
            .filter(|card| self.filter_topic.as_ref().is_none_or(|t| &card.topic == t))
            .collect()
    }

    fn subject_filtered(&self) -> impl Iterator<Item = &Card> {
        self.cards
            .iter()
            .filter(|card| self.filter_subject.as_ref().is_none_or(|s| &card.subject == s))
    }

    /// Distinct subjects across all cards, sorted
    pub fn subjects(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self.cards.iter().map(|c| c.subject.as_str()).collect();
        set.into_iter().collect()
    }

    /// Distinct topics among the subject-filtered cards, sorted
    pub fn topics(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self.subject_filtered().map(|c| c.topic.as_str()).collect();
        set.into_iter().collect()
    }

    pub fn subject_filter(&self) -> Option<&str> {
        self.filter_subject.as_deref()
    }

    pub fn topic_filter(&self) -> Option<&str> {
        self.filter_topic.as_deref()
    }

    /// Filter by subject (`None` for all); the topic filter is cleared
    pub fn set_subject(&mut self, subject: Option<String>) {
        self.filter_subject = subject;
        self.filter_topic = None;
        self.clamp();
    }

    /// Filter by topic within the current subject (`None` for all)
    pub fn set_topic(&mut self, topic: Option<String>) {
        self.filter_topic = topic;
        self.clamp();
    }

    /// Step the subject filter through all, then each subject in order
    pub fn cycle_subject(&mut self) {
        let next = cycle_option(&self.subjects(), self.filter_subject.as_deref());
        self.set_subject(next);
    }

    /// Step the topic filter through all, then each available topic
    pub fn cycle_topic(&mut self) {
        let next = cycle_option(&self.topics(), self.filter_topic.as_deref());
        self.set_topic(next);
    }

    fn clamp(&mut self) {
        if self.index >= self.filtered().len() {
            self.index = 0;
        }
    }

    /// Position in the filtered list, 0 when out of range
    pub fn current_index(&self) -> usize {
        if self.index < self.filtered().len() { self.index } else { 0 }
    }

    /// The displayed card
    pub fn current(&self) -> Option<&Card> {
        self.filtered().get(self.current_index()).copied()
    }

    pub fn len(&self) -> usize {
        self.filtered().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn navigate(
        &mut self,
        target: impl FnOnce(usize, usize) -> Result<usize, NavOutcome>,
    ) -> NavOutcome {
        let len = self.len();
        if len == 0 {
            return NavOutcome::Empty;
        }
        match target(self.current_index(), len) {
            Ok(index) => {
                self.index = index;
                self.clear_transient();
                NavOutcome::Moved
            }
            Err(outcome) => outcome,
        }
    }

    pub fn first(&mut self) -> NavOutcome {
        self.navigate(|_, _| Ok(0))
    }

    pub fn previous(&mut self) -> NavOutcome {
        self.navigate(|index, _| index.checked_sub(1).ok_or(NavOutcome::AtStart))
    }

    pub fn next(&mut self) -> NavOutcome {
        self.navigate(
            |index, len| if index + 1 < len { Ok(index + 1) } else { Err(NavOutcome::AtEnd) },
        )
    }

    pub fn last(&mut self) -> NavOutcome {
        self.navigate(|_, len| Ok(len - 1))
    }

    /// Show the card with `id`, dropping filters that hide it.
    ///
    /// Returns false, leaving the queue untouched, when the card is not queued.
    pub fn select(&mut self, id: &CardId) -> bool {
        if !self.cards.iter().any(|card| &card.id == id) {
            return false;
        }
        if !self.filtered().iter().any(|card| &card.id == id) {
            self.filter_subject = None;
            self.filter_topic = None;
        }
        if let Some(position) = self.filtered().iter().position(|card| &card.id == id) {
            self.index = position;
        }
        self.clear_transient();
        true
    }

    fn clear_transient(&mut self) {
        self.pending = None;
        self.reveal = false;
    }

    pub fn toggle_reveal(&mut self) {
        self.reveal = !self.reveal;
    }

    pub fn is_revealed(&self) -> bool {
        self.reveal
    }

    pub fn set_pending(&mut self, feedback: PendingFeedback) {
        self.pending = Some(feedback);
    }

    /// Pending feedback, only while it belongs to the displayed card
    pub fn visible_feedback(&self) -> Option<&PendingFeedback> {
        let card = self.current()?;
        self.pending.as_ref().filter(|feedback| feedback.is_for(card))
    }
}

/// The filter after `current` in `options`; after the last one, back to `None` (all)
pub fn cycle_option(options: &[&str], current: Option<&str>) -> Option<String> {
    let next = match current {
        None => options.first(),
        Some(value) => {
            options.iter().position(|o| *o == value).and_then(|i| options.get(i + 1))
        }
    };
    next.map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CardDraft;
    use pretty_assertions::assert_eq;

    fn card(id: &str, subject: &str, topic: &str) -> Card {
        Card::new(
            CardId::from(id),
            CardDraft::new(subject, topic, format!("Question {id}"), "Answer"),
        )
    }

    fn deck() -> Vec<Card> {
        vec![
            card("1", "Civil", "Contratos"),
            card("2", "Penal", "Dolo"),
            card("3", "Civil", "Posse"),
            card("4", "Penal", "Culpa"),
        ]
    }

    fn ids(queue: &PracticeQueue) -> Vec<&str> {
        queue.filtered().iter().map(|c| c.id.as_str()).collect()
    }

    fn feedback_for(card: &Card) -> PendingFeedback {
        PendingFeedback::new(card, FeedbackBody::MissingInput("answer please"))
    }

    #[test]
    fn navigation_bounds() {
        let mut queue = PracticeQueue::new(deck());
        assert_eq!(queue.previous(), NavOutcome::AtStart);
        assert_eq!(queue.current_index(), 0);

        assert_eq!(queue.last(), NavOutcome::Moved);
        assert_eq!(queue.current_index(), 3);
        assert_eq!(queue.next(), NavOutcome::AtEnd);
        assert_eq!(queue.current_index(), 3);

        assert_eq!(queue.previous(), NavOutcome::Moved);
        assert_eq!(queue.current().map(|c| c.id.as_str()), Some("3"));
        assert_eq!(queue.first(), NavOutcome::Moved);
        assert_eq!(queue.current_index(), 0);
    }

    #[test]
    fn empty_queue_reports_empty() {
        let mut queue = PracticeQueue::default();
        assert_eq!(queue.next(), NavOutcome::Empty);
        assert_eq!(queue.current(), None);
        assert!(NavOutcome::Empty.notice().is_some());
    }

    #[test]
    fn subject_then_topic_filters() {
        let mut queue = PracticeQueue::new(deck());
        assert_eq!(queue.subjects(), vec!["Civil", "Penal"]);
        assert_eq!(queue.topics(), vec!["Contratos", "Culpa", "Dolo", "Posse"]);

        queue.set_subject(Some("Penal".into()));
        assert_eq!(ids(&queue), vec!["2", "4"]);
        assert_eq!(queue.topics(), vec!["Culpa", "Dolo"]);

        queue.set_topic(Some("Culpa".into()));
        assert_eq!(ids(&queue), vec!["4"]);

        // Changing the subject drops the topic
        queue.set_subject(Some("Civil".into()));
        assert_eq!(queue.topic_filter(), None);
        assert_eq!(ids(&queue), vec!["1", "3"]);
    }

    #[test]
    fn out_of_range_index_clamps_to_zero() {
        let mut queue = PracticeQueue::new(deck());
        queue.last();
        queue.set_subject(Some("Civil".into()));
        assert_eq!(queue.current_index(), 0);
        assert_eq!(queue.current().map(|c| c.id.as_str()), Some("1"));
    }

    #[test]
    fn cycling_wraps_through_all() {
        let mut queue = PracticeQueue::new(deck());
        queue.cycle_subject();
        assert_eq!(queue.subject_filter(), Some("Civil"));
        queue.cycle_subject();
        assert_eq!(queue.subject_filter(), Some("Penal"));
        queue.cycle_subject();
        assert_eq!(queue.subject_filter(), None);

        queue.set_subject(Some("Penal".into()));
        queue.cycle_topic();
        assert_eq!(queue.topic_filter(), Some("Culpa"));
        queue.cycle_topic();
        queue.cycle_topic();
        assert_eq!(queue.topic_filter(), None);
    }

    #[test]
    fn navigation_clears_feedback_and_reveal() {
        let mut queue = PracticeQueue::new(deck());
        let first = queue.current().cloned().unwrap();
        queue.set_pending(feedback_for(&first));
        queue.toggle_reveal();
        assert!(queue.visible_feedback().is_some());

        queue.next();
        queue.previous();
        assert_eq!(queue.visible_feedback(), None);
        assert!(!queue.is_revealed());
    }

    #[test]
    fn stale_feedback_is_not_shown() {
        let mut queue = PracticeQueue::new(deck());
        let first = queue.current().cloned().unwrap();
        queue.set_pending(feedback_for(&first));

        // Filtering moves the display to another card without navigating
        queue.set_subject(Some("Penal".into()));
        assert_eq!(queue.current().map(|c| c.id.as_str()), Some("2"));
        assert_eq!(queue.visible_feedback(), None);

        queue.set_subject(None);
        assert!(queue.visible_feedback().is_some());
    }

    #[test]
    fn set_cards_follows_the_shown_card() {
        let mut queue = PracticeQueue::new(deck());
        queue.next();
        let shown = queue.current().cloned().unwrap();
        queue.set_pending(feedback_for(&shown));

        let mut reordered = deck();
        reordered.reverse();
        queue.set_cards(reordered);

        assert_eq!(queue.current(), Some(&shown));
        assert_eq!(queue.current_index(), 2);
        assert!(queue.visible_feedback().is_some());
    }

    #[test]
    fn set_cards_drops_filters_with_no_cards() {
        let mut queue = PracticeQueue::new(deck());
        queue.set_subject(Some("Penal".into()));
        queue.set_topic(Some("Dolo".into()));

        queue.set_cards(vec![card("1", "Civil", "Contratos"), card("4", "Penal", "Culpa")]);

        assert_eq!(queue.subject_filter(), Some("Penal"));
        assert_eq!(queue.topic_filter(), None);
        assert_eq!(ids(&queue), vec!["4"]);
    }

    #[test]
    fn edited_question_makes_feedback_stale() {
        let mut queue = PracticeQueue::new(deck());
        let first = queue.current().cloned().unwrap();
        queue.set_pending(feedback_for(&first));

        let mut edited = deck();
        edited[0].question = "Reworded".into();
        queue.set_cards(edited);

        assert_eq!(queue.visible_feedback(), None);
    }

    #[test]
    fn select_shows_card_and_drops_hiding_filters() {
        let mut queue = PracticeQueue::new(deck());
        queue.set_subject(Some("Civil".into()));
        queue.toggle_reveal();

        assert!(queue.select(&CardId::from("3")));
        assert_eq!(queue.subject_filter(), Some("Civil"));
        assert_eq!(queue.current().map(|c| c.id.as_str()), Some("3"));
        assert!(!queue.is_revealed());

        assert!(queue.select(&CardId::from("4")));
        assert_eq!(queue.subject_filter(), None);
        assert_eq!(queue.current().map(|c| c.id.as_str()), Some("4"));

        assert!(!queue.select(&CardId::from("missing")));
        assert_eq!(queue.current().map(|c| c.id.as_str()), Some("4"));
    }
}
