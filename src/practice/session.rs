//! A logged-in user's practice session
//!
//! The session holds its own copy of the deck, the history and both queues,
//! read fresh from the store when it opens. The store and the grading gateway
//! are passed in per call, so nothing is shared between sessions.

use thiserror::Error;

use crate::grading::{GatewayReply, GradedAnswer, Grader, GradingGateway, GradingRequest};
use crate::store::{
    Card, CardDraft, CardError, CardId, Collection, FeedbackEntry, Store, StoreError,
};

use super::queue::{FeedbackBody, PendingFeedback, PracticeQueue, QueueKind};
use super::ranking::{Ranking, RankingMode, ScoreIndex};
use super::stats::HistoryStats;

/// Errors from explicit session commands
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    InvalidCard(#[from] CardError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Shared pool writes by a non-administrator
    #[error("Only the administrator can change shared cards")]
    NotAdmin,

    #[error("No card with id {0}")]
    UnknownCard(CardId),
}

/// Which collection a new card goes to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CardScope {
    #[default]
    Own,
    Shared,
}

/// What happened to a submitted answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The active queue shows no card
    NoCard,
    /// The answer was blank; nothing was sent or recorded
    MissingInput,
    /// The answer was graded and recorded
    Graded { score: Option<u32> },
}

/// Per-user practice state
#[derive(Debug)]
pub struct Session {
    user: String,
    admin: bool,
    mode: RankingMode,
    own: Vec<Card>,
    shared: Vec<Card>,
    history: Vec<FeedbackEntry>,
    main: PracticeQueue,
    difficult: PracticeQueue,
    active: QueueKind,
    notices: Vec<String>,
}

impl Session {
    /// Load the user's deck and history and rank them.
    ///
    /// Unreadable collections are replaced by empty ones and reported
    /// through [`Session::take_notices`].
    pub fn open(store: &dyn Store, user: &str, admin: bool, mode: RankingMode) -> Self {
        let mut notices = Vec::new();
        let own = or_empty(store.list_cards(Collection::User(user)), "cards", &mut notices);
        let shared =
            or_empty(store.list_cards(Collection::Shared), "shared cards", &mut notices);
        let history = or_empty(store.load_feedback(user), "history", &mut notices);

        tracing::info!(
            "Opened session for {} ({} own cards, {} shared, {} attempts)",
            user,
            own.len(),
            shared.len(),
            history.len()
        );

        let mut session = Self {
            user: user.to_string(),
            admin,
            mode,
            own,
            shared,
            history,
            main: PracticeQueue::default(),
            difficult: PracticeQueue::default(),
            active: QueueKind::Main,
            notices,
        };
        session.recompute();
        session
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn is_admin(&self) -> bool {
        self.admin
    }

    pub fn ranking_mode(&self) -> RankingMode {
        self.mode
    }

    /// The practice deck: own cards, then the shared pool
    pub fn deck(&self) -> Vec<Card> {
        self.own.iter().chain(&self.shared).cloned().collect()
    }

    /// Deck card by 1-based position, as numbered on the cards screen
    pub fn card_at(&self, number: usize) -> Option<&Card> {
        number.checked_sub(1).and_then(|i| self.own.iter().chain(&self.shared).nth(i))
    }

    /// Whether `id` belongs to the shared pool
    pub fn is_shared(&self, id: &CardId) -> bool {
        self.shared.iter().any(|card| &card.id == id)
    }

    /// History, oldest first
    pub fn history(&self) -> &[FeedbackEntry] {
        &self.history
    }

    pub fn latest_score(&self, card: &Card) -> Option<u32> {
        ScoreIndex::new(&self.history).latest(card)
    }

    pub fn stats(&self, subject: Option<&str>, topic: Option<&str>) -> HistoryStats<'_> {
        HistoryStats::compute(&self.history, subject, topic)
    }

    pub fn active(&self) -> QueueKind {
        self.active
    }

    pub fn switch_queue(&mut self) {
        self.active = self.active.other();
    }

    pub fn queue(&self, kind: QueueKind) -> &PracticeQueue {
        match kind {
            QueueKind::Main => &self.main,
            QueueKind::Difficult => &self.difficult,
        }
    }

    pub fn active_queue(&self) -> &PracticeQueue {
        self.queue(self.active)
    }

    pub fn active_queue_mut(&mut self) -> &mut PracticeQueue {
        match self.active {
            QueueKind::Main => &mut self.main,
            QueueKind::Difficult => &mut self.difficult,
        }
    }

    /// Drain notices raised since the last call
    /// Make the main queue active and show the card with `id` on it
    pub fn select_card(&mut self, id: &CardId) -> bool {
        self.active = QueueKind::Main;
        self.main.select(id)
    }

    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    /// Grade `answer` against the active queue's card and record the attempt.
    ///
    /// A blank answer is rejected without a call or a history entry. A failed
    /// history write is reported as a notice; the attempt is still kept in
    /// memory. Only answers from the main queue trigger a re-rank.
    pub async fn submit<G: Grader>(
        &mut self,
        store: &mut dyn Store,
        gateway: &GradingGateway<G>,
        answer: &str,
    ) -> SubmitOutcome {
        let Some(card) = self.active_queue().current().cloned() else {
            return SubmitOutcome::NoCard;
        };

        let request = GradingRequest {
            question: &card.question,
            candidate_answer: answer,
            reference_answer: &card.expected_answer,
        };

        let raw = match gateway.evaluate(&request).await {
            GatewayReply::MissingInput(prompt) => {
                self.active_queue_mut()
                    .set_pending(PendingFeedback::new(&card, FeedbackBody::MissingInput(prompt)));
                return SubmitOutcome::MissingInput;
            }
            GatewayReply::Graded(raw) => raw,
        };

        let graded = GradedAnswer::from_reply(raw, gateway.sections());
        let score = graded.score;
        let entry = FeedbackEntry::for_card(&card, score, graded.content_gaps.clone());

        if let Err(e) = store.append_feedback(&self.user, entry.clone()) {
            tracing::error!("Failed to save attempt for {}: {}", self.user, e);
            self.notices.push(format!("Could not save this attempt: {}", e));
        }
        self.history.push(entry);

        let feedback = PendingFeedback::new(&card, FeedbackBody::Graded(graded));
        self.active_queue_mut().set_pending(feedback);
        if self.active == QueueKind::Main {
            self.recompute();
        }

        SubmitOutcome::Graded { score }
    }

    fn collection(&self, scope: CardScope) -> Result<Collection<'_>, SessionError> {
        match scope {
            CardScope::Own => Ok(Collection::User(&self.user)),
            CardScope::Shared if self.admin => Ok(Collection::Shared),
            CardScope::Shared => Err(SessionError::NotAdmin),
        }
    }

    fn scope_of(&self, id: &CardId) -> Result<CardScope, SessionError> {
        if self.own.iter().any(|card| &card.id == id) {
            Ok(CardScope::Own)
        } else if self.is_shared(id) {
            Ok(CardScope::Shared)
        } else {
            Err(SessionError::UnknownCard(id.clone()))
        }
    }

    fn cards_mut(&mut self, scope: CardScope) -> &mut Vec<Card> {
        match scope {
            CardScope::Own => &mut self.own,
            CardScope::Shared => &mut self.shared,
        }
    }

    pub fn add_card(
        &mut self,
        store: &mut dyn Store,
        scope: CardScope,
        draft: CardDraft,
    ) -> Result<&Card, SessionError> {
        let draft = draft.validate()?;
        let card = store.add_card(self.collection(scope)?, draft)?;
        tracing::info!("{} added card {}", self.user, card.id);

        let id = card.id.clone();
        self.cards_mut(scope).push(card);
        self.recompute();
        self.find(&id).ok_or(SessionError::UnknownCard(id))
    }

    pub fn edit_card(
        &mut self,
        store: &mut dyn Store,
        id: &CardId,
        draft: CardDraft,
    ) -> Result<(), SessionError> {
        let draft = draft.validate()?;
        let scope = self.scope_of(id)?;
        let updated = store.update_card(self.collection(scope)?, id, draft)?;
        tracing::info!("{} edited card {}", self.user, id);

        if let Some(card) = self.cards_mut(scope).iter_mut().find(|card| &card.id == id) {
            *card = updated;
        }
        self.recompute();
        Ok(())
    }

    pub fn delete_card(&mut self, store: &mut dyn Store, id: &CardId) -> Result<(), SessionError> {
        let scope = self.scope_of(id)?;
        store.delete_card(self.collection(scope)?, id)?;
        tracing::info!("{} deleted card {}", self.user, id);

        self.cards_mut(scope).retain(|card| &card.id != id);
        self.recompute();
        Ok(())
    }

    /// Empty the user's history, in the store first
    pub fn clear_history(&mut self, store: &mut dyn Store) -> Result<(), SessionError> {
        store.clear_feedback(&self.user)?;
        tracing::info!("{} cleared their history", self.user);

        self.history.clear();
        self.recompute();
        Ok(())
    }

    fn find(&self, id: &CardId) -> Option<&Card> {
        self.own.iter().chain(&self.shared).find(|card| &card.id == id)
    }

    /// Re-rank the deck and refresh both queues
    fn recompute(&mut self) {
        let ranking = Ranking::compute(&self.deck(), &self.history, self.mode);
        tracing::debug!(
            "Recomputed ranking for {}: {} difficult",
            self.user,
            ranking.difficult.len()
        );
        self.main.set_cards(ranking.ordering);
        self.difficult.set_cards(ranking.difficult);
    }
}

/// Use a loaded collection, or fall back to empty with a notice
fn or_empty<T>(
    result: Result<Vec<T>, StoreError>,
    what: &str,
    notices: &mut Vec<String>,
) -> Vec<T> {
    match result {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!("Falling back to empty {}: {}", what, e);
            let reason = if e.is_malformed() { "is malformed" } else { "could not be read" };
            notices.push(format!("Your {} {}; starting with none. ({})", what, reason, e));
            Vec::new()
        }
    }
}
