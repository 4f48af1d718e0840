//! Practice ranking: which cards to surface first and which are "difficult"
//!
//! History is joined to cards by card id. Entries recorded without an id
//! (older history) fall back to the (question, subject, topic) triple, so two
//! cards with identical content share that legacy history.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::store::{Card, CardId, ContentKey, FeedbackEntry};

/// Cards whose latest score is below this are "difficult"
pub const DIFFICULTY_THRESHOLD: u32 = 80;

/// Score used to order the main practice queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingMode {
    /// Most recent attempt
    #[default]
    Latest,
    /// Mean of every scored attempt
    Average,
}

impl std::str::FromStr for RankingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "latest" | "last" => Ok(RankingMode::Latest),
            "average" | "avg" | "mean" => Ok(RankingMode::Average),
            _ => Err(format!("Unknown ranking mode: {}. Options: latest, average", s)),
        }
    }
}

/// Per-identity score summary built from one pass over the history
#[derive(Debug, Default)]
struct Tally {
    /// Position in history of the newest attempt, and its score if it had one
    latest: Option<(usize, Option<u32>)>,
    sum: u64,
    count: u32,
}

impl Tally {
    fn record(&mut self, position: usize, score: Option<u32>) {
        if self.latest.is_none_or(|(pos, _)| position > pos) {
            self.latest = Some((position, score));
        }
        if let Some(score) = score {
            self.sum += u64::from(score);
            self.count += 1;
        }
    }
}

/// Scores of a user's history, indexed for lookup by card
#[derive(Debug, Default)]
pub struct ScoreIndex<'h> {
    by_id: HashMap<&'h CardId, Tally>,
    by_content: HashMap<ContentKey<'h>, Tally>,
}

impl<'h> ScoreIndex<'h> {
    /// Index `history` (oldest first)
    pub fn new(history: &'h [FeedbackEntry]) -> Self {
        let mut index = Self::default();
        for (position, entry) in history.iter().enumerate() {
            let tally = match &entry.card_id {
                Some(id) => index.by_id.entry(id).or_default(),
                None => index.by_content.entry(entry.content_key()).or_default(),
            };
            tally.record(position, entry.score);
        }
        index
    }

    fn tallies<'a>(&'a self, card: &'a Card) -> [Option<&'a Tally>; 2] {
        [self.by_id.get(&card.id), self.by_content.get(&card.content_key())]
    }

    /// Score of the card's most recent attempt.
    ///
    /// Absent when the card was never attempted or when that attempt went
    /// unscored; older scores do not stand in for it.
    pub fn latest(&self, card: &Card) -> Option<u32> {
        self.tallies(card)
            .into_iter()
            .flatten()
            .filter_map(|t| t.latest)
            .max_by_key(|(position, _)| *position)
            .and_then(|(_, score)| score)
    }

    /// Mean of all the card's scored attempts
    pub fn average(&self, card: &Card) -> Option<f64> {
        let (sum, count) = self
            .tallies(card)
            .into_iter()
            .flatten()
            .fold((0u64, 0u32), |(sum, count), t| (sum + t.sum, count + t.count));
        (count > 0).then(|| sum as f64 / f64::from(count))
    }

    fn key(&self, card: &Card, mode: RankingMode) -> Option<f64> {
        match mode {
            RankingMode::Latest => self.latest(card).map(f64::from),
            RankingMode::Average => self.average(card),
        }
    }
}

/// Whether a card with this latest score belongs to the difficult set
pub fn is_difficult(latest: Option<u32>) -> bool {
    latest.is_some_and(|score| score < DIFFICULTY_THRESHOLD)
}

/// Never-attempted cards (no key) sort before every scored card
fn compare_keys(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a.total_cmp(&b),
    }
}

/// The two views the practice screen works from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ranking {
    /// Every card, weakest and never-attempted first
    pub ordering: Vec<Card>,
    /// Cards whose latest score is below the threshold, in practice order
    pub difficult: Vec<Card>,
}

impl Ranking {
    /// Rank `cards` against `history` (oldest first).
    ///
    /// The sort is stable: cards with equal keys keep their order in `cards`.
    pub fn compute(cards: &[Card], history: &[FeedbackEntry], mode: RankingMode) -> Self {
        let index = ScoreIndex::new(history);

        let mut keyed: Vec<(Option<f64>, &Card)> =
            cards.iter().map(|card| (index.key(card, mode), card)).collect();
        keyed.sort_by(|(a, _), (b, _)| compare_keys(*a, *b));

        let ordering: Vec<Card> = keyed.into_iter().map(|(_, card)| card.clone()).collect();
        let difficult =
            ordering.iter().filter(|card| is_difficult(index.latest(card))).cloned().collect();

        tracing::debug!(
            "Ranked {} cards against {} attempts ({:?})",
            ordering.len(),
            history.len(),
            mode
        );
        Self { ordering, difficult }
    }
}
