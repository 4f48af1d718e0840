//! In-process backend

use std::collections::{BTreeMap, HashMap};

use super::model::{Card, CardDraft, CardId, Collection, FeedbackEntry, UserRecord};
use super::{Store, StoreError, check_username, sort_history};

/// Store that keeps every collection in memory; nothing survives the process
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    shared: Vec<Card>,
    cards: HashMap<String, Vec<Card>>,
    history: HashMap<String, Vec<FeedbackEntry>>,
    users: BTreeMap<String, UserRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn cards_mut(&mut self, collection: Collection<'_>) -> Result<&mut Vec<Card>, StoreError> {
        match collection {
            Collection::Shared => Ok(&mut self.shared),
            Collection::User(user) => {
                check_username(user)?;
                Ok(self.cards.entry(user.to_string()).or_default())
            }
        }
    }
}

impl Store for MemoryStore {
    fn list_cards(&self, collection: Collection<'_>) -> Result<Vec<Card>, StoreError> {
        match collection {
            Collection::Shared => Ok(self.shared.clone()),
            Collection::User(user) => {
                check_username(user)?;
                Ok(self.cards.get(user).cloned().unwrap_or_default())
            }
        }
    }

    fn add_card(
        &mut self,
        collection: Collection<'_>,
        draft: CardDraft,
    ) -> Result<Card, StoreError> {
        let card = Card::new(CardId::generate(), draft);
        self.cards_mut(collection)?.push(card.clone());
        Ok(card)
    }

    fn update_card(
        &mut self,
        collection: Collection<'_>,
        id: &CardId,
        draft: CardDraft,
    ) -> Result<Card, StoreError> {
        let card = self.cards_mut(collection)?.iter_mut().find(|c| &c.id == id).ok_or_else(
            || StoreError::CardNotFound { id: id.clone(), collection: collection.to_string() },
        )?;
        card.apply(draft);
        Ok(card.clone())
    }

    fn delete_card(&mut self, collection: Collection<'_>, id: &CardId) -> Result<(), StoreError> {
        let cards = self.cards_mut(collection)?;
        let len_before = cards.len();
        cards.retain(|c| &c.id != id);
        if cards.len() == len_before {
            return Err(StoreError::CardNotFound {
                id: id.clone(),
                collection: collection.to_string(),
            });
        }
        Ok(())
    }

    fn append_feedback(&mut self, user: &str, entry: FeedbackEntry) -> Result<(), StoreError> {
        check_username(user)?;
        self.history.entry(user.to_string()).or_default().push(entry);
        Ok(())
    }

    fn load_feedback(&self, user: &str) -> Result<Vec<FeedbackEntry>, StoreError> {
        check_username(user)?;
        let mut history = self.history.get(user).cloned().unwrap_or_default();
        sort_history(&mut history);
        Ok(history)
    }

    fn clear_feedback(&mut self, user: &str) -> Result<(), StoreError> {
        check_username(user)?;
        self.history.remove(user);
        Ok(())
    }

    fn put_user(&mut self, record: UserRecord) -> Result<(), StoreError> {
        check_username(&record.username)?;
        self.users.insert(record.username.clone(), record);
        Ok(())
    }

    fn get_user(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.get(username).cloned())
    }

    fn list_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        Ok(self.users.values().cloned().collect())
    }
}
