//! Local JSON file backend
//!
//! Layout under the root directory:
//!
//! ```text
//! users.json                              username -> account
//! shared/cards.json                       administrator's shared pool
//! users/<username>/cards.json             a user's own cards
//! users/<username>/feedback_history.json  a user's graded attempts
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::model::{Card, CardDraft, CardId, Collection, FeedbackEntry, UserRecord};
use super::{Store, StoreError, check_username, sort_history};

const USERS_FILE: &str = "users.json";
const CARDS_FILE: &str = "cards.json";
const HISTORY_FILE: &str = "feedback_history.json";

/// Account as kept in `users.json`.
///
/// Older files map usernames straight to a password digest string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum StoredUser {
    Full {
        password_hash: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        created_at: Option<DateTime<Utc>>,
    },
    Digest(String),
}

impl StoredUser {
    fn into_record(self, username: String) -> UserRecord {
        match self {
            StoredUser::Full { password_hash, created_at } => {
                UserRecord { username, password_hash, created_at }
            }
            StoredUser::Digest(password_hash) => {
                UserRecord { username, password_hash, created_at: None }
            }
        }
    }
}

/// Store backed by JSON documents on the local filesystem
#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|source| StoreError::Write { path: root.clone(), source })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn user_dir(&self, user: &str) -> Result<PathBuf, StoreError> {
        check_username(user)?;
        Ok(self.root.join("users").join(user))
    }

    fn cards_path(&self, collection: Collection<'_>) -> Result<PathBuf, StoreError> {
        match collection {
            Collection::Shared => Ok(self.root.join("shared").join(CARDS_FILE)),
            Collection::User(user) => Ok(self.user_dir(user)?.join(CARDS_FILE)),
        }
    }

    fn history_path(&self, user: &str) -> Result<PathBuf, StoreError> {
        Ok(self.user_dir(user)?.join(HISTORY_FILE))
    }

    fn users_path(&self) -> PathBuf {
        self.root.join(USERS_FILE)
    }

    fn load_users(&self) -> Result<BTreeMap<String, StoredUser>, StoreError> {
        read_json(&self.users_path())
    }

    /// Load, mutate and write back a card collection
    fn edit_cards<T>(
        &self,
        collection: Collection<'_>,
        edit: impl FnOnce(&mut Vec<Card>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let path = self.cards_path(collection)?;
        let mut cards: Vec<Card> = read_json(&path)?;
        let out = edit(&mut cards)?;
        write_json(&path, &cards)?;
        Ok(out)
    }
}

impl Store for JsonStore {
    fn list_cards(&self, collection: Collection<'_>) -> Result<Vec<Card>, StoreError> {
        read_json(&self.cards_path(collection)?)
    }

    fn add_card(
        &mut self,
        collection: Collection<'_>,
        draft: CardDraft,
    ) -> Result<Card, StoreError> {
        self.edit_cards(collection, |cards| {
            let card = Card::new(CardId::generate(), draft);
            cards.push(card.clone());
            Ok(card)
        })
    }

    fn update_card(
        &mut self,
        collection: Collection<'_>,
        id: &CardId,
        draft: CardDraft,
    ) -> Result<Card, StoreError> {
        self.edit_cards(collection, |cards| {
            let card = cards.iter_mut().find(|c| &c.id == id).ok_or_else(|| {
                StoreError::CardNotFound { id: id.clone(), collection: collection.to_string() }
            })?;
            card.apply(draft);
            Ok(card.clone())
        })
    }

    fn delete_card(&mut self, collection: Collection<'_>, id: &CardId) -> Result<(), StoreError> {
        self.edit_cards(collection, |cards| {
            let len_before = cards.len();
            cards.retain(|c| &c.id != id);
            if cards.len() == len_before {
                return Err(StoreError::CardNotFound {
                    id: id.clone(),
                    collection: collection.to_string(),
                });
            }
            Ok(())
        })
    }

    fn append_feedback(&mut self, user: &str, entry: FeedbackEntry) -> Result<(), StoreError> {
        let path = self.history_path(user)?;
        let mut history: Vec<FeedbackEntry> = read_json(&path)?;
        history.push(entry);
        write_json(&path, &history)
    }

    fn load_feedback(&self, user: &str) -> Result<Vec<FeedbackEntry>, StoreError> {
        let mut history: Vec<FeedbackEntry> = read_json(&self.history_path(user)?)?;
        sort_history(&mut history);
        Ok(history)
    }

    fn clear_feedback(&mut self, user: &str) -> Result<(), StoreError> {
        write_json(&self.history_path(user)?, &Vec::<FeedbackEntry>::new())
    }

    fn put_user(&mut self, record: UserRecord) -> Result<(), StoreError> {
        check_username(&record.username)?;
        let mut users = self.load_users()?;
        users.insert(
            record.username,
            StoredUser::Full { password_hash: record.password_hash, created_at: record.created_at },
        );
        write_json(&self.users_path(), &users)
    }

    fn get_user(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let mut users = self.load_users()?;
        Ok(users.remove(username).map(|u| u.into_record(username.to_string())))
    }

    fn list_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        Ok(self.load_users()?.into_iter().map(|(name, u)| u.into_record(name)).collect())
    }
}

/// Read a JSON document, treating a missing file as the empty collection
fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StoreError> {
    if !path.exists() {
        return Ok(T::default());
    }
    let contents = fs::read_to_string(path)
        .map_err(|source| StoreError::Read { path: path.to_path_buf(), source })?;
    serde_json::from_str(&contents)
        .map_err(|source| StoreError::Malformed { path: path.to_path_buf(), source })
}

/// Write a JSON document through a temp file so readers never see a partial write
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let write_err = |source: std::io::Error| StoreError::Write { path: path.to_path_buf(), source };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let contents = serde_json::to_string_pretty(value).map_err(|e| write_err(e.into()))?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents).map_err(write_err)?;
    fs::rename(&tmp, path).map_err(write_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn store() -> (TempDir, JsonStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        (dir, store)
    }

    fn draft(q: &str) -> CardDraft {
        CardDraft::new("Direito", "Penal", q, "Resposta")
    }

    #[test]
    fn missing_files_read_as_empty() {
        let (_dir, store) = store();
        assert!(store.list_cards(Collection::User("ana")).unwrap().is_empty());
        assert!(store.load_feedback("ana").unwrap().is_empty());
        assert!(store.list_users().unwrap().is_empty());
    }

    #[test]
    fn card_crud_persists() {
        let (dir, mut store) = store();
        let user = Collection::User("ana");

        let first = store.add_card(user, draft("Q1")).unwrap();
        let second = store.add_card(user, draft("Q2")).unwrap();
        store.update_card(user, &first.id, draft("Q1 edited")).unwrap();
        store.delete_card(user, &second.id).unwrap();

        let reopened = JsonStore::open(dir.path()).unwrap();
        let cards = reopened.list_cards(user).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].id, first.id);
        assert_eq!(cards[0].question, "Q1 edited");
    }

    #[test]
    fn collections_are_separate() {
        let (_dir, mut store) = store();
        store.add_card(Collection::Shared, draft("shared")).unwrap();
        store.add_card(Collection::User("ana"), draft("mine")).unwrap();

        assert_eq!(store.list_cards(Collection::Shared).unwrap().len(), 1);
        assert_eq!(store.list_cards(Collection::User("ana")).unwrap().len(), 1);
        assert!(store.list_cards(Collection::User("bia")).unwrap().is_empty());
    }

    #[test]
    fn delete_unknown_card_fails() {
        let (_dir, mut store) = store();
        let err = store.delete_card(Collection::User("ana"), &CardId::from("nope")).unwrap_err();
        assert!(matches!(err, StoreError::CardNotFound { .. }));
    }

    #[test]
    fn history_is_returned_oldest_first() {
        let (_dir, mut store) = store();
        let card = Card::new(CardId::from("c1"), draft("Q"));

        let mut late = FeedbackEntry::for_card(&card, Some(90), None);
        let mut early = late.clone();
        early.score = Some(10);
        early.timestamp = late.timestamp - Duration::minutes(5);
        late.timestamp += Duration::seconds(1);

        store.append_feedback("ana", late).unwrap();
        store.append_feedback("ana", early).unwrap();

        let scores: Vec<_> = store.load_feedback("ana").unwrap().iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![Some(10), Some(90)]);
    }

    #[test]
    fn clear_feedback_empties_history() {
        let (_dir, mut store) = store();
        let card = Card::new(CardId::from("c1"), draft("Q"));
        store.append_feedback("ana", FeedbackEntry::for_card(&card, Some(50), None)).unwrap();
        store.clear_feedback("ana").unwrap();
        assert!(store.load_feedback("ana").unwrap().is_empty());
    }

    #[test]
    fn malformed_history_is_reported() {
        let (dir, store) = store();
        let path = dir.path().join("users").join("ana");
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join(HISTORY_FILE), "{ not json").unwrap();

        let err = store.load_feedback("ana").unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn legacy_digest_users_are_readable() {
        let (dir, mut store) = store();
        fs::write(dir.path().join(USERS_FILE), r#"{"admin": "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8"}"#)
            .unwrap();

        let admin = store.get_user("admin").unwrap().unwrap();
        assert_eq!(admin.password_hash.len(), 64);
        assert!(admin.created_at.is_none());

        store
            .put_user(UserRecord {
                username: "ana".into(),
                password_hash: "$argon2id$stub".into(),
                created_at: Some(Utc::now()),
            })
            .unwrap();
        let names: Vec<_> = store.list_users().unwrap().into_iter().map(|u| u.username).collect();
        assert_eq!(names, vec!["admin", "ana"]);
    }

    #[test]
    fn path_escaping_usernames_are_rejected() {
        let (_dir, store) = store();
        assert!(matches!(
            store.load_feedback("../etc"),
            Err(StoreError::InvalidUsername(_))
        ));
    }
}
