//! User accounts: registration, login and administration
//!
//! Passwords are stored as argon2id PHC strings. Records written by older
//! versions hold an unsalted hex SHA-256 digest; those still verify and are
//! rehashed on the next successful login.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::store::{Store, StoreError, UserRecord};

/// Reserved name of the administrator account
pub const ADMIN_USERNAME: &str = "admin";

/// Account errors, each shown to the user as a re-prompt
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Enter both a username and a password")]
    MissingCredentials,

    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("The username 'admin' is reserved for the administrator")]
    ReservedUsername,

    #[error("The username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("No user named '{0}'")]
    UnknownUser(String),

    #[error("The administrator account does not exist yet")]
    NoAdmin,

    #[error("The administrator account already exists")]
    AdminExists,

    #[error("Only the administrator can do that")]
    NotAdmin,

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A logged-in user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub username: String,
}

impl Account {
    pub fn is_admin(&self) -> bool {
        self.username == ADMIN_USERNAME
    }
}

/// Outcome of checking a password against a stored hash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verification {
    Valid,
    /// Valid against a legacy digest; the record should be rehashed
    ValidLegacy,
    Invalid,
}

/// Hash `password` with argon2id and a random salt
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

fn legacy_digest(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

fn verify_password(password: &str, stored: &str) -> Verification {
    match PasswordHash::new(stored) {
        Ok(hash) => {
            if Argon2::default().verify_password(password.as_bytes(), &hash).is_ok() {
                Verification::Valid
            } else {
                Verification::Invalid
            }
        }
        Err(_) if stored.eq_ignore_ascii_case(&legacy_digest(password)) => {
            Verification::ValidLegacy
        }
        Err(_) => Verification::Invalid,
    }
}

/// Trimmed, non-empty credential
fn required(value: &str) -> Result<&str, AuthError> {
    let value = value.trim();
    if value.is_empty() { Err(AuthError::MissingCredentials) } else { Ok(value) }
}

fn new_record(username: &str, password: &str) -> Result<UserRecord, AuthError> {
    Ok(UserRecord {
        username: username.to_string(),
        password_hash: hash_password(password)?,
        created_at: Some(Utc::now()),
    })
}

pub fn admin_exists(store: &dyn Store) -> Result<bool, AuthError> {
    Ok(store.get_user(ADMIN_USERNAME)?.is_some())
}

/// First-run creation of the administrator account
pub fn create_admin(
    store: &mut dyn Store,
    password: &str,
    confirm: &str,
) -> Result<Account, AuthError> {
    if admin_exists(store)? {
        return Err(AuthError::AdminExists);
    }
    let password = required(password)?;
    if password != confirm.trim() {
        return Err(AuthError::PasswordMismatch);
    }

    store.put_user(new_record(ADMIN_USERNAME, password)?)?;
    tracing::info!("Created administrator account");
    Ok(Account { username: ADMIN_USERNAME.to_string() })
}

/// Register a regular user
pub fn register(
    store: &mut dyn Store,
    username: &str,
    password: &str,
    confirm: &str,
) -> Result<Account, AuthError> {
    if !admin_exists(store)? {
        return Err(AuthError::NoAdmin);
    }
    let username = required(username)?;
    let password = required(password)?;
    required(confirm)?;
    if password != confirm.trim() {
        return Err(AuthError::PasswordMismatch);
    }
    if username == ADMIN_USERNAME {
        return Err(AuthError::ReservedUsername);
    }
    if store.get_user(username)?.is_some() {
        return Err(AuthError::UsernameTaken(username.to_string()));
    }

    store.put_user(new_record(username, password)?)?;
    tracing::info!("Registered user {}", username);
    Ok(Account { username: username.to_string() })
}

/// Check credentials; no lockout
pub fn login(store: &mut dyn Store, username: &str, password: &str) -> Result<Account, AuthError> {
    let (Ok(username), Ok(password)) = (required(username), required(password)) else {
        return Err(AuthError::MissingCredentials);
    };
    if !admin_exists(store)? {
        return Err(AuthError::NoAdmin);
    }

    let Some(mut record) = store.get_user(username)? else {
        tracing::info!("Failed login for unknown user {}", username);
        return Err(AuthError::InvalidCredentials);
    };

    match verify_password(password, &record.password_hash) {
        Verification::Valid => {}
        Verification::ValidLegacy => {
            record.password_hash = hash_password(password)?;
            if let Err(e) = store.put_user(record) {
                tracing::warn!("Could not upgrade password hash for {}: {}", username, e);
            } else {
                tracing::info!("Upgraded legacy password hash for {}", username);
            }
        }
        Verification::Invalid => {
            tracing::info!("Failed login for {}", username);
            return Err(AuthError::InvalidCredentials);
        }
    }

    tracing::info!("{} logged in", username);
    Ok(Account { username: username.to_string() })
}

/// All accounts, for the administrator
pub fn list_users(store: &dyn Store, actor: &Account) -> Result<Vec<UserRecord>, AuthError> {
    if !actor.is_admin() {
        return Err(AuthError::NotAdmin);
    }
    Ok(store.list_users()?)
}

/// Set a new password for `username`, for the administrator
pub fn reset_password(
    store: &mut dyn Store,
    actor: &Account,
    username: &str,
    password: &str,
) -> Result<(), AuthError> {
    if !actor.is_admin() {
        return Err(AuthError::NotAdmin);
    }
    let password = required(password)?;
    let Some(mut record) = store.get_user(username.trim())? else {
        return Err(AuthError::UnknownUser(username.trim().to_string()));
    };

    record.password_hash = hash_password(password)?;
    store.put_user(record)?;
    tracing::info!("Administrator reset the password of {}", username.trim());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;

    fn store_with_admin() -> MemoryStore {
        let mut store = MemoryStore::new();
        create_admin(&mut store, "root-pass", "root-pass").unwrap();
        store
    }

    #[test]
    fn hashes_are_salted_argon2() {
        let a = hash_password("segredo").unwrap();
        let b = hash_password("segredo").unwrap();
        assert!(a.starts_with("$argon2id$"));
        assert_ne!(a, b);
        assert_eq!(verify_password("segredo", &a), Verification::Valid);
        assert_eq!(verify_password("outro", &a), Verification::Invalid);
    }

    #[test]
    fn nothing_works_before_admin_exists() {
        let mut store = MemoryStore::new();
        assert!(!admin_exists(&store).unwrap());
        assert!(matches!(register(&mut store, "ana", "pw", "pw"), Err(AuthError::NoAdmin)));
        assert!(matches!(login(&mut store, "ana", "pw"), Err(AuthError::NoAdmin)));

        let admin = create_admin(&mut store, "root-pass", "root-pass").unwrap();
        assert!(admin.is_admin());
        assert!(matches!(
            create_admin(&mut store, "again", "again"),
            Err(AuthError::AdminExists)
        ));
    }

    #[test]
    fn admin_passwords_must_match() {
        let mut store = MemoryStore::new();
        assert!(matches!(create_admin(&mut store, "a", "b"), Err(AuthError::PasswordMismatch)));
        assert!(matches!(create_admin(&mut store, " ", " "), Err(AuthError::MissingCredentials)));
        assert!(!admin_exists(&store).unwrap());
    }

    #[test]
    fn registration_rules() {
        let mut store = store_with_admin();

        assert!(matches!(register(&mut store, "", "pw", "pw"), Err(AuthError::MissingCredentials)));
        assert!(matches!(register(&mut store, "ana", "pw", ""), Err(AuthError::MissingCredentials)));
        assert!(matches!(register(&mut store, "ana", "pw", "px"), Err(AuthError::PasswordMismatch)));
        assert!(matches!(register(&mut store, "admin", "pw", "pw"), Err(AuthError::ReservedUsername)));

        let account = register(&mut store, " ana ", "pw", "pw").unwrap();
        assert_eq!(account.username, "ana");
        assert!(!account.is_admin());
        assert!(matches!(
            register(&mut store, "ana", "pw2", "pw2"),
            Err(AuthError::UsernameTaken(name)) if name == "ana"
        ));
    }

    #[test]
    fn login_distinguishes_missing_and_wrong_credentials() {
        let mut store = store_with_admin();
        register(&mut store, "ana", "pw", "pw").unwrap();

        assert!(matches!(login(&mut store, "ana", "  "), Err(AuthError::MissingCredentials)));
        assert!(matches!(login(&mut store, "", "pw"), Err(AuthError::MissingCredentials)));
        assert!(matches!(login(&mut store, "ana", "nope"), Err(AuthError::InvalidCredentials)));
        assert!(matches!(login(&mut store, "bob", "pw"), Err(AuthError::InvalidCredentials)));

        assert_eq!(login(&mut store, "ana", "pw").unwrap().username, "ana");
        assert!(login(&mut store, "admin", "root-pass").unwrap().is_admin());
    }

    #[test]
    fn legacy_digest_is_upgraded_on_login() {
        let mut store = store_with_admin();
        store
            .put_user(UserRecord {
                username: "ana".into(),
                password_hash: legacy_digest("pw"),
                created_at: None,
            })
            .unwrap();

        login(&mut store, "ana", "pw").unwrap();

        let record = store.get_user("ana").unwrap().unwrap();
        assert!(record.password_hash.starts_with("$argon2id$"));
        assert!(login(&mut store, "ana", "pw").is_ok());
    }

    #[test]
    fn admin_tools_require_admin() {
        let mut store = store_with_admin();
        let ana = register(&mut store, "ana", "pw", "pw").unwrap();
        let admin = login(&mut store, "admin", "root-pass").unwrap();

        assert!(matches!(list_users(&store, &ana), Err(AuthError::NotAdmin)));
        assert!(matches!(
            reset_password(&mut store, &ana, "admin", "x"),
            Err(AuthError::NotAdmin)
        ));

        let names: Vec<String> =
            list_users(&store, &admin).unwrap().into_iter().map(|u| u.username).collect();
        assert_eq!(names, vec!["admin".to_string(), "ana".to_string()]);

        reset_password(&mut store, &admin, "ana", "fresh").unwrap();
        assert!(matches!(login(&mut store, "ana", "pw"), Err(AuthError::InvalidCredentials)));
        assert!(login(&mut store, "ana", "fresh").is_ok());
        assert!(matches!(
            reset_password(&mut store, &admin, "ghost", "x"),
            Err(AuthError::UnknownUser(_))
        ));
    }
}
