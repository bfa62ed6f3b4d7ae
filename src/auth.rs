//! Session management collaborator and an in-process implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Error, PartialEq)]
pub enum AuthError {
    #[error("correo o contraseña incorrectos")]
    InvalidCredentials,
    #[error("el correo `{0}` ya está registrado")]
    EmailTaken(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("authentication service unavailable: {0}")]
    Unavailable(String),
}

pub type SessionListener = Arc<dyn Fn(Option<&Session>) + Send + Sync>;

/// Token returned by [`AuthProvider::on_session_change`]; pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(u64);

pub trait AuthProvider: Send + Sync {
    fn session(&self) -> Option<Session>;
    /// Registers `listener`, which runs after every sign in, sign up, or sign out.
    fn on_session_change(&self, listener: SessionListener) -> ListenerHandle;
    fn remove_listener(&self, handle: ListenerHandle) -> bool;
    fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;
    fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError>;
    fn sign_out(&self) -> Result<(), AuthError>;
}

struct UserRecord {
    id: Uuid,
    salt: String,
    digest: String,
}

/// Keeps accounts in memory with salted SHA-256 password digests.
pub struct LocalAuth {
    users: Mutex<HashMap<String, UserRecord>>,
    session: Mutex<Option<Session>>,
    listeners: Mutex<Vec<(ListenerHandle, SessionListener)>>,
    next_handle: AtomicU64,
}

impl Default for LocalAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalAuth {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            session: Mutex::new(None),
            listeners: Mutex::new(Vec::new()),
            next_handle: AtomicU64::new(1),
        }
    }

    /// Starts with an active session for `user_id`, as a single-user CLI does.
    pub fn signed_in_as(user_id: Uuid, email: &str) -> Self {
        let auth = Self::new();
        if let Ok(mut session) = auth.session.lock() {
            *session = Some(Session {
                user_id,
                email: email.to_string(),
                started_at: Utc::now(),
            });
        }
        auth
    }

    fn set_session(&self, next: Option<Session>) -> Result<(), AuthError> {
        {
            let mut session = self.session.lock().map_err(poisoned)?;
            *session = next.clone();
        }
        let listeners: Vec<SessionListener> = self
            .listeners
            .lock()
            .map_err(poisoned)?
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(next.as_ref());
        }
        Ok(())
    }
}

fn poisoned<T>(_: T) -> AuthError {
    AuthError::Unavailable("auth state lock poisoned".into())
}

fn normalize_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AuthError::InvalidInput("se requiere un correo válido".into()));
    }
    Ok(email)
}

fn password_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl AuthProvider for LocalAuth {
    fn session(&self) -> Option<Session> {
        self.session.lock().ok().and_then(|session| session.clone())
    }

    fn on_session_change(&self, listener: SessionListener) -> ListenerHandle {
        let handle = ListenerHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push((handle, listener));
        }
        handle
    }

    fn remove_listener(&self, handle: ListenerHandle) -> bool {
        match self.listeners.lock() {
            Ok(mut listeners) => {
                let before = listeners.len();
                listeners.retain(|(existing, _)| *existing != handle);
                listeners.len() != before
            }
            Err(_) => false,
        }
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = normalize_email(email)?;
        let user_id = {
            let users = self.users.lock().map_err(poisoned)?;
            let record = users.get(&email).ok_or(AuthError::InvalidCredentials)?;
            if password_digest(&record.salt, password) != record.digest {
                return Err(AuthError::InvalidCredentials);
            }
            record.id
        };
        let session = Session {
            user_id,
            email,
            started_at: Utc::now(),
        };
        self.set_session(Some(session.clone()))?;
        info!(user = %session.user_id, "signed in");
        Ok(session)
    }

    fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::InvalidInput(format!(
                "la contraseña debe tener al menos {MIN_PASSWORD_LEN} caracteres"
            )));
        }
        let user_id = {
            let mut users = self.users.lock().map_err(poisoned)?;
            if users.contains_key(&email) {
                return Err(AuthError::EmailTaken(email));
            }
            let salt = Uuid::new_v4().to_string();
            let record = UserRecord {
                id: Uuid::new_v4(),
                digest: password_digest(&salt, password),
                salt,
            };
            let id = record.id;
            users.insert(email.clone(), record);
            id
        };
        let session = Session {
            user_id,
            email,
            started_at: Utc::now(),
        };
        self.set_session(Some(session.clone()))?;
        info!(user = %session.user_id, "registered account");
        Ok(session)
    }

    fn sign_out(&self) -> Result<(), AuthError> {
        self.set_session(None)?;
        info!("signed out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn sign_up_then_sign_in() {
        let auth = LocalAuth::new();
        let created = auth.sign_up("Ana@Example.com", "secreto1").unwrap();
        auth.sign_out().unwrap();
        assert!(auth.session().is_none());

        let session = auth.sign_in("ana@example.com", "secreto1").unwrap();
        assert_eq!(session.user_id, created.user_id);
        assert_eq!(
            auth.sign_in("ana@example.com", "otra-clave"),
            Err(AuthError::InvalidCredentials)
        );
    }

    #[test]
    fn duplicate_and_weak_sign_ups_fail() {
        let auth = LocalAuth::new();
        auth.sign_up("luis@example.com", "123456").unwrap();
        assert!(matches!(
            auth.sign_up("luis@example.com", "abcdef"),
            Err(AuthError::EmailTaken(_))
        ));
        assert!(matches!(
            auth.sign_up("otro@example.com", "123"),
            Err(AuthError::InvalidInput(_))
        ));
    }

    #[test]
    fn listeners_see_every_change_until_removed() {
        let auth = LocalAuth::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let handle = auth.on_session_change(Arc::new(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        }));
        auth.sign_up("eva@example.com", "abcdef").unwrap();
        auth.sign_out().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        assert!(auth.remove_listener(handle));
        auth.sign_in("eva@example.com", "abcdef").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
