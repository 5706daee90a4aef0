use std::collections::HashMap;
use std::sync::{RwLock, RwLockWriteGuard};

use thiserror::Error;

use campus_auth::{UserDirectory, UserRecord};
use campus_core::{DomainError, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("user directory unavailable (lock poisoned)")]
    Unavailable,
}

type DirectoryResult<T> = Result<T, DirectoryError>;

/// In-memory user directory for tests/dev.
///
/// Emails are unique case-insensitively.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<UserId, UserRecord>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new user. Fails on a taken id or email.
    pub fn insert(&self, record: UserRecord) -> DirectoryResult<()> {
        let mut users = self.write()?;
        if users.contains_key(&record.id) {
            return Err(DomainError::duplicate("id").into());
        }
        if email_taken(&users, &record) {
            return Err(DomainError::duplicate("email").into());
        }
        users.insert(record.id, record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.users.read().map(|u| u.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn write(&self) -> DirectoryResult<RwLockWriteGuard<'_, HashMap<UserId, UserRecord>>> {
        self.users.write().map_err(|_| DirectoryError::Unavailable)
    }
}

fn email_taken(users: &HashMap<UserId, UserRecord>, record: &UserRecord) -> bool {
    users
        .values()
        .any(|u| u.id != record.id && u.email.eq_ignore_ascii_case(&record.email))
}

impl UserDirectory for InMemoryUserDirectory {
    fn find(&self, user_id: UserId) -> Option<UserRecord> {
        let users = self.users.read().ok()?;
        users.get(&user_id).cloned()
    }
}
