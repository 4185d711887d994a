use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// In-memory username/password store shared by every connection task
///
/// Registration holds the write lock across the existence check and the
/// insert, so two racing registrations of one name cannot both succeed.
#[derive(Debug, Default)]
pub struct AccountStore {
    users: RwLock<HashMap<String, String>>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user; false if the name is already taken
    pub fn register(&self, username: &str, password: &str) -> bool {
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        match users.entry(username.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(password.to_string());
                true
            }
        }
    }

    /// True iff the user exists and the password matches; a missing
    /// credential never matches
    pub fn login(&self, username: Option<&str>, password: Option<&str>) -> bool {
        let (Some(username), Some(password)) = (username, password) else {
            return false;
        };
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        users.get(username).is_some_and(|stored| stored == password)
    }

    pub fn len(&self) -> usize {
        self.users.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
