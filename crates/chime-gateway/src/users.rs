//! Demo user service: the thin CRUD slice that exercises the error
//! taxonomy and response envelope. Storage is an in-process map; the
//! gateway carries no database.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use chime_core::error::{ChimeError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
}

/// In-memory user store keyed by id, with a username uniqueness index.
#[derive(Default)]
pub struct UserRepo {
    users: DashMap<Uuid, User>,
    by_username: DashMap<String, Uuid>,
}

impl UserRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a user. Fails with `InvalidArgument` for a blank username
    /// and `Conflict` when the username is already in use.
    pub fn create(&self, new_user: NewUser) -> Result<User> {
        let username = new_user.username.trim().to_string();
        if username.is_empty() {
            return Err(ChimeError::InvalidArgument(
                "username is required".to_string(),
            ));
        }
        if self.by_username.contains_key(&username) {
            return Err(ChimeError::Conflict(format!(
                "username {username:?} is already in use"
            )));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: username.clone(),
        };
        self.by_username.insert(username, user.id);
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    pub fn find(&self, id: Uuid) -> Result<User> {
        self.users
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ChimeError::NotFound(format!("user {id}")))
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_find_round_trip() {
        let repo = UserRepo::new();
        let user = repo
            .create(NewUser {
                username: "ada".to_string(),
            })
            .unwrap();
        assert_eq!(repo.find(user.id).unwrap().username, "ada");
    }

    #[test]
    fn blank_username_is_rejected() {
        let repo = UserRepo::new();
        let err = repo
            .create(NewUser {
                username: "   ".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, ChimeError::InvalidArgument(_)));
        assert!(repo.is_empty());
    }

    #[test]
    fn duplicate_username_conflicts() {
        let repo = UserRepo::new();
        repo.create(NewUser {
            username: "ada".to_string(),
        })
        .unwrap();
        let err = repo
            .create(NewUser {
                username: "ada".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, ChimeError::Conflict(_)));
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn missing_user_is_not_found() {
        let repo = UserRepo::new();
        assert!(matches!(
            repo.find(Uuid::new_v4()),
            Err(ChimeError::NotFound(_))
        ));
    }
}
