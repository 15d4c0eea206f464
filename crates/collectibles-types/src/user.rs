//! User types

use serde::{Deserialize, Serialize};

/// Stored user record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Creation payload for `POST /users/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserCreate {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Partial update for `PUT /users/{id}`; absent or `null` fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl UserPatch {
    /// Merge present fields into `user`.
    pub fn apply(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
    }
}
