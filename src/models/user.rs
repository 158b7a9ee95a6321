use serde::{Deserialize, Serialize};

/// Number of synthetic users written by a single create call
pub const SEED_BATCH_SIZE: usize = 10;

/// A stored user as returned to API clients. This is a projection of the
/// stored document: other fields are not returned and missing ones are empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub username: String,
}

/// A user that has not been assigned an id by the store yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub username: String,
}

impl NewUser {
    /// Synthetic user number `n` of the seed batch
    pub fn numbered(n: usize) -> Self {
        Self {
            name: format!("User {}", n),
            email: format!("user{}@example.com", n),
            username: format!("user{}", n),
        }
    }
}

/// The fixed batch inserted by `POST /users`: `user1` through `user10`
pub fn seed_batch() -> Vec<NewUser> {
    (1..=SEED_BATCH_SIZE).map(NewUser::numbered).collect()
}
