use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An entity that holds a rank inside an ordered sibling collection.
///
/// Positions within one parent are dense and zero-based: a parent with
/// N children uses exactly the positions 0..N-1, each once. The reflow
/// routines in [`crate::position`] maintain that invariant across
/// inserts, deletes, and moves.
pub trait Positioned {
    type Id: Copy + PartialEq;

    fn id(&self) -> Self::Id;
    fn position(&self) -> i64;
    fn set_position(&mut self, position: i64);
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// Stored as `salt$hexdigest`; never serialized into responses.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Board {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub owner_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardMember {
    pub id: i64,
    pub board_id: i64,
    pub user_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct List {
    pub id: i64,
    pub title: String,
    pub board_id: i64,
    pub position: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub list_id: i64,
    pub position: i64,
    pub due_date: Option<DateTime<Utc>>,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Positioned for Card {
    type Id = i64;

    fn id(&self) -> i64 {
        self.id
    }

    fn position(&self) -> i64 {
        self.position
    }

    fn set_position(&mut self, position: i64) {
        self.position = position;
    }
}

impl Positioned for List {
    type Id = i64;

    fn id(&self) -> i64 {
        self.id
    }

    fn position(&self) -> i64 {
        self.position
    }

    fn set_position(&mut self, position: i64) {
        self.position = position;
    }
}
