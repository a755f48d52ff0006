/// In-memory task-board store.
///
/// Collections live in per-entity maps behind the single `AppState`
/// mutex; a handler holds the lock for its whole read-reflow-write
/// sequence, so sibling positions are never observed mid-reflow. The
/// position bookkeeping itself is delegated to `tablero_core::position`
/// through two thin `SiblingStore` adapters, one per sibling kind.
use std::collections::HashMap;

use chrono::Utc;
use thiserror::Error;

use tablero_core::position::{
    adjust_positions_on_insert, compact_positions_on_delete, reorder_on_move, validate_position,
};
use tablero_core::storage::SiblingStore;
use tablero_core::types::{Board, BoardMember, Card, List, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("User not found")]
    UserNotFound,

    #[error("Board not found")]
    BoardNotFound,

    #[error("List not found")]
    ListNotFound,

    #[error("Card not found")]
    CardNotFound,

    #[error("Member not found")]
    MemberNotFound,

    #[error("Username or email already exists")]
    DuplicateUser,

    #[error("You do not have permission to access this board")]
    Forbidden,
}

/// Field changes for a card update. `None` leaves a field untouched.
#[derive(Debug, Default)]
pub struct CardChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<chrono::DateTime<Utc>>,
    pub archived: Option<bool>,
    pub list_id: Option<i64>,
    pub position: Option<i64>,
}

#[derive(Default)]
pub struct Store {
    users: HashMap<i64, User>,
    boards: HashMap<i64, Board>,
    members: HashMap<i64, BoardMember>,
    lists: HashMap<i64, List>,
    cards: HashMap<i64, Card>,
    next_user_id: i64,
    next_board_id: i64,
    next_member_id: i64,
    next_list_id: i64,
    next_card_id: i64,
}

/// `SiblingStore` view over the cards of one board's lists, parent = list id.
struct CardSiblings<'a> {
    cards: &'a mut HashMap<i64, Card>,
}

impl SiblingStore for CardSiblings<'_> {
    type Item = Card;
    type ParentId = i64;
    type Error = StoreError;

    fn max_position(&self, parent_id: i64) -> Result<Option<i64>, StoreError> {
        Ok(self
            .cards
            .values()
            .filter(|c| c.list_id == parent_id)
            .map(|c| c.position)
            .max())
    }

    fn siblings_at_or_above(&self, parent_id: i64, position: i64) -> Result<Vec<Card>, StoreError> {
        Ok(self
            .cards
            .values()
            .filter(|c| c.list_id == parent_id && c.position >= position)
            .cloned()
            .collect())
    }

    fn siblings_above(&self, parent_id: i64, position: i64) -> Result<Vec<Card>, StoreError> {
        Ok(self
            .cards
            .values()
            .filter(|c| c.list_id == parent_id && c.position > position)
            .cloned()
            .collect())
    }

    fn siblings_between(
        &self,
        parent_id: i64,
        low: i64,
        high: i64,
        exclude: i64,
    ) -> Result<Vec<Card>, StoreError> {
        Ok(self
            .cards
            .values()
            .filter(|c| {
                c.list_id == parent_id
                    && c.id != exclude
                    && c.position >= low
                    && c.position <= high
            })
            .cloned()
            .collect())
    }

    fn persist(&mut self, item: Card) -> Result<(), StoreError> {
        self.cards.insert(item.id, item);
        Ok(())
    }
}

/// `SiblingStore` view over lists, parent = board id.
struct ListSiblings<'a> {
    lists: &'a mut HashMap<i64, List>,
}

impl SiblingStore for ListSiblings<'_> {
    type Item = List;
    type ParentId = i64;
    type Error = StoreError;

    fn max_position(&self, parent_id: i64) -> Result<Option<i64>, StoreError> {
        Ok(self
            .lists
            .values()
            .filter(|l| l.board_id == parent_id)
            .map(|l| l.position)
            .max())
    }

    fn siblings_at_or_above(&self, parent_id: i64, position: i64) -> Result<Vec<List>, StoreError> {
        Ok(self
            .lists
            .values()
            .filter(|l| l.board_id == parent_id && l.position >= position)
            .cloned()
            .collect())
    }

    fn siblings_above(&self, parent_id: i64, position: i64) -> Result<Vec<List>, StoreError> {
        Ok(self
            .lists
            .values()
            .filter(|l| l.board_id == parent_id && l.position > position)
            .cloned()
            .collect())
    }

    fn siblings_between(
        &self,
        parent_id: i64,
        low: i64,
        high: i64,
        exclude: i64,
    ) -> Result<Vec<List>, StoreError> {
        Ok(self
            .lists
            .values()
            .filter(|l| {
                l.board_id == parent_id
                    && l.id != exclude
                    && l.position >= low
                    && l.position <= high
            })
            .cloned()
            .collect())
    }

    fn persist(&mut self, item: List) -> Result<(), StoreError> {
        self.lists.insert(item.id, item);
        Ok(())
    }
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Users ────────────────────────────────────────────────────────

    pub fn create_user(
        &mut self,
        username: String,
        email: String,
        password_hash: String,
    ) -> Result<User, StoreError> {
        if self
            .users
            .values()
            .any(|u| u.username == username || u.email == email)
        {
            return Err(StoreError::DuplicateUser);
        }
        self.next_user_id += 1;
        let user = User {
            id: self.next_user_id,
            username,
            email,
            password_hash,
            created_at: Utc::now(),
        };
        self.users.insert(user.id, user.clone());
        log::info!("[store] Registered user {} (id {})", user.username, user.id);
        Ok(user)
    }

    pub fn user(&self, id: i64) -> Result<User, StoreError> {
        self.users.get(&id).cloned().ok_or(StoreError::UserNotFound)
    }

    pub fn user_by_username(&self, username: &str) -> Option<User> {
        self.users.values().find(|u| u.username == username).cloned()
    }

    // ── Boards and membership ────────────────────────────────────────

    pub fn create_board(
        &mut self,
        owner_id: i64,
        title: String,
        description: Option<String>,
    ) -> Board {
        self.next_board_id += 1;
        let board = Board {
            id: self.next_board_id,
            title,
            description,
            owner_id,
        };
        self.boards.insert(board.id, board.clone());
        log::info!("[store] Created board {} for user {}", board.id, owner_id);
        board
    }

    pub fn board(&self, id: i64) -> Result<Board, StoreError> {
        self.boards.get(&id).cloned().ok_or(StoreError::BoardNotFound)
    }

    pub fn update_board(
        &mut self,
        id: i64,
        title: Option<String>,
        description: Option<String>,
    ) -> Result<Board, StoreError> {
        let board = self.boards.get_mut(&id).ok_or(StoreError::BoardNotFound)?;
        if let Some(title) = title {
            board.title = title;
        }
        if let Some(description) = description {
            board.description = Some(description);
        }
        Ok(board.clone())
    }

    /// Delete a board together with its lists, their cards, and its
    /// memberships.
    pub fn delete_board(&mut self, id: i64) -> Result<(), StoreError> {
        self.boards.remove(&id).ok_or(StoreError::BoardNotFound)?;
        let list_ids: Vec<i64> = self
            .lists
            .values()
            .filter(|l| l.board_id == id)
            .map(|l| l.id)
            .collect();
        self.cards.retain(|_, c| !list_ids.contains(&c.list_id));
        self.lists.retain(|_, l| l.board_id != id);
        self.members.retain(|_, m| m.board_id != id);
        log::info!("[store] Deleted board {} ({} lists)", id, list_ids.len());
        Ok(())
    }

    /// Boards the user owns plus boards shared with them, deduplicated.
    pub fn boards_for_user(&self, user_id: i64) -> Vec<Board> {
        let mut owned: Vec<Board> = self
            .boards
            .values()
            .filter(|b| b.owner_id == user_id)
            .cloned()
            .collect();
        owned.sort_by_key(|b| b.id);
        let mut shared: Vec<Board> = self
            .members
            .values()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| self.boards.get(&m.board_id))
            .filter(|b| b.owner_id != user_id)
            .cloned()
            .collect();
        shared.sort_by_key(|b| b.id);
        owned.extend(shared);
        owned
    }

    /// Boards the user belongs to through a membership row only.
    pub fn member_boards(&self, user_id: i64) -> Vec<Board> {
        let mut boards: Vec<Board> = self
            .members
            .values()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| self.boards.get(&m.board_id))
            .cloned()
            .collect();
        boards.sort_by_key(|b| b.id);
        boards
    }

    pub fn members_of(&self, board_id: i64) -> Result<Vec<BoardMember>, StoreError> {
        if !self.boards.contains_key(&board_id) {
            return Err(StoreError::BoardNotFound);
        }
        let mut members: Vec<BoardMember> = self
            .members
            .values()
            .filter(|m| m.board_id == board_id)
            .cloned()
            .collect();
        members.sort_by_key(|m| m.id);
        Ok(members)
    }

    /// Add users to a board, skipping anyone already a member.
    pub fn add_members(&mut self, board_id: i64, user_ids: &[i64]) -> Result<(), StoreError> {
        if !self.boards.contains_key(&board_id) {
            return Err(StoreError::BoardNotFound);
        }
        for &user_id in user_ids {
            if !self.users.contains_key(&user_id) {
                return Err(StoreError::UserNotFound);
            }
            let already = self
                .members
                .values()
                .any(|m| m.board_id == board_id && m.user_id == user_id);
            if already {
                continue;
            }
            self.next_member_id += 1;
            self.members.insert(
                self.next_member_id,
                BoardMember {
                    id: self.next_member_id,
                    board_id,
                    user_id,
                },
            );
            log::info!("[store] Added user {} to board {}", user_id, board_id);
        }
        Ok(())
    }

    pub fn remove_member(&mut self, board_id: i64, user_id: i64) -> Result<(), StoreError> {
        let member_id = self
            .members
            .values()
            .find(|m| m.board_id == board_id && m.user_id == user_id)
            .map(|m| m.id)
            .ok_or(StoreError::MemberNotFound)?;
        self.members.remove(&member_id);
        log::info!("[store] Removed user {} from board {}", user_id, board_id);
        Ok(())
    }

    /// Owner or member may access a board.
    pub fn board_access(&self, board_id: i64, user_id: i64) -> Result<(), StoreError> {
        let board = self.boards.get(&board_id).ok_or(StoreError::BoardNotFound)?;
        if board.owner_id == user_id {
            return Ok(());
        }
        let is_member = self
            .members
            .values()
            .any(|m| m.board_id == board_id && m.user_id == user_id);
        if is_member {
            Ok(())
        } else {
            Err(StoreError::Forbidden)
        }
    }

    /// Only the owner may pass.
    pub fn board_owner(&self, board_id: i64, user_id: i64) -> Result<(), StoreError> {
        let board = self.boards.get(&board_id).ok_or(StoreError::BoardNotFound)?;
        if board.owner_id == user_id {
            Ok(())
        } else {
            Err(StoreError::Forbidden)
        }
    }

    /// Resolve the board a list belongs to, for access checks.
    pub fn board_of_list(&self, list_id: i64) -> Result<i64, StoreError> {
        self.lists
            .get(&list_id)
            .map(|l| l.board_id)
            .ok_or(StoreError::ListNotFound)
    }

    /// Resolve the board a card belongs to (card -> list -> board).
    pub fn board_of_card(&self, card_id: i64) -> Result<i64, StoreError> {
        let card = self.cards.get(&card_id).ok_or(StoreError::CardNotFound)?;
        self.board_of_list(card.list_id)
    }

    // ── Lists ────────────────────────────────────────────────────────

    pub fn list(&self, id: i64) -> Result<List, StoreError> {
        self.lists.get(&id).cloned().ok_or(StoreError::ListNotFound)
    }

    pub fn lists_of_board(&self, board_id: i64) -> Result<Vec<List>, StoreError> {
        if !self.boards.contains_key(&board_id) {
            return Err(StoreError::BoardNotFound);
        }
        let mut lists: Vec<List> = self
            .lists
            .values()
            .filter(|l| l.board_id == board_id)
            .cloned()
            .collect();
        lists.sort_by_key(|l| l.position);
        Ok(lists)
    }

    pub fn create_list(
        &mut self,
        board_id: i64,
        title: String,
        position: Option<i64>,
    ) -> Result<List, StoreError> {
        if !self.boards.contains_key(&board_id) {
            return Err(StoreError::BoardNotFound);
        }
        let mut siblings = ListSiblings {
            lists: &mut self.lists,
        };
        let position = validate_position(&siblings, board_id, position)?;
        adjust_positions_on_insert(&mut siblings, board_id, position)?;

        self.next_list_id += 1;
        let now = Utc::now();
        let list = List {
            id: self.next_list_id,
            title,
            board_id,
            position,
            created_at: now,
            updated_at: now,
        };
        self.lists.insert(list.id, list.clone());
        log::info!(
            "[store] Created list {} in board {} at position {}",
            list.id,
            board_id,
            position
        );
        Ok(list)
    }

    /// Update a list's title and, when board or position change, run the
    /// move reflow. A `position` equal to the current one is a no-op.
    pub fn update_list(
        &mut self,
        id: i64,
        title: Option<String>,
        board_id: Option<i64>,
        position: Option<i64>,
    ) -> Result<List, StoreError> {
        let (old_board_id, old_position) = {
            let list = self.lists.get(&id).ok_or(StoreError::ListNotFound)?;
            (list.board_id, list.position)
        };
        if let Some(new_board_id) = board_id {
            if !self.boards.contains_key(&new_board_id) {
                return Err(StoreError::BoardNotFound);
            }
        }
        if let Some(title) = title {
            if let Some(list) = self.lists.get_mut(&id) {
                list.title = title;
                list.updated_at = Utc::now();
            }
        }

        let new_board_id = board_id.unwrap_or(old_board_id);
        if new_board_id != old_board_id || position.is_some_and(|p| p != old_position) {
            self.relocate_list(id, old_board_id, old_position, new_board_id, position)?;
        }
        self.list(id)
    }

    /// Move a list to another board and/or position.
    pub fn move_list(
        &mut self,
        id: i64,
        board_id: Option<i64>,
        position: Option<i64>,
    ) -> Result<List, StoreError> {
        let (old_board_id, old_position) = {
            let list = self.lists.get(&id).ok_or(StoreError::ListNotFound)?;
            (list.board_id, list.position)
        };
        let new_board_id = match board_id {
            Some(b) if !self.boards.contains_key(&b) => return Err(StoreError::BoardNotFound),
            Some(b) => b,
            None => old_board_id,
        };
        self.relocate_list(id, old_board_id, old_position, new_board_id, position)?;
        self.list(id)
    }

    fn relocate_list(
        &mut self,
        id: i64,
        old_board_id: i64,
        old_position: i64,
        new_board_id: i64,
        position: Option<i64>,
    ) -> Result<(), StoreError> {
        let mut siblings = ListSiblings {
            lists: &mut self.lists,
        };
        let new_position = validate_position(&siblings, new_board_id, position)?;
        if new_board_id == old_board_id && new_position == old_position {
            return Ok(());
        }
        reorder_on_move(
            &mut siblings,
            id,
            old_board_id,
            old_position,
            new_board_id,
            new_position,
        )?;
        let list = self.lists.get_mut(&id).ok_or(StoreError::ListNotFound)?;
        list.board_id = new_board_id;
        list.position = new_position;
        list.updated_at = Utc::now();
        log::info!(
            "[store] Moved list {} from board {} pos {} to board {} pos {}",
            id,
            old_board_id,
            old_position,
            new_board_id,
            new_position
        );
        Ok(())
    }

    /// Delete a list, its cards, and compact the remaining lists.
    pub fn delete_list(&mut self, id: i64) -> Result<(), StoreError> {
        let list = self.lists.remove(&id).ok_or(StoreError::ListNotFound)?;
        self.cards.retain(|_, c| c.list_id != id);
        let mut siblings = ListSiblings {
            lists: &mut self.lists,
        };
        compact_positions_on_delete(&mut siblings, list.board_id, list.position)?;
        log::info!("[store] Deleted list {} from board {}", id, list.board_id);
        Ok(())
    }

    // ── Cards ────────────────────────────────────────────────────────

    pub fn card(&self, id: i64) -> Result<Card, StoreError> {
        self.cards.get(&id).cloned().ok_or(StoreError::CardNotFound)
    }

    pub fn cards_of_list(&self, list_id: i64) -> Result<Vec<Card>, StoreError> {
        if !self.lists.contains_key(&list_id) {
            return Err(StoreError::ListNotFound);
        }
        let mut cards: Vec<Card> = self
            .cards
            .values()
            .filter(|c| c.list_id == list_id)
            .cloned()
            .collect();
        cards.sort_by_key(|c| c.position);
        Ok(cards)
    }

    pub fn create_card(
        &mut self,
        list_id: i64,
        title: String,
        description: Option<String>,
        position: Option<i64>,
        due_date: Option<chrono::DateTime<Utc>>,
    ) -> Result<Card, StoreError> {
        if !self.lists.contains_key(&list_id) {
            return Err(StoreError::ListNotFound);
        }
        let mut siblings = CardSiblings {
            cards: &mut self.cards,
        };
        let position = validate_position(&siblings, list_id, position)?;
        adjust_positions_on_insert(&mut siblings, list_id, position)?;

        self.next_card_id += 1;
        let now = Utc::now();
        let card = Card {
            id: self.next_card_id,
            title,
            description,
            list_id,
            position,
            due_date,
            archived: false,
            created_at: now,
            updated_at: now,
        };
        self.cards.insert(card.id, card.clone());
        log::info!(
            "[store] Created card {} in list {} at position {}",
            card.id,
            list_id,
            position
        );
        Ok(card)
    }

    /// Apply field changes; list/position changes go through the move
    /// reflow, everything else is written in place.
    pub fn update_card(&mut self, id: i64, changes: CardChanges) -> Result<Card, StoreError> {
        let (old_list_id, old_position) = {
            let card = self.cards.get(&id).ok_or(StoreError::CardNotFound)?;
            (card.list_id, card.position)
        };
        if let Some(new_list_id) = changes.list_id {
            if !self.lists.contains_key(&new_list_id) {
                return Err(StoreError::ListNotFound);
            }
        }
        {
            let card = self.cards.get_mut(&id).ok_or(StoreError::CardNotFound)?;
            if let Some(title) = changes.title {
                card.title = title;
            }
            if let Some(description) = changes.description {
                card.description = Some(description);
            }
            if let Some(due_date) = changes.due_date {
                card.due_date = Some(due_date);
            }
            if let Some(archived) = changes.archived {
                card.archived = archived;
            }
            card.updated_at = Utc::now();
        }

        let new_list_id = changes.list_id.unwrap_or(old_list_id);
        if new_list_id != old_list_id || changes.position.is_some_and(|p| p != old_position) {
            self.relocate_card(id, old_list_id, old_position, new_list_id, changes.position)?;
        }
        self.card(id)
    }

    /// Move a card to another list and/or position.
    pub fn move_card(
        &mut self,
        id: i64,
        list_id: Option<i64>,
        position: Option<i64>,
    ) -> Result<Card, StoreError> {
        let (old_list_id, old_position) = {
            let card = self.cards.get(&id).ok_or(StoreError::CardNotFound)?;
            (card.list_id, card.position)
        };
        let new_list_id = match list_id {
            Some(l) if !self.lists.contains_key(&l) => return Err(StoreError::ListNotFound),
            Some(l) => l,
            None => old_list_id,
        };
        self.relocate_card(id, old_list_id, old_position, new_list_id, position)?;
        self.card(id)
    }

    fn relocate_card(
        &mut self,
        id: i64,
        old_list_id: i64,
        old_position: i64,
        new_list_id: i64,
        position: Option<i64>,
    ) -> Result<(), StoreError> {
        let mut siblings = CardSiblings {
            cards: &mut self.cards,
        };
        let new_position = validate_position(&siblings, new_list_id, position)?;
        if new_list_id == old_list_id && new_position == old_position {
            return Ok(());
        }
        reorder_on_move(
            &mut siblings,
            id,
            old_list_id,
            old_position,
            new_list_id,
            new_position,
        )?;
        let card = self.cards.get_mut(&id).ok_or(StoreError::CardNotFound)?;
        card.list_id = new_list_id;
        card.position = new_position;
        card.updated_at = Utc::now();
        log::info!(
            "[store] Moved card {} from list {} pos {} to list {} pos {}",
            id,
            old_list_id,
            old_position,
            new_list_id,
            new_position
        );
        Ok(())
    }

    /// Delete a card and compact its former siblings.
    pub fn delete_card(&mut self, id: i64) -> Result<(), StoreError> {
        let card = self.cards.remove(&id).ok_or(StoreError::CardNotFound)?;
        let mut siblings = CardSiblings {
            cards: &mut self.cards,
        };
        compact_positions_on_delete(&mut siblings, card.list_id, card.position)?;
        log::info!("[store] Deleted card {} from list {}", id, card.list_id);
        Ok(())
    }

    pub fn set_card_archived(&mut self, id: i64, archived: bool) -> Result<Card, StoreError> {
        let card = self.cards.get_mut(&id).ok_or(StoreError::CardNotFound)?;
        card.archived = archived;
        card.updated_at = Utc::now();
        Ok(card.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Store with one user (id 1) owning one board (id 1).
    fn store_with_board() -> Store {
        let mut store = Store::new();
        store
            .create_user("ana".into(), "ana@example.com".into(), "x$y".into())
            .unwrap();
        store.create_board(1, "Proyecto".into(), None);
        store
    }

    fn card_ids(store: &Store, list_id: i64) -> Vec<i64> {
        store
            .cards_of_list(list_id)
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect()
    }

    #[test]
    fn test_create_lists_append_in_order() {
        let mut store = store_with_board();
        let a = store.create_list(1, "Todo".into(), None).unwrap();
        let b = store.create_list(1, "Doing".into(), None).unwrap();
        let c = store.create_list(1, "Done".into(), None).unwrap();
        assert_eq!((a.position, b.position, c.position), (0, 1, 2));
    }

    #[test]
    fn test_create_list_in_middle_shifts_rest() {
        let mut store = store_with_board();
        let a = store.create_list(1, "Todo".into(), None).unwrap();
        let b = store.create_list(1, "Done".into(), None).unwrap();
        let middle = store.create_list(1, "Doing".into(), Some(1)).unwrap();
        assert_eq!(middle.position, 1);
        assert_eq!(store.list(a.id).unwrap().position, 0);
        assert_eq!(store.list(b.id).unwrap().position, 2);
    }

    #[test]
    fn test_create_card_negative_position_clamps() {
        let mut store = store_with_board();
        store.create_list(1, "Todo".into(), None).unwrap();
        store
            .create_card(1, "primero".into(), None, None, None)
            .unwrap();
        let card = store
            .create_card(1, "al frente".into(), None, Some(-3), None)
            .unwrap();
        assert_eq!(card.position, 0);
        assert_eq!(card_ids(&store, 1), vec![card.id, 1]);
    }

    #[test]
    fn test_delete_card_compacts_list() {
        let mut store = store_with_board();
        store.create_list(1, "Todo".into(), None).unwrap();
        for title in ["a", "b", "c"] {
            store
                .create_card(1, title.into(), None, None, None)
                .unwrap();
        }
        store.delete_card(2).unwrap();
        let cards = store.cards_of_list(1).unwrap();
        assert_eq!(
            cards.iter().map(|c| (c.id, c.position)).collect::<Vec<_>>(),
            vec![(1, 0), (3, 1)]
        );
    }

    #[test]
    fn test_move_card_across_lists_keeps_both_dense() {
        let mut store = store_with_board();
        store.create_list(1, "A".into(), None).unwrap();
        store.create_list(1, "B".into(), None).unwrap();
        store.create_card(1, "c1".into(), None, None, None).unwrap();
        store.create_card(1, "c2".into(), None, None, None).unwrap();
        store.create_card(2, "c3".into(), None, None, None).unwrap();

        let moved = store.move_card(1, Some(2), Some(1)).unwrap();
        assert_eq!((moved.list_id, moved.position), (2, 1));
        assert_eq!(card_ids(&store, 1), vec![2]);
        assert_eq!(store.card(2).unwrap().position, 0);
        assert_eq!(card_ids(&store, 2), vec![3, 1]);
    }

    #[test]
    fn test_move_card_same_slot_changes_nothing() {
        let mut store = store_with_board();
        store.create_list(1, "A".into(), None).unwrap();
        store.create_card(1, "c1".into(), None, None, None).unwrap();
        store.create_card(1, "c2".into(), None, None, None).unwrap();
        store.move_card(1, None, Some(0)).unwrap();
        assert_eq!(card_ids(&store, 1), vec![1, 2]);
    }

    #[test]
    fn test_update_card_can_move_between_lists() {
        let mut store = store_with_board();
        store.create_list(1, "A".into(), None).unwrap();
        store.create_list(1, "B".into(), None).unwrap();
        store.create_card(1, "c1".into(), None, None, None).unwrap();

        let changes = CardChanges {
            title: Some("renamed".into()),
            list_id: Some(2),
            ..CardChanges::default()
        };
        let card = store.update_card(1, changes).unwrap();
        assert_eq!(card.title, "renamed");
        assert_eq!((card.list_id, card.position), (2, 0));
    }

    #[test]
    fn test_delete_list_cascades_cards_and_compacts() {
        let mut store = store_with_board();
        store.create_list(1, "A".into(), None).unwrap();
        store.create_list(1, "B".into(), None).unwrap();
        store.create_list(1, "C".into(), None).unwrap();
        store.create_card(2, "c1".into(), None, None, None).unwrap();

        store.delete_list(2).unwrap();
        assert!(matches!(store.card(1), Err(StoreError::CardNotFound)));
        let lists = store.lists_of_board(1).unwrap();
        assert_eq!(
            lists.iter().map(|l| (l.id, l.position)).collect::<Vec<_>>(),
            vec![(1, 0), (3, 1)]
        );
    }

    #[test]
    fn test_delete_board_cascades_everything() {
        let mut store = store_with_board();
        store
            .create_user("bob".into(), "bob@example.com".into(), "x$y".into())
            .unwrap();
        store.add_members(1, &[2]).unwrap();
        store.create_list(1, "A".into(), None).unwrap();
        store.create_card(1, "c1".into(), None, None, None).unwrap();

        store.delete_board(1).unwrap();
        assert!(matches!(store.list(1), Err(StoreError::ListNotFound)));
        assert!(matches!(store.card(1), Err(StoreError::CardNotFound)));
        assert!(store.member_boards(2).is_empty());
    }

    #[test]
    fn test_board_access_owner_member_stranger() {
        let mut store = store_with_board();
        store
            .create_user("bob".into(), "bob@example.com".into(), "x$y".into())
            .unwrap();
        store
            .create_user("eve".into(), "eve@example.com".into(), "x$y".into())
            .unwrap();
        store.add_members(1, &[2]).unwrap();

        assert!(store.board_access(1, 1).is_ok());
        assert!(store.board_access(1, 2).is_ok());
        assert!(matches!(store.board_access(1, 3), Err(StoreError::Forbidden)));
        assert!(matches!(store.board_owner(1, 2), Err(StoreError::Forbidden)));
        assert!(matches!(
            store.board_access(99, 1),
            Err(StoreError::BoardNotFound)
        ));
    }

    #[test]
    fn test_boards_for_user_dedupes_owned_and_shared() {
        let mut store = store_with_board();
        store
            .create_user("bob".into(), "bob@example.com".into(), "x$y".into())
            .unwrap();
        store.create_board(2, "Bob's".into(), None);
        store.add_members(2, &[1]).unwrap();
        // Owner also listed as member: must not duplicate.
        store.add_members(1, &[1]).unwrap();

        let boards = store.boards_for_user(1);
        assert_eq!(boards.iter().map(|b| b.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_duplicate_user_rejected() {
        let mut store = store_with_board();
        assert!(matches!(
            store.create_user("ana".into(), "other@example.com".into(), "x$y".into()),
            Err(StoreError::DuplicateUser)
        ));
        assert!(matches!(
            store.create_user("otra".into(), "ana@example.com".into(), "x$y".into()),
            Err(StoreError::DuplicateUser)
        ));
    }

    #[test]
    fn test_add_members_is_idempotent_per_user() {
        let mut store = store_with_board();
        store
            .create_user("bob".into(), "bob@example.com".into(), "x$y".into())
            .unwrap();
        store.add_members(1, &[2]).unwrap();
        store.add_members(1, &[2]).unwrap();
        assert_eq!(store.members_of(1).unwrap().len(), 1);
    }

    #[test]
    fn test_board_of_card_walks_to_board() {
        let mut store = store_with_board();
        store.create_list(1, "A".into(), None).unwrap();
        store.create_card(1, "c1".into(), None, None, None).unwrap();
        assert_eq!(store.board_of_card(1).unwrap(), 1);
        assert!(matches!(
            store.board_of_card(9),
            Err(StoreError::CardNotFound)
        ));
    }
}
