use crate::types::Positioned;

/// Abstract persistence view over one sibling collection (cards within a
/// list, lists within a board), scoped by a parent id.
///
/// The position engine reads affected siblings through the query methods,
/// computes their new positions, and writes them back one by one through
/// `persist`. Callers are expected to run a whole engine operation inside
/// a single transaction (or equivalent), so partially reflowed positions
/// are never visible to other readers.
pub trait SiblingStore {
    type Item: Positioned;
    type ParentId: Copy + PartialEq;
    type Error;

    /// Highest position currently used under `parent_id`, or `None` when
    /// the parent has no children.
    fn max_position(&self, parent_id: Self::ParentId) -> Result<Option<i64>, Self::Error>;

    /// All siblings of `parent_id` with position >= `position`.
    fn siblings_at_or_above(
        &self,
        parent_id: Self::ParentId,
        position: i64,
    ) -> Result<Vec<Self::Item>, Self::Error>;

    /// All siblings of `parent_id` with position > `position`.
    fn siblings_above(
        &self,
        parent_id: Self::ParentId,
        position: i64,
    ) -> Result<Vec<Self::Item>, Self::Error>;

    /// All siblings of `parent_id` with `low <= position <= high`,
    /// excluding the item identified by `exclude`.
    fn siblings_between(
        &self,
        parent_id: Self::ParentId,
        low: i64,
        high: i64,
        exclude: <Self::Item as Positioned>::Id,
    ) -> Result<Vec<Self::Item>, Self::Error>;

    /// Durably write back an item whose position was changed.
    fn persist(&mut self, item: Self::Item) -> Result<(), Self::Error>;
}
