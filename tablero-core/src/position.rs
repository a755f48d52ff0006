//! Ordered-position maintenance for sibling collections.
//!
//! Cards within a list and lists within a board share the same dense,
//! zero-based ordering scheme, so the reflow logic is written once over
//! the [`SiblingStore`] trait and reused for both. Every routine here is
//! a read-modify-write over the affected siblings only: it shifts each
//! one by exactly one slot instead of renumbering the whole collection.

use crate::storage::SiblingStore;
use crate::types::Positioned;

/// Next free position under `parent_id`: one past the current maximum,
/// or 0 for an empty parent.
pub fn get_next_position<S: SiblingStore>(
    store: &S,
    parent_id: S::ParentId,
) -> Result<i64, S::Error> {
    Ok(store.max_position(parent_id)?.map_or(0, |max| max + 1))
}

/// Resolve a caller-supplied position into the slot actually used.
///
/// - `None` appends at the end of the collection.
/// - Negative values clamp to 0.
/// - Anything else is accepted verbatim. There is deliberately no upper
///   clamp: a position past the current end is kept as-is and leaves a
///   gap in the sequence, which existing clients rely on.
pub fn validate_position<S: SiblingStore>(
    store: &S,
    parent_id: S::ParentId,
    requested: Option<i64>,
) -> Result<i64, S::Error> {
    match requested {
        None => get_next_position(store, parent_id),
        Some(p) if p < 0 => Ok(0),
        Some(p) => Ok(p),
    }
}

/// Open a slot at `position` by shifting every sibling at or past it
/// forward by one. Must run before the new item is persisted, and
/// exactly once per insert: a second call double-shifts.
pub fn adjust_positions_on_insert<S: SiblingStore>(
    store: &mut S,
    parent_id: S::ParentId,
    position: i64,
) -> Result<(), S::Error> {
    let siblings = store.siblings_at_or_above(parent_id, position)?;
    log::debug!(
        "[position] Insert at {} shifts {} sibling(s) forward",
        position,
        siblings.len()
    );
    for mut sibling in siblings {
        let shifted = sibling.position() + 1;
        sibling.set_position(shifted);
        store.persist(sibling)?;
    }
    Ok(())
}

/// Close the gap left at `deleted_position` by shifting every sibling
/// past it back by one. The deleted item must already be gone (or be
/// removed in the same transaction), so it is never matched here.
pub fn compact_positions_on_delete<S: SiblingStore>(
    store: &mut S,
    parent_id: S::ParentId,
    deleted_position: i64,
) -> Result<(), S::Error> {
    let siblings = store.siblings_above(parent_id, deleted_position)?;
    log::debug!(
        "[position] Delete at {} shifts {} sibling(s) back",
        deleted_position,
        siblings.len()
    );
    for mut sibling in siblings {
        let shifted = sibling.position() - 1;
        sibling.set_position(shifted);
        store.persist(sibling)?;
    }
    Ok(())
}

/// Reflow siblings around a move. The moved item itself is excluded by
/// id (its stored position is still `old_position` at call time); the
/// caller persists its new `parent_id`/`position` afterwards, and skips
/// this call entirely when neither changed.
///
/// Same parent: only the siblings strictly between the two positions
/// move, by one slot each — `(old, new]` slides back when moving later,
/// `[new, old)` slides forward when moving earlier. Different parents:
/// compact the source collection, then open a slot in the destination
/// (disjoint sibling sets, so the order of the two steps is irrelevant).
pub fn reorder_on_move<S: SiblingStore>(
    store: &mut S,
    item_id: <S::Item as Positioned>::Id,
    old_parent_id: S::ParentId,
    old_position: i64,
    new_parent_id: S::ParentId,
    new_position: i64,
) -> Result<(), S::Error> {
    if old_parent_id == new_parent_id {
        if new_position == old_position {
            return Ok(());
        }
        if new_position > old_position {
            for mut sibling in
                store.siblings_between(new_parent_id, old_position + 1, new_position, item_id)?
            {
                let shifted = sibling.position() - 1;
                sibling.set_position(shifted);
                store.persist(sibling)?;
            }
        } else {
            for mut sibling in
                store.siblings_between(new_parent_id, new_position, old_position - 1, item_id)?
            {
                let shifted = sibling.position() + 1;
                sibling.set_position(shifted);
                store.persist(sibling)?;
            }
        }
    } else {
        compact_positions_on_delete(store, old_parent_id, old_position)?;
        adjust_positions_on_insert(store, new_parent_id, new_position)?;
    }
    Ok(())
}
