//! Directional card navigation for keyboard focus while the camera is
//! unlocked: arrow keys jump to the nearest card center in the pressed
//! direction.

use ordered_float::OrderedFloat;
use std::collections::HashSet;
use uuid::Uuid;

use crate::domain::card::Position;
use crate::services::progress;
use crate::store::CardStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Signed delta along the primary axis for a candidate center relative
    /// to the origin. Positive means "further in this direction".
    fn primary_delta(self, from: Position, to: Position) -> f64 {
        match self {
            Direction::Left => from.x - to.x,
            Direction::Right => to.x - from.x,
            Direction::Up => from.y - to.y,
            Direction::Down => to.y - from.y,
        }
    }

    fn cross_delta(self, from: Position, to: Position) -> f64 {
        match self {
            Direction::Left | Direction::Right => (to.y - from.y).abs(),
            Direction::Up | Direction::Down => (to.x - from.x).abs(),
        }
    }
}

/// Nearest card strictly in the given direction from `from_id`, ranked by
/// primary-axis distance with cross-axis distance as the tiebreak. Only
/// rendered cards are candidates: internal notes and cards hidden under a
/// collapsed ancestor are never navigated to. Returns None at the edge of
/// the canvas in that direction.
pub fn nearest_in_direction(
    store: &CardStore,
    from_id: Uuid,
    direction: Direction,
) -> Option<Uuid> {
    let origin = store.get(from_id)?.center();

    store
        .cards()
        .iter()
        .filter(|card| {
            card.id != from_id
                && !card.is_internal
                && progress::is_expanded_in_tree(card, store, &mut HashSet::new())
        })
        .filter_map(|card| {
            let center = card.center();
            let primary = direction.primary_delta(origin, center);
            (primary > 0.0).then(|| {
                (
                    OrderedFloat(primary),
                    OrderedFloat(direction.cross_delta(origin, center)),
                    card.id,
                )
            })
        })
        .min_by_key(|&(primary, cross, _)| (primary, cross))
        .map(|(_, _, id)| id)
}
