//! R-tree over card bounding boxes, used to resolve drop targets and
//! connection-release targets without scanning every card per pointer event.

use rstar::{AABB, RTree, RTreeObject};
use std::collections::HashSet;
use uuid::Uuid;

use crate::domain::card::{Card, Position};
use crate::services::progress;
use crate::store::CardStore;

#[derive(Debug, Clone, PartialEq)]
pub struct CardEnvelope {
    pub id: Uuid,
    min: [f64; 2],
    max: [f64; 2],
}

impl CardEnvelope {
    fn from_card(card: &Card) -> Self {
        let (w, h) = card.bounds();
        Self {
            id: card.id,
            min: [card.position.x, card.position.y],
            max: [card.position.x + w, card.position.y + h],
        }
    }
}

impl RTreeObject for CardEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.min, self.max)
    }
}

/// Index over the currently-rendered cards: internal notes and cards hidden
/// by a collapsed ancestor are excluded, matching what the canvas draws.
pub struct CardIndex {
    tree: RTree<CardEnvelope>,
}

impl CardIndex {
    pub fn rendered(store: &CardStore) -> Self {
        let envelopes: Vec<CardEnvelope> = store
            .cards()
            .iter()
            .filter(|card| {
                !card.is_internal
                    && progress::is_expanded_in_tree(card, store, &mut HashSet::new())
            })
            .map(CardEnvelope::from_card)
            .collect();
        Self {
            tree: RTree::bulk_load(envelopes),
        }
    }

    /// First rendered card whose bounding box contains the world point,
    /// optionally excluding one id (the dragged card).
    pub fn hit_test(&self, point: Position, exclude: Option<Uuid>) -> Option<Uuid> {
        let probe = AABB::from_point([point.x, point.y]);
        self.tree
            .locate_in_envelope_intersecting(&probe)
            .map(|e| e.id)
            .find(|id| Some(*id) != exclude)
    }
}
