//! Hierarchical progress aggregation and cascading visibility over the
//! parent/child card graph. Parent chains can dangle or even form cycles;
//! every traversal here carries a visited set and returns a safe default
//! instead of looping.

use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::domain::card::{Card, CardStatus};
use crate::store::CardStore;

/// Progress write-backs are themselves card updates; skipping changes below
/// this threshold breaks the update -> reprogress -> update loop.
pub const PROGRESS_EPSILON: f64 = 0.1;

/// O(children-of) lookup built once per pass instead of re-filtering the
/// full card list per recursion step.
pub struct ChildIndex {
    children: HashMap<Uuid, Vec<Uuid>>,
    status: HashMap<Uuid, CardStatus>,
}

impl ChildIndex {
    pub fn build(cards: &[Card]) -> Self {
        let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        let mut status = HashMap::new();
        for card in cards {
            status.insert(card.id, card.status);
            if let Some(parent_id) = card.parent_id {
                children.entry(parent_id).or_default().push(card.id);
            }
        }
        Self { children, status }
    }

    pub fn children(&self, id: Uuid) -> &[Uuid] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    fn is_completed(&self, id: Uuid) -> bool {
        self.status.get(&id) == Some(&CardStatus::Completed)
    }
}

/// Aggregate completion percentage in [0, 100]. Leaves contribute 100/0 by
/// their own status; a parent is the arithmetic mean of its children, where
/// a child with its own subtree contributes its recursive percentage.
pub fn compute_progress(card_id: Uuid, index: &ChildIndex, visited: &mut HashSet<Uuid>) -> f64 {
    if !visited.insert(card_id) {
        return 0.0;
    }
    let children = index.children(card_id);
    if children.is_empty() {
        return if index.is_completed(card_id) {
            100.0
        } else {
            0.0
        };
    }
    let total: f64 = children
        .iter()
        .map(|&child| {
            if index.children(child).is_empty() {
                if index.is_completed(child) { 100.0 } else { 0.0 }
            } else {
                compute_progress(child, index, visited)
            }
        })
        .sum();
    total / children.len() as f64
}

/// Recomputes progress for every card that currently has children and
/// writes the value back only when it moved by more than the epsilon.
/// Returns the ids whose stored progress changed.
pub fn recompute(store: &mut CardStore) -> Vec<Uuid> {
    let index = ChildIndex::build(store.cards());
    let parents: Vec<Uuid> = store
        .cards()
        .iter()
        .filter_map(|c| c.parent_id)
        .filter(|&pid| store.get(pid).is_some())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let mut changed = Vec::new();
    for parent_id in parents {
        let mut visited = HashSet::new();
        let progress = compute_progress(parent_id, &index, &mut visited);
        if let Some(card) = store.get(parent_id)
            && (card.progress - progress).abs() > PROGRESS_EPSILON
            && let Some(card) = store.get_mut(parent_id)
        {
            card.progress = progress;
            changed.push(parent_id);
        }
    }
    changed
}

/// Whether the card is visible through its ancestor chain: roots and cards
/// with dangling parents are visible; otherwise the parent must be expanded
/// and itself expanded-in-tree.
pub fn is_expanded_in_tree(card: &Card, store: &CardStore, visited: &mut HashSet<Uuid>) -> bool {
    let Some(parent_id) = card.parent_id else {
        return true;
    };
    if !visited.insert(card.id) {
        return false;
    }
    let Some(parent) = store.get(parent_id) else {
        return true;
    };
    parent.is_expanded && is_expanded_in_tree(parent, store, visited)
}
