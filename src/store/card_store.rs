use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::domain::card::{
    Attachment, Card, CardColor, CardKind, CardPatch, CardShape, CardStatus, Position,
    TimerFillMode,
};
use crate::domain::connection::Connection;
use crate::services::parser::{self, BatchCommand};

/// World-unit offset from a parent when a child spawns without an explicit
/// position.
pub const PARENT_SPAWN_OFFSET: f64 = 200.0;

/// Where a new card lands when neither the draft nor a parent supplies a
/// position: the current camera center, resolved by the host per call.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct SpawnContext {
    pub camera_center: Position,
}

/// Creation request. Unset fields inherit from the parent (when parented)
/// or fall back to defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CardDraft {
    pub title: String,
    pub description: String,
    pub kind: Option<CardKind>,
    pub position: Option<Position>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub aspect_ratio: Option<f64>,
    pub shape: Option<CardShape>,
    pub color: Option<CardColor>,
    pub timer_total: Option<u32>,
    pub timer_fill_mode: Option<TimerFillMode>,
    pub tags: HashSet<String>,
}

/// The authoritative collection of cards and connections. Card order is
/// meaningful: it is the default routine order. Operations referencing a
/// missing id are silent no-ops.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CardStore {
    cards: Vec<Card>,
    connections: Vec<Connection>,
}

impl CardStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(cards: Vec<Card>, connections: Vec<Connection>) -> Self {
        Self { cards, connections }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn get(&self, id: Uuid) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: Uuid) -> Option<&mut Card> {
        self.cards.iter_mut().find(|c| c.id == id)
    }

    pub fn card_ids(&self) -> Vec<Uuid> {
        self.cards.iter().map(|c| c.id).collect()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Creates a card. Spawn position comes from the draft, else from the
    /// parent plus a fixed offset, else from the camera center. Color,
    /// shape, kind, timer fill mode, and timer total inherit from the parent
    /// when not explicitly set. A parented creation also records a labeled
    /// connection from parent to child.
    pub fn create_card(
        &mut self,
        draft: CardDraft,
        parent_id: Option<Uuid>,
        spawn: &SpawnContext,
    ) -> Uuid {
        let parent = parent_id.and_then(|pid| self.get(pid));

        let position = draft.position.unwrap_or_else(|| match parent {
            Some(p) => Position::new(
                p.position.x + PARENT_SPAWN_OFFSET,
                p.position.y + PARENT_SPAWN_OFFSET,
            ),
            None => spawn.camera_center,
        });
        let kind = draft
            .kind
            .or(parent.map(|p| p.kind))
            .unwrap_or(CardKind::Task);
        let shape = draft
            .shape
            .or(parent.map(|p| p.shape))
            .unwrap_or(CardShape::Rectangle);
        let color = draft
            .color
            .or(parent.map(|p| p.color))
            .unwrap_or(CardColor::Gray);
        let timer_total = draft
            .timer_total
            .or(parent.map(|p| p.timer_total))
            .unwrap_or(0);
        let timer_fill_mode = draft
            .timer_fill_mode
            .or(parent.map(|p| p.timer_fill_mode))
            .unwrap_or_default();

        let mut card = Card::new(draft.title, kind);
        card.description = draft.description;
        card.tags = draft.tags;
        card.position = position;
        card.width = draft.width;
        card.height = draft.height;
        card.aspect_ratio = draft.aspect_ratio;
        card.shape = shape;
        card.color = color;
        card.timer_total = timer_total;
        card.timer_remaining = timer_total;
        card.timer_fill_mode = timer_fill_mode;
        card.parent_id = parent_id;

        let id = card.id;
        self.cards.push(card);
        debug!(card_id = %id, parent = ?parent_id, "card created");

        if let Some(pid) = parent_id {
            self.create_connection(pid, id, Some("Sub".to_string()));
        }

        // New titles can carry commands too.
        self.reparse_commands(id);
        id
    }

    /// Shallow-merges the patch; when title/description/pane text changed,
    /// re-evaluates the command grammar against the merged text.
    pub fn update_card(&mut self, id: Uuid, patch: CardPatch) -> bool {
        let Some(card) = self.get_mut(id) else {
            trace!(card_id = %id, "update for missing card ignored");
            return false;
        };
        let text_changed = patch.apply(card);
        if text_changed {
            self.reparse_commands(id);
        }
        true
    }

    /// Removes the card and every connection touching it. Children keep
    /// their (now dangling) parent reference; orphaning is intentional.
    pub fn delete_card(&mut self, id: Uuid) -> bool {
        let before = self.cards.len();
        self.cards.retain(|c| c.id != id);
        if self.cards.len() == before {
            trace!(card_id = %id, "delete for missing card ignored");
            return false;
        }
        self.connections.retain(|conn| !conn.touches(id));
        debug!(card_id = %id, "card deleted");
        true
    }

    /// Self-loops are rejected; dangling endpoints are tolerated the same
    /// way dangling parent references are.
    pub fn create_connection(
        &mut self,
        from_id: Uuid,
        to_id: Uuid,
        label: Option<String>,
    ) -> Option<Uuid> {
        let connection = Connection::new(from_id, to_id, label)?;
        let id = connection.id;
        self.connections.push(connection);
        Some(id)
    }

    pub fn delete_connection(&mut self, id: Uuid) -> bool {
        let before = self.connections.len();
        self.connections.retain(|c| c.id != id);
        self.connections.len() != before
    }

    pub fn move_card_by(&mut self, id: Uuid, dx: f64, dy: f64) {
        if let Some(card) = self.get_mut(id) {
            card.position.x += dx;
            card.position.y += dy;
        }
    }

    pub fn set_card_geometry(&mut self, id: Uuid, x: f64, y: f64, width: f64, height: f64) {
        if let Some(card) = self.get_mut(id) {
            card.position = Position::new(x, y);
            card.width = Some(width);
            card.height = Some(height);
        }
    }

    pub fn set_status(&mut self, id: Uuid, status: CardStatus) {
        if let Some(card) = self.get_mut(id) {
            card.status = status;
        }
    }

    /// Completion stamp plus the completed/incomplete counter split decided
    /// by the caller.
    pub fn record_completion(&mut self, id: Uuid, now: DateTime<Utc>, counted: bool) {
        if let Some(card) = self.get_mut(id) {
            card.status = CardStatus::Completed;
            card.last_completed = Some(now);
            if counted {
                card.completion_count += 1;
            } else {
                card.incomplete_count += 1;
            }
        }
    }

    pub fn add_attachment(&mut self, id: Uuid, attachment: Attachment) {
        if let Some(card) = self.get_mut(id) {
            card.attachments.push(attachment);
        }
    }

    pub fn bump_micro_task(&mut self, id: Uuid) {
        if let Some(card) = self.get_mut(id) {
            card.micro_task_count += 1;
        }
    }

    /// Reorders cards so `front_ids` come first in the given order; cards
    /// not listed keep their relative order after them.
    pub fn reorder(&mut self, front_ids: &[Uuid]) {
        let mut front = Vec::with_capacity(self.cards.len());
        for &id in front_ids {
            if let Some(pos) = self.cards.iter().position(|c| c.id == id) {
                front.push(self.cards.remove(pos));
            }
        }
        front.append(&mut self.cards);
        self.cards = front;
    }

    pub fn replace_all(&mut self, cards: Vec<Card>, connections: Vec<Connection>) {
        self.cards = cards;
        self.connections = connections;
    }

    /// Direct children of a card.
    pub fn children_of(&self, id: Uuid) -> Vec<Uuid> {
        self.cards
            .iter()
            .filter(|c| c.parent_id == Some(id))
            .map(|c| c.id)
            .collect()
    }

    /// Re-evaluates the command grammar over the card's title, description,
    /// and pane text. The `!` suppression check spans the combined text;
    /// batch stripping applies to whichever single field matched first
    /// (title, then description, then panes).
    fn reparse_commands(&mut self, id: Uuid) {
        let Some(card) = self.get(id) else { return };
        let title = card.title.clone();
        let description = card.description.clone();
        let panes: Vec<(usize, String)> = card
            .panes
            .iter()
            .enumerate()
            .map(|(i, p)| (i, p.content.clone()))
            .collect();

        let combined = {
            let mut s = String::new();
            s.push_str(&title);
            s.push('\n');
            s.push_str(&description);
            for (_, content) in &panes {
                s.push('\n');
                s.push_str(content);
            }
            s
        };

        if !parser::has_bang(&combined)
            && let Some(target) = parser::count_marker(&combined)
            && let Some(card) = self.get_mut(id)
        {
            card.target_micro_tasks = target;
        }

        if let Some((batch, stripped)) = parser::extract_batch(&title) {
            if let Some(card) = self.get_mut(id) {
                card.title = stripped;
            }
            self.spawn_batch(id, &batch);
        } else if let Some((batch, stripped)) = parser::extract_batch(&description) {
            if let Some(card) = self.get_mut(id) {
                card.description = stripped;
            }
            self.spawn_batch(id, &batch);
        } else {
            for (pane_index, content) in &panes {
                if let Some((batch, stripped)) = parser::extract_batch(content) {
                    if let Some(card) = self.get_mut(id)
                        && let Some(pane) = card.panes.get_mut(*pane_index)
                    {
                        pane.content = stripped;
                    }
                    self.spawn_batch(id, &batch);
                    break;
                }
            }
        }
    }

    /// Spawns the batch's sub-cards as a chain: every card is parented to
    /// the origin, connections run origin -> first ("Start") then card ->
    /// card ("Next"), and shared tags land on every generated card.
    fn spawn_batch(&mut self, origin_id: Uuid, batch: &BatchCommand) {
        let Some(origin) = self.get(origin_id) else {
            return;
        };
        let origin_pos = origin.position;
        let shape = origin.shape;
        let color = origin.color;

        let segments = batch.expanded_segments();
        debug!(origin = %origin_id, count = segments.len(), "spawning batch chain");

        let mut prev = origin_id;
        for (i, segment) in segments.iter().enumerate() {
            let duration = batch.duration_for(segment);
            let mut card = Card::new(segment.title.clone(), CardKind::Task);
            card.parent_id = Some(origin_id);
            card.position = Position::new(
                origin_pos.x + PARENT_SPAWN_OFFSET * (i as f64 + 1.0),
                origin_pos.y + PARENT_SPAWN_OFFSET,
            );
            card.shape = shape;
            card.color = color;
            card.timer_total = duration;
            card.timer_remaining = duration;
            card.tags = batch.tags.iter().cloned().collect();

            let id = card.id;
            self.cards.push(card);

            let label = if prev == origin_id { "Start" } else { "Next" };
            self.create_connection(prev, id, Some(label.to_string()));
            prev = id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn_at(x: f64, y: f64) -> SpawnContext {
        SpawnContext {
            camera_center: Position::new(x, y),
        }
    }

    #[test]
    fn test_create_card_at_camera_center() {
        let mut store = CardStore::new();
        let id = store.create_card(
            CardDraft {
                title: "solo".to_string(),
                ..Default::default()
            },
            None,
            &spawn_at(500.0, -250.0),
        );
        let card = store.get(id).unwrap();
        assert_eq!(card.position, Position::new(500.0, -250.0));
        assert_eq!(card.status, CardStatus::Pending);
    }

    #[test]
    fn test_create_card_inherits_from_parent() {
        let mut store = CardStore::new();
        let parent_id = store.create_card(
            CardDraft {
                title: "parent".to_string(),
                shape: Some(CardShape::Hexagon),
                color: Some(CardColor::Purple),
                timer_total: Some(600),
                position: Some(Position::new(100.0, 100.0)),
                ..Default::default()
            },
            None,
            &spawn_at(0.0, 0.0),
        );

        let child_id = store.create_card(
            CardDraft {
                title: "child".to_string(),
                ..Default::default()
            },
            Some(parent_id),
            &spawn_at(0.0, 0.0),
        );

        let child = store.get(child_id).unwrap();
        assert_eq!(child.shape, CardShape::Hexagon);
        assert_eq!(child.color, CardColor::Purple);
        assert_eq!(child.timer_total, 600);
        assert_eq!(child.parent_id, Some(parent_id));
        assert_eq!(
            child.position,
            Position::new(100.0 + PARENT_SPAWN_OFFSET, 100.0 + PARENT_SPAWN_OFFSET)
        );

        // Parented creation records a labeled parent -> child edge.
        let conn = store
            .connections()
            .iter()
            .find(|c| c.from_id == parent_id && c.to_id == child_id)
            .unwrap();
        assert_eq!(conn.label.as_deref(), Some("Sub"));
    }

    #[test]
    fn test_draft_overrides_beat_inheritance() {
        let mut store = CardStore::new();
        let parent_id = store.create_card(
            CardDraft {
                title: "p".to_string(),
                color: Some(CardColor::Red),
                ..Default::default()
            },
            None,
            &spawn_at(0.0, 0.0),
        );
        let child_id = store.create_card(
            CardDraft {
                title: "c".to_string(),
                color: Some(CardColor::Blue),
                position: Some(Position::new(7.0, 7.0)),
                ..Default::default()
            },
            Some(parent_id),
            &spawn_at(0.0, 0.0),
        );
        let child = store.get(child_id).unwrap();
        assert_eq!(child.color, CardColor::Blue);
        assert_eq!(child.position, Position::new(7.0, 7.0));
    }

    #[test]
    fn test_delete_cascades_connections_not_children() {
        let mut store = CardStore::new();
        let spawn = spawn_at(0.0, 0.0);
        let a = store.create_card(CardDraft::default(), None, &spawn);
        let b = store.create_card(CardDraft::default(), Some(a), &spawn);
        let c = store.create_card(CardDraft::default(), None, &spawn);
        store.create_connection(c, a, None);
        store.create_connection(a, c, Some("loop back".to_string()));

        assert!(store.delete_card(a));

        assert!(store.get(a).is_none());
        assert!(store.connections().iter().all(|conn| !conn.touches(a)));

        // The child survives with a dangling parent reference.
        let child = store.get(b).unwrap();
        assert_eq!(child.parent_id, Some(a));
    }

    #[test]
    fn test_self_loop_connection_rejected() {
        let mut store = CardStore::new();
        let a = store.create_card(CardDraft::default(), None, &spawn_at(0.0, 0.0));
        assert!(store.create_connection(a, a, None).is_none());
        assert!(store.connections().is_empty());
    }

    #[test]
    fn test_missing_id_operations_are_noops() {
        let mut store = CardStore::new();
        let ghost = Uuid::new_v4();
        assert!(!store.update_card(ghost, CardPatch::default()));
        assert!(!store.delete_card(ghost));
        store.move_card_by(ghost, 1.0, 1.0);
        store.set_status(ghost, CardStatus::Active);
        assert!(store.is_empty());
    }

    #[test]
    fn test_update_title_runs_batch_command() {
        let mut store = CardStore::new();
        let origin = store.create_card(
            CardDraft {
                title: "chores".to_string(),
                position: Some(Position::new(0.0, 0.0)),
                ..Default::default()
            },
            None,
            &spawn_at(0.0, 0.0),
        );

        store.update_card(
            origin,
            CardPatch {
                title: Some(
                    ". n3 m5 Wash dishes, Sweep floor, Take out trash #chores .".to_string(),
                ),
                ..Default::default()
            },
        );

        assert_eq!(store.get(origin).unwrap().title, "");

        let children: Vec<&Card> = store
            .cards()
            .iter()
            .filter(|c| c.parent_id == Some(origin))
            .collect();
        assert_eq!(children.len(), 3);
        assert_eq!(children[0].title, "Wash dishes");
        assert_eq!(children[1].title, "Sweep floor");
        assert_eq!(children[2].title, "Take out trash");
        for child in &children {
            assert_eq!(child.timer_total, 300);
            assert!(child.tags.contains("chores"));
        }

        // Chain: origin -> c1 "Start", c1 -> c2 "Next", c2 -> c3 "Next".
        let edge = |from: Uuid, to: Uuid| {
            store
                .connections()
                .iter()
                .find(|c| c.from_id == from && c.to_id == to)
                .and_then(|c| c.label.clone())
        };
        assert_eq!(edge(origin, children[0].id).as_deref(), Some("Start"));
        assert_eq!(
            edge(children[0].id, children[1].id).as_deref(),
            Some("Next")
        );
        assert_eq!(
            edge(children[1].id, children[2].id).as_deref(),
            Some("Next")
        );
    }

    #[test]
    fn test_count_marker_sets_target() {
        let mut store = CardStore::new();
        let id = store.create_card(CardDraft::default(), None, &spawn_at(0.0, 0.0));

        store.update_card(
            id,
            CardPatch {
                title: Some("practice scales #5".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(store.get(id).unwrap().target_micro_tasks, 5);
    }

    #[test]
    fn test_bang_in_description_suppresses_title_marker() {
        let mut store = CardStore::new();
        let id = store.create_card(CardDraft::default(), None, &spawn_at(0.0, 0.0));

        store.update_card(
            id,
            CardPatch {
                title: Some("practice #5".to_string()),
                description: Some("do it now!".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(store.get(id).unwrap().target_micro_tasks, 0);
    }

    #[test]
    fn test_reorder_appends_unlisted() {
        let mut store = CardStore::new();
        let spawn = spawn_at(0.0, 0.0);
        let a = store.create_card(CardDraft::default(), None, &spawn);
        let b = store.create_card(CardDraft::default(), None, &spawn);
        let c = store.create_card(CardDraft::default(), None, &spawn);

        store.reorder(&[c, a]);
        assert_eq!(store.card_ids(), vec![c, a, b]);
    }
}
