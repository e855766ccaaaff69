//! Command-syntax behavior through the store: batch expansion, chain
//! wiring, count markers, and suppression, all driven by card text edits.

use focusdeck::domain::card::{Card, CardPatch, Position};
use focusdeck::store::{CardDraft, CardStore, SpawnContext};
use uuid::Uuid;

fn store_with_origin(title: &str) -> (CardStore, Uuid) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let mut store = CardStore::new();
    let origin = store.create_card(
        CardDraft {
            title: title.to_string(),
            position: Some(Position::new(0.0, 0.0)),
            ..Default::default()
        },
        None,
        &SpawnContext::default(),
    );
    (store, origin)
}

fn children_of(store: &CardStore, parent: Uuid) -> Vec<&Card> {
    store
        .cards()
        .iter()
        .filter(|c| c.parent_id == Some(parent))
        .collect()
}

fn edge_label(store: &CardStore, from: Uuid, to: Uuid) -> Option<String> {
    store
        .connections()
        .iter()
        .find(|c| c.from_id == from && c.to_id == to)
        .and_then(|c| c.label.clone())
}

#[test]
fn batch_with_count_duration_and_tag() {
    let (mut store, origin) = store_with_origin("");
    store.update_card(
        origin,
        CardPatch {
            title: Some(". n3 m5 Wash dishes, Sweep floor, Take out trash #chores .".to_string()),
            ..Default::default()
        },
    );

    // Matched block stripped from the origin title.
    assert_eq!(store.get(origin).unwrap().title, "");

    let children = children_of(&store, origin);
    assert_eq!(children.len(), 3);
    assert_eq!(children[0].title, "Wash dishes");
    assert_eq!(children[1].title, "Sweep floor");
    assert_eq!(children[2].title, "Take out trash");
    for child in &children {
        assert_eq!(child.timer_total, 300);
        assert!(child.tags.contains("chores"));
    }

    assert_eq!(edge_label(&store, origin, children[0].id).as_deref(), Some("Start"));
    assert_eq!(
        edge_label(&store, children[0].id, children[1].id).as_deref(),
        Some("Next")
    );
    assert_eq!(
        edge_label(&store, children[1].id, children[2].id).as_deref(),
        Some("Next")
    );
}

#[test]
fn stacked_time_tokens_sum_into_default_duration() {
    let (mut store, origin) = store_with_origin("");
    store.update_card(
        origin,
        CardPatch {
            title: Some(". h1 m30 Review quarter .".to_string()),
            ..Default::default()
        },
    );

    let children = children_of(&store, origin);
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].timer_total, 5400);
}

#[test]
fn per_segment_override_beats_default() {
    let (mut store, origin) = store_with_origin("");
    store.update_card(
        origin,
        CardPatch {
            title: Some(". m10 Warm up, m45 Long run, Cool down .".to_string()),
            ..Default::default()
        },
    );

    let children = children_of(&store, origin);
    assert_eq!(children.len(), 3);
    assert_eq!(children[0].timer_total, 600);
    assert_eq!(children[1].timer_total, 2700);
    assert_eq!(children[2].timer_total, 600);
}

#[test]
fn single_segment_duplicated_to_count() {
    let (mut store, origin) = store_with_origin("");
    store.update_card(
        origin,
        CardPatch {
            title: Some(". n4 m25 Pomodoro .".to_string()),
            ..Default::default()
        },
    );

    let children = children_of(&store, origin);
    assert_eq!(children.len(), 4);
    assert!(children.iter().all(|c| c.title == "Pomodoro"));
    assert!(children.iter().all(|c| c.timer_total == 1500));
}

#[test]
fn batch_in_description_strips_description_only() {
    let (mut store, origin) = store_with_origin("Weekly reset");
    store.update_card(
        origin,
        CardPatch {
            description: Some("notes before . Laundry; Groceries . notes after".to_string()),
            ..Default::default()
        },
    );

    let card = store.get(origin).unwrap();
    assert_eq!(card.title, "Weekly reset");
    assert_eq!(card.description, "notes before  notes after");
    assert_eq!(children_of(&store, origin).len(), 2);
}

#[test]
fn count_marker_sets_micro_target() {
    let (mut store, origin) = store_with_origin("");
    store.update_card(
        origin,
        CardPatch {
            title: Some("drink water #8".to_string()),
            ..Default::default()
        },
    );
    assert_eq!(store.get(origin).unwrap().target_micro_tasks, 8);
}

#[test]
fn bang_anywhere_suppresses_count_marker_but_not_batch() {
    let (mut store, origin) = store_with_origin("");
    store.update_card(
        origin,
        CardPatch {
            title: Some("urgent! #4 . Pack bag, Book train .".to_string()),
            ..Default::default()
        },
    );

    let card = store.get(origin).unwrap();
    assert_eq!(card.target_micro_tasks, 0);
    assert_eq!(children_of(&store, origin).len(), 2);
}

#[test]
fn batch_children_stagger_from_origin() {
    let (mut store, origin) = store_with_origin("");
    store.update_card(
        origin,
        CardPatch {
            title: Some(". First, Second .".to_string()),
            ..Default::default()
        },
    );

    let children = children_of(&store, origin);
    assert_eq!(children[0].position, Position::new(200.0, 200.0));
    assert_eq!(children[1].position, Position::new(400.0, 200.0));
}

#[test]
fn generated_cards_inherit_origin_visuals() {
    use focusdeck::domain::card::{CardColor, CardShape};

    let mut store = CardStore::new();
    let origin = store.create_card(
        CardDraft {
            shape: Some(CardShape::Circle),
            color: Some(CardColor::Green),
            position: Some(Position::new(0.0, 0.0)),
            ..Default::default()
        },
        None,
        &SpawnContext::default(),
    );

    store.update_card(
        origin,
        CardPatch {
            title: Some(". Breathe, Stretch .".to_string()),
            ..Default::default()
        },
    );

    for child in children_of(&store, origin) {
        assert_eq!(child.shape, CardShape::Circle);
        assert_eq!(child.color, CardColor::Green);
    }
}
