//! End-to-end routine run over the public API: start, complete, snooze,
//! skip, finish, with camera-follow effects checked along the way.

use chrono::Utc;
use focusdeck::domain::camera::FOCUS_ZOOM;
use focusdeck::domain::card::{CardPatch, CardStatus};
use focusdeck::domain::ui_state::UiState;
use focusdeck::services::routine::{RoutinePhase, RoutineScheduler};
use focusdeck::store::{CardDraft, CardStore, SpawnContext};

fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn seed(store: &mut CardStore, titles: &[&str]) -> Vec<uuid::Uuid> {
    init_logging();
    titles
        .iter()
        .map(|title| {
            store.create_card(
                CardDraft {
                    title: (*title).to_string(),
                    ..Default::default()
                },
                None,
                &SpawnContext::default(),
            )
        })
        .collect()
}

#[test]
fn full_run_completes_every_card_and_unlocks() {
    let mut store = CardStore::new();
    let ids = seed(&mut store, &["morning pages", "stretch", "inbox zero"]);
    let mut ui = UiState::default();
    let mut routine = RoutineScheduler::new();

    let outcome = routine.start_routine(None, &mut store, &mut ui);
    assert_eq!(outcome.activated, Some(ids[0]));
    let follow = outcome.follow.expect("locked camera follows the active card");
    assert_eq!(follow.card_id, ids[0]);
    assert_eq!(follow.zoom, FOCUS_ZOOM);

    for (i, &id) in ids.iter().enumerate() {
        let outcome = routine.complete_current(id, Utc::now(), &mut store, &mut ui);
        if i + 1 < ids.len() {
            assert_eq!(outcome.activated, Some(ids[i + 1]));
        } else {
            assert!(outcome.finished);
            assert!(outcome.reset_zoom);
        }
    }

    assert_eq!(routine.phase(), RoutinePhase::Finished);
    assert!(!ui.focus_mode_active);
    assert!(!ui.camera_locked);
    for id in ids {
        let card = store.get(id).unwrap();
        assert_eq!(card.status, CardStatus::Completed);
        assert_eq!(card.completion_count, 1);
        assert!(card.last_completed.is_some());
    }
}

#[test]
fn snooze_and_skip_shape_the_remaining_run() {
    let mut store = CardStore::new();
    let ids = seed(&mut store, &["a", "b", "c"]);
    let mut ui = UiState::default();
    let mut routine = RoutineScheduler::new();

    routine.start_routine(Some(ids.clone()), &mut store, &mut ui);

    // Snoozed: a moves behind c, b becomes active.
    let outcome = routine.snooze(ids[0], &mut store, &mut ui);
    assert_eq!(outcome.activated, Some(ids[1]));
    assert_eq!(store.card_ids(), vec![ids[1], ids[2], ids[0]]);

    // Skipped: b is done for this run, c takes over.
    let outcome = routine.skip(ids[1], &mut store, &mut ui);
    assert_eq!(outcome.activated, Some(ids[2]));

    routine.complete_current(ids[2], Utc::now(), &mut store, &mut ui);
    // The snoozed card comes back around; the skipped one does not.
    assert_eq!(routine.active(), Some(ids[0]));

    let outcome = routine.complete_current(ids[0], Utc::now(), &mut store, &mut ui);
    assert!(outcome.finished);
    assert_eq!(store.get(ids[1]).unwrap().status, CardStatus::Skipped);
}

#[test]
fn micro_target_completion_counts_as_incomplete() {
    let mut store = CardStore::new();
    let ids = seed(&mut store, &["practice piano"]);
    store.update_card(
        ids[0],
        CardPatch {
            target_micro_tasks: Some(3),
            ..Default::default()
        },
    );

    let mut ui = UiState::default();
    let mut routine = RoutineScheduler::new();
    routine.start_routine(None, &mut store, &mut ui);
    routine.complete_current(ids[0], Utc::now(), &mut store, &mut ui);

    let card = store.get(ids[0]).unwrap();
    assert_eq!(card.status, CardStatus::Completed);
    assert_eq!(card.completion_count, 0);
    assert_eq!(card.incomplete_count, 1);
}

#[test]
fn completing_a_parent_rolls_progress_up() {
    let mut store = CardStore::new();
    let spawn = SpawnContext::default();
    let parent = store.create_card(
        CardDraft {
            title: "deep clean".to_string(),
            ..Default::default()
        },
        None,
        &spawn,
    );
    let child_a = store.create_card(CardDraft::default(), Some(parent), &spawn);
    let child_b = store.create_card(CardDraft::default(), Some(parent), &spawn);

    let mut ui = UiState::default();
    let mut routine = RoutineScheduler::new();
    routine.start_routine(Some(vec![child_a, child_b]), &mut store, &mut ui);

    routine.complete_current(child_a, Utc::now(), &mut store, &mut ui);
    assert_eq!(store.get(parent).unwrap().progress, 50.0);
    // Each child completion notches the parent's micro-task counter.
    assert_eq!(store.get(parent).unwrap().micro_task_count, 1);

    routine.complete_current(child_b, Utc::now(), &mut store, &mut ui);
    assert_eq!(store.get(parent).unwrap().progress, 100.0);
}

#[test]
fn stopping_mid_run_returns_active_card_to_pending() {
    let mut store = CardStore::new();
    let ids = seed(&mut store, &["a", "b"]);
    let mut ui = UiState::default();
    let mut routine = RoutineScheduler::new();

    routine.start_routine(None, &mut store, &mut ui);
    assert_eq!(store.get(ids[0]).unwrap().status, CardStatus::Active);

    routine.stop_routine(&mut store, &mut ui);
    assert_eq!(store.get(ids[0]).unwrap().status, CardStatus::Pending);
    assert_eq!(store.get(ids[1]).unwrap().status, CardStatus::Pending);
    assert_eq!(routine.phase(), RoutinePhase::NoRoutine);
}
