//! The focus-mode routine: one ordered run-list of card ids, exactly one
//! active card while running, advancing on complete/skip/snooze until the
//! list is exhausted. The routine is ephemeral and never persisted.

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::camera::FOCUS_ZOOM;
use crate::domain::card::CardStatus;
use crate::domain::ui_state::UiState;
use crate::services::progress;
use crate::store::CardStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoutinePhase {
    #[default]
    NoRoutine,
    Running,
    Finished,
}

/// Deferred camera-center request: applied by the host after a short delay
/// so layout can settle, and only while the camera is locked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFollow {
    pub card_id: Uuid,
    pub zoom: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdvanceOutcome {
    pub activated: Option<Uuid>,
    pub finished: bool,
    pub follow: Option<CameraFollow>,
    /// Set when the routine ended and the host should restore zoom to 1.0.
    pub reset_zoom: bool,
}

#[derive(Debug, Default)]
pub struct RoutineScheduler {
    order: Vec<Uuid>,
    active: Option<Uuid>,
    phase: RoutinePhase,
}

impl RoutineScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> RoutinePhase {
        self.phase
    }

    pub fn active(&self) -> Option<Uuid> {
        self.active
    }

    pub fn order(&self) -> &[Uuid] {
        &self.order
    }

    /// Starts a run. An explicit order reorders the underlying store so
    /// other views reflect it, with unlisted ids appended; otherwise the
    /// current card order is the routine order. Stale actives from a
    /// previous run are reset before the first advance.
    pub fn start_routine(
        &mut self,
        explicit_order: Option<Vec<Uuid>>,
        store: &mut CardStore,
        ui: &mut UiState,
    ) -> AdvanceOutcome {
        if let Some(ids) = explicit_order {
            store.reorder(&ids);
        }
        self.order = store.card_ids();

        for id in &self.order {
            if store.get(*id).map(|c| c.status) == Some(CardStatus::Active) {
                store.set_status(*id, CardStatus::Pending);
            }
        }

        self.phase = RoutinePhase::Running;
        self.active = None;
        ui.focus_mode_active = true;
        ui.camera_locked = true;
        info!(cards = self.order.len(), "routine started");

        self.advance(store, ui)
    }

    /// Marks the card completed and moves on. The completion counts as a
    /// full completion unless the card still has an unmet micro-task target
    /// or incomplete children, in which case the incomplete counter takes
    /// it. Pending direct children are force-completed alongside; the
    /// cascade is one level deep only, it does not walk further down.
    pub fn complete_current(
        &mut self,
        card_id: Uuid,
        now: DateTime<Utc>,
        store: &mut CardStore,
        ui: &mut UiState,
    ) -> AdvanceOutcome {
        if self.phase != RoutinePhase::Running {
            return AdvanceOutcome::default();
        }
        let Some(card) = store.get(card_id) else {
            return self.advance(store, ui);
        };

        let unmet_target = card.has_unmet_micro_target();
        let parent_id = card.parent_id;
        let children = store.children_of(card_id);
        let has_incomplete_children = children.iter().any(|&child| {
            matches!(
                store.get(child).map(|c| c.status),
                Some(CardStatus::Pending) | Some(CardStatus::Active)
            )
        });

        store.record_completion(card_id, now, !(unmet_target || has_incomplete_children));

        if let Some(parent) = parent_id {
            store.bump_micro_task(parent);
        }

        for child in children {
            if store.get(child).map(|c| c.status) == Some(CardStatus::Pending) {
                store.record_completion(child, now, true);
            }
        }

        progress::recompute(store);
        debug!(card_id = %card_id, "card completed");

        if self.active == Some(card_id) {
            self.active = None;
        }
        self.advance(store, ui)
    }

    /// Skipped cards are out of this run: not pending, never re-offered.
    pub fn skip(&mut self, card_id: Uuid, store: &mut CardStore, ui: &mut UiState) -> AdvanceOutcome {
        if self.phase != RoutinePhase::Running {
            return AdvanceOutcome::default();
        }
        store.set_status(card_id, CardStatus::Skipped);
        progress::recompute(store);
        if self.active == Some(card_id) {
            self.active = None;
        }
        self.advance(store, ui)
    }

    /// Snooze defers instead of dropping: the card goes back to pending and
    /// to the back of the queue, and the next card is picked under the new
    /// order.
    pub fn snooze(
        &mut self,
        card_id: Uuid,
        store: &mut CardStore,
        ui: &mut UiState,
    ) -> AdvanceOutcome {
        if self.phase != RoutinePhase::Running {
            return AdvanceOutcome::default();
        }
        store.set_status(card_id, CardStatus::Pending);

        if let Some(pos) = self.order.iter().position(|&id| id == card_id) {
            let id = self.order.remove(pos);
            self.order.push(id);
            store.reorder(&self.order);
        }
        if self.active == Some(card_id) {
            self.active = None;
        }
        self.advance(store, ui)
    }

    pub fn stop_routine(&mut self, store: &mut CardStore, ui: &mut UiState) -> AdvanceOutcome {
        for id in store.card_ids() {
            if store.get(id).map(|c| c.status) == Some(CardStatus::Active) {
                store.set_status(id, CardStatus::Pending);
            }
        }
        self.order.clear();
        self.active = None;
        self.phase = RoutinePhase::NoRoutine;
        ui.focus_mode_active = false;
        ui.camera_locked = false;
        info!("routine stopped");
        AdvanceOutcome {
            reset_zoom: true,
            ..Default::default()
        }
    }

    /// Strictly forward/backward by one position in the routine order,
    /// used by arrow keys while the camera is locked.
    pub fn step(&self, delta: isize) -> Option<Uuid> {
        let active = self.active?;
        let pos = self.order.iter().position(|&id| id == active)? as isize;
        let next = pos + delta;
        if next < 0 {
            return None;
        }
        self.order.get(next as usize).copied()
    }

    fn advance(&mut self, store: &mut CardStore, ui: &mut UiState) -> AdvanceOutcome {
        let next = self
            .order
            .iter()
            .copied()
            .find(|&id| store.get(id).map(|c| c.status) == Some(CardStatus::Pending));

        match next {
            Some(id) => {
                store.set_status(id, CardStatus::Active);
                self.active = Some(id);
                let follow = ui
                    .camera_locked
                    .then_some(CameraFollow {
                        card_id: id,
                        zoom: FOCUS_ZOOM,
                    });
                AdvanceOutcome {
                    activated: Some(id),
                    finished: false,
                    follow,
                    reset_zoom: false,
                }
            }
            None => {
                info!("routine finished");
                self.active = None;
                self.phase = RoutinePhase::Finished;
                ui.focus_mode_active = false;
                ui.camera_locked = false;
                AdvanceOutcome {
                    activated: None,
                    finished: true,
                    follow: None,
                    reset_zoom: true,
                }
            }
        }
    }
}
