//! The async core: one serial command loop over the shared store, the
//! periodic alarm sweep, deferred camera follows, and staleness guarding
//! for slow AI completions.

use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::domain::camera::Camera;
use crate::domain::card::Position;
use crate::domain::ui_state::UiState;
use crate::services::actions::{self, ActionEffects};
use crate::services::ai::SuggestionProvider;
use crate::services::alarm::{self, AlarmEvent};
use crate::services::progress;
use crate::services::routine::CameraFollow;
use crate::store::{self, Applied, CardStore, SpawnContext, StoreCommand};

/// Delay before a camera follow lands, letting layout settle first.
pub const FOLLOW_DELAY_MS: u64 = 120;

/// Mutations arrive from pointer handlers, keyboard handlers, and async
/// completions at once; everything funnels through one queue so each
/// command sees the store state left by the previous one.
pub struct CanvasEngine {
    store: Arc<RwLock<CardStore>>,
    spawn: Arc<RwLock<SpawnContext>>,
    tx: mpsc::UnboundedSender<StoreCommand>,
    generation: Arc<AtomicU64>,
}

/// The consuming half, spawned once by the host.
pub struct EngineLoop {
    rx: mpsc::UnboundedReceiver<StoreCommand>,
    store: Arc<RwLock<CardStore>>,
    spawn: Arc<RwLock<SpawnContext>>,
}

impl CanvasEngine {
    pub fn new() -> (Self, EngineLoop) {
        let store = Arc::new(RwLock::new(CardStore::new()));
        let spawn = Arc::new(RwLock::new(SpawnContext::default()));
        let (tx, rx) = mpsc::unbounded_channel();
        let engine = Self {
            store: Arc::clone(&store),
            spawn: Arc::clone(&spawn),
            tx,
            generation: Arc::new(AtomicU64::new(0)),
        };
        (engine, EngineLoop { rx, store, spawn })
    }

    pub fn store(&self) -> Arc<RwLock<CardStore>> {
        Arc::clone(&self.store)
    }

    /// Keeps the spawn point in sync with the camera so unpositioned
    /// creations land at the current view center.
    pub fn set_camera_center(&self, center: Position) {
        self.spawn.write().camera_center = center;
    }

    /// Queues a command for the serial loop. Returns false when the loop
    /// has shut down.
    pub fn enqueue(&self, command: StoreCommand) -> bool {
        self.tx.send(command).is_ok()
    }

    /// Applies a command synchronously, bypassing the queue. Used by
    /// pointer handlers that need the result immediately (e.g. the id of
    /// a created card).
    pub fn apply_now(&self, command: StoreCommand) -> Applied {
        let spawn = *self.spawn.read();
        let mut store = self.store.write();
        let applied = store::apply(&mut store, &spawn, command);
        progress::recompute(&mut store);
        applied
    }

    /// Asks the provider for actions and applies them, unless a newer
    /// request was issued while this one was in flight. Stale completions
    /// are dropped wholesale rather than applied against a canvas the user
    /// has since changed.
    pub async fn request_suggestions(
        &self,
        provider: &dyn SuggestionProvider,
        user_text: String,
    ) -> Option<ActionEffects> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = self.store.read().cards().to_vec();

        let actions = match provider.suggest_actions(snapshot, user_text).await {
            Ok(actions) => actions,
            Err(err) => {
                tracing::warn!(error = %err, "suggestion request failed");
                return None;
            }
        };

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "dropping stale suggestion response");
            return None;
        }

        let spawn = *self.spawn.read();
        let mut store = self.store.write();
        let effects = actions::execute_actions(&mut store, &spawn, actions);
        progress::recompute(&mut store);
        Some(effects)
    }
}

impl EngineLoop {
    /// Runs until every sender is dropped. Progress is recomputed after
    /// each command so hierarchy percentages never lag a mutation.
    pub async fn run(mut self) {
        info!("engine command loop started");
        while let Some(command) = self.rx.recv().await {
            let spawn = *self.spawn.read();
            let mut store = self.store.write();
            store::apply(&mut store, &spawn, command);
            progress::recompute(&mut store);
        }
        info!("engine command loop stopped");
    }
}

/// Applies a routine camera follow after the settle delay, re-checking the
/// lock: if the user unlocked the camera while the delay ran, the follow is
/// abandoned.
pub async fn follow_after_delay(
    camera: Arc<RwLock<Camera>>,
    store: Arc<RwLock<CardStore>>,
    ui: Arc<RwLock<UiState>>,
    follow: CameraFollow,
) {
    tokio::time::sleep(Duration::from_millis(FOLLOW_DELAY_MS)).await;
    if !ui.read().camera_locked {
        return;
    }
    let center = match store.read().get(follow.card_id) {
        Some(card) => card.center(),
        None => return,
    };
    *camera.write() = Camera::centered_on(center, follow.zoom);
}

/// Spawns the reminder sweep on a fixed interval, emitting due alarms on
/// the channel. The period is a parameter so tests can run it fast; hosts
/// pass `Duration::from_secs(ALARM_SWEEP_SECONDS)`.
pub fn spawn_alarm_sweeper(
    store: Arc<RwLock<CardStore>>,
    period: Duration,
    events: mpsc::UnboundedSender<AlarmEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let due = alarm::sweep(&mut store.write(), chrono::Utc::now());
            for event in due {
                if events.send(event).is_err() {
                    return;
                }
            }
        }
    })
}
