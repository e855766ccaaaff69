//! Structured actions returned by the suggestion provider, applied in
//! order against the store. Actions that only concern the host (chat
//! replies, camera moves, settings) come back as effects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::card::{CardPatch, Position};
use crate::store::{CardDraft, CardStore, SpawnContext};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Chat {
        message: String,
    },
    CreateCard {
        draft: CardDraft,
        parent_id: Option<Uuid>,
    },
    MoveCard {
        id: Uuid,
        position: Position,
    },
    ConnectCards {
        from_id: Uuid,
        to_id: Uuid,
        label: Option<String>,
    },
    UpdateSettings {
        #[serde(default)]
        settings: serde_json::Map<String, serde_json::Value>,
    },
    CameraFocus {
        card_id: Uuid,
    },
    ScheduleCard {
        id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    UpdateCard {
        id: Uuid,
        patch: CardPatch,
    },
}

/// Host-facing outcomes of an action batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionEffects {
    pub chat_messages: Vec<String>,
    pub camera_focus: Option<Uuid>,
    pub settings: serde_json::Map<String, serde_json::Value>,
    pub created_ids: Vec<Uuid>,
}

/// Applies the list in the order the provider returned it. Actions naming
/// unknown ids are logged and skipped; the rest of the batch still runs.
pub fn execute_actions(
    store: &mut CardStore,
    spawn: &SpawnContext,
    actions: Vec<Action>,
) -> ActionEffects {
    let mut effects = ActionEffects::default();

    for action in actions {
        match action {
            Action::Chat { message } => effects.chat_messages.push(message),
            Action::CreateCard { draft, parent_id } => {
                let id = store.create_card(draft, parent_id, spawn);
                effects.created_ids.push(id);
            }
            Action::MoveCard { id, position } => {
                if store.get(id).is_some() {
                    store.update_card(
                        id,
                        CardPatch {
                            position: Some(position),
                            ..Default::default()
                        },
                    );
                } else {
                    warn!(card_id = %id, "move action for unknown card skipped");
                }
            }
            Action::ConnectCards {
                from_id,
                to_id,
                label,
            } => {
                if store.create_connection(from_id, to_id, label).is_none() {
                    warn!(%from_id, %to_id, "connect action rejected");
                }
            }
            Action::UpdateSettings { settings } => {
                effects.settings.extend(settings);
            }
            Action::CameraFocus { card_id } => {
                // Last focus in the batch wins.
                effects.camera_focus = Some(card_id);
            }
            Action::ScheduleCard { id, start, end } => {
                if !store.update_card(
                    id,
                    CardPatch {
                        scheduled_start: Some(Some(start)),
                        scheduled_end: Some(Some(end)),
                        // Rescheduling re-arms the reminder.
                        alarm_played: Some(false),
                        ..Default::default()
                    },
                ) {
                    warn!(card_id = %id, "schedule action for unknown card skipped");
                }
            }
            Action::UpdateCard { id, patch } => {
                if !store.update_card(id, patch) {
                    warn!(card_id = %id, "update action for unknown card skipped");
                }
            }
        }
    }

    debug!(
        created = effects.created_ids.len(),
        chat = effects.chat_messages.len(),
        "action batch applied"
    );
    effects
}
