//! Serializable mutation commands over the card store. The engine feeds
//! these through a single queue so concurrent callers never interleave
//! partial mutations.

use serde::{Deserialize, Serialize};
use tracing::trace;
use uuid::Uuid;

use crate::domain::card::{CardPatch, CardStatus, Position};
use crate::store::card_store::{CardDraft, CardStore, SpawnContext};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreCommand {
    CreateCard {
        draft: CardDraft,
        parent_id: Option<Uuid>,
    },
    UpdateCard {
        id: Uuid,
        patch: CardPatch,
    },
    DeleteCard {
        id: Uuid,
    },
    MoveCardBy {
        id: Uuid,
        dx: f64,
        dy: f64,
    },
    SetGeometry {
        id: Uuid,
        position: Position,
        width: f64,
        height: f64,
    },
    SetStatus {
        id: Uuid,
        status: CardStatus,
    },
    Connect {
        from_id: Uuid,
        to_id: Uuid,
        label: Option<String>,
    },
    Disconnect {
        connection_id: Uuid,
    },
    Reorder {
        front_ids: Vec<Uuid>,
    },
    AppendThought {
        id: Uuid,
        content: String,
    },
    /// Wholesale replacement, used by backup restore.
    ReplaceAll {
        cards: Vec<crate::domain::card::Card>,
        connections: Vec<crate::domain::connection::Connection>,
    },
}

/// What a command produced, for callers that need the id of a created
/// entity. Everything else reports only whether the store changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Created(Uuid),
    Mutated,
    NoOp,
}

impl Applied {
    pub fn created_id(self) -> Option<Uuid> {
        match self {
            Applied::Created(id) => Some(id),
            _ => None,
        }
    }
}

/// Applies one command. Commands naming a missing id degrade to no-ops,
/// mirroring the store's own tolerance for stale references.
pub fn apply(store: &mut CardStore, spawn: &SpawnContext, command: StoreCommand) -> Applied {
    trace!(?command, "applying store command");
    match command {
        StoreCommand::CreateCard { draft, parent_id } => {
            Applied::Created(store.create_card(draft, parent_id, spawn))
        }
        StoreCommand::UpdateCard { id, patch } => {
            if store.update_card(id, patch) {
                Applied::Mutated
            } else {
                Applied::NoOp
            }
        }
        StoreCommand::DeleteCard { id } => {
            if store.delete_card(id) {
                Applied::Mutated
            } else {
                Applied::NoOp
            }
        }
        StoreCommand::MoveCardBy { id, dx, dy } => {
            if store.get(id).is_some() {
                store.move_card_by(id, dx, dy);
                Applied::Mutated
            } else {
                Applied::NoOp
            }
        }
        StoreCommand::SetGeometry {
            id,
            position,
            width,
            height,
        } => {
            if store.get(id).is_some() {
                store.set_card_geometry(id, position.x, position.y, width, height);
                Applied::Mutated
            } else {
                Applied::NoOp
            }
        }
        StoreCommand::SetStatus { id, status } => {
            if store.get(id).is_some() {
                store.set_status(id, status);
                Applied::Mutated
            } else {
                Applied::NoOp
            }
        }
        StoreCommand::Connect {
            from_id,
            to_id,
            label,
        } => match store.create_connection(from_id, to_id, label) {
            Some(id) => Applied::Created(id),
            None => Applied::NoOp,
        },
        StoreCommand::Disconnect { connection_id } => {
            if store.delete_connection(connection_id) {
                Applied::Mutated
            } else {
                Applied::NoOp
            }
        }
        StoreCommand::Reorder { front_ids } => {
            store.reorder(&front_ids);
            Applied::Mutated
        }
        StoreCommand::AppendThought { id, content } => match store.get_mut(id) {
            Some(card) => {
                card.append_thought(content);
                Applied::Mutated
            }
            None => Applied::NoOp,
        },
        StoreCommand::ReplaceAll { cards, connections } => {
            store.replace_all(cards, connections);
            Applied::Mutated
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_then_update_round_trip() {
        let mut store = CardStore::new();
        let spawn = SpawnContext::default();

        let created = apply(
            &mut store,
            &spawn,
            StoreCommand::CreateCard {
                draft: CardDraft {
                    title: "Write report".to_string(),
                    ..Default::default()
                },
                parent_id: None,
            },
        );
        let id = created.created_id().unwrap();

        let applied = apply(
            &mut store,
            &spawn,
            StoreCommand::UpdateCard {
                id,
                patch: CardPatch {
                    status: Some(CardStatus::Active),
                    ..Default::default()
                },
            },
        );
        assert_eq!(applied, Applied::Mutated);
        assert_eq!(store.get(id).unwrap().status, CardStatus::Active);
    }

    #[test]
    fn test_missing_ids_degrade_to_noops() {
        let mut store = CardStore::new();
        let spawn = SpawnContext::default();
        let ghost = Uuid::new_v4();

        for command in [
            StoreCommand::DeleteCard { id: ghost },
            StoreCommand::MoveCardBy {
                id: ghost,
                dx: 1.0,
                dy: 1.0,
            },
            StoreCommand::SetStatus {
                id: ghost,
                status: CardStatus::Completed,
            },
            StoreCommand::Disconnect {
                connection_id: ghost,
            },
        ] {
            assert_eq!(apply(&mut store, &spawn, command), Applied::NoOp);
        }
        assert!(store.is_empty());
    }

    #[test]
    fn test_self_loop_connect_is_noop() {
        let mut store = CardStore::new();
        let spawn = SpawnContext::default();
        let id = apply(
            &mut store,
            &spawn,
            StoreCommand::CreateCard {
                draft: CardDraft::default(),
                parent_id: None,
            },
        )
        .created_id()
        .unwrap();

        let applied = apply(
            &mut store,
            &spawn,
            StoreCommand::Connect {
                from_id: id,
                to_id: id,
                label: None,
            },
        );
        assert_eq!(applied, Applied::NoOp);
    }

    #[test]
    fn test_commands_serialize_tagged() {
        let command = StoreCommand::SetStatus {
            id: Uuid::nil(),
            status: CardStatus::Skipped,
        };
        let json = serde_json::to_string(&command).unwrap();
        assert!(json.contains("\"type\":\"set_status\""));
        let back: StoreCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(back, command);
    }
}
