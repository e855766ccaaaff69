use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A directed, labeled edge between two cards, independent of the
/// parent/child hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Connection {
    pub id: Uuid,
    pub from_id: Uuid,
    pub to_id: Uuid,
    pub label: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Connection {
    /// Self-loops are rejected at creation time.
    pub fn new(from_id: Uuid, to_id: Uuid, label: Option<String>) -> Option<Self> {
        if from_id == to_id {
            return None;
        }
        Some(Self {
            id: Uuid::new_v4(),
            from_id,
            to_id,
            label,
            created_at: Utc::now(),
        })
    }

    pub fn touches(&self, card_id: Uuid) -> bool {
        self.from_id == card_id || self.to_id == card_id
    }
}
