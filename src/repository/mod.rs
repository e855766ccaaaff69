//! Persistence collaborator. The core mutates its in-memory store first
//! and mirrors changes out through this trait; a write failure is logged
//! and the session keeps going on memory alone.

mod memory;

pub use memory::InMemoryRepository;

use async_trait::async_trait;
use mockall::automock;
use tracing::warn;
use uuid::Uuid;

use crate::domain::card::Card;
use crate::domain::connection::Connection;
use crate::services::error::FocusdeckError;
use crate::services::scheduling::SchedulingProfile;

/// An opaque, restorable snapshot of the whole canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct BackupSnapshot {
    pub id: Uuid,
    pub name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub cards: Vec<Card>,
    pub connections: Vec<Connection>,
}

#[automock]
#[async_trait]
pub trait CanvasRepository: Send + Sync {
    async fn fetch_cards(&self) -> Result<Vec<Card>, FocusdeckError>;
    async fn fetch_connections(&self) -> Result<Vec<Connection>, FocusdeckError>;
    async fn save_card(&self, card: Card) -> Result<(), FocusdeckError>;
    async fn delete_card(&self, id: Uuid) -> Result<(), FocusdeckError>;
    async fn save_connection(&self, connection: Connection) -> Result<(), FocusdeckError>;
    async fn delete_connection(&self, id: Uuid) -> Result<(), FocusdeckError>;
    async fn save_profile(&self, profile: SchedulingProfile) -> Result<(), FocusdeckError>;
    async fn fetch_profile(&self) -> Result<Option<SchedulingProfile>, FocusdeckError>;
    /// Stores a labeled snapshot of the given canvas state; the caller
    /// passes the live cards/connections so the backup captures exactly
    /// what the user sees, not what storage last flushed.
    async fn create_backup(
        &self,
        cards: Vec<Card>,
        connections: Vec<Connection>,
        name: String,
    ) -> Result<Uuid, FocusdeckError>;
    async fn restore_backup(
        &self,
        backup_id: Uuid,
    ) -> Result<(Vec<Card>, Vec<Connection>), FocusdeckError>;
    async fn clear_all_data(&self) -> Result<(), FocusdeckError>;
}

/// Best-effort card write: the in-memory mutation already happened, so a
/// storage failure only gets logged.
pub async fn save_card_best_effort(repo: &dyn CanvasRepository, card: Card) {
    let id = card.id;
    if let Err(err) = repo.save_card(card).await {
        warn!(card_id = %id, error = %err, "card write failed, continuing in memory");
    }
}

pub async fn delete_card_best_effort(repo: &dyn CanvasRepository, id: Uuid) {
    if let Err(err) = repo.delete_card(id).await {
        warn!(card_id = %id, error = %err, "card delete failed, continuing in memory");
    }
}

pub async fn save_connection_best_effort(repo: &dyn CanvasRepository, connection: Connection) {
    let id = connection.id;
    if let Err(err) = repo.save_connection(connection).await {
        warn!(connection_id = %id, error = %err, "connection write failed, continuing in memory");
    }
}

pub async fn delete_connection_best_effort(repo: &dyn CanvasRepository, id: Uuid) {
    if let Err(err) = repo.delete_connection(id).await {
        warn!(connection_id = %id, error = %err, "connection delete failed, continuing in memory");
    }
}
