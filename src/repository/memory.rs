//! In-memory repository for tests and hosts that run without a backend.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::domain::card::Card;
use crate::domain::connection::Connection;
use crate::services::error::FocusdeckError;
use crate::services::scheduling::SchedulingProfile;

use super::{BackupSnapshot, CanvasRepository};

#[derive(Default)]
struct State {
    cards: Vec<Card>,
    connections: Vec<Connection>,
    profile: Option<SchedulingProfile>,
    backups: Vec<BackupSnapshot>,
}

#[derive(Default)]
pub struct InMemoryRepository {
    state: Mutex<State>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CanvasRepository for InMemoryRepository {
    async fn fetch_cards(&self) -> Result<Vec<Card>, FocusdeckError> {
        Ok(self.state.lock().cards.clone())
    }

    async fn fetch_connections(&self) -> Result<Vec<Connection>, FocusdeckError> {
        Ok(self.state.lock().connections.clone())
    }

    async fn save_card(&self, card: Card) -> Result<(), FocusdeckError> {
        let mut state = self.state.lock();
        match state.cards.iter_mut().find(|c| c.id == card.id) {
            Some(existing) => *existing = card,
            None => state.cards.push(card),
        }
        Ok(())
    }

    async fn delete_card(&self, id: Uuid) -> Result<(), FocusdeckError> {
        let mut state = self.state.lock();
        state.cards.retain(|c| c.id != id);
        state.connections.retain(|c| !c.touches(id));
        Ok(())
    }

    async fn save_connection(&self, connection: Connection) -> Result<(), FocusdeckError> {
        let mut state = self.state.lock();
        match state
            .connections
            .iter_mut()
            .find(|c| c.id == connection.id)
        {
            Some(existing) => *existing = connection,
            None => state.connections.push(connection),
        }
        Ok(())
    }

    async fn delete_connection(&self, id: Uuid) -> Result<(), FocusdeckError> {
        self.state.lock().connections.retain(|c| c.id != id);
        Ok(())
    }

    async fn save_profile(&self, profile: SchedulingProfile) -> Result<(), FocusdeckError> {
        self.state.lock().profile = Some(profile);
        Ok(())
    }

    async fn fetch_profile(&self) -> Result<Option<SchedulingProfile>, FocusdeckError> {
        Ok(self.state.lock().profile.clone())
    }

    async fn create_backup(
        &self,
        cards: Vec<Card>,
        connections: Vec<Connection>,
        name: String,
    ) -> Result<Uuid, FocusdeckError> {
        let snapshot = BackupSnapshot {
            id: Uuid::new_v4(),
            name,
            created_at: Utc::now(),
            cards,
            connections,
        };
        let id = snapshot.id;
        self.state.lock().backups.push(snapshot);
        Ok(id)
    }

    async fn restore_backup(
        &self,
        backup_id: Uuid,
    ) -> Result<(Vec<Card>, Vec<Connection>), FocusdeckError> {
        let mut state = self.state.lock();
        let snapshot = state
            .backups
            .iter()
            .find(|b| b.id == backup_id)
            .cloned()
            .ok_or_else(|| {
                FocusdeckError::BackupRestore(format!("no backup with id {backup_id}"))
            })?;
        state.cards = snapshot.cards.clone();
        state.connections = snapshot.connections.clone();
        Ok((snapshot.cards, snapshot.connections))
    }

    async fn clear_all_data(&self) -> Result<(), FocusdeckError> {
        let mut state = self.state.lock();
        state.cards.clear();
        state.connections.clear();
        state.profile = None;
        Ok(())
    }
}
