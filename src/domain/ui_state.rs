use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::card::Position;

/// The single UI surface that may be open. The gesture machine and routine
/// scheduler never read this directly; they only see the two flags below.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub enum Surface {
    #[default]
    None,
    Settings,
    CardEditor(Uuid),
    /// Context menu anchored at a canvas point; when a connection drag was
    /// released over empty canvas, the pending source rides along so the
    /// menu's "add card"/"add note" choices can become the new endpoint.
    ContextMenu {
        at: Position,
        connect_from: Option<Uuid>,
    },
    AiChat,
    Backups,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UiState {
    pub surface: Surface,
    pub focus_mode_active: bool,
    pub camera_locked: bool,
}

impl UiState {
    pub fn open_only(&mut self, surface: Surface) {
        self.surface = surface;
    }

    pub fn close_all(&mut self) {
        self.surface = Surface::None;
    }

    pub fn is_open(&self) -> bool {
        self.surface != Surface::None
    }
}
