//! The suggestion collaborator. The crate owns only the interface; hosts
//! plug in whatever backend they have, tests plug in the mock.

use async_trait::async_trait;
use mockall::automock;

use crate::domain::card::Card;
use crate::services::actions::Action;
use crate::services::error::FocusdeckError;

#[automock]
#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    /// Turns the user's message plus a snapshot of the canvas into an
    /// ordered action list. The snapshot is owned so the request can
    /// outlive the lock that produced it.
    async fn suggest_actions(
        &self,
        cards: Vec<Card>,
        user_text: String,
    ) -> Result<Vec<Action>, FocusdeckError>;
}
