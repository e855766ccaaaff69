mod card_store;
mod command;

pub use card_store::{CardDraft, CardStore, SpawnContext, PARENT_SPAWN_OFFSET};
pub use command::{apply, Applied, StoreCommand};
