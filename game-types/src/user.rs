use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Verified identity of a player as handed over by the identity collaborator.
/// Sessions keep a copy of this; the account itself lives in the player registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Player {
    pub id: Uuid,
    pub username: String,
}

impl Player {
    pub fn new(id: Uuid, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }
}
