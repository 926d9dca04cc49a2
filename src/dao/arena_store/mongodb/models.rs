use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};

use crate::dao::models::{ArenaEntity, ArenaStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoArenaDocument {
    #[serde(rename = "_id")]
    id: String,
    player1: String,
    #[serde(default)]
    player2: Option<String>,
    status: ArenaStatus,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<ArenaEntity> for MongoArenaDocument {
    fn from(value: ArenaEntity) -> Self {
        Self {
            id: value.id,
            player1: value.player1,
            player2: value.player2,
            status: value.status,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoArenaDocument> for ArenaEntity {
    fn from(value: MongoArenaDocument) -> Self {
        Self {
            id: value.id,
            player1: value.player1,
            player2: value.player2,
            status: value.status,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

pub fn doc_id(id: &str) -> Document {
    doc! {"_id": id}
}
