use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::dao::models::{ArenaEntity, ArenaStatus};

pub const ARENA_PREFIX: &str = "arena::";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchArenaDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub arena: ArenaBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArenaBody {
    pub arena_id: String,
    pub player1: String,
    #[serde(default)]
    pub player2: Option<String>,
    pub status: ArenaStatus,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl From<(ArenaEntity, Option<String>)> for CouchArenaDocument {
    fn from((arena, rev): (ArenaEntity, Option<String>)) -> Self {
        Self {
            id: arena_doc_id(&arena.id),
            rev,
            arena: ArenaBody {
                arena_id: arena.id,
                player1: arena.player1,
                player2: arena.player2,
                status: arena.status,
                created_at: arena.created_at,
                updated_at: arena.updated_at,
            },
        }
    }
}

impl CouchArenaDocument {
    pub fn into_entity(self) -> ArenaEntity {
        ArenaEntity {
            id: self.arena.arena_id,
            player1: self.arena.player1,
            player2: self.arena.player2,
            status: self.arena.status,
            created_at: self.arena.created_at,
            updated_at: self.arena.updated_at,
        }
    }
}

pub fn arena_doc_id(id: &str) -> String {
    format!("{ARENA_PREFIX}{id}")
}
