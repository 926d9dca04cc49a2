use serde::Serialize;
use utoipa::ToSchema;

/// Overall service condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Storage reachable, every operation available.
    Ok,
    /// Storage unreachable: running games continue, create and join are refused.
    Degraded,
}

/// Body of `GET /healthcheck`.
#[derive(Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Overall service condition.
    pub status: HealthStatus,
    /// Arenas currently held in memory.
    pub arenas: usize,
}

impl HealthResponse {
    /// Storage is reachable.
    pub fn ok(arenas: usize) -> Self {
        Self {
            status: HealthStatus::Ok,
            arenas,
        }
    }

    /// Storage is unreachable.
    pub fn degraded(arenas: usize) -> Self {
        Self {
            status: HealthStatus::Degraded,
            arenas,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_in_lowercase() {
        let body = serde_json::to_value(HealthResponse::degraded(2)).unwrap();
        assert_eq!(body, serde_json::json!({ "status": "degraded", "arenas": 2 }));
    }
}
