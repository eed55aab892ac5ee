use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable)]
#[diesel(table_name = crate::schema::servers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Server {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub category_id: Uuid,
    pub description: Option<String>,
    pub icon_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Wire shape for server listings. `num_members` is only present when the
/// caller asked for the member-count annotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSummary {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub category_id: Uuid,
    pub description: Option<String>,
    pub icon_path: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_members: Option<i64>,
}

impl From<Server> for ServerSummary {
    fn from(server: Server) -> Self {
        Self {
            id: server.id,
            name: server.name,
            owner_id: server.owner_id,
            category_id: server.category_id,
            description: server.description,
            icon_path: server.icon_path,
            created_at: server.created_at,
            num_members: None,
        }
    }
}
