//! Domain records shared by the service and HTTP layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A TODO as stored. Identity and timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Todo {
    pub id: i64,
    pub subject: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
