use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// Collections written by the importer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Services,
    Channels,
    Municipalities,
}

impl Collection {
    pub fn name(self) -> &'static str {
        match self {
            Collection::Services => "services",
            Collection::Channels => "channels",
            Collection::Municipalities => "municipalities",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Collection {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "services" => Ok(Collection::Services),
            "channels" => Ok(Collection::Channels),
            "municipalities" => Ok(Collection::Municipalities),
            other => Err(SyncError::UnknownCollection {
                name: other.to_string(),
            }),
        }
    }
}

/// Document store used for the synchronized snapshot.
///
/// Documents are plain JSON objects carrying an `id` field; records that take
/// part in incremental sync also carry an RFC 3339 `lastUpdated` field.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert_many(&self, collection: Collection, docs: Vec<serde_json::Value>)
        -> Result<u64>;

    /// Deletes documents whose `id` is in `ids` and returns how many went away.
    async fn delete_by_ids(&self, collection: Collection, ids: &[String]) -> Result<u64>;

    async fn delete_all(&self, collection: Collection) -> Result<u64>;

    /// Largest stored `lastUpdated`, or `None` for an empty collection.
    async fn max_last_updated(&self, collection: Collection) -> Result<Option<DateTime<Utc>>>;
}
