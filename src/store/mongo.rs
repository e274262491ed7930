use crate::config::MongoConfig;
use crate::domain::ports::{Collection, DocumentStore};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::{self, doc, Bson, Document};
use mongodb::{Client, Database};

const LAST_UPDATED: &str = "lastUpdated";

/// MongoDB-backed snapshot. One client for the importer's lifetime; pooling is
/// left to the driver.
#[derive(Clone)]
pub struct MongoStore {
    database: Database,
}

impl MongoStore {
    pub async fn connect(config: &MongoConfig) -> Result<Self> {
        let client = Client::with_uri_str(config.connection_uri()?).await?;
        tracing::info!("🗄️ Connected to MongoDB at {}:{}", config.host, config.port);
        Ok(Self::new(client.database(&config.database)))
    }

    pub fn new(database: Database) -> Self {
        Self { database }
    }

    fn collection(&self, collection: Collection) -> mongodb::Collection<Document> {
        self.database.collection(collection.name())
    }
}

/// Converts a JSON document to BSON, storing `lastUpdated` as a BSON date so
/// that `$max` orders chronologically.
pub fn to_bson_document(value: &serde_json::Value) -> Result<Document> {
    let mut document = bson::to_document(value)?;

    let stamp = match document.get(LAST_UPDATED) {
        Some(Bson::String(raw)) => DateTime::parse_from_rfc3339(raw).ok(),
        _ => None,
    };
    if let Some(stamp) = stamp {
        document.insert(
            LAST_UPDATED,
            Bson::DateTime(bson::DateTime::from_millis(stamp.timestamp_millis())),
        );
    }

    Ok(document)
}

/// Reads the aggregated maximum. Older snapshots hold epoch milliseconds.
fn max_to_datetime(value: Option<&Bson>) -> Option<DateTime<Utc>> {
    let millis = match value? {
        Bson::DateTime(dt) => dt.timestamp_millis(),
        Bson::Int64(ms) => *ms,
        Bson::Int32(ms) => i64::from(*ms),
        Bson::Double(ms) => *ms as i64,
        _ => return None,
    };
    DateTime::from_timestamp_millis(millis)
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn insert_many(&self, collection: Collection, docs: Vec<serde_json::Value>) -> Result<u64> {
        if docs.is_empty() {
            return Ok(0);
        }
        let documents = docs
            .iter()
            .map(to_bson_document)
            .collect::<Result<Vec<_>>>()?;

        let result = self.collection(collection).insert_many(documents).await?;
        Ok(result.inserted_ids.len() as u64)
    }

    async fn delete_by_ids(&self, collection: Collection, ids: &[String]) -> Result<u64> {
        let result = self
            .collection(collection)
            .delete_many(doc! { "id": { "$in": ids.to_vec() } })
            .await?;
        Ok(result.deleted_count)
    }

    async fn delete_all(&self, collection: Collection) -> Result<u64> {
        let result = self.collection(collection).delete_many(doc! {}).await?;
        Ok(result.deleted_count)
    }

    async fn max_last_updated(&self, collection: Collection) -> Result<Option<DateTime<Utc>>> {
        let pipeline = vec![doc! {
            "$group": { "_id": Bson::Null, "max": { "$max": format!("${}", LAST_UPDATED) } }
        }];
        let mut cursor = self.collection(collection).aggregate(pipeline).await?;

        if cursor.advance().await? {
            let group = cursor.deserialize_current()?;
            return Ok(max_to_datetime(group.get("max")));
        }
        Ok(None)
    }
}
