use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One key-value pair stored as a MongoDB document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoValueDocument {
    #[serde(rename = "_id")]
    pub key: String,
    pub value: Value,
    pub updated_at: DateTime,
}

impl MongoValueDocument {
    pub fn new(key: String, value: Value) -> Self {
        Self {
            key,
            value,
            updated_at: DateTime::now(),
        }
    }
}
