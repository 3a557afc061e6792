use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DOCUMENT_PREFIX: &str = "kv::";
pub const END_SUFFIX: &str = "\u{ffff}";

/// CouchDB id of the document holding `key`.
pub fn document_id(key: &str) -> String {
    format!("{DOCUMENT_PREFIX}{key}")
}

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    pub id: String,
    pub value: RevisionValue,
}

#[derive(Debug, Deserialize)]
pub struct RevisionValue {
    pub rev: String,
}

/// Envelope wrapping a stored value with CouchDB bookkeeping fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchValueDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    pub value: Value,
}
