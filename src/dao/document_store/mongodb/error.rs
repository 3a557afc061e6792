use mongodb::error::Error as MongoError;
use thiserror::Error;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to load document `{key}`")]
    LoadDocument {
        key: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to save document `{key}`")]
    SaveDocument {
        key: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to clear collection `{collection}`")]
    ClearCollection {
        collection: &'static str,
        #[source]
        source: MongoError,
    },
}
