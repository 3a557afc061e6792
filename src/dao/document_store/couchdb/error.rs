//! Failures of the CouchDB document store.

use reqwest::StatusCode;
use thiserror::Error;

pub type CouchResult<T> = Result<T, CouchDaoError>;

#[derive(Debug, Error)]
pub enum CouchDaoError {
    #[error("failed to build the CouchDB HTTP client")]
    Client(#[source] reqwest::Error),
    /// `target` is the database name or the document id.
    #[error("CouchDB request for `{target}` failed")]
    Transport {
        target: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("CouchDB answered {status} for `{target}`")]
    Status { target: String, status: StatusCode },
    #[error("CouchDB returned an unreadable body for `{target}`")]
    Decode {
        target: String,
        #[source]
        source: reqwest::Error,
    },
}
