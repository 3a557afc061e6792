pub mod document_store;
pub mod models;
pub mod question_source;
pub mod repository;
pub mod storage;
