/// Setup draft persistence.
pub mod draft_store;
/// Match and event storage backends.
pub mod match_store;
/// Database model definitions.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
