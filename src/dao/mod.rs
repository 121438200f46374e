/// Database model definitions.
pub mod models;
/// Party persistence backends.
pub mod party_store;
/// Storage abstraction layer for database operations.
pub mod storage;
