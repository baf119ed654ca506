/// Key-value stores backing the snapshot.
pub mod kv;
/// Record shapes stored under each snapshot key.
pub mod models;
/// Versioned snapshot loading and writing.
pub mod snapshot;
/// Storage error types shared by every store.
pub mod storage;
