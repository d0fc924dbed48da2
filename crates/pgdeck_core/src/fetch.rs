use crate::{DbRecord, FetchError};
use async_trait::async_trait;

/// Seam to the service that resolves a `db_id` into a full record.
///
/// The dialog controller never talks to the network itself; the embedding
/// shell registers an implementation (HTTP client in production, a scripted
/// fake in tests). Implementations must be safe to call concurrently: the
/// controller does not cancel an in-flight fetch when a new one starts.
#[async_trait]
pub trait RecordFetcher: Send + Sync {
    async fn get_record(&self, db_id: &str) -> Result<DbRecord, FetchError>;
}
