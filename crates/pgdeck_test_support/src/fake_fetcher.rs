use async_trait::async_trait;
use pgdeck_core::{DbRecord, FetchError, RecordFetcher};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum FakeFetchOutcome {
    Success(DbRecord),
    Error(FetchError),
}

impl FakeFetchOutcome {
    fn into_result(&self) -> Result<DbRecord, FetchError> {
        match self {
            Self::Success(record) => Ok(record.clone()),
            Self::Error(err) => Err(err.clone()),
        }
    }
}

#[derive(Debug, Clone)]
struct ScriptedCall {
    delay: Option<Duration>,
    outcome: FakeFetchOutcome,
}

#[derive(Default)]
struct FakeFetcherState {
    by_id: Mutex<HashMap<String, FakeFetchOutcome>>,
    queued: Mutex<VecDeque<ScriptedCall>>,
    requested_ids: Mutex<Vec<String>>,
}

/// Scripted [`RecordFetcher`] for controller tests.
///
/// Outcomes can be registered per `db_id`, or queued in FIFO order to
/// script successive calls independently of the id (useful for refresh
/// races, where every call targets the same record). Queued calls win over
/// per-id outcomes and may carry an artificial delay.
#[derive(Clone, Default)]
pub struct FakeRecordFetcher {
    state: Arc<FakeFetcherState>,
}

impl FakeRecordFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(self, db_id: impl Into<String>, record: DbRecord) -> Self {
        lock(&self.state.by_id).insert(db_id.into(), FakeFetchOutcome::Success(record));
        self
    }

    pub fn with_error(self, db_id: impl Into<String>, error: FetchError) -> Self {
        lock(&self.state.by_id).insert(db_id.into(), FakeFetchOutcome::Error(error));
        self
    }

    /// Queue the outcome for the next unscripted call, resolving after
    /// `delay` of (simulated) time.
    pub fn queue_response(&self, delay: Duration, record: DbRecord) {
        lock(&self.state.queued).push_back(ScriptedCall {
            delay: Some(delay),
            outcome: FakeFetchOutcome::Success(record),
        });
    }

    pub fn queue_error(&self, delay: Duration, error: FetchError) {
        lock(&self.state.queued).push_back(ScriptedCall {
            delay: Some(delay),
            outcome: FakeFetchOutcome::Error(error),
        });
    }

    /// Every `db_id` requested so far, in call order.
    pub fn requested_ids(&self) -> Vec<String> {
        lock(&self.state.requested_ids).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.state.requested_ids).len()
    }
}

#[async_trait]
impl RecordFetcher for FakeRecordFetcher {
    async fn get_record(&self, db_id: &str) -> Result<DbRecord, FetchError> {
        lock(&self.state.requested_ids).push(db_id.to_string());

        let queued = lock(&self.state.queued).pop_front();
        if let Some(call) = queued {
            if let Some(delay) = call.delay {
                tokio::time::sleep(delay).await;
            }
            return call.outcome.into_result();
        }

        match lock(&self.state.by_id).get(db_id) {
            Some(outcome) => outcome.into_result(),
            None => Err(FetchError::NotFound(db_id.to_string())),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().expect("fake fetcher lock poisoned")
}
