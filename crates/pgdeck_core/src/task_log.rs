use crate::{FetchError, LongReadGuard};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Severity of a task log line, encoded numerically by the service
/// (1 = debug, 0 = info, negative values increasing in severity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i8", into = "i8")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl From<i8> for LogLevel {
    fn from(value: i8) -> Self {
        match value {
            1 => LogLevel::Debug,
            -1 => LogLevel::Warn,
            -2 => LogLevel::Error,
            -3 => LogLevel::Fatal,
            _ => LogLevel::Info,
        }
    }
}

impl From<LogLevel> for i8 {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => 1,
            LogLevel::Info => 0,
            LogLevel::Warn => -1,
            LogLevel::Error => -2,
            LogLevel::Fatal => -3,
        }
    }
}

/// One line of a long-running task's log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskLogEntry {
    pub seq: i64,
    #[serde(rename = "log_level")]
    pub level: LogLevel,
    #[serde(rename = "log")]
    pub message: String,
    #[serde(rename = "create_time")]
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i8", into = "i8")]
pub enum TaskState {
    Running,
    Finished,
    Failed,
}

impl From<i8> for TaskState {
    fn from(value: i8) -> Self {
        match value {
            0 => TaskState::Running,
            1 => TaskState::Finished,
            _ => TaskState::Failed,
        }
    }
}

impl From<TaskState> for i8 {
    fn from(state: TaskState) -> Self {
        match state {
            TaskState::Running => 0,
            TaskState::Finished => 1,
            TaskState::Failed => -1,
        }
    }
}

/// One incremental page of task log: entries newer than the requested
/// sequence number, plus the task's current state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskLogPage {
    pub state: TaskState,
    #[serde(rename = "data")]
    pub entries: Vec<TaskLogEntry>,
}

/// Seam to the task-log endpoint. `fetch_since` returns only entries with
/// `seq` strictly greater than the given one.
#[async_trait]
pub trait TaskLogSource: Send + Sync {
    async fn fetch_since(&self, task_id: i64, seq: i64) -> Result<TaskLogPage, FetchError>;
}

/// Tails one task's log on a fixed interval until the task leaves the
/// running state.
///
/// This is the "long read" the dialog's close protocol waits for: every
/// `fetch_since` call holds a token on the shared [`LongReadGuard`] so the
/// controller will not tear the dialog down mid-read. The spawned handle is
/// meant to be attached to the controller, which aborts it on close.
pub struct TaskLogTailer {
    source: Arc<dyn TaskLogSource>,
    guard: LongReadGuard,
    poll_interval: Duration,
    entries: Arc<Mutex<Vec<TaskLogEntry>>>,
}

impl TaskLogTailer {
    pub fn new(source: Arc<dyn TaskLogSource>, guard: LongReadGuard) -> Self {
        Self {
            source,
            guard,
            poll_interval: DEFAULT_POLL_INTERVAL,
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Snapshot of all entries received so far, in sequence order.
    pub fn entries(&self) -> Vec<TaskLogEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Start tailing `task_id`. The task runs until the log source reports
    /// the task finished or failed, or until the handle is aborted.
    pub fn spawn(&self, task_id: i64) -> JoinHandle<()> {
        let source = self.source.clone();
        let guard = self.guard.clone();
        let entries = self.entries.clone();
        let poll_interval = self.poll_interval;

        tokio::spawn(async move {
            let mut last_seq = 0;
            loop {
                let page = {
                    let _token = guard.begin();
                    source.fetch_since(task_id, last_seq).await
                };

                match page {
                    Ok(page) => {
                        if let Some(last) = page.entries.last() {
                            last_seq = last.seq;
                        }
                        if !page.entries.is_empty() {
                            if let Ok(mut sink) = entries.lock() {
                                sink.extend(page.entries);
                            }
                        }
                        if page.state != TaskState::Running {
                            log::info!("Task {} left running state, stopping tail", task_id);
                            break;
                        }
                    }
                    Err(FetchError::NotFound(message)) => {
                        log::warn!("Task log tail stopped: {}", message);
                        break;
                    }
                    Err(err) => {
                        // Transient transport errors: keep polling.
                        log::warn!("Task {} log fetch failed: {}", task_id, err);
                    }
                }

                tokio::time::sleep(poll_interval).await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    fn entry(seq: i64, message: &str) -> TaskLogEntry {
        TaskLogEntry {
            seq,
            level: LogLevel::Info,
            message: message.to_string(),
            created_at: NaiveDateTime::default(),
        }
    }

    struct ScriptedSource {
        guard: LongReadGuard,
        pages: Mutex<VecDeque<TaskLogPage>>,
        requested_seqs: Mutex<Vec<i64>>,
    }

    #[async_trait]
    impl TaskLogSource for ScriptedSource {
        async fn fetch_since(&self, _task_id: i64, seq: i64) -> Result<TaskLogPage, FetchError> {
            // The tailer must hold the long-read token across this call.
            assert!(self.guard.is_in_flight());
            self.requested_seqs.lock().unwrap().push(seq);
            match self.pages.lock().unwrap().pop_front() {
                Some(page) => Ok(page),
                None => Err(FetchError::transport("source exhausted")),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn tails_until_task_finishes() {
        let guard = LongReadGuard::new();
        let source = Arc::new(ScriptedSource {
            guard: guard.clone(),
            pages: Mutex::new(VecDeque::from([
                TaskLogPage {
                    state: TaskState::Running,
                    entries: vec![entry(1, "starting"), entry(2, "working")],
                },
                TaskLogPage {
                    state: TaskState::Finished,
                    entries: vec![entry(3, "done")],
                },
            ])),
            requested_seqs: Mutex::new(Vec::new()),
        });

        let tailer =
            TaskLogTailer::new(source.clone(), guard.clone()).with_poll_interval(Duration::from_secs(1));
        let handle = tailer.spawn(42);
        handle.await.unwrap();

        let messages: Vec<_> = tailer.entries().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, ["starting", "working", "done"]);
        // Incremental: second request asks only for entries after seq 2.
        assert_eq!(*source.requested_seqs.lock().unwrap(), vec![0, 2]);
        assert!(!guard.is_in_flight());
    }

    struct HangingSource {
        guard: LongReadGuard,
    }

    #[async_trait]
    impl TaskLogSource for HangingSource {
        async fn fetch_since(&self, _task_id: i64, _seq: i64) -> Result<TaskLogPage, FetchError> {
            assert!(self.guard.is_in_flight());
            futures::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn abort_releases_the_guard() {
        let guard = LongReadGuard::new();
        let source = Arc::new(HangingSource {
            guard: guard.clone(),
        });

        let tailer = TaskLogTailer::new(source, guard.clone());
        let handle = tailer.spawn(7);
        tokio::task::yield_now().await;
        assert!(guard.is_in_flight());

        handle.abort();
        let _ = handle.await;
        assert!(!guard.is_in_flight());
    }

    #[test]
    fn log_level_round_trip() {
        assert_eq!(LogLevel::from(-2), LogLevel::Error);
        assert_eq!(i8::from(LogLevel::Warn), -1);
        // Unknown severities degrade to info.
        assert_eq!(LogLevel::from(5), LogLevel::Info);
    }
}
