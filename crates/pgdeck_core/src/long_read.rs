use std::sync::Arc;
use tokio::sync::watch;

/// Shared readiness signal between the task-log tailer and the dialog
/// controller.
///
/// The tailer holds a [`LongReadToken`] for the duration of each slow read;
/// the controller checks `is_in_flight` from its close poll loop. The
/// watch channel also gives waiters an awaitable form (`cleared`) for
/// embedders that would rather not poll.
#[derive(Clone)]
pub struct LongReadGuard {
    in_flight: Arc<watch::Sender<usize>>,
}

impl LongReadGuard {
    pub fn new() -> Self {
        Self {
            in_flight: Arc::new(watch::Sender::new(0)),
        }
    }

    /// Mark a long read as started. The read counts as in flight until the
    /// returned token is dropped.
    pub fn begin(&self) -> LongReadToken {
        self.in_flight.send_modify(|count| *count += 1);
        LongReadToken {
            in_flight: self.in_flight.clone(),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        *self.in_flight.borrow() > 0
    }

    /// Resolve once no long read is in flight. Returns immediately if none
    /// is active.
    pub async fn cleared(&self) {
        let mut rx = self.in_flight.subscribe();
        // The sender lives in self, so the channel cannot close under us.
        let _ = rx.wait_for(|count| *count == 0).await;
    }
}

impl Default for LongReadGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII marker for one in-flight long read.
pub struct LongReadToken {
    in_flight: Arc<watch::Sender<usize>>,
}

impl Drop for LongReadToken {
    fn drop(&mut self) {
        self.in_flight
            .send_modify(|count| *count = count.saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_tracks_in_flight() {
        let guard = LongReadGuard::new();
        assert!(!guard.is_in_flight());

        let token = guard.begin();
        assert!(guard.is_in_flight());

        let second = guard.begin();
        drop(token);
        assert!(guard.is_in_flight());

        drop(second);
        assert!(!guard.is_in_flight());
    }

    #[tokio::test]
    async fn cleared_resolves_when_token_drops() {
        let guard = LongReadGuard::new();
        let token = guard.begin();

        let waiter = {
            let guard = guard.clone();
            tokio::spawn(async move { guard.cleared().await })
        };
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        drop(token);
        waiter.await.unwrap();
        assert!(!guard.is_in_flight());
    }

    #[tokio::test]
    async fn cleared_is_immediate_when_idle() {
        LongReadGuard::new().cleared().await;
    }
}
