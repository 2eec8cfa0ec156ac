//! services/console/src/sync.rs
//!
//! A cached copy of a backend-owned list. The cache is only ever replaced
//! wholesale by a reload, never patched after a mutation.
//!
//! Reloads are sequenced: each one takes the next sequence number and a fresh
//! `CancellationToken`, cancelling whichever reload was still in flight. A
//! result is applied only if its reload is still the latest, so a slow earlier
//! response can never overwrite a faster later one.

use parking_lot::Mutex;
use std::future::Future;
use student_portal_core::ports::{PortError, PortResult};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// What happened to a reload that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// The list was replaced; carries the new length.
    Applied(usize),
    /// A newer reload started first; this result was dropped.
    Superseded,
}

struct SyncState<T> {
    items: Vec<T>,
    error: Option<PortError>,
    loaded: bool,
    seq: u64,
    inflight: Option<CancellationToken>,
}

/// A point-in-time copy of the cache for rendering.
#[derive(Debug, Clone)]
pub struct ListSnapshot<T> {
    pub items: Vec<T>,
    /// Set when the most recent applied reload failed.
    pub error: Option<PortError>,
    pub loaded: bool,
}

pub struct ListSync<T> {
    state: Mutex<SyncState<T>>,
}

impl<T: Clone> Default for ListSync<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> ListSync<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SyncState {
                items: Vec::new(),
                error: None,
                loaded: false,
                seq: 0,
                inflight: None,
            }),
        }
    }

    fn begin(&self) -> (u64, CancellationToken) {
        let mut state = self.state.lock();
        state.seq += 1;
        let token = CancellationToken::new();
        if let Some(previous) = state.inflight.replace(token.clone()) {
            previous.cancel();
        }
        (state.seq, token)
    }

    /// Runs `fetch` and, if this is still the latest reload, replaces the cache.
    ///
    /// On failure the previous items stay cached and the error is recorded for
    /// the view; the error is also returned to the caller.
    pub async fn reload<F>(&self, fetch: F) -> PortResult<ReloadOutcome>
    where
        F: Future<Output = PortResult<Vec<T>>>,
    {
        let (seq, token) = self.begin();

        let result = tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!(seq, "Reload cancelled by a newer one");
                return Ok(ReloadOutcome::Superseded);
            }
            result = fetch => result,
        };

        let mut state = self.state.lock();
        if state.seq != seq {
            debug!(seq, latest = state.seq, "Dropping stale reload result");
            return Ok(ReloadOutcome::Superseded);
        }
        state.inflight = None;
        match result {
            Ok(items) => {
                let len = items.len();
                state.items = items;
                state.error = None;
                state.loaded = true;
                Ok(ReloadOutcome::Applied(len))
            }
            Err(e) => {
                state.error = Some(e.clone());
                Err(e)
            }
        }
    }

    pub fn snapshot(&self) -> ListSnapshot<T> {
        let state = self.state.lock();
        ListSnapshot {
            items: state.items.clone(),
            error: state.error.clone(),
            loaded: state.loaded,
        }
    }

    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        self.state.lock().items.iter().find(|item| predicate(item)).cloned()
    }

    /// Drops the cache and cancels any reload in flight (used at logout).
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.seq += 1;
        if let Some(token) = state.inflight.take() {
            token.cancel();
        }
        state.items.clear();
        state.error = None;
        state.loaded = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn applies_and_replaces_wholesale() {
        let list = ListSync::new();
        assert_eq!(
            list.reload(async { Ok(vec![1, 2, 3]) }).await,
            Ok(ReloadOutcome::Applied(3))
        );
        assert_eq!(
            list.reload(async { Ok(vec![9]) }).await,
            Ok(ReloadOutcome::Applied(1))
        );
        assert_eq!(list.snapshot().items, vec![9]);
    }

    #[tokio::test]
    async fn failure_keeps_items_and_records_error() {
        let list = ListSync::new();
        list.reload(async { Ok(vec!["a"]) }).await.unwrap();
        let err = list
            .reload(async { Err(PortError::Network("down".into())) })
            .await
            .unwrap_err();
        assert_eq!(err, PortError::Network("down".into()));

        let snapshot = list.snapshot();
        assert_eq!(snapshot.items, vec!["a"]);
        assert_eq!(snapshot.error, Some(PortError::Network("down".into())));

        list.reload(async { Ok(vec!["b"]) }).await.unwrap();
        assert_eq!(list.snapshot().error, None);
    }

    #[tokio::test]
    async fn slow_earlier_reload_never_overwrites_later_one() {
        let list = ListSync::new();
        let (release_slow, slow_gate) = oneshot::channel::<()>();

        let slow = list.reload(async move {
            let _ = slow_gate.await;
            Ok(vec!["stale"])
        });
        let fast = async {
            // Let the slow reload register first.
            tokio::time::sleep(Duration::from_millis(10)).await;
            let outcome = list.reload(async { Ok(vec!["fresh"]) }).await;
            let _ = release_slow.send(());
            outcome
        };

        let (slow_outcome, fast_outcome) = tokio::join!(slow, fast);
        assert_eq!(slow_outcome, Ok(ReloadOutcome::Superseded));
        assert_eq!(fast_outcome, Ok(ReloadOutcome::Applied(1)));
        assert_eq!(list.snapshot().items, vec!["fresh"]);
    }

    #[tokio::test]
    async fn reset_clears_and_cancels() {
        let list = ListSync::new();
        list.reload(async { Ok(vec![1]) }).await.unwrap();
        list.reset();
        let snapshot = list.snapshot();
        assert!(snapshot.items.is_empty());
        assert!(!snapshot.loaded);
    }
}
