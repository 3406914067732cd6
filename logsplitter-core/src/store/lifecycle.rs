//! Initial-fetch lifecycle for stores

use std::future::Future;

/// Extra attempts allowed for a store's initial fetch. User-triggered
/// fetches are never retried.
pub const INITIAL_FETCH_RETRIES: u32 = 2;

/// Whether a store has performed its initial fetch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Lifecycle {
    #[default]
    Idle,
    Initializing,
    Ready,
    Failed,
}

impl Lifecycle {
    /// Move `Idle -> Initializing`. Returns false from any other state, so
    /// the initial fetch runs at most once per store.
    pub fn try_begin(&mut self) -> bool {
        if *self == Lifecycle::Idle {
            *self = Lifecycle::Initializing;
            true
        } else {
            false
        }
    }

    pub fn finish(&mut self, ok: bool) {
        *self = if ok { Lifecycle::Ready } else { Lifecycle::Failed };
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self, Lifecycle::Ready | Lifecycle::Failed)
    }
}

/// Run `attempt` until it succeeds, at most `1 + retries` times.
///
/// `attempt` returns `Some(true)` on success, `Some(false)` on a retryable
/// failure and `None` when retrying is pointless (e.g. the scope was
/// cancelled).
pub(crate) async fn with_initial_retries<F, Fut>(store: &str, retries: u32, mut attempt: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<bool>>,
{
    for n in 0..=retries {
        match attempt().await {
            Some(true) => return true,
            None => return false,
            Some(false) if n < retries => {
                tracing::debug!(
                    store,
                    "Retrying initial fetch (attempt {}/{})",
                    n + 2,
                    retries + 1
                );
            }
            Some(false) => {}
        }
    }
    tracing::warn!(store, "Max retries exceeded for initial fetch");
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_lifecycle_begins_once() {
        let mut lifecycle = Lifecycle::default();
        assert!(lifecycle.try_begin());
        assert!(!lifecycle.try_begin());
        lifecycle.finish(false);
        assert_eq!(lifecycle, Lifecycle::Failed);
        assert!(lifecycle.is_initialized());
        assert!(!lifecycle.try_begin());
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let calls = AtomicU32::new(0);
        let ok = with_initial_retries("test", INITIAL_FETCH_RETRIES, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Some(false)
        })
        .await;
        assert!(!ok);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_stops_on_success_or_abort() {
        let calls = AtomicU32::new(0);
        let ok = with_initial_retries("test", 2, || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            Some(n == 1)
        })
        .await;
        assert!(ok);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let calls = AtomicU32::new(0);
        let ok = with_initial_retries("test", 2, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            None
        })
        .await;
        assert!(!ok);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
