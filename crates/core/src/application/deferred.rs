// Deferred Signal
// One-shot cell that can be resolved from several call sites; the first value wins.

use tokio::sync::watch;

/// One-shot, first-wins value that can be awaited.
///
/// Built on a watch channel so any number of waiters can observe the value,
/// and resolution after the first is silently ignored.
pub struct Deferred<T> {
    tx: watch::Sender<Option<T>>,
}

impl<T> Deferred<T>
where
    T: Clone + Send + Sync,
{
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Resolve with `value`. Returns false if already resolved (value dropped).
    pub fn resolve(&self, value: T) -> bool {
        self.tx.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(value);
            true
        })
    }

    pub fn is_resolved(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Current value without waiting
    pub fn peek(&self) -> Option<T> {
        self.tx.borrow().clone()
    }

    /// Wait for the first resolution
    pub async fn wait(&self) -> T {
        let mut rx = self.tx.subscribe();
        let settled = match rx.wait_for(Option::is_some).await {
            Ok(slot) => slot.clone(),
            Err(_) => None,
        };
        match settled {
            Some(value) => value,
            // The sender lives in `self`, so the channel cannot close while we wait.
            None => std::future::pending().await,
        }
    }
}

impl<T> Default for Deferred<T>
where
    T: Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Deferred<T>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deferred")
            .field("value", &*self.tx.borrow())
            .finish()
    }
}
