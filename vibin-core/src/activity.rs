//! A process-wide "something is working in the background" signal.
//!
//! Any number of named sources can report activity; the signal is lit while at least one of them
//! is active. UI indicators subscribe to the aggregate and never see individual sources.
use std::{
    collections::BTreeMap,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use tokio::sync::watch;

#[derive(Clone)]
pub struct BackgroundActivity {
    inner: Arc<Inner>,
}
struct Inner {
    next_source_id: AtomicU64,
    sources: Mutex<BTreeMap<u64, SourceState>>,
    tx: watch::Sender<bool>,
}
struct SourceState {
    name: String,
    active: bool,
}
impl Default for BackgroundActivity {
    fn default() -> Self {
        Self::new()
    }
}
impl BackgroundActivity {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                next_source_id: AtomicU64::new(0),
                sources: Mutex::new(BTreeMap::new()),
                tx: watch::Sender::new(false),
            }),
        }
    }

    /// Registers a new reporter. It starts out inactive.
    pub fn source(&self, name: impl Into<String>) -> ActivitySource {
        let id = self.inner.next_source_id.fetch_add(1, Ordering::Relaxed);
        let name = name.into();
        self.sources().insert(
            id,
            SourceState {
                name: name.clone(),
                active: false,
            },
        );
        tracing::debug!("registered background activity source `{name}`");
        ActivitySource {
            id,
            activity: self.clone(),
        }
    }

    pub fn is_active(&self) -> bool {
        *self.inner.tx.borrow()
    }

    /// Names of the sources currently reporting activity.
    pub fn active_sources(&self) -> Vec<String> {
        self.sources()
            .values()
            .filter(|source| source.active)
            .map(|source| source.name.clone())
            .collect()
    }

    /// Watches the aggregate signal.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.tx.subscribe()
    }

    fn update(&self, id: u64, active: Option<bool>) {
        let mut sources = self.sources();
        match active {
            Some(active) => {
                if let Some(source) = sources.get_mut(&id) {
                    source.active = active;
                }
            }
            None => {
                sources.remove(&id);
            }
        }
        // Publish under the lock so concurrent updates cannot land out of order.
        let any_active = sources.values().any(|source| source.active);
        let was_active = self.inner.tx.send_replace(any_active);
        drop(sources);

        if was_active != any_active {
            tracing::debug!("background activity: {any_active}");
        }
    }

    fn sources(&self) -> std::sync::MutexGuard<'_, BTreeMap<u64, SourceState>> {
        self.inner
            .sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// One reporter into a [`BackgroundActivity`]. Dropping it withdraws its contribution.
pub struct ActivitySource {
    id: u64,
    activity: BackgroundActivity,
}
impl ActivitySource {
    pub fn set(&self, active: bool) {
        self.activity.update(self.id, Some(active));
    }
}
impl Drop for ActivitySource {
    fn drop(&mut self) {
        self.activity.update(self.id, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_source() {
        let activity = BackgroundActivity::new();
        let source = activity.source("groupings");
        assert!(!activity.is_active());

        source.set(true);
        assert!(activity.is_active());
        assert_eq!(activity.active_sources(), ["groupings"]);

        source.set(false);
        assert!(!activity.is_active());
    }

    #[test]
    fn test_any_source_lights_the_signal() {
        let activity = BackgroundActivity::new();
        let a = activity.source("a");
        let b = activity.source("b");

        a.set(true);
        b.set(true);
        a.set(false);
        assert!(activity.is_active());
        b.set(false);
        assert!(!activity.is_active());
    }

    #[test]
    fn test_dropping_a_source_clears_it() {
        let activity = BackgroundActivity::new();
        let source = activity.source("worker");
        source.set(true);
        drop(source);
        assert!(!activity.is_active());
        assert!(activity.active_sources().is_empty());
    }

    #[test]
    fn test_concurrent_sources_settle_on_the_last_state() {
        let activity = BackgroundActivity::new();
        let a = activity.source("a");
        let b = activity.source("b");

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for i in 0..2000 {
                    a.set(i % 2 == 0);
                }
                a.set(false);
            });
            scope.spawn(|| {
                for i in 0..2000 {
                    b.set(i % 2 == 1);
                }
                b.set(true);
            });
        });

        assert!(activity.is_active());
        assert_eq!(activity.active_sources(), ["b"]);
        b.set(false);
        assert!(!activity.is_active());
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let activity = BackgroundActivity::new();
        let mut rx = activity.subscribe();
        let source = activity.source("worker");

        source.set(true);
        rx.changed().await.unwrap();
        assert!(*rx.borrow_and_update());

        source.set(false);
        rx.changed().await.unwrap();
        assert!(!*rx.borrow_and_update());
    }
}
