//! Cache key tracking
//!
//! A `CacheKeyTracker` holds the single latest cache key per consumer
//! surface. Storing a key replaces the previous one wholesale; equal keys
//! are swallowed so downstream watchers never see duplicate emissions.
//! `watch()` replays the latest stored key to each new subscriber, then
//! pushes every subsequent distinct key. Subscribers that fall behind see
//! only the newest key, never an intermediate backlog.

use futures::stream::BoxStream;
use tokio::sync::watch;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::WatchStream;

pub struct CacheKeyTracker<K> {
    sender: watch::Sender<Option<K>>,
}

impl<K> CacheKeyTracker<K>
where
    K: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender }
    }

    /// Replace the tracked key. A key equal to the current one is a no-op
    /// and produces no emission.
    pub fn store(&self, key: K) {
        self.sender.send_if_modified(|current| {
            if current.as_ref() == Some(&key) {
                return false;
            }
            *current = Some(key);
            true
        });
    }

    /// The latest stored key, if any.
    pub fn current(&self) -> Option<K> {
        self.sender.borrow().clone()
    }

    /// Stream of keys: the current key first (when one exists), then
    /// every distinct replacement. Never terminates while the tracker
    /// lives.
    pub fn watch(&self) -> BoxStream<'static, K> {
        let stream = WatchStream::new(self.sender.subscribe());
        Box::pin(stream.filter_map(|key| key))
    }
}

impl<K> Default for CacheKeyTracker<K>
where
    K: Clone + PartialEq + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
