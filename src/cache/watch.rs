//! Live watch plumbing
//!
//! `watch_composed` turns a composition (a keyed read that joins records
//! into an entity view) into a stream: one emission for the current state,
//! then one for every committed write that touches the composition's
//! identities and actually changes the composed value. Value-equal
//! recompositions are swallowed.
//!
//! `switch_to_latest` flattens a stream of streams by always following the
//! newest inner stream, dropping the previous one mid-flight. Repositories
//! use it to retarget a live query whenever the tracked cache key is
//! replaced.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::data::{Database, RecordChange};
use crate::error::Result;

/// A keyed join-on-read over the record store.
///
/// `compose` returning `Ok(None)` means the referenced records are not
/// present yet; watchers skip the emission and keep listening.
#[async_trait]
pub(crate) trait Composition: Send + Sync + 'static {
    type Output: Clone + PartialEq + Send + 'static;

    fn is_affected(&self, change: &RecordChange) -> bool;

    async fn compose(&self, db: &Database) -> Result<Option<Self::Output>>;
}

struct WatchState<C: Composition> {
    db: Arc<Database>,
    composition: C,
    changes: broadcast::Receiver<Arc<RecordChange>>,
    last: Option<C::Output>,
    primed: bool,
}

/// Stream of composed values for one composition. Emits the current value
/// first (once the records exist), then every distinct recomposition.
/// Storage errors during recomposition are logged and retried on the next
/// notification rather than surfaced to the consumer.
pub(crate) fn watch_composed<C>(
    db: Arc<Database>,
    composition: C,
) -> BoxStream<'static, C::Output>
where
    C: Composition,
{
    // Subscribe before the initial read so no write between the two is
    // missed.
    let changes = db.subscribe();
    let state = WatchState {
        db,
        composition,
        changes,
        last: None,
        primed: false,
    };

    Box::pin(stream::unfold(state, |mut st| async move {
        loop {
            if !st.primed {
                st.primed = true;
            } else {
                match st.changes.recv().await {
                    Ok(change) if st.composition.is_affected(&change) => {}
                    Ok(_) => continue,
                    // Missed notifications: recompose unconditionally.
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "Watcher lagged, recomposing");
                    }
                    Err(RecvError::Closed) => return None,
                }
            }

            match st.composition.compose(&st.db).await {
                Ok(Some(value)) => {
                    if st.last.as_ref() == Some(&value) {
                        continue;
                    }
                    st.last = Some(value.clone());
                    return Some((value, st));
                }
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(error = %e, "Recomposition failed, will retry");
                    continue;
                }
            }
        }
    }))
}

/// Flatten a stream of streams, always following the newest inner stream.
///
/// When the outer stream yields a new inner stream the previous one is
/// dropped, cancelling whatever it was waiting on. The output ends when
/// the outer stream has ended and the last inner stream ends.
pub fn switch_to_latest<T, S>(outer: S) -> BoxStream<'static, T>
where
    S: Stream<Item = BoxStream<'static, T>> + Send + 'static,
    T: Send + 'static,
{
    enum Step<T> {
        Retarget(Option<BoxStream<'static, T>>),
        Item(Option<T>),
    }

    let outer: Option<BoxStream<'static, BoxStream<'static, T>>> = Some(outer.boxed());
    let inner: Option<BoxStream<'static, T>> = None;

    Box::pin(stream::unfold(
        (outer, inner),
        |(mut outer, mut inner)| async move {
            loop {
                if outer.is_none() && inner.is_none() {
                    return None;
                }

                // New targets win over items from the current target.
                let step = tokio::select! {
                    biased;
                    next = next_or_pending(outer.as_mut()) => Step::Retarget(next),
                    item = next_or_pending(inner.as_mut()) => Step::Item(item),
                };

                match step {
                    Step::Retarget(Some(stream)) => inner = Some(stream),
                    Step::Retarget(None) => outer = None,
                    Step::Item(Some(item)) => return Some((item, (outer, inner))),
                    Step::Item(None) => inner = None,
                }
            }
        },
    ))
}

async fn next_or_pending<S>(stream: Option<&mut S>) -> Option<S::Item>
where
    S: Stream + Unpin + ?Sized,
{
    match stream {
        Some(s) => s.next().await,
        None => std::future::pending().await,
    }
}
