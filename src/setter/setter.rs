use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::store::{SetterLink, StoreInner};

/// The input of a write: either a plain value or an updater invoked with the
/// current value.
pub enum Mutation<S> {
    /// Replace the value outright.
    Value(S),
    /// Compute the new value from the current one.
    Update(Box<dyn FnOnce(&S) -> S + Send>),
}

/// Write handle for a store.
///
/// Every commit runs the store's setter chain in order (to-links first,
/// terminal link last) while the store's from-propagation is suppressed, so
/// an update pushed to a parent cannot loop back into the store that
/// originated it.
///
/// Notification policy: the listener list is snapshotted before iteration.
/// Listeners added during a notification pass are not invoked within that
/// pass; listeners removed during a pass may still receive the in-flight
/// notification.
pub struct Setter<S> {
    pub(crate) inner: Arc<StoreInner<S>>,
}

impl<S> Clone for Setter<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Clone + Send + Sync + 'static> Setter<S> {
    /// Replace the store's value and notify listeners.
    pub fn set(&self, value: S) {
        self.apply(Mutation::Value(value));
    }

    /// Compute the new value from the current one, then commit it.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&S) -> S + Send + 'static,
    {
        self.apply(Mutation::Update(Box::new(f)));
    }

    /// Commit a [`Mutation`], dispatching on its form explicitly.
    pub fn apply(&self, mutation: Mutation<S>) {
        let value = match mutation {
            Mutation::Value(value) => value,
            Mutation::Update(f) => {
                let current = self.inner.current();
                f(&current)
            }
        };
        self.commit(value);
    }

    /// Await a producer of the next value, then commit it.
    ///
    /// No guard is held across the await: a synchronous `set` issued while
    /// the producer is pending is not sequenced against this write, and the
    /// later-completing commit wins. Callers needing bounded waits implement
    /// them inside the producer.
    pub async fn set_async<F, Fut>(&self, producer: F)
    where
        F: FnOnce(S) -> Fut,
        Fut: Future<Output = S>,
    {
        let value = producer(self.inner.current()).await;
        self.commit(value);
    }

    /// Fallible variant of [`set_async`](Self::set_async).
    ///
    /// If the producer fails, the value is left untouched, no listeners
    /// fire, and the error is returned to the caller.
    pub async fn try_set_async<F, Fut, E>(&self, producer: F) -> Result<(), E>
    where
        F: FnOnce(S) -> Fut,
        Fut: Future<Output = Result<S, E>>,
    {
        let value = producer(self.inner.current()).await?;
        self.commit(value);
        Ok(())
    }

    /// Whether two setters write into the same store.
    pub fn ptr_eq(&self, other: &Setter<S>) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Run the setter chain with the resolved value.
    ///
    /// From-propagation back into this store is suppressed for the whole
    /// chain run, including the notifications the links trigger.
    fn commit(&self, value: S) {
        let _guard = SkipGuard::hold(self.inner.skip_map_from());
        let chain: Vec<SetterLink<S>> = self
            .inner
            .setter_chain()
            .lock()
            .unwrap()
            .iter()
            .map(Arc::clone)
            .collect();
        for link in &chain {
            link(&value);
        }
    }
}

/// Suppresses from-propagation for the guard's lifetime.
///
/// Release happens in `Drop`, so the flag is cleared on every exit path,
/// panics included.
struct SkipGuard<'a>(&'a AtomicBool);

impl<'a> SkipGuard<'a> {
    fn hold(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for SkipGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
