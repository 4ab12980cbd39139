use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

use crate::detector::Detector;
use crate::error::InheritError;
use crate::setter::Setter;

pub(crate) type Listener<S> = Arc<dyn Fn(&S, &Setter<S>) + Send + Sync>;
pub(crate) type SetterLink<S> = Arc<dyn Fn(&S) + Send + Sync>;

/// Wraps a listener at subscribe time; used for store-default detectors.
type WrapFn<S> = Arc<dyn Fn(Listener<S>, &S) -> Listener<S> + Send + Sync>;

fn next_store_id() -> usize {
    static NEXT_ID: AtomicUsize = AtomicUsize::new(0);
    NEXT_ID.fetch_add(1, Ordering::SeqCst)
}

/// Shared state behind every [`Store`] and [`Setter`] handle.
pub(crate) struct StoreInner<S> {
    id: usize,
    value: RwLock<S>,
    /// Insertion order is notification order; the id is used for removal.
    listeners: Mutex<Vec<(usize, Listener<S>)>>,
    /// Mutation handlers, run front to back. The terminal link (registered
    /// at construction) sits last; `to` links are prepended in front of it.
    setters: Mutex<Vec<SetterLink<S>>>,
    from_ids: Mutex<Vec<usize>>,
    to_ids: Mutex<Vec<usize>>,
    /// Suppresses from-propagation while a commit originating here runs.
    skip_map_from: AtomicBool,
    default_detector: Option<WrapFn<S>>,
    next_listener_id: AtomicUsize,
}

impl<S: Clone + Send + Sync + 'static> StoreInner<S> {
    pub(crate) fn current(&self) -> S {
        self.value.read().unwrap().clone()
    }

    pub(crate) fn skip_map_from(&self) -> &AtomicBool {
        &self.skip_map_from
    }

    pub(crate) fn setter_chain(&self) -> &Mutex<Vec<SetterLink<S>>> {
        &self.setters
    }

    /// Commit through the terminal link only: write the value and notify
    /// listeners. To-links do not run; this is the path from-propagation
    /// takes so a derived update cannot ping-pong back up.
    pub(crate) fn commit_terminal(inner: &Arc<Self>, value: S) {
        {
            let mut current = inner.value.write().unwrap();
            *current = value;
        }
        Self::notify(inner);
    }

    /// Notify a snapshot of the listener list.
    ///
    /// Only the listener list is snapshotted; the value is read fresh per
    /// listener, so after a re-entrant write from an earlier listener the
    /// remaining listeners see the new value, never a stale one. No lock is
    /// held while listeners run, so a listener may subscribe, unsubscribe,
    /// or write back into the store.
    fn notify(inner: &Arc<Self>) {
        let snapshot: Vec<Listener<S>> = inner
            .listeners
            .lock()
            .unwrap()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        let setter = Setter {
            inner: Arc::clone(inner),
        };
        log::trace!(
            "store {}: notifying {} listener(s)",
            inner.id,
            snapshot.len()
        );
        for listener in &snapshot {
            let state = inner.current();
            listener(&state, &setter);
        }
    }
}

/// A reactive value container.
///
/// A store owns a value and notifies subscribed listeners whenever the value
/// is committed through its [`Setter`]. Stores compose: [`Store::from`]
/// derives this store's state from a parent whenever the parent changes, and
/// [`Store::to`] pushes mapped local writes up into a parent, with
/// reentrancy suppression keeping the two directions from looping.
///
/// Handles are cheap to clone and share one underlying cell.
///
/// # Examples
///
/// ```
/// use tributary::Store;
///
/// let store = Store::new(1);
/// let (value, setter) = store.handler();
/// assert_eq!(value, 1);
///
/// setter.set(2);
/// assert_eq!(store.get(), 2);
/// ```
pub struct Store<S> {
    inner: Arc<StoreInner<S>>,
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("id", &self.inner.id)
            .finish_non_exhaustive()
    }
}

impl<S: Clone + Send + Sync + 'static> Store<S> {
    /// Create a store holding `initial`.
    pub fn new(initial: S) -> Self {
        Self::build(initial, None)
    }

    /// Create a store with a default detector applied by [`subscribe`].
    ///
    /// Every listener registered through `subscribe` is gated behind a
    /// detector built from `deps`, seeded from the store's value at
    /// subscribe time. [`detect`](Self::detect) subscriptions use their own
    /// detector instead.
    pub fn with_detector<K, D>(initial: S, deps: D) -> Self
    where
        K: PartialEq + Send + Sync + 'static,
        D: Fn(&S) -> Vec<K> + Send + Sync + 'static,
    {
        let deps: Arc<dyn Fn(&S) -> Vec<K> + Send + Sync> = Arc::new(deps);
        let wrap: WrapFn<S> = Arc::new(move |listener, state| {
            Detector::from_parts(listener, Arc::clone(&deps), Some(state)).into_listener()
        });
        Self::build(initial, Some(wrap))
    }

    fn build(initial: S, default_detector: Option<WrapFn<S>>) -> Self {
        let inner = Arc::new(StoreInner {
            id: next_store_id(),
            value: RwLock::new(initial),
            listeners: Mutex::new(Vec::new()),
            setters: Mutex::new(Vec::new()),
            from_ids: Mutex::new(Vec::new()),
            to_ids: Mutex::new(Vec::new()),
            skip_map_from: AtomicBool::new(false),
            default_detector,
            next_listener_id: AtomicUsize::new(0),
        });

        // Terminal link: commits the value and notifies listeners. Held
        // weakly to avoid a cycle through the chain it lives in.
        let weak = Arc::downgrade(&inner);
        let terminal: SetterLink<S> = Arc::new(move |value: &S| {
            if let Some(inner) = weak.upgrade() {
                StoreInner::commit_terminal(&inner, value.clone());
            }
        });
        inner.setters.lock().unwrap().push(terminal);

        log::debug!("store {} created", inner.id);
        Self { inner }
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> S {
        self.inner.current()
    }

    /// Read the current value without cloning.
    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        let value = self.inner.value.read().unwrap();
        f(&value)
    }

    /// The `(current_value, setter)` pair.
    pub fn handler(&self) -> (S, Setter<S>) {
        (self.get(), self.setter())
    }

    /// A write handle for this store.
    pub fn setter(&self) -> Setter<S> {
        Setter {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Process-unique id of this store.
    pub fn id(&self) -> usize {
        self.inner.id
    }

    /// Whether two handles refer to the same store.
    pub fn ptr_eq(&self, other: &Store<S>) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Subscribe a listener to value changes.
    ///
    /// The listener receives the current `(value, setter)` pair on every
    /// commit, in subscription order relative to other listeners. The same
    /// closure subscribed twice fires twice. If the store was built with
    /// [`with_detector`](Self::with_detector), the listener is gated behind
    /// that detector.
    ///
    /// The returned [`Subscription`] removes exactly this entry; dropping it
    /// without calling [`Subscription::unsubscribe`] leaves the listener
    /// subscribed.
    pub fn subscribe<L>(&self, listener: L) -> Subscription<S>
    where
        L: Fn(&S, &Setter<S>) + Send + Sync + 'static,
    {
        let listener: Listener<S> = Arc::new(listener);
        let listener = match &self.inner.default_detector {
            Some(wrap) => {
                let state = self.inner.current();
                wrap(listener, &state)
            }
            None => listener,
        };
        self.push_listener(listener)
    }

    fn push_listener(&self, listener: Listener<S>) -> Subscription<S> {
        let listener_id = self.inner.next_listener_id.fetch_add(1, Ordering::SeqCst);
        self.inner
            .listeners
            .lock()
            .unwrap()
            .push((listener_id, listener));
        Subscription {
            inner: Arc::downgrade(&self.inner),
            listener_id,
        }
    }

    /// Gate subscriptions behind a dependency-key detector.
    ///
    /// Independent of any default detector; the memo is seeded from the
    /// store's value at subscribe time, so a commit whose keys equal the
    /// current state's keys does not fire.
    pub fn detect<F>(&self, deps: F) -> Detect<S, F> {
        Detect {
            store: self.clone(),
            deps,
        }
    }

    /// Begin deriving this store's state from `parent`.
    ///
    /// Completed by [`FromBinding::map`]. Fails with
    /// [`InheritError::DuplicateFrom`] if a from-link to the same parent
    /// already exists; on rejection nothing is mutated.
    pub fn from<P>(&self, parent: &Store<P>) -> Result<FromBinding<S, P>, InheritError<P>>
    where
        P: Clone + Send + Sync + 'static,
    {
        let mut from_ids = self.inner.from_ids.lock().unwrap();
        if from_ids.contains(&parent.id()) {
            log::debug!(
                "store {}: rejected duplicate .from() link to store {}",
                self.inner.id,
                parent.id()
            );
            return Err(InheritError::DuplicateFrom {
                parent: parent.clone(),
            });
        }
        from_ids.push(parent.id());
        Ok(FromBinding {
            child: self.clone(),
            parent: parent.clone(),
        })
    }

    /// Begin propagating this store's writes to `parent`.
    ///
    /// Completed by [`ToBinding::map`]. Fails with
    /// [`InheritError::DuplicateTo`] on a repeated link to the same parent;
    /// on rejection nothing is mutated.
    pub fn to<P>(&self, parent: &Store<P>) -> Result<ToBinding<S, P>, InheritError<P>>
    where
        P: Clone + Send + Sync + 'static,
    {
        let mut to_ids = self.inner.to_ids.lock().unwrap();
        if to_ids.contains(&parent.id()) {
            log::debug!(
                "store {}: rejected duplicate .to() link to store {}",
                self.inner.id,
                parent.id()
            );
            return Err(InheritError::DuplicateTo {
                parent: parent.clone(),
            });
        }
        to_ids.push(parent.id());
        Ok(ToBinding {
            child: self.clone(),
            parent: parent.clone(),
        })
    }
}

/// Pending `from` link; [`map`](FromBinding::map) completes it.
pub struct FromBinding<S, P> {
    child: Store<S>,
    parent: Store<P>,
}

impl<S, P> fmt::Debug for FromBinding<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FromBinding")
            .field("child", &self.child)
            .field("parent", &self.parent)
            .finish()
    }
}

impl<S, P> FromBinding<S, P>
where
    S: Clone + Send + Sync + 'static,
    P: Clone + Send + Sync + 'static,
{
    /// Complete the link with a derivation function.
    ///
    /// Whenever the parent changes, `map(parent_value, child_value)` is
    /// committed into the child through its terminal link (to-links do not
    /// re-fire), unless the child's own commit is what changed the parent.
    /// The child's value is recomputed once immediately, by direct
    /// assignment, without notifying listeners.
    ///
    /// Returns the child handle, so links can be chained.
    pub fn map<F>(self, map: F) -> Store<S>
    where
        F: Fn(&P, &S) -> S + Send + Sync + 'static,
    {
        let Self { child, parent } = self;
        let map = Arc::new(map);

        let weak = Arc::downgrade(&child.inner);
        let _subscription = parent.subscribe({
            let map = Arc::clone(&map);
            move |parent_state: &P, _: &Setter<P>| {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                if inner.skip_map_from.load(Ordering::SeqCst) {
                    return;
                }
                let next = {
                    let current = inner.value.read().unwrap();
                    map(parent_state, &current)
                };
                StoreInner::commit_terminal(&inner, next);
            }
        });

        // Immediate recompute at link time, no notification.
        let next = {
            let parent_state = parent.get();
            let current = child.inner.value.read().unwrap();
            map(&parent_state, &current)
        };
        *child.inner.value.write().unwrap() = next;

        log::debug!(
            "store {} now derives from store {}",
            child.inner.id,
            parent.id()
        );
        child
    }
}

/// Pending `to` link; [`map`](ToBinding::map) completes it.
pub struct ToBinding<S, P> {
    child: Store<S>,
    parent: Store<P>,
}

impl<S, P> fmt::Debug for ToBinding<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToBinding")
            .field("child", &self.child)
            .field("parent", &self.parent)
            .finish()
    }
}

impl<S, P> ToBinding<S, P>
where
    S: Clone + Send + Sync + 'static,
    P: Clone + Send + Sync + 'static,
{
    /// Complete the link with a propagation function.
    ///
    /// A setter link is prepended to the child's chain: on every child
    /// commit it computes `map(child_value, parent_value)` and writes it
    /// through the parent's full setter, before the child's terminal link
    /// runs. Subscribers of the child therefore observe the parent already
    /// updated.
    ///
    /// Returns the child handle, so links can be chained.
    pub fn map<F>(self, map: F) -> Store<S>
    where
        F: Fn(&S, &P) -> P + Send + Sync + 'static,
    {
        let Self { child, parent } = self;

        let link: SetterLink<S> = Arc::new({
            let parent = parent.clone();
            move |value: &S| {
                let (parent_state, parent_setter) = parent.handler();
                parent_setter.set(map(value, &parent_state));
            }
        });
        child.inner.setters.lock().unwrap().insert(0, link);

        log::debug!(
            "store {} now propagates to store {}",
            child.inner.id,
            parent.id()
        );
        child
    }
}

/// Binder returned by [`Store::detect`].
pub struct Detect<S, F> {
    store: Store<S>,
    deps: F,
}

impl<S, F> Detect<S, F>
where
    S: Clone + Send + Sync + 'static,
{
    /// Subscribe a listener gated behind this binder's detector.
    pub fn subscribe<K, L>(self, listener: L) -> Subscription<S>
    where
        K: PartialEq + Send + Sync + 'static,
        F: Fn(&S) -> Vec<K> + Send + Sync + 'static,
        L: Fn(&S, &Setter<S>) + Send + Sync + 'static,
    {
        let seed = self.store.get();
        let detector = Detector::from_parts(Arc::new(listener), Arc::new(self.deps), Some(&seed));
        self.store.push_listener(detector.into_listener())
    }
}

/// Handle for removing a subscribed listener.
///
/// Holds the store weakly: keeping a subscription alive does not keep the
/// store alive, and dropping it does not unsubscribe.
pub struct Subscription<S> {
    inner: Weak<StoreInner<S>>,
    listener_id: usize,
}

impl<S> Subscription<S> {
    /// Remove the listener this subscription registered.
    ///
    /// Idempotent: calling it again (or after the store is gone) is a no-op.
    pub fn unsubscribe(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner
                .listeners
                .lock()
                .unwrap()
                .retain(|(id, _)| *id != self.listener_id);
        }
    }
}
