use std::sync::{Arc, Mutex};

use crate::setter::Setter;
use crate::store::Listener;

/// A memoized gate in front of a listener.
///
/// On each call the detector derives a key vector from the state and compares
/// it element-wise against the keys from the previous call. The listener is
/// invoked only when the lengths differ or some element compares unequal;
/// otherwise the memo is left untouched and the listener stays silent.
///
/// Keys are compared with `PartialEq`, per element. The memo lock is released
/// before the listener runs, so a listener may write back into the store.
pub struct Detector<S, K> {
    listener: Listener<S>,
    deps: Arc<dyn Fn(&S) -> Vec<K> + Send + Sync>,
    previous: Mutex<Vec<K>>,
}

impl<S, K> Detector<S, K>
where
    S: Clone + Send + Sync + 'static,
    K: PartialEq + Send + Sync + 'static,
{
    /// Create a detector with an empty memo.
    ///
    /// The first invocation with a non-empty key vector counts as changed.
    pub fn new<L, D>(listener: L, deps: D) -> Self
    where
        L: Fn(&S, &Setter<S>) + Send + Sync + 'static,
        D: Fn(&S) -> Vec<K> + Send + Sync + 'static,
    {
        Self::from_parts(Arc::new(listener), Arc::new(deps), None)
    }

    /// Create a detector whose memo is seeded from `seed`.
    ///
    /// A first invocation carrying keys equal to the seeded ones is treated
    /// as unchanged and does not fire.
    pub fn seeded<L, D>(listener: L, deps: D, seed: &S) -> Self
    where
        L: Fn(&S, &Setter<S>) + Send + Sync + 'static,
        D: Fn(&S) -> Vec<K> + Send + Sync + 'static,
    {
        Self::from_parts(Arc::new(listener), Arc::new(deps), Some(seed))
    }

    pub(crate) fn from_parts(
        listener: Listener<S>,
        deps: Arc<dyn Fn(&S) -> Vec<K> + Send + Sync>,
        seed: Option<&S>,
    ) -> Self {
        let previous = seed.map(|state| deps(state)).unwrap_or_default();
        Self {
            listener,
            deps,
            previous: Mutex::new(previous),
        }
    }

    /// Run the gate: fire the wrapped listener if the keys changed.
    pub fn call(&self, state: &S, setter: &Setter<S>) {
        let current = (self.deps)(state);
        let changed = {
            let mut previous = self.previous.lock().unwrap();
            if previous.len() != current.len()
                || previous.iter().zip(current.iter()).any(|(a, b)| a != b)
            {
                *previous = current;
                true
            } else {
                false
            }
        };
        if changed {
            (self.listener)(state, setter);
        }
    }

    /// Consume the detector, producing a listener suitable for subscription.
    pub(crate) fn into_listener(self) -> Listener<S> {
        Arc::new(move |state: &S, setter: &Setter<S>| self.call(state, setter))
    }
}
