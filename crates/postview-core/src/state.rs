// ── Observable value cell ──
//
// `State<T>` is the smallest reactive primitive in the workspace: a value,
// the value it replaced, and an ordered list of synchronous subscribers.
// Controllers build several of these and wire them together; renderers
// subscribe to the ones they display.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

type Listener<T> = Arc<dyn Fn(&T, &T) + Send + Sync>;

/// An observable value cell with `get` / `set` / `subscribe`.
///
/// Cheaply cloneable; clones share the same value and subscriber list.
///
/// Every `set` notifies, even when the new value equals the old one, and
/// subscribers run synchronously in registration order with
/// `(new, previous)`. There is no reentrancy guard: a subscriber that calls
/// `set` on the same state triggers a nested round of notifications before
/// the outer round finishes.
pub struct State<T> {
    inner: Arc<StateInner<T>>,
}

struct StateInner<T> {
    values: Mutex<Values<T>>,
    listeners: Mutex<Vec<(u64, Listener<T>)>>,
    next_id: AtomicU64,
}

struct Values<T> {
    current: T,
    previous: T,
}

impl<T> Clone for State<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> State<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(StateInner {
                values: Mutex::new(Values {
                    previous: initial.clone(),
                    current: initial,
                }),
                listeners: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Current value.
    pub fn get(&self) -> T {
        self.inner.values.lock().current.clone()
    }

    /// Value before the most recent `set` (the initial value until then).
    pub fn previous(&self) -> T {
        self.inner.values.lock().previous.clone()
    }

    /// Borrow the current value without cloning it.
    ///
    /// `f` runs under the value lock: it must not call back into this state.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.values.lock().current)
    }

    /// Replace the value and notify every subscriber.
    pub fn set(&self, value: T) {
        self.replace_with(|_| value);
    }

    /// Compute the new value from the current one, then notify.
    ///
    /// Read and write happen under one lock, so concurrent updates never
    /// lose each other's writes. `f` must not call back into this state.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        self.replace_with(f);
    }

    /// Register `listener`; the returned handle removes exactly this
    /// registration. Registering the same closure twice yields two
    /// independent subscriptions.
    pub fn subscribe(&self, listener: impl Fn(&T, &T) + Send + Sync + 'static) -> Unsubscribe {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.lock().push((id, Arc::new(listener)));

        let weak: Weak<StateInner<T>> = Arc::downgrade(&self.inner);
        Unsubscribe::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.lock().retain(|(lid, _)| *lid != id);
            }
        })
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }

    fn replace_with(&self, f: impl FnOnce(&T) -> T) {
        let (current, previous) = {
            let mut values = self.inner.values.lock();
            let next = f(&values.current);
            values.previous = std::mem::replace(&mut values.current, next);
            (values.current.clone(), values.previous.clone())
        };
        self.notify(&current, &previous);
    }

    fn notify(&self, current: &T, previous: &T) {
        // Snapshot so listeners may (un)subscribe or `set` without deadlocking.
        let listeners: Vec<Listener<T>> = self
            .inner
            .listeners
            .lock()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();

        for listener in listeners {
            listener(current, previous);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for State<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = self.inner.values.lock();
        f.debug_struct("State")
            .field("current", &values.current)
            .field("previous", &values.previous)
            .field("subscribers", &self.inner.listeners.lock().len())
            .finish()
    }
}

/// Disposer returned by [`State::subscribe`].
///
/// Dropping it does nothing: subscriptions stay registered until
/// [`unsubscribe`](Self::unsubscribe) is called.
pub struct Unsubscribe {
    dispose: Box<dyn FnOnce() + Send + Sync>,
}

impl Unsubscribe {
    fn new(dispose: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            dispose: Box::new(dispose),
        }
    }

    pub fn unsubscribe(self) {
        (self.dispose)();
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe").finish_non_exhaustive()
    }
}
