use std::{cell::RefCell, fmt, mem::take, ops::Deref, sync::Arc};

use derive_ex::derive_ex;

use crate::{subscription::Observers, Effects, Model, Subscription};

#[cfg(test)]
mod tests;

type Observer<A, S> = dyn Fn(&A, &S) + Send + Sync;

thread_local! {
    static HELD: RefCell<Vec<Vec<Box<dyn FnOnce()>>>> = const { RefCell::new(Vec::new()) };
}

/// Broadcasts held back by [`hold_broadcasts`].
#[must_use]
pub(crate) struct Broadcasts(Vec<Box<dyn FnOnce()>>);

impl Broadcasts {
    pub fn run(self) {
        for broadcast in self.0 {
            broadcast();
        }
    }
}

/// Runs `f`, holding back every decorator broadcast it triggers on this thread.
///
/// The store applies actions inside this so observers run after the state lock is released.
pub(crate) fn hold_broadcasts<T>(f: impl FnOnce() -> T) -> (T, Broadcasts) {
    struct Frame;
    impl Drop for Frame {
        fn drop(&mut self) {
            HELD.with_borrow_mut(|frames| frames.pop());
        }
    }
    HELD.with_borrow_mut(|frames| frames.push(Vec::new()));
    let frame = Frame;
    let value = f();
    let held = HELD.with_borrow_mut(|frames| frames.last_mut().map(take).unwrap_or_default());
    drop(frame);
    (value, Broadcasts(held))
}

/// Broadcasts "this action was just applied" to any number of observers.
///
/// Observers are called synchronously, with the action and the state it produced.
/// Only observers subscribed at broadcast time are called; nothing is replayed.
#[derive_ex(Clone, Default, bound())]
pub struct Publisher<A, S>(Observers<Observer<A, S>>);

impl<A: 'static, S: 'static> Publisher<A, S> {
    pub fn new() -> Self {
        Self(Observers::new())
    }

    pub fn subscribe(&self, f: impl Fn(&A, &S) + Send + Sync + 'static) -> Subscription {
        self.0.subscribe(Arc::new(f))
    }

    pub fn publish(&self, action: &A, state: &S) {
        for observer in self.0.snapshot() {
            observer(action, state);
        }
    }

    pub fn observer_count(&self) -> usize {
        self.0.len()
    }

    /// Publishes now, or with a copy of `state` once the enclosing [`hold_broadcasts`] ends.
    fn publish_after_update(&self, action: A, state: &S)
    where
        S: Clone,
    {
        if self.0.len() == 0 {
            return;
        }
        let action = HELD.with_borrow_mut(|frames| match frames.last_mut() {
            Some(frame) => {
                let this = self.clone();
                let state = state.clone();
                frame.push(Box::new(move || this.publish(&action, &state)));
                None
            }
            None => Some(action),
        });
        if let Some(action) = action {
            self.publish(&action, state);
        }
    }
}

/// Wraps a state and broadcasts every action after `update` has applied it.
///
/// Reads are forwarded to the inner state through `Deref`.
///
/// Outside a store the broadcast happens before `update` returns. Inside a store it happens
/// once the store has released its state lock, before the next action is applied, with a copy
/// of the state as it was right after this action. Observers may read the store and send to it.
pub struct DidUpdate<S: Model> {
    inner: S,
    publisher: Publisher<S::Action, S>,
}

impl<S: Model + 'static> DidUpdate<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            publisher: Publisher::new(),
        }
    }

    pub fn subscribe(&self, f: impl Fn(&S::Action, &S) + Send + Sync + 'static) -> Subscription {
        self.publisher.subscribe(f)
    }

    /// A handle for subscribing from outside the store.
    pub fn publisher(&self) -> Publisher<S::Action, S> {
        self.publisher.clone()
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S> Model for DidUpdate<S>
where
    S: Model + Clone + 'static,
    S::Action: Clone,
{
    type Action = S::Action;
    type Environment = S::Environment;

    fn update(&mut self, action: Self::Action, env: &Self::Environment) -> Effects<Self::Action> {
        let effects = self.inner.update(action.clone(), env);
        self.publisher.publish_after_update(action, &self.inner);
        effects
    }
}

impl<S: Model> Deref for DidUpdate<S> {
    type Target = S;
    fn deref(&self) -> &S {
        &self.inner
    }
}
impl<S: Model + fmt::Debug> fmt::Debug for DidUpdate<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DidUpdate").field(&self.inner).finish()
    }
}

/// Wraps a state and broadcasts an action only when applying it changed the state.
///
/// The state is compared with a snapshot taken before `update`. Broadcasts are timed as for
/// [`DidUpdate`].
pub struct DidChange<S: Model> {
    inner: S,
    publisher: Publisher<S::Action, S>,
}

impl<S: Model + 'static> DidChange<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            publisher: Publisher::new(),
        }
    }

    pub fn subscribe(&self, f: impl Fn(&S::Action, &S) + Send + Sync + 'static) -> Subscription {
        self.publisher.subscribe(f)
    }

    pub fn publisher(&self) -> Publisher<S::Action, S> {
        self.publisher.clone()
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S> Model for DidChange<S>
where
    S: Model + Clone + PartialEq + 'static,
    S::Action: Clone,
{
    type Action = S::Action;
    type Environment = S::Environment;

    fn update(&mut self, action: Self::Action, env: &Self::Environment) -> Effects<Self::Action> {
        let old = self.inner.clone();
        let effects = self.inner.update(action.clone(), env);
        if self.inner != old {
            self.publisher.publish_after_update(action, &self.inner);
        }
        effects
    }
}

impl<S: Model> Deref for DidChange<S> {
    type Target = S;
    fn deref(&self) -> &S {
        &self.inner
    }
}
impl<S: Model + fmt::Debug> fmt::Debug for DidChange<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DidChange").field(&self.inner).finish()
    }
}
