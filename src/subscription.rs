use std::{
    mem::take,
    sync::{Arc, Weak},
};

use derive_ex::derive_ex;
use parking_lot::Mutex;
use slabmap::SlabMap;


/// Handle returned by `subscribe` functions.
///
/// Dropping it unsubscribes.
#[derive(Default)]
#[must_use]
pub struct Subscription(RawSubscription);

impl Subscription {
    pub fn empty() -> Self {
        Subscription(RawSubscription::Empty)
    }
    pub fn from_fn(f: impl FnOnce() + Send + 'static) -> Self {
        Subscription(RawSubscription::Fn(Box::new(f)))
    }

    /// Keeps the subscription alive for as long as its source lives.
    pub fn detach(mut self) {
        self.0 = RawSubscription::Empty;
    }
}
impl Drop for Subscription {
    fn drop(&mut self) {
        match take(&mut self.0) {
            RawSubscription::Empty => {}
            RawSubscription::Fn(f) => f(),
        }
    }
}
impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            RawSubscription::Empty => write!(f, "Subscription(<empty>)"),
            RawSubscription::Fn(_) => write!(f, "Subscription"),
        }
    }
}

#[derive(Default)]
enum RawSubscription {
    #[default]
    Empty,
    Fn(Box<dyn FnOnce() + Send + 'static>),
}

/// Registry of callbacks shared between a source and its subscriptions.
#[derive_ex(Clone, Default, bound())]
pub(crate) struct Observers<F: ?Sized>(Arc<Mutex<SlabMap<Arc<F>>>>);

impl<F: ?Sized + Send + Sync + 'static> Observers<F> {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(SlabMap::new())))
    }

    pub fn subscribe(&self, f: Arc<F>) -> Subscription {
        let key = self.0.lock().insert(f);
        let observers: Weak<Mutex<SlabMap<Arc<F>>>> = Arc::downgrade(&self.0);
        Subscription::from_fn(move || {
            if let Some(observers) = observers.upgrade() {
                observers.lock().remove(key);
            }
        })
    }

    /// The observers subscribed right now.
    ///
    /// Callbacks are invoked from the snapshot so they may subscribe or unsubscribe freely.
    pub fn snapshot(&self) -> Vec<Arc<F>> {
        self.0.lock().iter().map(|(_, f)| f.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }
}
