use std::{fmt, ops::Deref, sync::Arc};

use crate::{subscription::Observers, Subscription};


/// A state field that notifies subscribers when it is assigned.
///
/// Assignment takes `&mut self`, so inside a store it can only happen in `update`.
/// Subscribers are called synchronously with the new value.
///
/// Clones start with no subscribers.
pub struct Observed<T> {
    value: T,
    observers: Observers<dyn Fn(&T) + Send + Sync>,
}

impl<T: 'static> Observed<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            observers: Observers::new(),
        }
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.value.clone()
    }

    /// Sets the value and notifies the subscribers.
    pub fn set(&mut self, value: T) {
        self.value = value;
        self.notify();
    }

    /// Sets the value and notifies the subscribers only if it differs from the current one.
    ///
    /// Returns `true` if the value changed.
    pub fn set_dedup(&mut self, value: T) -> bool
    where
        T: PartialEq,
    {
        if self.value == value {
            return false;
        }
        self.set(value);
        true
    }

    /// Mutates the value in place and notifies the subscribers.
    pub fn modify(&mut self, f: impl FnOnce(&mut T)) {
        f(&mut self.value);
        self.notify();
    }

    pub fn subscribe(&self, f: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        self.observers.subscribe(Arc::new(f))
    }

    fn notify(&self) {
        for observer in self.observers.snapshot() {
            observer(&self.value);
        }
    }
}

impl<T> Deref for Observed<T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.value
    }
}
impl<T: Clone + 'static> Clone for Observed<T> {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}
impl<T: Default + 'static> Default for Observed<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
impl<T: PartialEq> PartialEq for Observed<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}
impl<T: Eq> Eq for Observed<T> {}
impl<T: fmt::Debug> fmt::Debug for Observed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.value, f)
    }
}
impl<T: 'static> From<T> for Observed<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}
