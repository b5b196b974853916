use std::{fmt, future::Future, sync::Arc, time::Duration};

use futures::{
    future::{ready, BoxFuture},
    FutureExt,
};

use crate::{utils::timer::sleep, Embed};


/// A deferred asynchronous computation that eventually yields exactly one action.
///
/// Nothing runs until the effect is turned into a future with [`into_future`](Self::into_future),
/// which the [`EffectRunner`](crate::EffectRunner) does once it schedules the effect.
#[must_use]
pub struct Effect<A>(Box<dyn FnOnce() -> BoxFuture<'static, A> + Send>);

impl<A: Send + 'static> Effect<A> {
    /// Create an effect from a function that builds the future when the effect starts.
    pub fn new<Fut>(f: impl FnOnce() -> Fut + Send + 'static) -> Self
    where
        Fut: Future<Output = A> + Send + 'static,
    {
        Self(Box::new(move || f().boxed()))
    }

    /// Create an effect from a future.
    ///
    /// Futures are inert until polled, so this is still deferred.
    pub fn future(fut: impl Future<Output = A> + Send + 'static) -> Self {
        Self::new(move || fut)
    }

    /// Create an effect that yields `action` as soon as it is scheduled.
    pub fn ready(action: A) -> Self {
        Self::new(move || ready(action))
    }

    /// Create an effect that yields `action` after `duration`.
    pub fn delayed(duration: Duration, action: A) -> Self {
        Self::new(move || async move {
            sleep(duration).await;
            action
        })
    }

    /// Maps the action this effect yields.
    ///
    /// `f` is applied when the effect resolves, not now.
    pub fn tag<B: Send + 'static>(self, f: impl FnOnce(A) -> B + Send + 'static) -> Effect<B> {
        Effect::new(move || (self.0)().map(f))
    }

    /// Starts the computation.
    pub fn into_future(self) -> BoxFuture<'static, A> {
        (self.0)()
    }
}
impl<A> fmt::Debug for Effect<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Effect { .. }")
    }
}

/// An ordered bundle of effects produced by one update.
///
/// Order is emission order. It decides which effect is scheduled first, not which one
/// completes first.
#[must_use]
pub struct Effects<A>(Vec<Effect<A>>);

impl<A: Send + 'static> Effects<A> {
    /// A bundle with no effect.
    pub const fn none() -> Self {
        Self(Vec::new())
    }

    /// A bundle with a single effect.
    pub fn of(effect: Effect<A>) -> Self {
        Self(vec![effect])
    }

    pub fn from_vec(effects: Vec<Effect<A>>) -> Self {
        Self(effects)
    }

    /// A bundle with a single effect yielding `action` immediately.
    pub fn send(action: A) -> Self {
        Self::of(Effect::ready(action))
    }

    /// A bundle with a single effect yielding `action` after `duration`.
    pub fn delayed(duration: Duration, action: A) -> Self {
        Self::of(Effect::delayed(duration, action))
    }

    /// A bundle with a single effect built from `f`.
    pub fn task<Fut>(f: impl FnOnce() -> Fut + Send + 'static) -> Self
    where
        Fut: Future<Output = A> + Send + 'static,
    {
        Self::of(Effect::new(f))
    }

    /// Concatenates `self` and `other`, `self`'s effects first.
    pub fn merge(mut self, other: Self) -> Self {
        self.0.extend(other.0);
        self
    }

    /// Translates every effect's action through `f` at resolution time.
    pub fn tag<B: Send + 'static>(self, f: impl Fn(A) -> B + Send + Sync + 'static) -> Effects<B> {
        let f = Arc::new(f);
        Effects(
            self.0
                .into_iter()
                .map(|effect| {
                    let f = f.clone();
                    effect.tag(move |a| f(a))
                })
                .collect(),
        )
    }

    /// Translates every effect's action into the parent vocabulary `P`.
    pub fn embed<P: Embed<A> + Send + 'static>(self) -> Effects<P> {
        self.tag(P::embed)
    }

    pub fn push(&mut self, effect: Effect<A>) {
        self.0.push(effect);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_effects(self) -> Vec<Effect<A>> {
        self.0
    }
}

impl<A> Default for Effects<A> {
    fn default() -> Self {
        Self(Vec::new())
    }
}
impl<A: Send + 'static> From<Effect<A>> for Effects<A> {
    fn from(effect: Effect<A>) -> Self {
        Self::of(effect)
    }
}
impl<A: Send + 'static> FromIterator<Effect<A>> for Effects<A> {
    fn from_iter<I: IntoIterator<Item = Effect<A>>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
impl<A: Send + 'static> Extend<Effect<A>> for Effects<A> {
    fn extend<I: IntoIterator<Item = Effect<A>>>(&mut self, iter: I) {
        self.0.extend(iter)
    }
}
impl<A> IntoIterator for Effects<A> {
    type Item = Effect<A>;
    type IntoIter = std::vec::IntoIter<Effect<A>>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
impl<A> fmt::Debug for Effects<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effects").field("len", &self.0.len()).finish()
    }
}
