use std::{
    collections::VecDeque,
    fmt::Debug,
    future::Future,
    ops::Deref,
    sync::{Arc, Weak},
};

use derive_ex::derive_ex;
use futures::task::Spawn;
use parking_lot::{Mutex, MutexGuard};
use tracing::debug;

use crate::{
    publish::hold_broadcasts,
    utils::activity::{Activity, ActivityGuard},
    Binding, EffectRunner, Embed, Error, Mailbox, Model, StoreBuilder, ViewStore,
};


/// Owner of one state value and one environment, and the single entry point for mutation.
///
/// `Store` is a cheap handle; clones refer to the same state.
///
/// Actions sent to a store are applied one at a time. A `send` made while the store is idle
/// applies the action before returning. A `send` made while another call is applying
/// actions (another thread, an effect completing, or a decorator observer) is queued
/// and applied by that call, in order.
#[derive_ex(Clone, bound())]
pub struct Store<M: Model>(Arc<StoreNode<M>>);

struct StoreNode<M: Model> {
    state: Mutex<M>,
    env: M::Environment,
    inbox: Mutex<Inbox<M::Action>>,
    runner: EffectRunner<M::Action>,
    activity: Activity,
    log_actions: bool,
}

struct Inbox<A> {
    queue: VecDeque<A>,
    drain: Option<ActivityGuard>,
}

impl<M> Store<M>
where
    M: Model + Send + 'static,
    M::Action: Debug,
    M::Environment: Send + Sync + 'static,
{
    /// Creates a store whose effects run on the process-wide effect pool.
    pub fn new(state: M, env: M::Environment) -> Result<Self, Error> {
        Self::builder(state, env).build()
    }

    /// Creates a store whose effects run on `spawner`.
    pub fn with_spawner(
        state: M,
        env: M::Environment,
        spawner: impl Spawn + Send + Sync + 'static,
    ) -> Self {
        Self::from_parts(state, env, Arc::new(spawner), true)
    }

    pub fn builder(state: M, env: M::Environment) -> StoreBuilder<M> {
        StoreBuilder::new(state, env)
    }

    pub(crate) fn from_parts(
        state: M,
        env: M::Environment,
        spawner: Arc<dyn Spawn + Send + Sync>,
        log_actions: bool,
    ) -> Self {
        let activity = Activity::new();
        Self(Arc::new_cyclic(|this: &Weak<StoreNode<M>>| {
            let mailbox: Weak<dyn Mailbox<M::Action>> = this.clone();
            StoreNode {
                state: Mutex::new(state),
                env,
                inbox: Mutex::new(Inbox {
                    queue: VecDeque::new(),
                    drain: None,
                }),
                runner: EffectRunner::with_owner_activity(mailbox, spawner, activity.clone()),
                activity,
                log_actions,
            }
        }))
    }

    /// Sends an action through `update` and schedules the effects it returns.
    ///
    /// Never waits for effects.
    pub fn send(&self, action: M::Action) {
        self.0.send(action)
    }

    /// Read-only access to the current state.
    ///
    /// Do not hold the returned guard across a call to [`send`](Self::send) on the same thread.
    pub fn state(&self) -> StateRef<'_, M> {
        StateRef(self.0.state.lock())
    }

    /// Calls `f` with the current state.
    pub fn with<T>(&self, f: impl FnOnce(&M) -> T) -> T {
        f(&*self.0.state.lock())
    }

    pub fn environment(&self) -> &M::Environment {
        &self.0.env
    }

    /// Number of effects scheduled whose action has not been delivered yet.
    pub fn in_flight(&self) -> usize {
        self.0.runner.in_flight()
    }

    /// Resolves when no action is queued or being applied and no effect is in flight.
    pub fn settled(&self) -> impl Future<Output = ()> + Send + 'static {
        self.0.activity.idle()
    }

    /// The whole store as a [`ViewStore`].
    pub fn view_store(&self) -> ViewStore<M, M::Action> {
        let read = self.clone();
        let send = self.clone();
        ViewStore::new(
            move |f: &mut dyn FnMut(&M)| f(&*read.0.state.lock()),
            move |action| send.send(action),
        )
    }

    /// A projection onto the sub-state returned by `get`, sending through `tag`.
    pub fn view<S: 'static, A: 'static>(
        &self,
        get: impl Fn(&M) -> &S + Send + Sync + 'static,
        tag: impl Fn(A) -> M::Action + Send + Sync + 'static,
    ) -> ViewStore<S, A> {
        self.view_store().view(get, tag)
    }

    /// A projection whose action vocabulary is embedded in this store's through [`Embed`].
    pub fn scope<S: 'static, A: 'static>(
        &self,
        get: impl Fn(&M) -> &S + Send + Sync + 'static,
    ) -> ViewStore<S, A>
    where
        M::Action: Embed<A>,
    {
        self.view_store().scope(get)
    }

    /// A value read through `get` and written by sending `tag(value)`.
    pub fn binding<T: 'static>(
        &self,
        get: impl Fn(&M) -> T + Send + Sync + 'static,
        tag: impl Fn(T) -> M::Action + Send + Sync + 'static,
    ) -> Binding<T> {
        self.view_store().binding(get, tag)
    }
}

impl<M> Mailbox<M::Action> for Store<M>
where
    M: Model + Send + 'static,
    M::Action: Debug,
    M::Environment: Send + Sync + 'static,
{
    fn send(&self, action: M::Action) {
        self.0.send(action)
    }
}

impl<M: Model + Debug> Debug for Store<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.state.try_lock() {
            Some(state) => f.debug_tuple("Store").field(&*state).finish(),
            None => write!(f, "Store(<locked>)"),
        }
    }
}

impl<M> StoreNode<M>
where
    M: Model + Send + 'static,
    M::Action: Debug,
    M::Environment: Send + Sync + 'static,
{
    fn send(&self, action: M::Action) {
        {
            let mut inbox = self.inbox.lock();
            inbox.queue.push_back(action);
            if inbox.drain.is_some() {
                return;
            }
            inbox.drain = Some(self.activity.begin());
        }
        let mut drain = Drain {
            inbox: &self.inbox,
            finished: false,
        };
        while let Some(action) = drain.next() {
            self.apply(action);
        }
    }

    fn apply(&self, action: M::Action) {
        if self.log_actions {
            debug!(target: "uniflow::store", "send {action:?}");
        }
        let (effects, broadcasts) =
            hold_broadcasts(|| self.state.lock().update(action, &self.env));
        broadcasts.run();
        self.runner.run(effects);
    }
}

impl<M> Mailbox<M::Action> for StoreNode<M>
where
    M: Model + Send + 'static,
    M::Action: Debug,
    M::Environment: Send + Sync + 'static,
{
    fn send(&self, action: M::Action) {
        StoreNode::send(self, action)
    }
}

/// Ownership of the inbox's drain. Released when the queue runs dry or on unwind.
struct Drain<'a, A> {
    inbox: &'a Mutex<Inbox<A>>,
    finished: bool,
}
impl<A> Drain<'_, A> {
    fn next(&mut self) -> Option<A> {
        let mut inbox = self.inbox.lock();
        if let Some(action) = inbox.queue.pop_front() {
            return Some(action);
        }
        self.finished = true;
        let drain = inbox.drain.take();
        drop(inbox);
        drop(drain);
        None
    }
}
impl<A> Drop for Drain<'_, A> {
    fn drop(&mut self) {
        if !self.finished {
            let drain = self.inbox.lock().drain.take();
            drop(drain);
        }
    }
}

/// Read-only borrow of a store's state returned by [`Store::state`].
pub struct StateRef<'a, M>(MutexGuard<'a, M>);

impl<M> Deref for StateRef<'_, M> {
    type Target = M;
    fn deref(&self) -> &M {
        &self.0
    }
}
impl<M: Debug> Debug for StateRef<'_, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&*self.0, f)
    }
}
