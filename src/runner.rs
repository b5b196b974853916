use std::sync::{Arc, Weak};

use futures::{future::FutureObj, task::Spawn};
use tracing::{trace, warn};

use crate::{utils::activity::Activity, Effects, Mailbox};


/// Schedules effects on an executor and delivers each resulting action to a mailbox.
///
/// The runner only holds a weak reference to its mailbox. An action that resolves after
/// the mailbox is gone is discarded.
pub struct EffectRunner<A> {
    mailbox: Weak<dyn Mailbox<A>>,
    spawner: Arc<dyn Spawn + Send + Sync>,
    activity: Activity,
    owner: Option<Activity>,
}

impl<A: Send + 'static> EffectRunner<A> {
    pub fn new(mailbox: Weak<dyn Mailbox<A>>, spawner: Arc<dyn Spawn + Send + Sync>) -> Self {
        Self {
            mailbox,
            spawner,
            activity: Activity::new(),
            owner: None,
        }
    }

    /// Also accounts every effect in `owner`, so the owner can wait for its whole pipeline.
    pub(crate) fn with_owner_activity(
        mailbox: Weak<dyn Mailbox<A>>,
        spawner: Arc<dyn Spawn + Send + Sync>,
        owner: Activity,
    ) -> Self {
        Self {
            owner: Some(owner),
            ..Self::new(mailbox, spawner)
        }
    }

    /// Spawns every effect of `effects` in bundle order and returns immediately.
    pub fn run(&self, effects: Effects<A>) {
        for effect in effects {
            let work = (self.activity.begin(), self.owner.as_ref().map(Activity::begin));
            let mailbox = self.mailbox.clone();
            let task = async move {
                let action = effect.into_future().await;
                match mailbox.upgrade() {
                    Some(mailbox) => mailbox.send(action),
                    None => trace!(target: "uniflow::runner", "mailbox released, action dropped"),
                }
                drop(work);
            };
            if let Err(e) = self.spawner.spawn_obj(FutureObj::new(Box::new(task))) {
                warn!(target: "uniflow::runner", "effect dropped: {e}");
            }
        }
    }

    /// Number of effects spawned whose action has not been delivered yet.
    pub fn in_flight(&self) -> usize {
        self.activity.count()
    }

    /// Resolves once every spawned effect has delivered its action.
    pub fn idle(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        self.activity.idle()
    }
}
