use std::{
    sync::Arc,
    task::{Context, Poll, Waker},
};

use futures::{
    future::FutureObj,
    task::{Spawn, SpawnError},
    FutureExt,
};
use parking_lot::Mutex;

/// A `Spawn` that keeps spawned futures until [`run_all`](Self::run_all) is called.
///
/// Lets tests observe scheduling order without any worker thread.
#[derive(Clone, Default)]
pub struct ManualSpawner(Arc<Mutex<Vec<FutureObj<'static, ()>>>>);

impl ManualSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.0.lock().len()
    }

    /// Polls every queued future once, in spawn order, including ones spawned meanwhile.
    ///
    /// Futures that are still pending are dropped.
    pub fn run_all(&self) -> usize {
        let mut cx = Context::from_waker(Waker::noop());
        let mut done = 0;
        loop {
            let tasks = std::mem::take(&mut *self.0.lock());
            if tasks.is_empty() {
                return done;
            }
            for mut task in tasks {
                match task.poll_unpin(&mut cx) {
                    Poll::Ready(()) => done += 1,
                    Poll::Pending => {}
                }
            }
        }
    }
}

impl Spawn for ManualSpawner {
    fn spawn_obj(&self, future: FutureObj<'static, ()>) -> Result<(), SpawnError> {
        self.0.lock().push(future);
        Ok(())
    }
}

/// A `Spawn` that always refuses.
pub struct ClosedSpawner;

impl Spawn for ClosedSpawner {
    fn spawn_obj(&self, _future: FutureObj<'static, ()>) -> Result<(), SpawnError> {
        Err(SpawnError::shutdown())
    }
}
