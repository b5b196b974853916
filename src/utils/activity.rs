use std::{
    future::{poll_fn, Future},
    sync::Arc,
    task::{Poll, Waker},
};

use derive_ex::derive_ex;
use parking_lot::Mutex;
use slabmap::SlabMap;


/// Counts units of outstanding work and lets callers wait for it to reach zero.
#[derive(Default)]
#[derive_ex(Clone, bound())]
pub struct Activity(Arc<Mutex<ActivityData>>);

#[derive(Default)]
struct ActivityData {
    count: usize,
    epoch: u64,
    wakers: SlabMap<Waker>,
}

impl Activity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one unit of work. The unit ends when the returned guard is dropped.
    pub fn begin(&self) -> ActivityGuard {
        self.0.lock().count += 1;
        ActivityGuard(self.clone())
    }

    pub fn count(&self) -> usize {
        self.0.lock().count
    }

    /// Resolves once the count is zero.
    pub fn idle(&self) -> impl Future<Output = ()> + Send + 'static {
        let this = self.clone();
        let mut key = WakerKey {
            activity: self.clone(),
            key: None,
        };
        async move {
            poll_fn(|cx| {
                let mut d = this.0.lock();
                if d.count == 0 {
                    return Poll::Ready(());
                }
                match key.key {
                    Some((epoch, k)) if epoch == d.epoch => d.wakers[k].clone_from(cx.waker()),
                    _ => key.key = Some((d.epoch, d.wakers.insert(cx.waker().clone()))),
                }
                Poll::Pending
            })
            .await
        }
    }

    fn end(&self) {
        let wakers = {
            let mut d = self.0.lock();
            d.count -= 1;
            if d.count != 0 {
                return;
            }
            d.epoch += 1;
            std::mem::take(&mut d.wakers)
        };
        for (_, waker) in wakers {
            waker.wake();
        }
    }
}

#[must_use]
pub struct ActivityGuard(Activity);

impl Drop for ActivityGuard {
    fn drop(&mut self) {
        self.0.end();
    }
}

struct WakerKey {
    activity: Activity,
    key: Option<(u64, usize)>,
}
impl Drop for WakerKey {
    fn drop(&mut self) {
        if let Some((epoch, key)) = self.key {
            let mut d = self.activity.0.lock();
            if d.epoch == epoch {
                d.wakers.remove(key);
            }
        }
    }
}
