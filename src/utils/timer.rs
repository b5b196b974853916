//! Runtime-agnostic timers.
//!
//! A single background thread owns a deadline queue and wakes sleeping futures, so
//! effects can wait without depending on the executor they are spawned on.

use std::{
    collections::BTreeMap,
    future::Future,
    io,
    pin::Pin,
    sync::LazyLock,
    task::{Context, Poll, Waker},
    thread,
    time::{Duration, Instant},
};

use futures::{
    future::{select, Either},
    pin_mut,
};
use parking_lot::{Condvar, Mutex, MutexGuard};
use parse_display::Display;
use slabmap::SlabMap;
use tracing::warn;


static TIMER: LazyLock<Timer> = LazyLock::new(|| Timer {
    queue: Mutex::new(Deadlines::new()),
    condvar: Condvar::new(),
});

struct Timer {
    queue: Mutex<Deadlines>,
    condvar: Condvar,
}
impl Timer {
    fn lock(&self) -> MutexGuard<'_, Deadlines> {
        self.queue.lock()
    }

    fn run_worker(&self) {
        let mut expired = Vec::new();
        let mut queue = self.lock();
        loop {
            let now = Instant::now();
            queue.take_expired(now, &mut expired);
            if !expired.is_empty() {
                MutexGuard::unlocked(&mut queue, || {
                    for waker in expired.drain(..) {
                        waker.wake();
                    }
                });
                continue;
            }
            match queue.next_deadline() {
                Some(deadline) => {
                    self.condvar.wait_until(&mut queue, deadline);
                }
                None => self.condvar.wait(&mut queue),
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Key {
    deadline: Instant,
    seq: u64,
}

struct Entry {
    key: Key,
    waker: Option<Waker>,
    fired: bool,
}

struct Deadlines {
    order: BTreeMap<Key, usize>,
    entries: SlabMap<Entry>,
    next_seq: u64,
    worker_started: bool,
}

impl Deadlines {
    fn new() -> Self {
        Self {
            order: BTreeMap::new(),
            entries: SlabMap::new(),
            next_seq: 0,
            worker_started: false,
        }
    }

    /// Returns `false` if the worker is not running; the next call tries again.
    fn start_worker(&mut self, spawn: impl FnOnce() -> io::Result<()>) -> bool {
        if !self.worker_started {
            match spawn() {
                Ok(()) => self.worker_started = true,
                Err(e) => warn!(target: "uniflow::timer", "failed to start timer thread: {e}"),
            }
        }
        self.worker_started
    }

    fn insert(&mut self, deadline: Instant) -> usize {
        let key = Key {
            deadline,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        let is_first = self.order.first_key_value().is_none_or(|(k, _)| key < *k);
        let id = self.entries.insert(Entry {
            key,
            waker: None,
            fired: false,
        });
        self.order.insert(key, id);
        if is_first {
            TIMER.condvar.notify_one();
        }
        id
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.order.first_key_value().map(|(k, _)| k.deadline)
    }

    fn take_expired(&mut self, now: Instant, to: &mut Vec<Waker>) {
        while let Some(entry) = self.order.first_entry() {
            if entry.key().deadline > now {
                break;
            }
            let id = entry.remove();
            if let Some(e) = self.entries.get_mut(id) {
                e.fired = true;
                to.extend(e.waker.take());
            }
        }
    }

    fn poll(&mut self, id: usize, cx: &Context) -> Poll<()> {
        let Some(e) = self.entries.get_mut(id) else {
            return Poll::Ready(());
        };
        if e.fired || e.key.deadline <= Instant::now() {
            self.remove(id);
            return Poll::Ready(());
        }
        match &mut e.waker {
            Some(waker) if waker.will_wake(cx.waker()) => {}
            waker => *waker = Some(cx.waker().clone()),
        }
        Poll::Pending
    }

    fn remove(&mut self, id: usize) {
        if let Some(e) = self.entries.remove(id) {
            self.order.remove(&e.key);
        }
    }
}

fn spawn_worker() -> io::Result<()> {
    thread::Builder::new()
        .name("uniflow-timer".into())
        .spawn(|| TIMER.run_worker())
        .map(drop)
}

/// Future returned by [`sleep`] and [`sleep_until`].
#[must_use = "futures do nothing unless polled"]
pub struct Sleep {
    deadline: Instant,
    id: Option<usize>,
    done: bool,
}

impl Future for Sleep {
    type Output = ();
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(());
        }
        if this.deadline <= Instant::now() {
            this.release();
            return Poll::Ready(());
        }
        let mut queue = TIMER.lock();
        let id = *this.id.get_or_insert_with(|| queue.insert(this.deadline));
        let poll = queue.poll(id, cx);
        if poll.is_ready() {
            this.id = None;
            this.done = true;
        } else if !queue.start_worker(spawn_worker) {
            cx.waker().wake_by_ref();
        }
        poll
    }
}
impl Sleep {
    fn release(&mut self) {
        self.done = true;
        if let Some(id) = self.id.take() {
            TIMER.lock().remove(id);
        }
    }
}
impl Drop for Sleep {
    fn drop(&mut self) {
        self.release();
    }
}

/// Waits until `duration` has elapsed.
///
/// Works on any executor; the deadline is tracked by a shared timer thread.
pub fn sleep(duration: Duration) -> Sleep {
    sleep_until(Instant::now() + duration)
}

/// Waits until `deadline` is reached.
pub fn sleep_until(deadline: Instant) -> Sleep {
    Sleep {
        deadline,
        id: None,
        done: false,
    }
}

#[derive(Debug, Display, PartialEq, Eq)]
#[display("timeout")]
pub struct TimeoutError {
    _private: (),
}
impl TimeoutError {
    fn new() -> Self {
        Self { _private: () }
    }
}

impl std::error::Error for TimeoutError {}

/// Runs `fut` to completion unless `duration` elapses first.
pub async fn timeout<T>(fut: impl Future<Output = T>, duration: Duration) -> Result<T, TimeoutError> {
    let timer = sleep(duration);
    pin_mut!(fut);
    pin_mut!(timer);
    match select(fut, timer).await {
        Either::Left((value, _)) => Ok(value),
        Either::Right(((), _)) => Err(TimeoutError::new()),
    }
}
