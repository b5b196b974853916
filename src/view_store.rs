use std::sync::Arc;

use derive_ex::derive_ex;

use crate::Embed;


type ReadFn<S> = dyn Fn(&mut dyn FnMut(&S)) + Send + Sync;
type SendFn<A> = dyn Fn(A) + Send + Sync;

/// A projection of a [`Store`](crate::Store) onto a sub-state and a sub-action vocabulary.
///
/// Owns nothing: reads go through the root store every time and `send` forwards a tagged
/// action to the root store's `send`. View-stores nest freely.
#[derive_ex(Clone, bound())]
pub struct ViewStore<S, A> {
    read: Arc<ReadFn<S>>,
    send: Arc<SendFn<A>>,
}

impl<S: 'static, A: 'static> ViewStore<S, A> {
    /// `read` must call its argument exactly once with the current state.
    pub(crate) fn new(
        read: impl Fn(&mut dyn FnMut(&S)) + Send + Sync + 'static,
        send: impl Fn(A) + Send + Sync + 'static,
    ) -> Self {
        Self {
            read: Arc::new(read),
            send: Arc::new(send),
        }
    }

    /// Calls `f` with the current sub-state.
    ///
    /// Do not send actions from inside `f`.
    pub fn with<T>(&self, f: impl FnOnce(&S) -> T) -> T {
        let mut f = Some(f);
        let mut value = None;
        (self.read)(&mut |s: &S| {
            if let Some(f) = f.take() {
                value = Some(f(s));
            }
        });
        value.expect("view-store reader did not yield the state")
    }

    /// A copy of the current sub-state.
    pub fn state(&self) -> S
    where
        S: Clone,
    {
        self.with(S::clone)
    }

    pub fn send(&self, action: A) {
        (self.send)(action)
    }

    /// A further projection of this view-store.
    pub fn view<C: 'static, B: 'static>(
        &self,
        get: impl Fn(&S) -> &C + Send + Sync + 'static,
        tag: impl Fn(B) -> A + Send + Sync + 'static,
    ) -> ViewStore<C, B> {
        let read = self.read.clone();
        let send = self.send.clone();
        ViewStore::new(
            move |f: &mut dyn FnMut(&C)| read(&mut |s: &S| f(get(s))),
            move |action| send(tag(action)),
        )
    }

    /// Like [`view`](Self::view), tagging with [`Embed::embed`].
    pub fn scope<C: 'static, B: 'static>(
        &self,
        get: impl Fn(&S) -> &C + Send + Sync + 'static,
    ) -> ViewStore<C, B>
    where
        A: Embed<B>,
    {
        self.view(get, A::embed)
    }

    /// A value read through `get` and written by sending `tag(value)`.
    pub fn binding<T: 'static>(
        &self,
        get: impl Fn(&S) -> T + Send + Sync + 'static,
        tag: impl Fn(T) -> A + Send + Sync + 'static,
    ) -> Binding<T> {
        let this = self.clone();
        let send = self.send.clone();
        Binding {
            get: Arc::new(move || this.with(&get)),
            set: Arc::new(move |value| send(tag(value))),
        }
    }
}

/// A read/write handle on a single value of a store.
///
/// Writing sends an action; the value changes only once that action is applied.
#[derive_ex(Clone, bound())]
pub struct Binding<T> {
    get: Arc<dyn Fn() -> T + Send + Sync>,
    set: Arc<dyn Fn(T) + Send + Sync>,
}

impl<T> Binding<T> {
    pub fn get(&self) -> T {
        (self.get)()
    }
    pub fn set(&self, value: T) {
        (self.set)(value)
    }
}
