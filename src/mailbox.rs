/// Anything that accepts actions.
///
/// `send` may be called from any thread and must not block on effect execution.
pub trait Mailbox<A>: Send + Sync {
    fn send(&self, action: A);
}

impl<A, F> Mailbox<A> for F
where
    F: Fn(A) + Send + Sync,
{
    fn send(&self, action: A) {
        self(action)
    }
}
