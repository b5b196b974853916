use crate::Effects;


/// The update contract implemented by every state type.
///
/// `update` is the only place where a state's fields change. It runs synchronously;
/// any asynchronous work is returned as [`Effects`] and performed later by the store.
///
/// Given the same prior state and action, `update` must produce the same new state.
/// The environment may feed non-deterministic input only into the returned effects.
///
/// A composite state delegates child actions to the child's `update`, tags the
/// child's effects into its own vocabulary, and merges them in front of its own:
///
/// ```ignore
/// AppAction::Counter(a) => {
///     let child = self.counter.update(a, &env.counter).embed();
///     self.edits += 1;
///     child.merge(Effects::none())
/// }
/// ```
pub trait Model {
    type Action: Send + 'static;
    type Environment;

    fn update(&mut self, action: Self::Action, env: &Self::Environment) -> Effects<Self::Action>;
}

/// Wraps and unwraps a child action vocabulary `C` inside a parent vocabulary.
///
/// Usually derived with [`#[derive(Embed)]`](macro@crate::Embed).
pub trait Embed<C>: Sized {
    fn embed(child: C) -> Self;
    fn extract(self) -> Result<C, Self>;
}
