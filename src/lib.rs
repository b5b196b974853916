//! A unidirectional store with asynchronous effects.
//!
//! State lives in a [`Store`] and changes only through [`Model::update`], which receives an
//! action and returns [`Effects`]. The store runs those effects on an executor and feeds the
//! actions they produce back into `update`.
//!
//! [`ViewStore`] projects a store onto a sub-state and a sub-action vocabulary, so that a
//! component only sees the part of the state it renders and the actions it can send.
//!
//! ```
//! use uniflow::{Effects, Model, Store};
//!
//! #[derive(Debug, Default)]
//! struct Counter {
//!     count: i64,
//! }
//!
//! #[derive(Debug)]
//! enum CounterAction {
//!     Increment,
//!     Decrement,
//! }
//!
//! impl Model for Counter {
//!     type Action = CounterAction;
//!     type Environment = ();
//!
//!     fn update(&mut self, action: CounterAction, _env: &()) -> Effects<CounterAction> {
//!         match action {
//!             CounterAction::Increment => self.count += 1,
//!             CounterAction::Decrement => self.count -= 1,
//!         }
//!         Effects::none()
//!     }
//! }
//!
//! let store = Store::new(Counter::default(), ()).unwrap();
//! store.send(CounterAction::Increment);
//! assert_eq!(store.state().count, 1);
//! ```

extern crate self as uniflow;

mod config;
mod effect;
mod error;
mod mailbox;
mod model;
mod observed;
mod publish;
mod runner;
mod store;
mod subscription;
pub mod utils;
mod view_store;

pub use config::*;
pub use effect::*;
pub use error::*;
pub use mailbox::*;
pub use model::*;
pub use observed::*;
pub use publish::*;
pub use runner::*;
pub use store::*;
pub use subscription::Subscription;
pub use view_store::*;

/// Derives [`Embed`](trait@Embed) and `From` for every `#[embed]` variant of an action enum.
pub use uniflow_macros::Embed;
