//! Redux-style state management.
//!
//! A [`Store`] owns one piece of state and changes it only by folding
//! dispatched actions through a reducer. The action, state and error
//! streams are rxRust thread-safe subjects. Watchers and observers react
//! to dispatched actions and may dispatch further actions.
//!
//! ```text
//! dispatch ──► actions ──► reducer ──► state ──► subscribers
//!                 │
//!                 └──► watchers / observers ──► dispatch
//! ```

mod action;
mod builder;
mod observer;
mod reducer;
mod store;

pub use action::{Action, ActionStreamExt, KindFilter, OfKind};
pub use builder::{StoreBuilder, StoreConfig, DEFAULT_MAX_DISPATCH_DEPTH};
pub use observer::{create_observer, StoreObserver};
pub use reducer::Reducer;
pub use store::{create_rx_store, ActionStream, Dispatcher, ErrorStream, StateStream, Store};
