//! # rxstore
//!
//! A Redux-style state store built on [rxRust](rxrust) subjects.
//!
//! A [`Store<S, A>`](Store) owns one piece of state and changes it only by
//! folding dispatched actions through a reducer:
//! - `dispatch` / `get_state` / `subscribe`
//! - Watchers that react to actions of one kind and dispatch new actions
//! - Observers built with `create_observer` that see both actions and state
//!
//! Actions flow through a thread-safe rxRust `SubjectThreads`, and state
//! lives in a `BehaviorSubject`, so any rxRust operator can be used in a
//! watcher pipeline.
//!
//! ```
//! use rxrust::prelude::*;
//! use rxstore::{create_rx_store, Action};
//!
//! #[derive(Clone, Debug, Default, PartialEq)]
//! struct Form {
//!     email: String,
//!     confirmed: String,
//! }
//!
//! #[derive(Clone)]
//! enum Edit {
//!     Email(String),
//!     Confirm(String),
//! }
//!
//! impl Action for Edit {
//!     fn kind(&self) -> &str {
//!         match self {
//!             Edit::Email(_) => "EMAIL",
//!             Edit::Confirm(_) => "CONFIRM",
//!         }
//!     }
//! }
//!
//! let store = create_rx_store(
//!     |form: &Form, edit: &Edit| match edit {
//!         Edit::Email(v) => Form { email: v.clone(), ..form.clone() },
//!         Edit::Confirm(v) => Form { confirmed: v.clone(), ..form.clone() },
//!     },
//!     None,
//! );
//!
//! store.add_watcher("EMAIL", |emails| {
//!     emails.filter_map(|edit: Edit| match edit {
//!         Edit::Email(v) => Some(Edit::Confirm(v)),
//!         _ => None,
//!     })
//! });
//!
//! store.dispatch(Edit::Email("a@b.c".to_string()));
//! assert_eq!(store.get_state().confirmed, "a@b.c");
//! ```

pub mod error;
pub mod store;

// Re-export main types for convenience
pub use error::StoreError;
pub use store::{
    create_observer, create_rx_store, Action, ActionStream, ActionStreamExt, Dispatcher,
    ErrorStream, OfKind, Reducer, StateStream, Store, StoreBuilder, StoreConfig, StoreObserver,
};
