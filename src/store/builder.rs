use std::marker::PhantomData;

use crate::store::{Action, Reducer, Store};

/// Default upper bound on nested dispatches.
pub const DEFAULT_MAX_DISPATCH_DEPTH: usize = 64;

/// Store configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    /// Name reported in log events.
    pub name: String,
    /// How deep derived dispatches may chain (an action dispatched by a
    /// watcher sits one level below the action that triggered it). Deeper
    /// dispatches are refused. Values below 1 are treated as 1.
    pub max_dispatch_depth: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: "store".to_string(),
            max_dispatch_depth: DEFAULT_MAX_DISPATCH_DEPTH,
        }
    }
}

/// Builder for a configured [`Store`].
///
/// # Example
///
/// ```ignore
/// let store = Store::builder(reducer)
///     .name("todos")
///     .initial_state(TodoState::new())
///     .max_dispatch_depth(16)
///     .build();
/// ```
pub struct StoreBuilder<S, A, R> {
    reducer: R,
    initial: Option<S>,
    config: StoreConfig,
    _action: PhantomData<fn(A)>,
}

impl<S, A, R> StoreBuilder<S, A, R>
where
    S: Clone + Send + Sync + 'static,
    A: Action,
    R: Reducer<S, A>,
{
    pub(crate) fn new(reducer: R) -> Self {
        Self {
            reducer,
            initial: None,
            config: StoreConfig::default(),
            _action: PhantomData,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn initial_state(mut self, state: S) -> Self {
        self.initial = Some(state);
        self
    }

    /// Limit derived dispatch chains. `0` is raised to `1`, which still
    /// lets callers dispatch but refuses every watcher output.
    pub fn max_dispatch_depth(mut self, depth: usize) -> Self {
        self.config.max_dispatch_depth = depth.max(1);
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the store, starting from `S::default()` unless an initial
    /// state was given.
    pub fn build(self) -> Store<S, A>
    where
        S: Default,
    {
        let initial = self.initial.unwrap_or_default();
        Store::with_config(self.reducer, initial, self.config)
    }
}
