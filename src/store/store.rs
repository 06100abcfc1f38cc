use std::cell::RefCell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, ReentrantMutex};
use rxrust::ops::distinct::DistinctUntilChangedOp;
use rxrust::ops::map::MapOp;
use rxrust::prelude::*;

use crate::error::StoreError;
use crate::store::observer::observe;
use crate::store::{Action, ActionStreamExt, OfKind, Reducer, StoreBuilder, StoreConfig, StoreObserver};

/// Hot stream of every action the store emits.
pub type ActionStream<A> = SubjectThreads<A, Infallible>;

/// The current state followed by every later state.
pub type StateStream<S> = BehaviorSubject<S, SubjectThreads<S, Infallible>>;

/// Dispatches the store refused.
pub type ErrorStream = SubjectThreads<StoreError, Infallible>;

// Actions dispatched while the action stream is emitting, with their depth.
struct Pending<A> {
    queue: VecDeque<(A, usize)>,
    // depth of the action being emitted, `None` when idle
    current: Option<usize>,
}

impl<A> Pending<A> {
    fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            current: None,
        }
    }
}

// Resets the pending queue when a drain ends, also on unwind.
struct Draining<'a, A>(&'a RefCell<Pending<A>>);

impl<A> Drop for Draining<'_, A> {
    fn drop(&mut self) {
        let mut pending = self.0.borrow_mut();
        pending.current = None;
        pending.queue.clear();
    }
}

struct StoreInner<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Action,
{
    config: StoreConfig,
    actions: ActionStream<A>,
    state: StateStream<S>,
    errors: ErrorStream,
    // held across a whole emission so other threads dispatch after it
    emission: ReentrantMutex<RefCell<Pending<A>>>,
    // reducer, watcher and observer subscriptions
    registrations: Mutex<Vec<BoxSubscriptionThreads>>,
}

impl<S, A> StoreInner<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Action,
{
    fn dispatch(&self, action: A) {
        let emission = self.emission.lock();

        // A subject cannot be re-entered while it emits, so actions
        // dispatched from inside an emission wait in the queue.
        let current = emission.borrow().current;
        if let Some(depth) = current {
            self.enqueue(&emission, action, depth + 1);
            return;
        }
        if self.actions.is_finished() {
            self.refuse(StoreError::Closed);
            return;
        }

        let _draining = Draining(&emission);
        let mut actions = self.actions.clone();
        let mut next = Some((action, 1));
        while let Some((action, depth)) = next {
            emission.borrow_mut().current = Some(depth);
            tracing::debug!(store = %self.config.name, action = action.kind(), depth, "dispatch");
            actions.next(action);
            next = emission.borrow_mut().queue.pop_front();
        }
        actions.retain();
    }

    fn enqueue(&self, pending: &RefCell<Pending<A>>, action: A, depth: usize) {
        let limit = self.config.max_dispatch_depth;
        if depth > limit {
            self.refuse(StoreError::DepthExceeded {
                kind: action.kind().to_string(),
                limit,
            });
            return;
        }
        tracing::trace!(store = %self.config.name, action = action.kind(), depth, "dispatch queued");
        pending.borrow_mut().queue.push_back((action, depth));
    }

    fn refuse(&self, error: StoreError) {
        tracing::error!(store = %self.config.name, %error, "dispatch refused");
        self.errors.clone().next(error);
    }

    fn register(&self, subscription: BoxSubscriptionThreads) {
        self.registrations.lock().push(subscription);
    }
}

impl<S, A> Drop for StoreInner<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Action,
{
    fn drop(&mut self) {
        for subscription in self.registrations.get_mut().drain(..) {
            subscription.unsubscribe();
        }
        self.actions.clone().complete();
        Observer::<S, Infallible>::complete(self.state.clone());
        self.errors.clone().complete();
    }
}

/// Observer that dispatches every action it receives into a store.
///
/// Watcher and observer pipelines are subscribed with one of these. It
/// holds the store weakly, so a registration never keeps its store alive.
pub struct Dispatcher<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Action,
{
    store: Weak<StoreInner<S, A>>,
    origin: String,
}

impl<S, A> Observer<A, Infallible> for Dispatcher<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Action,
{
    fn next(&mut self, action: A) {
        if let Some(store) = self.store.upgrade() {
            tracing::trace!(
                store = %store.config.name,
                origin = %self.origin,
                action = action.kind(),
                "derived dispatch"
            );
            store.dispatch(action);
        }
    }

    fn error(self, error: Infallible) {
        match error {}
    }

    fn complete(self) {}

    fn is_finished(&self) -> bool {
        self.store.strong_count() == 0
    }
}

/// A thread-safe store driven by dispatched actions.
///
/// State changes only through the reducer: every dispatched action is
/// folded into the current state and the result is published to
/// subscribers. Cloning a store yields another handle to the same state.
///
/// # Example
///
/// ```
/// use rxrust::prelude::*;
/// use rxstore::{create_rx_store, Action};
///
/// #[derive(Clone)]
/// enum Counter {
///     Add(i32),
///     Reset,
/// }
///
/// impl Action for Counter {
///     fn kind(&self) -> &str {
///         match self {
///             Counter::Add(_) => "ADD",
///             Counter::Reset => "RESET",
///         }
///     }
/// }
///
/// let store = create_rx_store(
///     |count: &i32, action: &Counter| match action {
///         Counter::Add(n) => count + n,
///         Counter::Reset => 0,
///     },
///     None,
/// );
///
/// // every ADD is followed by another ADD of one
/// store.add_watcher("ADD", |adds| {
///     adds.filter(|a: &Counter| matches!(a, Counter::Add(n) if *n != 1))
///         .map(|_: Counter| Counter::Add(1))
/// });
///
/// store.dispatch(Counter::Add(10));
/// assert_eq!(store.get_state(), 11);
/// ```
pub struct Store<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Action,
{
    inner: Arc<StoreInner<S, A>>,
}

/// Create a store from a reducer and an optional initial state.
///
/// Without an initial state the store starts from `S::default()`.
pub fn create_rx_store<S, A, R>(reducer: R, initial_state: impl Into<Option<S>>) -> Store<S, A>
where
    S: Clone + Default + Send + Sync + 'static,
    A: Action,
    R: Reducer<S, A>,
{
    Store::new(reducer, initial_state.into().unwrap_or_default())
}

impl<S, A> Store<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Action,
{
    /// Create a new store with the given reducer and initial state.
    pub fn new<R>(reducer: R, initial: S) -> Self
    where
        R: Reducer<S, A>,
    {
        Self::with_config(reducer, initial, StoreConfig::default())
    }

    /// Start building a configured store.
    pub fn builder<R>(reducer: R) -> StoreBuilder<S, A, R>
    where
        R: Reducer<S, A>,
    {
        StoreBuilder::new(reducer)
    }

    /// Create a new store with explicit configuration.
    pub fn with_config<R>(reducer: R, initial: S, mut config: StoreConfig) -> Self
    where
        R: Reducer<S, A>,
    {
        config.max_dispatch_depth = config.max_dispatch_depth.max(1);
        let actions = ActionStream::<A>::default();
        let state = StateStream::<S>::new(initial);

        // Registered first so state is reduced before any watcher sees the action.
        let reduction = {
            let mut state = state.clone();
            actions.clone().subscribe(move |action: A| {
                Behavior::<S, Infallible>::next_by(&mut state, |current| {
                    reducer.reduce(&current, &action)
                });
            })
        };

        let inner = StoreInner {
            config,
            actions,
            state,
            errors: ErrorStream::default(),
            emission: ReentrantMutex::new(RefCell::new(Pending::new())),
            registrations: Mutex::new(vec![BoxSubscriptionThreads::new(reduction)]),
        };
        tracing::debug!(store = %inner.config.name, "store created");

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Get a clone of the current state.
    pub fn get_state(&self) -> S {
        Behavior::<S, Infallible>::peek(&self.inner.state)
    }

    /// Push an action through the reducer and every matching watcher.
    ///
    /// Actions derived by watchers and observers are reduced after the
    /// action that caused them, in the order they were emitted, and all of
    /// them before this call returns. A derived action more than
    /// [`StoreConfig::max_dispatch_depth`] levels deep is dropped and
    /// reported on [`errors`](Self::errors).
    ///
    /// Dispatches from several threads are applied one at a time, so
    /// subscribers see states in the order they were reduced.
    pub fn dispatch(&self, action: A) {
        self.inner.dispatch(action)
    }

    /// Subscribe to state changes.
    ///
    /// The observer receives the current state immediately, then every
    /// new state.
    pub fn subscribe<F>(&self, observer: F) -> SubscriberThreads<ObserverItem<F>>
    where
        F: FnMut(S) + Send + 'static,
    {
        self.inner.state.clone().subscribe(observer)
    }

    /// Watch actions of `kind` and dispatch whatever `pipeline` emits.
    ///
    /// `pipeline` receives the stream of matching actions and returns the
    /// stream of actions to dispatch. Watchers run in registration order,
    /// after the reducer, and stay registered for the lifetime of the
    /// store.
    pub fn add_watcher<F, P>(&self, kind: impl Into<String>, pipeline: F)
    where
        F: FnOnce(OfKind<A>) -> P,
        P: Observable<A, Infallible, Dispatcher<S, A>>,
        P::Unsub: Send + 'static,
    {
        let kind = kind.into();
        tracing::debug!(store = %self.inner.config.name, watcher = %kind, "watcher added");

        let dispatcher = self.dispatcher(format!("watcher:{kind}"));
        let matching = self.actions().of_kind(kind);
        self.inner.register(observe(pipeline(matching), dispatcher));
    }

    /// Run an observer against the store's action and state streams.
    ///
    /// Usually built with [`create_observer`](crate::create_observer). The
    /// subscription is kept for the lifetime of the store.
    pub fn add_observer(&self, observer: StoreObserver<S, A>) {
        let subscription = observer.attach(self);
        self.inner.register(subscription);
    }

    /// Run several observers, in order.
    pub fn add_observers<I>(&self, observers: I)
    where
        I: IntoIterator<Item = StoreObserver<S, A>>,
    {
        for observer in observers {
            self.add_observer(observer);
        }
    }

    /// An observer feeding its input into [`dispatch`](Self::dispatch).
    ///
    /// `origin` labels the derived dispatches in trace events.
    pub fn dispatcher(&self, origin: impl Into<String>) -> Dispatcher<S, A> {
        Dispatcher {
            store: Arc::downgrade(&self.inner),
            origin: origin.into(),
        }
    }

    /// Stream of emitted actions, derived ones included.
    pub fn actions(&self) -> ActionStream<A> {
        self.inner.actions.clone()
    }

    /// Stream of states, starting with the current one.
    pub fn states(&self) -> StateStream<S> {
        self.inner.state.clone()
    }

    /// Stream of refused dispatches.
    pub fn errors(&self) -> ErrorStream {
        self.inner.errors.clone()
    }

    /// Project the state and emit only when the projection changes.
    pub fn select<U, F>(&self, selector: F) -> DistinctUntilChangedOp<MapOp<StateStream<S>, F, S>>
    where
        U: Clone + PartialEq + Send + 'static,
        F: FnMut(S) -> U + Send + 'static,
    {
        self.states().map(selector).distinct_until_changed()
    }

    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }
}

impl<S, A> Clone for Store<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Action,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Debug, Default, PartialEq)]
    struct AppState {
        count: usize,
        name: String,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum AppAction {
        Increment,
        Rename(String),
        Ping,
    }

    impl Action for AppAction {
        fn kind(&self) -> &str {
            match self {
                AppAction::Increment => "INCREMENT",
                AppAction::Rename(_) => "RENAME",
                AppAction::Ping => "PING",
            }
        }
    }

    fn reducer(state: &AppState, action: &AppAction) -> AppState {
        match action {
            AppAction::Increment => AppState {
                count: state.count + 1,
                ..state.clone()
            },
            AppAction::Rename(name) => AppState {
                name: name.clone(),
                ..state.clone()
            },
            AppAction::Ping => state.clone(),
        }
    }

    fn store() -> Store<AppState, AppAction> {
        Store::new(
            reducer,
            AppState {
                count: 0,
                name: "test".to_string(),
            },
        )
    }

    #[test]
    fn store_get_state() {
        let store = store();
        assert_eq!(store.get_state().count, 0);
        assert_eq!(store.get_state().name, "test");
    }

    #[test]
    fn store_dispatch() {
        let store = store();

        store.dispatch(AppAction::Increment);
        store.dispatch(AppAction::Increment);
        assert_eq!(store.get_state().count, 2);
        assert_eq!(store.get_state().name, "test");

        store.dispatch(AppAction::Rename("updated".to_string()));
        assert_eq!(store.get_state().name, "updated");
        assert_eq!(store.get_state().count, 2);
    }

    #[test]
    fn create_without_initial_state_uses_default() {
        let store: Store<AppState, AppAction> = create_rx_store(reducer, None);
        assert_eq!(store.get_state(), AppState::default());
    }

    #[test]
    fn store_subscribe() {
        let store = store();

        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let subscription = store.subscribe(move |_state: AppState| {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        });

        // current state is delivered on subscribe
        assert_eq!(call_count.load(Ordering::SeqCst), 1);

        store.dispatch(AppAction::Increment);
        assert_eq!(call_count.load(Ordering::SeqCst), 2);

        subscription.unsubscribe();
        store.dispatch(AppAction::Increment);
        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn watcher_sees_reduced_state() {
        let store = store();
        let observed = Arc::new(Mutex::new(Vec::new()));
        let sink = observed.clone();
        let states = store.states();

        store.add_watcher("INCREMENT", move |increments| {
            increments
                .tap(move |_: &AppAction| {
                    sink.lock().push(Behavior::<AppState, Infallible>::peek(&states).count)
                })
                .filter(|_: &AppAction| false)
        });

        store.dispatch(AppAction::Increment);
        assert_eq!(*observed.lock(), vec![1]);
    }

    #[test]
    fn watchers_fire_in_registration_order() {
        let store = store();
        store.add_watcher("PING", |pings| {
            pings.map(|_: AppAction| AppAction::Rename("first".to_string()))
        });
        store.add_watcher("PING", |pings| {
            pings.map(|_: AppAction| AppAction::Rename("second".to_string()))
        });

        store.dispatch(AppAction::Ping);
        assert_eq!(store.get_state().name, "second");
    }

    #[test]
    fn derived_actions_follow_their_cause() {
        let store = store();
        let kinds = Arc::new(Mutex::new(Vec::new()));
        let sink = kinds.clone();

        store.add_watcher("PING", |pings| pings.map(|_: AppAction| AppAction::Increment));
        store.add_watcher("INCREMENT", |increments| {
            increments.map(|_: AppAction| AppAction::Rename("derived".to_string()))
        });
        store
            .actions()
            .subscribe(move |action: AppAction| sink.lock().push(action.kind().to_string()));

        store.dispatch(AppAction::Ping);

        assert_eq!(*kinds.lock(), vec!["PING", "INCREMENT", "RENAME"]);
        assert_eq!(store.get_state().count, 1);
        assert_eq!(store.get_state().name, "derived");
    }

    #[test]
    fn state_subscriber_can_dispatch() {
        let store = store();
        let writer = store.clone();

        let _subscription = store
            .subscribe(move |state: AppState| {
                if state.count == 1 && state.name != "one" {
                    writer.dispatch(AppAction::Rename("one".to_string()));
                }
            })
            .unsubscribe_when_dropped();

        store.dispatch(AppAction::Increment);
        assert_eq!(store.get_state().name, "one");
    }

    #[test]
    fn watcher_loop_is_cut_off() {
        let store = Store::builder(reducer).max_dispatch_depth(5).build();
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = errors.clone();
        store
            .errors()
            .subscribe(move |error: StoreError| sink.lock().push(error.to_string()));

        store.add_watcher("INCREMENT", |increments| increments);
        store.dispatch(AppAction::Increment);

        assert_eq!(store.get_state().count, 5);
        assert_eq!(
            *errors.lock(),
            vec!["dispatch of `INCREMENT` exceeded depth limit of 5"]
        );

        // the limit applies per dispatch, not for the lifetime of the store
        store.dispatch(AppAction::Increment);
        assert_eq!(store.get_state().count, 10);
    }

    #[test]
    fn dispatch_after_actions_complete_is_refused() {
        let store = store();
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = errors.clone();
        store
            .errors()
            .subscribe(move |error: StoreError| sink.lock().push(error));

        store.actions().complete();
        store.dispatch(AppAction::Increment);

        assert_eq!(store.get_state().count, 0);
        assert_eq!(*errors.lock(), vec![StoreError::Closed]);
    }

    #[test]
    fn select_emits_distinct_projections() {
        let store = store();
        let names = Arc::new(Mutex::new(Vec::new()));
        let sink = names.clone();

        store
            .select(|state: AppState| state.name)
            .subscribe(move |name: String| sink.lock().push(name));

        store.dispatch(AppAction::Increment);
        store.dispatch(AppAction::Rename("next".to_string()));
        store.dispatch(AppAction::Increment);

        assert_eq!(*names.lock(), vec!["test", "next"]);
    }

    #[test]
    fn dropping_store_completes_streams() {
        let store = store();
        let completed = Arc::new(AtomicUsize::new(0));
        let on_state = completed.clone();
        let on_action = completed.clone();

        store
            .states()
            .on_complete(move || {
                on_state.fetch_add(1, Ordering::SeqCst);
            })
            .subscribe(|_: AppState| {});
        store
            .actions()
            .on_complete(move || {
                on_action.fetch_add(1, Ordering::SeqCst);
            })
            .subscribe(|_: AppAction| {});
        store.add_watcher("PING", |pings| pings.map(|_: AppAction| AppAction::Increment));

        drop(store);
        assert_eq!(completed.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn concurrent_dispatch_publishes_states_in_order() {
        let store = store();
        // (last count seen, whether a count ever went backwards)
        let seen = Arc::new(Mutex::new((0usize, false)));
        let sink = seen.clone();
        store.subscribe(move |state: AppState| {
            let mut seen = sink.lock();
            if state.count < seen.0 {
                seen.1 = true;
            }
            seen.0 = state.count;
        });

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        store.dispatch(AppAction::Increment);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let (last, went_backwards) = *seen.lock();
        assert!(!went_backwards);
        assert_eq!(last, 2000);
        assert_eq!(store.get_state().count, 2000);
    }
}
