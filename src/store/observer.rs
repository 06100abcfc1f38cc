use std::convert::Infallible;

use rxrust::prelude::*;

use crate::store::{Action, ActionStream, Dispatcher, StateStream, Store};

/// Subscribe `pipeline` so that everything it emits is dispatched.
///
/// Watchers and observers both go through here, so their output takes the
/// same path as [`Store::dispatch`].
pub(crate) fn observe<S, A, P>(pipeline: P, dispatcher: Dispatcher<S, A>) -> BoxSubscriptionThreads
where
    S: Clone + Send + Sync + 'static,
    A: Action,
    P: Observable<A, Infallible, Dispatcher<S, A>>,
    P::Unsub: Send + 'static,
{
    BoxSubscriptionThreads::new(pipeline.actual_subscribe(dispatcher))
}

/// A pipeline over a store's action and state streams, ready to attach.
///
/// Built with [`create_observer`] and registered with
/// [`Store::add_observer`].
pub struct StoreObserver<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Action,
{
    attach: Box<dyn FnOnce(&Store<S, A>) -> BoxSubscriptionThreads + Send>,
}

impl<S, A> StoreObserver<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Action,
{
    /// Subscribe the pipeline to `store`. Dropping the returned
    /// subscription does not stop it; call `unsubscribe`.
    pub fn attach(self, store: &Store<S, A>) -> BoxSubscriptionThreads {
        (self.attach)(store)
    }
}

/// Wrap an action pipeline as an observer for
/// [`Store::add_observer`](crate::Store::add_observer).
///
/// `pipeline` receives the action stream and the state stream and returns
/// a stream of actions; every action it emits is dispatched into the
/// store, with the same logging and depth limit as a watcher's output.
///
/// # Example
///
/// ```ignore
/// // after every START, dispatch DONE carrying the current attempt count
/// let done = create_observer(|actions: ActionStream<Job>, state: StateStream<JobState>| {
///     actions
///         .of_kind("START")
///         .with_latest_from_threads(state)
///         .map(|(_, s): (Job, JobState)| Job::Done(s.attempts))
/// });
/// store.add_observer(done);
/// ```
pub fn create_observer<S, A, F, P>(pipeline: F) -> StoreObserver<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Action,
    F: FnOnce(ActionStream<A>, StateStream<S>) -> P + Send + 'static,
    P: Observable<A, Infallible, Dispatcher<S, A>>,
    P::Unsub: Send + 'static,
{
    StoreObserver {
        attach: Box::new(move |store: &Store<S, A>| {
            let output = pipeline(store.actions(), store.states());
            observe(output, store.dispatcher("observer"))
        }),
    }
}
