//! Action trait for dispatched state changes.

use rxrust::ops::filter::FilterOp;
use rxrust::prelude::*;

use crate::store::ActionStream;

/// An intent to change the state of a [`Store`](crate::Store).
///
/// Actions are cloned to every subscriber of the action stream, and
/// watchers select them by [`kind`](Action::kind).
pub trait Action: Clone + Send + Sync + 'static {
    /// Discriminator used to route the action to watchers.
    fn kind(&self) -> &str;
}

/// Predicate selecting actions of one kind.
pub type KindFilter<A> = Box<dyn Fn(&A) -> bool + Send>;

/// Action stream narrowed to a single kind.
pub type OfKind<A> = FilterOp<ActionStream<A>, KindFilter<A>>;

/// Kind filtering for action streams.
pub trait ActionStreamExt<A> {
    /// Keep only actions whose [`kind`](Action::kind) equals `kind`.
    fn of_kind(self, kind: impl Into<String>) -> OfKind<A>;
}

impl<A: Action> ActionStreamExt<A> for ActionStream<A> {
    fn of_kind(self, kind: impl Into<String>) -> OfKind<A> {
        let kind = kind.into();
        let matches: KindFilter<A> = Box::new(move |action: &A| action.kind() == kind);
        self.filter(matches)
    }
}
