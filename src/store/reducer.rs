//! Reducer trait for state transitions.

/// Reducer transforms state based on actions.
///
/// The reducer is the only place where state transitions happen. It must
/// be a pure function: `(State, Action) -> State`. It runs while the
/// action stream is emitting, ahead of every watcher.
///
/// Any `Fn(&S, &A) -> S` closure is a reducer.
pub trait Reducer<S, A>: Send + Sync + 'static {
    /// Produce the next state.
    fn reduce(&self, state: &S, action: &A) -> S;
}

impl<S, A, F> Reducer<S, A> for F
where
    F: Fn(&S, &A) -> S + Send + Sync + 'static,
{
    fn reduce(&self, state: &S, action: &A) -> S {
        self(state, action)
    }
}
