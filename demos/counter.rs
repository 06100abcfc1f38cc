//! Counter application driven by dispatched actions

use rxrust::prelude::*;
use rxstore::{Action, Store};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, Default)]
struct CounterState {
    count: i32,
    step: i32,
    history: Vec<i32>,
}

#[derive(Clone, Debug)]
enum CounterAction {
    Increment,
    Decrement,
    SetStep(i32),
    Reset,
}

impl Action for CounterAction {
    fn kind(&self) -> &str {
        match self {
            CounterAction::Increment => "INCREMENT",
            CounterAction::Decrement => "DECREMENT",
            CounterAction::SetStep(_) => "SET_STEP",
            CounterAction::Reset => "RESET",
        }
    }
}

fn reducer(state: &CounterState, action: &CounterAction) -> CounterState {
    let mut next = state.clone();
    match action {
        CounterAction::Increment => next.count += state.step,
        CounterAction::Decrement => next.count -= state.step,
        CounterAction::SetStep(step) => next.step = *step,
        CounterAction::Reset => next.count = 0,
    }
    if next.count != state.count {
        next.history.push(next.count);
    }
    next
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

fn main() {
    init_tracing();
    println!("=== Counter Application ===\n");

    let store = Store::builder(reducer)
        .name("counter")
        .initial_state(CounterState {
            count: 0,
            step: 1,
            history: vec![0],
        })
        .build();

    let subscription = store.subscribe(|state: CounterState| {
        println!("   [State] Count: {}, Step: {}", state.count, state.step);
    });

    let parity = store.select(|state: CounterState| state.count % 2 == 0);
    parity.subscribe(|even: bool| {
        println!("   [Parity] {}", if even { "even" } else { "odd" });
    });

    println!("\n1. Incrementing twice");
    store.dispatch(CounterAction::Increment);
    store.dispatch(CounterAction::Increment);

    println!("\n2. Changing step to 5 and decrementing");
    store.dispatch(CounterAction::SetStep(5));
    store.dispatch(CounterAction::Decrement);

    println!("\n3. Reset");
    store.dispatch(CounterAction::Reset);

    subscription.unsubscribe();
    store.dispatch(CounterAction::Increment);

    println!("\nHistory: {:?}", store.get_state().history);
}
