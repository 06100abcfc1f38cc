//! Watchers and observers reacting to dispatched actions

use rxrust::prelude::*;
use rxstore::{create_observer, Action, ActionStream, ActionStreamExt, StateStream, Store, StoreError};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, Default)]
struct TodoState {
    todos: Vec<String>,
    last_added: Option<String>,
    notifications: Vec<String>,
}

#[derive(Clone, Debug)]
enum TodoAction {
    Add(String),
    Added(String),
    Notify(String),
}

impl Action for TodoAction {
    fn kind(&self) -> &str {
        match self {
            TodoAction::Add(_) => "ADD",
            TodoAction::Added(_) => "ADDED",
            TodoAction::Notify(_) => "NOTIFY",
        }
    }
}

fn reducer(state: &TodoState, action: &TodoAction) -> TodoState {
    let mut next = state.clone();
    match action {
        TodoAction::Add(title) => next.todos.push(title.clone()),
        TodoAction::Added(title) => next.last_added = Some(title.clone()),
        TodoAction::Notify(message) => next.notifications.push(message.clone()),
    }
    next
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trace"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let store = Store::builder(reducer).name("todos").build();

    // ADD -> ADDED
    store.add_watcher("ADD", |adds| {
        adds.filter_map(|action: TodoAction| match action {
            TodoAction::Add(title) => Some(TodoAction::Added(title)),
            _ => None,
        })
    });

    // ADDED -> NOTIFY, including how many todos exist at that point
    store.add_observer(create_observer(
        |actions: ActionStream<TodoAction>, state: StateStream<TodoState>| {
            actions
                .of_kind("ADDED")
                .with_latest_from_threads(state)
                .filter_map(|(action, todos): (TodoAction, TodoState)| match action {
                    TodoAction::Added(title) => Some(TodoAction::Notify(format!(
                        "added '{}' ({} total)",
                        title,
                        todos.todos.len()
                    ))),
                    _ => None,
                })
        },
    ));

    // refused dispatches end up here
    store.errors().subscribe(|error: StoreError| eprintln!("store error: {error}"));

    store.dispatch(TodoAction::Add("write docs".to_string()));
    store.dispatch(TodoAction::Add("ship release".to_string()));

    let state = store.get_state();
    println!("todos: {:?}", state.todos);
    println!("last added: {:?}", state.last_added);
    for notification in &state.notifications {
        println!("notification: {notification}");
    }
}
