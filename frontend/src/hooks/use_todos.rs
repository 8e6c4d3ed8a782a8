use shared::{validate_description, validate_todo_input, CreateTodoRequest, Todo, UpdateTodoRequest};
use std::rc::Rc;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::services::api::ApiClient;
use crate::state::{
    optimistic_add, optimistic_delete, optimistic_update, now_timestamp, FetchGeneration,
    TempIdAllocator,
};

/// The selected day's todo list, mutated only through the reducer.
///
/// Mutation callbacks are memoized, so a closure created on one render keeps
/// running on later ones; dispatching through a reducer means every action
/// is applied to the list as it exists at dispatch time, never to the
/// snapshot the closure happened to capture.
#[derive(Clone, PartialEq, Default)]
struct DayTodos {
    todos: Vec<Todo>,
}

enum DayTodosAction {
    /// Server truth from a (re)fetch replaces the whole list, confirming or
    /// rolling back any optimistic guesses
    Loaded(Vec<Todo>),
    Added {
        temp_id: i64,
        title: String,
        description: Option<String>,
        date: String,
    },
    Edited {
        id: i64,
        request: UpdateTodoRequest,
        now: String,
    },
    Removed {
        id: i64,
    },
}

impl Reducible for DayTodos {
    type Action = DayTodosAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let todos = match action {
            DayTodosAction::Loaded(todos) => todos,
            DayTodosAction::Added { temp_id, title, description, date } => {
                optimistic_add(&self.todos, temp_id, &title, description.as_deref(), &date)
            }
            DayTodosAction::Edited { id, request, now } => {
                optimistic_update(&self.todos, id, &request, &now)
            }
            DayTodosAction::Removed { id } => optimistic_delete(&self.todos, id),
        };
        Rc::new(Self { todos })
    }
}

#[derive(Clone, PartialEq)]
pub struct TodosState {
    pub todos: Vec<Todo>,
    pub loading: bool,
    pub form_error: Option<String>,
}

pub struct UseTodosResult {
    pub state: TodosState,
    pub actions: UseTodosActions,
}

#[derive(Clone, PartialEq)]
pub struct UseTodosActions {
    pub refresh: Callback<()>,
    /// (title, description)
    pub add_todo: Callback<(String, String)>,
    /// (id, completed)
    pub toggle_todo: Callback<(i64, bool)>,
    /// (id, new title)
    pub rename_todo: Callback<(i64, String)>,
    /// (id, new description; empty clears)
    pub describe_todo: Callback<(i64, String)>,
    pub delete_todo: Callback<i64>,
}

/// Todo list for one date with optimistic mutations.
///
/// Every mutation dispatches its effect to local state immediately, then
/// issues the request and reconciles by refetching the date's todos - on
/// success to adopt server truth (replacing any provisional ID), on failure
/// to roll the guess back. `on_mutated` fires after each successful mutation
/// so the heatmap can re-aggregate without a page reload.
#[hook]
pub fn use_todos(api_client: &ApiClient, selected_date: &str, on_mutated: Callback<()>) -> UseTodosResult {
    let todos = use_reducer(DayTodos::default);
    let loading = use_state(|| true);
    let form_error = use_state(|| Option::<String>::None);

    let temp_ids = use_mut_ref(TempIdAllocator::new);
    // Bumped on every refetch and key change; stale responses are dropped
    let generation = use_mut_ref(FetchGeneration::default);

    // Refresh todos for the current date
    let refresh = {
        let api_client = api_client.clone();
        let todos = todos.dispatcher();
        let loading = loading.clone();
        let generation = generation.clone();
        let date = selected_date.to_string();

        use_callback(date.clone(), move |_, date| {
            let api_client = api_client.clone();
            let todos = todos.clone();
            let loading = loading.clone();
            let generation = generation.clone();
            let date = date.clone();

            let captured = generation.borrow_mut().bump();
            spawn_local(async move {
                loading.set(true);

                let result = api_client.list_todos(&date).await;
                if !generation.borrow().is_current(captured) {
                    // Superseded by a newer fetch, which now owns both the
                    // list and the loading flag
                    return;
                }

                match result {
                    Ok(data) => todos.dispatch(DayTodosAction::Loaded(data)),
                    Err(e) => {
                        gloo::console::error!("Failed to fetch todos:", e);
                    }
                }
                loading.set(false);
            });
        })
    };

    // Shared tail for every mutation: refetch to reconcile; on success also
    // notify so the heatmap re-aggregates
    let reconcile = {
        let refresh = refresh.clone();
        let form_error = form_error.clone();
        let on_mutated = on_mutated.clone();

        move |result: Result<(), String>| {
            match result {
                Ok(()) => {
                    on_mutated.emit(());
                }
                Err(error_message) => {
                    form_error.set(Some(error_message));
                }
            }
            // Source of truth wins over the optimistic guess either way
            refresh.emit(());
        }
    };

    // Add todo callback
    let add_todo = {
        let api_client = api_client.clone();
        let todos = todos.dispatcher();
        let form_error = form_error.clone();
        let temp_ids = temp_ids.clone();
        let reconcile = reconcile.clone();
        let date = selected_date.to_string();

        use_callback(date.clone(), move |(title, description): (String, String), date| {
            // Validation failures block the mutation before any optimistic
            // state is shown
            let (title, description) = match validate_todo_input(&title, Some(&description)) {
                Ok(cleaned) => cleaned,
                Err(message) => {
                    form_error.set(Some(message));
                    return;
                }
            };
            form_error.set(None);

            let temp_id = temp_ids.borrow_mut().allocate();
            todos.dispatch(DayTodosAction::Added {
                temp_id,
                title: title.clone(),
                description: description.clone(),
                date: date.clone(),
            });

            let api_client = api_client.clone();
            let reconcile = reconcile.clone();
            let request = CreateTodoRequest {
                title,
                description,
                date: Some(date.clone()),
            };

            spawn_local(async move {
                reconcile(api_client.create_todo(request).await.map(|_| ()));
            });
        })
    };

    // Toggle completion callback
    let toggle_todo = {
        let api_client = api_client.clone();
        let todos = todos.dispatcher();
        let reconcile = reconcile.clone();

        use_callback((), move |(id, completed): (i64, bool), _| {
            let request = UpdateTodoRequest {
                title: None,
                description: None,
                completed: Some(completed),
            };
            todos.dispatch(DayTodosAction::Edited {
                id,
                request: request.clone(),
                now: now_timestamp(),
            });

            let api_client = api_client.clone();
            let reconcile = reconcile.clone();
            spawn_local(async move {
                reconcile(api_client.update_todo(id, request).await.map(|_| ()));
            });
        })
    };

    // Rename callback
    let rename_todo = {
        let api_client = api_client.clone();
        let todos = todos.dispatcher();
        let form_error = form_error.clone();
        let reconcile = reconcile.clone();

        use_callback((), move |(id, title): (i64, String), _| {
            if let Err(message) = validate_todo_input(&title, None) {
                form_error.set(Some(message));
                return;
            }
            form_error.set(None);

            let request = UpdateTodoRequest {
                title: Some(title),
                description: None,
                completed: None,
            };
            todos.dispatch(DayTodosAction::Edited {
                id,
                request: request.clone(),
                now: now_timestamp(),
            });

            let api_client = api_client.clone();
            let reconcile = reconcile.clone();
            spawn_local(async move {
                reconcile(api_client.update_todo(id, request).await.map(|_| ()));
            });
        })
    };

    // Edit description callback; an empty string clears
    let describe_todo = {
        let api_client = api_client.clone();
        let todos = todos.dispatcher();
        let form_error = form_error.clone();
        let reconcile = reconcile.clone();

        use_callback((), move |(id, description): (i64, String), _| {
            if let Err(message) = validate_description(&description) {
                form_error.set(Some(message));
                return;
            }
            form_error.set(None);

            let request = UpdateTodoRequest {
                title: None,
                description: Some(description),
                completed: None,
            };
            todos.dispatch(DayTodosAction::Edited {
                id,
                request: request.clone(),
                now: now_timestamp(),
            });

            let api_client = api_client.clone();
            let reconcile = reconcile.clone();
            spawn_local(async move {
                reconcile(api_client.update_todo(id, request).await.map(|_| ()));
            });
        })
    };

    // Delete callback
    let delete_todo = {
        let api_client = api_client.clone();
        let todos = todos.dispatcher();
        let reconcile = reconcile.clone();

        use_callback((), move |id: i64, _| {
            todos.dispatch(DayTodosAction::Removed { id });

            let api_client = api_client.clone();
            let reconcile = reconcile.clone();
            spawn_local(async move {
                reconcile(api_client.delete_todo(id).await.map(|_| ()));
            });
        })
    };

    // Refetch whenever the selected date changes
    use_effect_with(selected_date.to_string(), {
        let refresh = refresh.clone();
        move |_| {
            refresh.emit(());
            || ()
        }
    });

    let state = TodosState {
        todos: todos.todos.clone(),
        loading: *loading,
        form_error: (*form_error).clone(),
    };

    let actions = UseTodosActions {
        refresh,
        add_todo,
        toggle_todo,
        rename_todo,
        describe_todo,
        delete_todo,
    };

    UseTodosResult { state, actions }
}
