use shared::Todo;
use web_sys::{HtmlInputElement, HtmlTextAreaElement};
use yew::prelude::*;

use crate::hooks::use_todos::{TodosState, UseTodosActions};

#[derive(Properties, PartialEq)]
pub struct TodoListProps {
    pub selected_date: String,
    pub state: TodosState,
    pub actions: UseTodosActions,
}

/// The todo list for one date: an add form at the top, then the day's todos
/// newest-first with inline editing for title and description.
#[function_component(TodoList)]
pub fn todo_list(props: &TodoListProps) -> Html {
    let title_input = use_node_ref();
    let description_input = use_node_ref();

    let on_add = {
        let title_input = title_input.clone();
        let description_input = description_input.clone();
        let add_todo = props.actions.add_todo.clone();

        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let Some(title) = title_input.cast::<HtmlInputElement>() else {
                return;
            };
            let Some(description) = description_input.cast::<HtmlInputElement>() else {
                return;
            };

            add_todo.emit((title.value(), description.value()));
            title.set_value("");
            description.set_value("");
        })
    };

    let items = if props.state.loading {
        html! { <p class="todo-list-status">{ "Loading..." }</p> }
    } else if props.state.todos.is_empty() {
        html! { <p class="todo-list-status">{ "No todos for this day yet." }</p> }
    } else {
        props
            .state
            .todos
            .iter()
            .map(|todo| render_item(todo, &props.actions))
            .collect::<Html>()
    };

    html! {
        <div class="todo-list">
            <h3 class="todo-list-title">{ format!("Todos for {}", props.selected_date) }</h3>

            <form class="todo-add-form" onsubmit={on_add}>
                <input
                    ref={title_input}
                    class="todo-add-title"
                    type="text"
                    placeholder="What needs doing?"
                />
                <input
                    ref={description_input}
                    class="todo-add-description"
                    type="text"
                    placeholder="Notes (optional)"
                />
                <button type="submit" class="todo-add-button">{ "Add" }</button>
            </form>

            if let Some(error) = &props.state.form_error {
                <p class="todo-form-error">{ error }</p>
            }

            <div class="todo-items">{ items }</div>
        </div>
    }
}

fn render_item(todo: &Todo, actions: &UseTodosActions) -> Html {
    html! {
        <TodoItem
            key={todo.id.to_string()}
            todo={todo.clone()}
            actions={actions.clone()}
        />
    }
}

#[derive(Properties, PartialEq)]
struct TodoItemProps {
    todo: Todo,
    actions: UseTodosActions,
}

#[function_component(TodoItem)]
fn todo_item(props: &TodoItemProps) -> Html {
    let editing_title = use_state(|| false);
    let editing_description = use_state(|| props.todo.description.is_some());

    let todo = &props.todo;
    let completed = todo.is_completed();

    let on_toggle = {
        let toggle_todo = props.actions.toggle_todo.clone();
        let id = todo.id;
        Callback::from(move |e: Event| {
            let Some(input) = e.target_dyn_into::<HtmlInputElement>() else {
                return;
            };
            toggle_todo.emit((id, input.checked()));
        })
    };

    let start_title_edit = {
        let editing_title = editing_title.clone();
        Callback::from(move |_: MouseEvent| editing_title.set(true))
    };

    let commit_rename = {
        let editing_title = editing_title.clone();
        let rename_todo = props.actions.rename_todo.clone();
        let id = todo.id;
        let current = todo.title.clone();
        Callback::from(move |e: FocusEvent| {
            editing_title.set(false);
            let Some(input) = e.target_dyn_into::<HtmlInputElement>() else {
                return;
            };
            let value = input.value();
            if value.trim() != current {
                rename_todo.emit((id, value));
            }
        })
    };

    let commit_describe = {
        let describe_todo = props.actions.describe_todo.clone();
        let id = todo.id;
        let current = todo.description.clone().unwrap_or_default();
        Callback::from(move |e: FocusEvent| {
            let Some(input) = e.target_dyn_into::<HtmlTextAreaElement>() else {
                return;
            };
            let value = input.value();
            if value.trim() != current {
                describe_todo.emit((id, value));
            }
        })
    };

    let show_description = {
        let editing_description = editing_description.clone();
        Callback::from(move |_: MouseEvent| editing_description.set(true))
    };

    let on_delete = {
        let delete_todo = props.actions.delete_todo.clone();
        let id = todo.id;
        Callback::from(move |_: MouseEvent| delete_todo.emit(id))
    };

    let title = if *editing_title {
        html! {
            <input
                class="todo-title-input"
                type="text"
                value={todo.title.clone()}
                onblur={commit_rename}
            />
        }
    } else {
        html! {
            <span
                class={classes!("todo-title", completed.then_some("todo-title-completed"))}
                onclick={start_title_edit}
            >
                { &todo.title }
            </span>
        }
    };

    let description = if *editing_description {
        html! {
            <textarea
                class="todo-description-input"
                placeholder="Notes"
                value={todo.description.clone().unwrap_or_default()}
                onblur={commit_describe}
            />
        }
    } else {
        html! {
            <button class="todo-note-button" onclick={show_description}>{ "+ note" }</button>
        }
    };

    html! {
        <div class="todo-item">
            <input
                class="todo-checkbox"
                type="checkbox"
                checked={completed}
                onchange={on_toggle}
            />
            <div class="todo-item-main">
                { title }
                { description }
            </div>
            <button class="todo-delete-button" title="Delete" onclick={on_delete}>
                { "x" }
            </button>
        </div>
    }
}
