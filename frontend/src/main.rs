use chrono::{Datelike, Local, NaiveDate};
use yew::prelude::*;

mod components;
mod hooks;
mod services;
mod state;

use components::{Header, Heatmap, TodoList};
use hooks::{use_heatmap, use_todos};
use services::ApiClient;

fn today_key() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}

#[function_component(App)]
fn app() -> Html {
    let selected_date = use_state(today_key);
    let year = use_state(|| Local::now().date_naive().year());

    let api_client = use_memo((), |_| ApiClient::new());

    let heatmap = use_heatmap(&api_client, *year);

    // Each successful todo mutation re-aggregates the year view
    let on_mutated = {
        let refresh = heatmap.actions.refresh.clone();
        Callback::from(move |_| refresh.emit(()))
    };
    let todos = use_todos(&api_client, &selected_date, on_mutated);

    // Picking a date in another year also moves the heatmap to that year
    let on_date_selected = {
        let selected_date = selected_date.clone();
        let year = year.clone();
        Callback::from(move |date: String| {
            if let Ok(parsed) = NaiveDate::parse_from_str(&date, "%Y-%m-%d") {
                if parsed.year() != *year {
                    year.set(parsed.year());
                }
            }
            selected_date.set(date);
        })
    };

    html! {
        <div class="app">
            <Header
                selected_date={(*selected_date).clone()}
                on_date_selected={on_date_selected.clone()}
            />
            <main class="app-main">
                <TodoList
                    selected_date={(*selected_date).clone()}
                    state={todos.state.clone()}
                    actions={todos.actions.clone()}
                />
                <Heatmap
                    year={*year}
                    summaries={heatmap.state.summaries.clone()}
                    selected_date={(*selected_date).clone()}
                    on_date_selected={on_date_selected}
                />
            </main>
        </div>
    }
}

fn main() {
    yew::Renderer::<App>::new().render();
}
