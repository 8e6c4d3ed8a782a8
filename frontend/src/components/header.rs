use chrono::{Duration, Local, NaiveDate};
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct HeaderProps {
    pub selected_date: String,
    pub on_date_selected: Callback<String>,
}

/// App header: title plus day-by-day navigation around the selected date.
#[function_component(Header)]
pub fn header(props: &HeaderProps) -> Html {
    let parsed = NaiveDate::parse_from_str(&props.selected_date, "%Y-%m-%d").ok();

    let display_date = parsed
        .map(|date| date.format("%B %-d, %Y").to_string())
        .unwrap_or_else(|| props.selected_date.clone());

    let shift_day = |days: i64| {
        let on_date_selected = props.on_date_selected.clone();
        Callback::from(move |_: MouseEvent| {
            if let Some(date) = parsed {
                let shifted = date + Duration::days(days);
                on_date_selected.emit(shifted.format("%Y-%m-%d").to_string());
            }
        })
    };

    let go_today = {
        let on_date_selected = props.on_date_selected.clone();
        Callback::from(move |_: MouseEvent| {
            on_date_selected.emit(Local::now().date_naive().format("%Y-%m-%d").to_string());
        })
    };

    html! {
        <header class="app-header">
            <h1 class="app-title">{ "streakmark" }</h1>
            <div class="date-nav">
                <button class="date-nav-button" onclick={shift_day(-1)}>{ "<" }</button>
                <span class="date-nav-current">{ display_date }</span>
                <button class="date-nav-button" onclick={shift_day(1)}>{ ">" }</button>
                <button class="date-nav-today" onclick={go_today}>{ "Today" }</button>
            </div>
        </header>
    }
}
