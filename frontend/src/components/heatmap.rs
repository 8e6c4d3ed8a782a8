use chrono::{Local, NaiveDate};
use shared::{build_year_grid, heatmap_level, DaySummary, DAY_ABBREVS};
use std::collections::HashMap;
use yew::prelude::*;

use crate::state::day_summary;

#[derive(Properties, PartialEq)]
pub struct HeatmapProps {
    pub year: i32,
    pub summaries: HashMap<String, DaySummary>,
    pub selected_date: String,
    pub on_date_selected: Callback<String>,
}

/// GitHub-style contribution heatmap for one calendar year.
///
/// The component only lays out what the grid builder and the day summaries
/// hand it; it knows nothing about where the summaries came from.
#[function_component(Heatmap)]
pub fn heatmap(props: &HeatmapProps) -> Html {
    let grid = use_memo(props.year, |year| build_year_grid(*year));
    let today = Local::now().date_naive();

    let month_labels = grid
        .month_labels
        .iter()
        .enumerate()
        .map(|(index, label)| {
            // Each label spans its month's columns in the header row
            let width = format!("{}px", grid.label_span(index) * 14);
            html! {
                <div class="heatmap-month-label" style={format!("width: {};", width)}>
                    { label.month }
                </div>
            }
        })
        .collect::<Html>();

    let day_labels = DAY_ABBREVS
        .iter()
        .map(|day| {
            html! { <div class="heatmap-day-label">{ *day }</div> }
        })
        .collect::<Html>();

    let weeks = grid
        .weeks
        .iter()
        .map(|week| {
            let cells = week
                .iter()
                .map(|slot| render_cell(props, *slot, today))
                .collect::<Html>();
            html! { <div class="heatmap-week">{ cells }</div> }
        })
        .collect::<Html>();

    html! {
        <div class="heatmap">
            <h3 class="heatmap-title">{ format!("{} Contributions", props.year) }</h3>
            <div class="heatmap-months">{ month_labels }</div>
            <div class="heatmap-body">
                <div class="heatmap-day-labels">{ day_labels }</div>
                <div class="heatmap-weeks">{ weeks }</div>
            </div>
        </div>
    }
}

fn render_cell(props: &HeatmapProps, slot: Option<NaiveDate>, today: NaiveDate) -> Html {
    let Some(date) = slot else {
        // Padding slot outside the year (first/last column only)
        return html! { <div class="heatmap-cell heatmap-cell-blank"></div> };
    };

    let date_key = date.format("%Y-%m-%d").to_string();
    let is_future = date > today;

    let summary = day_summary(&props.summaries, &date_key);
    let total = summary.todos.len() as u32;
    let level = heatmap_level(summary.completed_count, total);

    let class = if is_future {
        "heatmap-cell heatmap-cell-future".to_string()
    } else {
        format!("heatmap-cell heatmap-cell-level-{}", level)
    };
    let selected = (date_key == props.selected_date).then_some("heatmap-cell-selected");

    let title = format!("{}: {}/{} todos completed", date_key, summary.completed_count, total);

    let onclick = {
        let on_date_selected = props.on_date_selected.clone();
        let date_key = date_key.clone();
        Callback::from(move |_: MouseEvent| {
            if !is_future {
                on_date_selected.emit(date_key.clone());
            }
        })
    };

    html! {
        <button
            class={classes!(class, selected)}
            {title}
            disabled={is_future}
            {onclick}
        />
    }
}
