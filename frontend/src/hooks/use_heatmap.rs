use shared::DaySummary;
use std::collections::HashMap;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::services::api::ApiClient;
use crate::state::FetchGeneration;

#[derive(Clone, PartialEq)]
pub struct HeatmapState {
    /// Summaries keyed by `YYYY-MM-DD`; only days with activity are present.
    /// Use `state::day_summary` for a total lookup.
    pub summaries: HashMap<String, DaySummary>,
    pub loading: bool,
}

pub struct UseHeatmapResult {
    pub state: HeatmapState,
    pub actions: UseHeatmapActions,
}

#[derive(Clone)]
pub struct UseHeatmapActions {
    pub refresh: Callback<()>,
}

/// Year-level aggregation feed for the contribution heatmap. Refetches when
/// the year changes; responses for a superseded year are dropped.
#[hook]
pub fn use_heatmap(api_client: &ApiClient, year: i32) -> UseHeatmapResult {
    let summaries = use_state(HashMap::<String, DaySummary>::new);
    let loading = use_state(|| true);
    let generation = use_mut_ref(FetchGeneration::default);

    let refresh = {
        let api_client = api_client.clone();
        let summaries = summaries.clone();
        let loading = loading.clone();
        let generation = generation.clone();

        use_callback(year, move |_, year| {
            let api_client = api_client.clone();
            let summaries = summaries.clone();
            let loading = loading.clone();
            let generation = generation.clone();
            let year = *year;

            let captured = generation.borrow_mut().bump();
            spawn_local(async move {
                loading.set(true);

                let result = api_client.get_heatmap(year).await;
                if !generation.borrow().is_current(captured) {
                    // Superseded by a newer fetch, which now owns both the
                    // summaries and the loading flag
                    return;
                }

                match result {
                    Ok(data) => {
                        summaries.set(data.into_iter().map(|s| (s.date.clone(), s)).collect());
                    }
                    Err(e) => {
                        gloo::console::error!("Failed to fetch heatmap data:", e);
                    }
                }
                loading.set(false);
            });
        })
    };

    // Refetch whenever the year changes
    use_effect_with(year, {
        let refresh = refresh.clone();
        move |_| {
            refresh.emit(());
            || ()
        }
    });

    let state = HeatmapState {
        summaries: (*summaries).clone(),
        loading: *loading,
    };

    UseHeatmapResult {
        state,
        actions: UseHeatmapActions { refresh },
    }
}
