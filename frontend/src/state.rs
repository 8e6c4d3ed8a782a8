//! Local todo-list state and the optimistic mutation rules applied to it.
//!
//! Every user-initiated mutation edits this in-memory view immediately, then
//! the hook layer issues the request and reconciles by refetching: on success
//! the server snapshot replaces the guess (including any provisional ID), on
//! failure the refetch restores the last known-good state. Keeping the
//! transforms pure makes the whole policy testable without a browser.

use shared::{DaySummary, Todo, UpdateTodoRequest};
use std::collections::HashMap;

/// Current time as RFC 3339 UTC with millisecond precision, used to stamp
/// optimistic completions until the server's timestamp arrives
pub fn now_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Total lookup over the fetched year summaries: days without activity get
/// a well-formed empty summary, never an absence the grid would trip over
pub fn day_summary(summaries: &HashMap<String, DaySummary>, date: &str) -> DaySummary {
    summaries
        .get(date)
        .cloned()
        .unwrap_or_else(|| DaySummary::empty(date))
}

/// Hands out provisional IDs for todos created optimistically.
///
/// IDs are negative and strictly decreasing, so they can never collide with
/// store-issued (positive) IDs and later optimistic edits can target the new
/// todo before the server responds. They are discarded on reconciliation.
#[derive(Debug, Clone)]
pub struct TempIdAllocator {
    next: i64,
}

impl TempIdAllocator {
    pub fn new() -> Self {
        Self { next: -1 }
    }

    pub fn allocate(&mut self) -> i64 {
        let id = self.next;
        self.next -= 1;
        id
    }
}

impl Default for TempIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Guards against stale in-flight responses. Each refetch (and each change
/// of the date/year key) bumps the generation; a response is applied only if
/// its captured generation is still current.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchGeneration(u64);

impl FetchGeneration {
    pub fn bump(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }

    pub fn is_current(&self, captured: u64) -> bool {
        self.0 == captured
    }
}

/// Prepend a provisionally-created todo, mirroring the store's newest-first
/// ordering for same-day creations
pub fn optimistic_add(
    todos: &[Todo],
    temp_id: i64,
    title: &str,
    description: Option<&str>,
    date: &str,
) -> Vec<Todo> {
    let provisional = Todo {
        id: temp_id,
        owner_id: String::new(),
        title: title.to_string(),
        description: description.map(str::to_string),
        created_at: format!("{date}T00:00:00.000Z"),
        completed_at: None,
        deleted_at: None,
    };

    let mut next = Vec::with_capacity(todos.len() + 1);
    next.push(provisional);
    next.extend_from_slice(todos);
    next
}

/// Apply a partial update to the targeted todo, leaving the rest untouched.
/// `now` stands in for the server's completion timestamp until reconciliation.
pub fn optimistic_update(todos: &[Todo], id: i64, request: &UpdateTodoRequest, now: &str) -> Vec<Todo> {
    todos
        .iter()
        .map(|todo| {
            if todo.id != id {
                return todo.clone();
            }

            let mut updated = todo.clone();
            if let Some(title) = &request.title {
                updated.title = title.trim().to_string();
            }
            if let Some(description) = request.description.as_deref() {
                let description = description.trim();
                updated.description =
                    (!description.is_empty()).then(|| description.to_string());
            }
            match request.completed {
                Some(true) => {
                    if updated.completed_at.is_none() {
                        updated.completed_at = Some(now.to_string());
                    }
                }
                Some(false) => updated.completed_at = None,
                None => {}
            }
            updated
        })
        .collect()
}

/// Drop the targeted todo from the local view (the store only soft-deletes)
pub fn optimistic_delete(todos: &[Todo], id: i64) -> Vec<Todo> {
    todos.iter().filter(|todo| todo.id != id).cloned().collect()
}
