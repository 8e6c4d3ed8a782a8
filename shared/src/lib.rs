use serde::{Deserialize, Serialize};

pub mod grid;

pub use grid::{build_year_grid, MonthLabel, WeekColumn, YearGrid, DAY_ABBREVS, MONTH_ABBREVS};

/// Maximum length of a todo title after trimming
pub const MAX_TITLE_LEN: usize = 200;
/// Maximum length of a todo description after trimming
pub const MAX_DESCRIPTION_LEN: usize = 1000;

/// A single todo item owned by a user.
///
/// The date component of `created_at` decides which heatmap bucket the todo
/// belongs to and never changes after creation. Completion is tracked through
/// `completed_at` alone; deletion is always soft via `deleted_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    /// ID of the user this todo belongs to
    pub owner_id: String,
    /// Title of the todo (trimmed, max 200 characters)
    pub title: String,
    /// Optional longer description (trimmed, max 1000 characters)
    pub description: Option<String>,
    /// RFC 3339 timestamp with millisecond precision
    pub created_at: String,
    /// Set if and only if the todo is completed
    pub completed_at: Option<String>,
    /// Set when the todo has been soft-deleted; such rows are excluded from all reads
    pub deleted_at: Option<String>,
}

impl Todo {
    /// Whether this todo counts as completed
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// The `YYYY-MM-DD` bucket key derived from the creation timestamp
    pub fn created_date(&self) -> &str {
        self.created_at.split('T').next().unwrap_or(&self.created_at)
    }
}

/// Per-day rollup of todos, derived from the store and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    /// Bucket key in `YYYY-MM-DD` format
    pub date: String,
    /// Number of completed todos in this bucket
    pub completed_count: u32,
    /// Todos in this bucket, most recently created first
    pub todos: Vec<Todo>,
}

impl DaySummary {
    /// A well-formed summary for a day with no activity
    pub fn empty(date: &str) -> Self {
        Self {
            date: date.to_string(),
            completed_count: 0,
            todos: Vec::new(),
        }
    }
}

/// Request for creating a new todo
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateTodoRequest {
    pub title: String,
    pub description: Option<String>,
    /// Optional target date (`YYYY-MM-DD`) - uses the current date if not provided
    pub date: Option<String>,
}

/// Partial update for an existing todo; at least one field must be present
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdateTodoRequest {
    /// New title (trimmed, must be non-empty if present)
    pub title: Option<String>,
    /// New description; an empty string clears it
    pub description: Option<String>,
    /// Sets or clears `completed_at` together with the completion flag
    pub completed: Option<bool>,
}

/// Acknowledgement returned by mutations that do not echo the record back
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MutationAck {
    pub success: bool,
}

/// Classify a day's completion ratio into a heatmap intensity level 0-4.
///
/// A day with no todos at all maps to level 0, deliberately indistinguishable
/// from a day where nothing was completed.
pub fn heatmap_level(completed_count: u32, total_count: u32) -> u8 {
    if total_count == 0 {
        return 0;
    }
    let ratio = completed_count as f64 / total_count as f64;
    if ratio == 0.0 {
        0
    } else if ratio <= 0.25 {
        1
    } else if ratio <= 0.50 {
        2
    } else if ratio <= 0.75 {
        3
    } else {
        4
    }
}

/// Trim and bound-check todo input, normalizing an empty description to `None`.
///
/// Both the backend (authoritatively) and the frontend (to block a mutation
/// before any optimistic state is shown) run the same checks.
pub fn validate_todo_input(
    title: &str,
    description: Option<&str>,
) -> Result<(String, Option<String>), String> {
    let title = title.trim();
    if title.is_empty() {
        return Err("Title is required".to_string());
    }
    if title.len() > MAX_TITLE_LEN {
        return Err("Title too long".to_string());
    }

    let description = match description.map(str::trim) {
        Some("") | None => None,
        Some(d) => {
            validate_description(d)?;
            Some(d.to_string())
        }
    };

    Ok((title.to_string(), description))
}

/// Bound-check a description on its own, for partial updates where an empty
/// string means "clear" and must not be normalized away
pub fn validate_description(description: &str) -> Result<(), String> {
    if description.trim().len() > MAX_DESCRIPTION_LEN {
        return Err("Description too long".to_string());
    }
    Ok(())
}

/// Check that a string is a plausible `YYYY-MM-DD` calendar date
pub fn is_valid_date_key(date: &str) -> bool {
    chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok()
}
