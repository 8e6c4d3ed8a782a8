use crate::db::DbConnection;
use chrono::Utc;
use shared::{is_valid_date_key, validate_todo_input, CreateTodoRequest, DaySummary, Todo, UpdateTodoRequest};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::info;

/// Error taxonomy for todo operations. Every variant maps to one HTTP
/// status in the REST layer; the client treats NotFound and Storage the
/// same way (roll back and re-sync).
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("no valid session presented")]
    Unauthenticated,
    #[error("{0}")]
    Validation(String),
    #[error("todo not found")]
    NotFound,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub type DomainResult<T> = Result<T, DomainError>;

/// Current time as an RFC 3339 UTC timestamp with millisecond precision,
/// the only timestamp format that crosses the API boundary
pub fn now_rfc3339() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Todo CRUD scoped to an authenticated owner
#[derive(Clone)]
pub struct TodoService {
    db: DbConnection,
}

impl TodoService {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Resolve a bearer token to the owning user ID
    pub async fn resolve_session(&self, token: Option<&str>) -> DomainResult<String> {
        let Some(token) = token else {
            return Err(DomainError::Unauthenticated);
        };
        self.db
            .session_owner(token)
            .await?
            .ok_or(DomainError::Unauthenticated)
    }

    /// Create a todo for the owner, dated now or at an explicit target date
    pub async fn create_todo(&self, owner_id: &str, request: CreateTodoRequest) -> DomainResult<Todo> {
        let (title, description) =
            validate_todo_input(&request.title, request.description.as_deref())
                .map_err(DomainError::Validation)?;

        let created_at = match request.date.as_deref() {
            Some(date) if is_valid_date_key(date) => format!("{date}T00:00:00.000Z"),
            Some(_) => {
                return Err(DomainError::Validation(
                    "Invalid date format (YYYY-MM-DD)".to_string(),
                ));
            }
            None => now_rfc3339(),
        };

        let todo = self
            .db
            .create_todo(owner_id, &title, description.as_deref(), &created_at)
            .await?;

        info!("Created todo {} for {} in bucket {}", todo.id, owner_id, todo.created_date());
        Ok(todo)
    }

    /// List the owner's todos for one date, newest first; defaults to today
    pub async fn list_for_date(&self, owner_id: &str, date: Option<&str>) -> DomainResult<Vec<Todo>> {
        let today = now_rfc3339();
        let date = match date {
            Some(date) if is_valid_date_key(date) => date,
            Some(_) => {
                return Err(DomainError::Validation(
                    "Invalid date format (YYYY-MM-DD)".to_string(),
                ));
            }
            None => today.split('T').next().unwrap_or(&today),
        };

        Ok(self.db.list_todos_for_date(owner_id, date).await?)
    }

    /// Apply a partial update: rename, re-describe, or toggle completion.
    /// `completed_at` moves together with the completion flag.
    pub async fn update_todo(
        &self,
        owner_id: &str,
        id: i64,
        request: UpdateTodoRequest,
    ) -> DomainResult<()> {
        if request.title.is_none() && request.description.is_none() && request.completed.is_none() {
            return Err(DomainError::Validation("No valid fields to update".to_string()));
        }

        let current = self
            .db
            .get_todo(owner_id, id)
            .await?
            .ok_or(DomainError::NotFound)?;

        let title = match request.title.as_deref() {
            Some(title) => {
                let (title, _) = validate_todo_input(title, None).map_err(DomainError::Validation)?;
                title
            }
            None => current.title,
        };

        // An explicit empty string clears the description
        let description = match request.description.as_deref().map(str::trim) {
            Some("") => None,
            Some(d) => {
                shared::validate_description(d).map_err(DomainError::Validation)?;
                Some(d.to_string())
            }
            None => current.description,
        };

        let completed_at = match request.completed {
            Some(true) => current.completed_at.or_else(|| Some(now_rfc3339())),
            Some(false) => None,
            None => current.completed_at,
        };

        let updated = self
            .db
            .store_todo_fields(owner_id, id, &title, description.as_deref(), completed_at.as_deref())
            .await?;
        if !updated {
            return Err(DomainError::NotFound);
        }

        info!("Updated todo {} for {}", id, owner_id);
        Ok(())
    }

    /// Soft-delete a todo; reads stop returning it but the row survives
    pub async fn delete_todo(&self, owner_id: &str, id: i64) -> DomainResult<()> {
        let deleted = self.db.soft_delete_todo(owner_id, id, &now_rfc3339()).await?;
        if !deleted {
            return Err(DomainError::NotFound);
        }

        info!("Soft-deleted todo {} for {}", id, owner_id);
        Ok(())
    }
}

/// Aggregates an owner's yearly activity into per-day summaries for the
/// contribution heatmap
#[derive(Clone)]
pub struct HeatmapService {
    db: DbConnection,
}

impl HeatmapService {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Fetch and aggregate one owner's todos for a year. Only days with
    /// activity appear; the frontend substitutes empty summaries for the rest.
    pub async fn year_summaries(&self, owner_id: &str, year: i32) -> DomainResult<Vec<DaySummary>> {
        if !(2000..=2100).contains(&year) {
            return Err(DomainError::Validation("Invalid year".to_string()));
        }

        let todos = self.db.list_todos_for_year(owner_id, year).await?;
        let summaries = Self::aggregate(todos, year);

        info!(
            "Aggregated {} active days of {} for {}",
            summaries.len(),
            year,
            owner_id
        );
        Ok(summaries.into_values().collect())
    }

    /// Group todos into creation-date buckets for one year.
    ///
    /// Bucketing is strictly by creation date: completing a todo on a later
    /// day never moves it, which keeps a day's reported statistics stable.
    /// Input ordering (newest first) is preserved within each bucket.
    pub fn aggregate(todos: Vec<Todo>, year: i32) -> BTreeMap<String, DaySummary> {
        let prefix = format!("{year:04}-");
        let mut by_date: BTreeMap<String, DaySummary> = BTreeMap::new();

        for todo in todos {
            if todo.deleted_at.is_some() || !todo.created_date().starts_with(&prefix) {
                continue;
            }

            let date = todo.created_date().to_string();
            let summary = by_date
                .entry(date.clone())
                .or_insert_with(|| DaySummary::empty(&date));
            if todo.is_completed() {
                summary.completed_count += 1;
            }
            summary.todos.push(todo);
        }

        by_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn create_test_services() -> (TodoService, HeatmapService, DbConnection) {
        let db = DbConnection::init_test().await.expect("Failed to init test DB");
        db.ensure_user("user_1", "Test User", "2025-01-01T00:00:00.000Z")
            .await
            .expect("Failed to create test user");
        (TodoService::new(db.clone()), HeatmapService::new(db.clone()), db)
    }

    fn create_request(title: &str, date: Option<&str>) -> CreateTodoRequest {
        CreateTodoRequest {
            title: title.to_string(),
            description: None,
            date: date.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_create_todo_with_target_date() {
        let (todos, _, _) = create_test_services().await;

        let todo = todos
            .create_todo("user_1", create_request("dated", Some("2025-03-14")))
            .await
            .unwrap();

        assert_eq!(todo.created_date(), "2025-03-14");
        assert!(!todo.is_completed());

        let listed = todos.list_for_date("user_1", Some("2025-03-14")).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_create_todo_validation() {
        let (todos, _, _) = create_test_services().await;

        let err = todos
            .create_todo("user_1", create_request("   ", None))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = todos
            .create_todo("user_1", create_request("ok", Some("14-03-2025")))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_todo_normalizes_description() {
        let (todos, _, _) = create_test_services().await;

        let todo = todos
            .create_todo(
                "user_1",
                CreateTodoRequest {
                    title: "  spaced  ".to_string(),
                    description: Some("   ".to_string()),
                    date: Some("2025-03-14".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(todo.title, "spaced");
        assert_eq!(todo.description, None);
    }

    #[tokio::test]
    async fn test_toggle_completion_moves_completed_at() {
        let (todos, _, db) = create_test_services().await;

        let todo = todos
            .create_todo("user_1", create_request("toggle me", Some("2025-03-14")))
            .await
            .unwrap();

        todos
            .update_todo(
                "user_1",
                todo.id,
                UpdateTodoRequest { title: None, description: None, completed: Some(true) },
            )
            .await
            .unwrap();
        let fetched = db.get_todo("user_1", todo.id).await.unwrap().unwrap();
        assert!(fetched.is_completed());
        assert!(fetched.completed_at.is_some());

        todos
            .update_todo(
                "user_1",
                todo.id,
                UpdateTodoRequest { title: None, description: None, completed: Some(false) },
            )
            .await
            .unwrap();
        let fetched = db.get_todo("user_1", todo.id).await.unwrap().unwrap();
        assert!(!fetched.is_completed());
        assert!(fetched.completed_at.is_none());
    }

    #[tokio::test]
    async fn test_update_requires_a_field() {
        let (todos, _, _) = create_test_services().await;

        let todo = todos
            .create_todo("user_1", create_request("untouched", Some("2025-03-14")))
            .await
            .unwrap();

        let err = todos
            .update_todo(
                "user_1",
                todo.id,
                UpdateTodoRequest { title: None, description: None, completed: None },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_clears_description_on_empty_string() {
        let (todos, _, db) = create_test_services().await;

        let todo = todos
            .create_todo(
                "user_1",
                CreateTodoRequest {
                    title: "notes".to_string(),
                    description: Some("keep this".to_string()),
                    date: Some("2025-03-14".to_string()),
                },
            )
            .await
            .unwrap();

        todos
            .update_todo(
                "user_1",
                todo.id,
                UpdateTodoRequest {
                    title: None,
                    description: Some(String::new()),
                    completed: None,
                },
            )
            .await
            .unwrap();

        let fetched = db.get_todo("user_1", todo.id).await.unwrap().unwrap();
        assert_eq!(fetched.description, None);
    }

    #[tokio::test]
    async fn test_update_missing_todo_is_not_found() {
        let (todos, _, _) = create_test_services().await;

        let err = todos
            .update_todo(
                "user_1",
                9999,
                UpdateTodoRequest { title: Some("ghost".to_string()), description: None, completed: None },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound));

        let err = todos.delete_todo("user_1", 9999).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound));
    }

    #[tokio::test]
    async fn test_resolve_session() {
        let (todos, _, db) = create_test_services().await;
        db.ensure_session("good_token", "user_1", "2025-01-01T00:00:00.000Z")
            .await
            .unwrap();

        assert_eq!(todos.resolve_session(Some("good_token")).await.unwrap(), "user_1");

        let err = todos.resolve_session(Some("bad_token")).await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthenticated));
        let err = todos.resolve_session(None).await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthenticated));
    }

    #[tokio::test]
    async fn test_aggregate_groups_by_creation_date() {
        let (todos, heatmap, _) = create_test_services().await;

        todos
            .create_todo("user_1", create_request("a", Some("2025-03-14")))
            .await
            .unwrap();
        let b = todos
            .create_todo("user_1", create_request("b", Some("2025-03-14")))
            .await
            .unwrap();
        todos
            .create_todo("user_1", create_request("c", Some("2025-07-01")))
            .await
            .unwrap();

        // Complete one todo; it stays in its creation bucket
        todos
            .update_todo(
                "user_1",
                b.id,
                UpdateTodoRequest { title: None, description: None, completed: Some(true) },
            )
            .await
            .unwrap();

        let summaries = heatmap.year_summaries("user_1", 2025).await.unwrap();
        assert_eq!(summaries.len(), 2);

        let march = summaries.iter().find(|s| s.date == "2025-03-14").unwrap();
        assert_eq!(march.todos.len(), 2);
        assert_eq!(march.completed_count, 1);

        let july = summaries.iter().find(|s| s.date == "2025-07-01").unwrap();
        assert_eq!(july.todos.len(), 1);
        assert_eq!(july.completed_count, 0);
    }

    #[tokio::test]
    async fn test_aggregate_is_idempotent() {
        let todo = Todo {
            id: 1,
            owner_id: "user_1".to_string(),
            title: "same in, same out".to_string(),
            description: None,
            created_at: "2025-03-14T09:00:00.000Z".to_string(),
            completed_at: Some("2025-03-14T10:00:00.000Z".to_string()),
            deleted_at: None,
        };

        let first = HeatmapService::aggregate(vec![todo.clone()], 2025);
        let second = HeatmapService::aggregate(vec![todo], 2025);
        assert_eq!(first, second);
    }

    #[test]
    fn test_aggregate_skips_deleted_and_out_of_year() {
        let template = Todo {
            id: 1,
            owner_id: "user_1".to_string(),
            title: "t".to_string(),
            description: None,
            created_at: "2025-03-14T09:00:00.000Z".to_string(),
            completed_at: None,
            deleted_at: None,
        };

        let deleted = Todo {
            id: 2,
            deleted_at: Some("2025-03-15T00:00:00.000Z".to_string()),
            ..template.clone()
        };
        let other_year = Todo {
            id: 3,
            created_at: "2024-03-14T09:00:00.000Z".to_string(),
            ..template.clone()
        };

        let buckets = HeatmapService::aggregate(vec![template, deleted, other_year], 2025);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets["2025-03-14"].todos.len(), 1);
    }

    #[tokio::test]
    async fn test_year_summaries_rejects_invalid_year() {
        let (_, heatmap, _) = create_test_services().await;

        let err = heatmap.year_summaries("user_1", 1999).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        let err = heatmap.year_summaries("user_1", 2101).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn test_leap_day_bucket() {
        let (todos, heatmap, _) = create_test_services().await;

        todos
            .create_todo("user_1", create_request("leap", Some("2024-02-29")))
            .await
            .unwrap();

        let summaries = heatmap.year_summaries("user_1", 2024).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].date, "2024-02-29");
    }
}
