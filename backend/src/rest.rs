use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use shared::{CreateTodoRequest, MutationAck, UpdateTodoRequest};
use tracing::info;

use crate::domain::{DomainError, HeatmapService, TodoService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub todo_service: TodoService,
    pub heatmap_service: HeatmapService,
}

impl AppState {
    pub fn new(todo_service: TodoService, heatmap_service: HeatmapService) -> Self {
        Self {
            todo_service,
            heatmap_service,
        }
    }
}

/// Query parameters for the todo list endpoint
#[derive(Deserialize, Debug)]
pub struct TodoListQuery {
    pub date: Option<String>,
}

/// Query parameters for the heatmap endpoint
#[derive(Deserialize, Debug)]
pub struct HeatmapQuery {
    pub year: Option<i32>,
}

/// Pull the bearer token out of the Authorization header
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Map a domain error onto the HTTP surface. Validation messages pass
/// through verbatim for inline display; storage details stay server-side.
fn error_response(error: DomainError) -> Response {
    match error {
        DomainError::Unauthenticated => (StatusCode::UNAUTHORIZED, "Unauthorized").into_response(),
        DomainError::Validation(message) => (StatusCode::BAD_REQUEST, message).into_response(),
        DomainError::NotFound => (StatusCode::NOT_FOUND, "Todo not found").into_response(),
        DomainError::Storage(e) => {
            tracing::error!("Storage error: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong").into_response()
        }
    }
}

/// Axum handler function for POST /api/todos
pub async fn create_todo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateTodoRequest>,
) -> Response {
    info!("POST /api/todos - title len: {}", request.title.len());

    let owner_id = match state.todo_service.resolve_session(bearer_token(&headers)).await {
        Ok(owner_id) => owner_id,
        Err(e) => return error_response(e),
    };

    match state.todo_service.create_todo(&owner_id, request).await {
        Ok(todo) => (StatusCode::CREATED, Json(todo)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Axum handler function for GET /api/todos?date=YYYY-MM-DD
pub async fn list_todos(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<TodoListQuery>,
) -> Response {
    info!("GET /api/todos - query: {:?}", query);

    let owner_id = match state.todo_service.resolve_session(bearer_token(&headers)).await {
        Ok(owner_id) => owner_id,
        Err(e) => return error_response(e),
    };

    match state
        .todo_service
        .list_for_date(&owner_id, query.date.as_deref())
        .await
    {
        Ok(todos) => (StatusCode::OK, Json(todos)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Axum handler function for PATCH /api/todos/:id
pub async fn update_todo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(request): Json<UpdateTodoRequest>,
) -> Response {
    info!("PATCH /api/todos/{} - request: {:?}", id, request);

    let owner_id = match state.todo_service.resolve_session(bearer_token(&headers)).await {
        Ok(owner_id) => owner_id,
        Err(e) => return error_response(e),
    };

    match state.todo_service.update_todo(&owner_id, id, request).await {
        Ok(()) => (StatusCode::OK, Json(MutationAck { success: true })).into_response(),
        Err(e) => error_response(e),
    }
}

/// Axum handler function for DELETE /api/todos/:id
pub async fn delete_todo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    info!("DELETE /api/todos/{}", id);

    let owner_id = match state.todo_service.resolve_session(bearer_token(&headers)).await {
        Ok(owner_id) => owner_id,
        Err(e) => return error_response(e),
    };

    match state.todo_service.delete_todo(&owner_id, id).await {
        Ok(()) => (StatusCode::OK, Json(MutationAck { success: true })).into_response(),
        Err(e) => error_response(e),
    }
}

/// Axum handler function for GET /api/heatmap?year=YYYY
pub async fn heatmap(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HeatmapQuery>,
) -> Response {
    info!("GET /api/heatmap - query: {:?}", query);

    let owner_id = match state.todo_service.resolve_session(bearer_token(&headers)).await {
        Ok(owner_id) => owner_id,
        Err(e) => return error_response(e),
    };

    let year = query.year.unwrap_or_else(|| {
        use chrono::Datelike;
        chrono::Utc::now().year()
    });

    match state.heatmap_service.year_summaries(&owner_id, year).await {
        Ok(summaries) => (StatusCode::OK, Json(summaries)).into_response(),
        Err(e) => error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConnection;
    use axum::body::to_bytes;
    use shared::{DaySummary, Todo};

    const TEST_TOKEN: &str = "session_token_1";

    /// Build handler state backed by a fresh in-memory database with one
    /// user and one valid session
    async fn setup_test_handlers() -> AppState {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        db.ensure_user("user_1", "Test User", "2025-01-01T00:00:00.000Z")
            .await
            .expect("Failed to create test user");
        db.ensure_session(TEST_TOKEN, "user_1", "2025-01-01T00:00:00.000Z")
            .await
            .expect("Failed to create test session");

        AppState::new(TodoService::new(db.clone()), HeatmapService::new(db))
    }

    fn auth_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            format!("Bearer {TEST_TOKEN}").parse().unwrap(),
        );
        headers
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn create_request(title: &str, date: &str) -> CreateTodoRequest {
        CreateTodoRequest {
            title: title.to_string(),
            description: None,
            date: Some(date.to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_todo_handler() {
        let state = setup_test_handlers().await;

        let response = create_todo(
            State(state),
            auth_headers(),
            Json(create_request("Test todo", "2025-03-14")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let todo: Todo = body_json(response).await;
        assert_eq!(todo.title, "Test todo");
        assert_eq!(todo.owner_id, "user_1");
        assert_eq!(todo.created_date(), "2025-03-14");
    }

    #[tokio::test]
    async fn test_create_todo_validation_error() {
        let state = setup_test_handlers().await;

        let response = create_todo(
            State(state),
            auth_headers(),
            Json(create_request("", "2025-03-14")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_requests_without_session_are_rejected() {
        let state = setup_test_handlers().await;

        let response = create_todo(
            State(state.clone()),
            HeaderMap::new(),
            Json(create_request("No session", "2025-03-14")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let mut bad = HeaderMap::new();
        bad.insert(header::AUTHORIZATION, "Bearer nope".parse().unwrap());
        let response = list_todos(State(state), bad, Query(TodoListQuery { date: None })).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_list_todos_handler() {
        let state = setup_test_handlers().await;

        let _ = create_todo(
            State(state.clone()),
            auth_headers(),
            Json(create_request("Listed todo", "2025-03-14")),
        )
        .await;

        let response = list_todos(
            State(state),
            auth_headers(),
            Query(TodoListQuery { date: Some("2025-03-14".to_string()) }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let todos: Vec<Todo> = body_json(response).await;
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].title, "Listed todo");
    }

    #[tokio::test]
    async fn test_update_and_delete_todo_handlers() {
        let state = setup_test_handlers().await;

        let response = create_todo(
            State(state.clone()),
            auth_headers(),
            Json(create_request("Mutable todo", "2025-03-14")),
        )
        .await;
        let todo: Todo = body_json(response).await;

        let response = update_todo(
            State(state.clone()),
            auth_headers(),
            Path(todo.id),
            Json(UpdateTodoRequest { title: None, description: None, completed: Some(true) }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let ack: MutationAck = body_json(response).await;
        assert!(ack.success);

        let response = delete_todo(State(state.clone()), auth_headers(), Path(todo.id)).await;
        assert_eq!(response.status(), StatusCode::OK);

        // Gone from listings and no longer updatable
        let response = list_todos(
            State(state.clone()),
            auth_headers(),
            Query(TodoListQuery { date: Some("2025-03-14".to_string()) }),
        )
        .await;
        let todos: Vec<Todo> = body_json(response).await;
        assert!(todos.is_empty());

        let response = update_todo(
            State(state),
            auth_headers(),
            Path(todo.id),
            Json(UpdateTodoRequest { title: None, description: None, completed: Some(false) }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_heatmap_handler() {
        let state = setup_test_handlers().await;

        let response = create_todo(
            State(state.clone()),
            auth_headers(),
            Json(create_request("Heatmap todo", "2025-03-14")),
        )
        .await;
        let todo: Todo = body_json(response).await;

        let _ = update_todo(
            State(state.clone()),
            auth_headers(),
            Path(todo.id),
            Json(UpdateTodoRequest { title: None, description: None, completed: Some(true) }),
        )
        .await;

        let response = heatmap(
            State(state.clone()),
            auth_headers(),
            Query(HeatmapQuery { year: Some(2025) }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let summaries: Vec<DaySummary> = body_json(response).await;
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].date, "2025-03-14");
        assert_eq!(summaries[0].completed_count, 1);

        // Completion later never moves the todo out of its creation bucket
        assert_eq!(summaries[0].todos[0].created_date(), "2025-03-14");

        let response = heatmap(
            State(state),
            auth_headers(),
            Query(HeatmapQuery { year: Some(1900) }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
