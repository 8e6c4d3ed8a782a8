use gloo::net::http::Request;
use shared::{CreateTodoRequest, DaySummary, MutationAck, Todo, UpdateTodoRequest};

/// API client for communicating with the backend server
#[derive(Clone, PartialEq)]
pub struct ApiClient {
    base_url: String,
    session_token: String,
}

impl ApiClient {
    /// Create a new API client with the default base URL and the local
    /// single-user session
    pub fn new() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            session_token: "local-dev-token".to_string(),
        }
    }

    /// Create a new API client with a custom base URL and session token
    pub fn with_base_url(base_url: String, session_token: String) -> Self {
        Self { base_url, session_token }
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.session_token)
    }

    /// Get the todos created on a specific date
    pub async fn list_todos(&self, date: &str) -> Result<Vec<Todo>, String> {
        let url = format!("{}/api/todos?date={}", self.base_url, date);

        match Request::get(&url).header("Authorization", &self.bearer()).send().await {
            Ok(response) => {
                if response.ok() {
                    response
                        .json::<Vec<Todo>>()
                        .await
                        .map_err(|e| format!("Failed to parse todos: {}", e))
                } else {
                    Err(response.text().await.unwrap_or_else(|_| "Unknown error".to_string()))
                }
            }
            Err(e) => Err(format!("Network error: {}", e)),
        }
    }

    /// Get the per-day summaries for a year's heatmap
    pub async fn get_heatmap(&self, year: i32) -> Result<Vec<DaySummary>, String> {
        let url = format!("{}/api/heatmap?year={}", self.base_url, year);

        match Request::get(&url).header("Authorization", &self.bearer()).send().await {
            Ok(response) => {
                if response.ok() {
                    response
                        .json::<Vec<DaySummary>>()
                        .await
                        .map_err(|e| format!("Failed to parse heatmap data: {}", e))
                } else {
                    Err(response.text().await.unwrap_or_else(|_| "Unknown error".to_string()))
                }
            }
            Err(e) => Err(format!("Network error: {}", e)),
        }
    }

    /// Create a new todo
    pub async fn create_todo(&self, request: CreateTodoRequest) -> Result<Todo, String> {
        let url = format!("{}/api/todos", self.base_url);

        match Request::post(&url)
            .header("Authorization", &self.bearer())
            .json(&request)
            .map_err(|e| format!("Failed to serialize request: {}", e))?
            .send()
            .await
        {
            Ok(response) => {
                if response.ok() {
                    response
                        .json::<Todo>()
                        .await
                        .map_err(|e| format!("Failed to parse response: {}", e))
                } else {
                    Err(response.text().await.unwrap_or_else(|_| "Unknown error".to_string()))
                }
            }
            Err(e) => Err(format!("Network error: {}", e)),
        }
    }

    /// Rename, re-describe, or toggle completion on a todo
    pub async fn update_todo(&self, id: i64, request: UpdateTodoRequest) -> Result<MutationAck, String> {
        let url = format!("{}/api/todos/{}", self.base_url, id);

        match Request::patch(&url)
            .header("Authorization", &self.bearer())
            .json(&request)
            .map_err(|e| format!("Failed to serialize request: {}", e))?
            .send()
            .await
        {
            Ok(response) => {
                if response.ok() {
                    response
                        .json::<MutationAck>()
                        .await
                        .map_err(|e| format!("Failed to parse response: {}", e))
                } else {
                    Err(response.text().await.unwrap_or_else(|_| "Unknown error".to_string()))
                }
            }
            Err(e) => Err(format!("Network error: {}", e)),
        }
    }

    /// Soft-delete a todo
    pub async fn delete_todo(&self, id: i64) -> Result<MutationAck, String> {
        let url = format!("{}/api/todos/{}", self.base_url, id);

        match Request::delete(&url)
            .header("Authorization", &self.bearer())
            .send()
            .await
        {
            Ok(response) => {
                if response.ok() {
                    response
                        .json::<MutationAck>()
                        .await
                        .map_err(|e| format!("Failed to parse response: {}", e))
                } else {
                    Err(response.text().await.unwrap_or_else(|_| "Unknown error".to_string()))
                }
            }
            Err(e) => Err(format!("Network error: {}", e)),
        }
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}
