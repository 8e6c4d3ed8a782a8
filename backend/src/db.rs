use anyhow::Result;
use shared::Todo;
use sqlx::{migrate::MigrateDatabase, sqlite::SqliteRow, Row, Sqlite, SqlitePool};
use std::sync::Arc;

// The database URL for the production database
const DATABASE_URL: &str = "sqlite:streakmark.db";

/// DbConnection manages database operations
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Create a new database connection
    pub async fn new(url: &str) -> Result<Self> {
        // Create database if it doesn't exist
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            Sqlite::create_database(url).await?
        }

        // Connect to the database
        let pool = SqlitePool::connect(url).await?;

        // Setup database schema
        Self::setup_schema(&pool).await?;

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Initialize the standard database
    pub async fn init() -> Result<Self> {
        Self::new(DATABASE_URL).await
    }

    /// Initialize a test database with a unique name
    #[cfg(test)]
    pub async fn init_test() -> Result<Self> {
        // Generate a unique database name for tests
        let test_id = uuid::Uuid::new_v4().to_string();
        let db_url = format!("file:memdb_{}?mode=memory&cache=shared", test_id);

        Self::new(&db_url).await
    }

    /// Set up the required database schema
    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT UNIQUE,
                created_at TEXT NOT NULL
            );
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                token TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id),
                created_at TEXT NOT NULL
            );
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS todos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id TEXT NOT NULL REFERENCES users(id),
                title TEXT NOT NULL,
                description TEXT,
                created_at TEXT NOT NULL,
                completed_at TEXT,
                deleted_at TEXT
            );
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS todo_owner_created_idx
                ON todos(owner_id, created_at);
            "#,
            // Habit tracking schema; no aggregation logic reads these tables yet
            r#"
            CREATE TABLE IF NOT EXISTS habits (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id TEXT NOT NULL REFERENCES users(id),
                name TEXT NOT NULL,
                start_date TEXT NOT NULL,
                frequency TEXT NOT NULL,
                days_of_week TEXT,
                created_at TEXT NOT NULL
            );
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS habit_completions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                habit_id INTEGER NOT NULL REFERENCES habits(id),
                date TEXT NOT NULL,
                UNIQUE(habit_id, date)
            );
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS follows (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                follower_id TEXT NOT NULL REFERENCES users(id),
                following_id TEXT NOT NULL REFERENCES users(id),
                created_at TEXT NOT NULL,
                UNIQUE(follower_id, following_id)
            );
            "#,
        ];

        for statement in statements {
            sqlx::query(statement).execute(pool).await?;
        }

        Ok(())
    }

    /// Insert a user if it does not exist yet
    pub async fn ensure_user(&self, id: &str, name: &str, created_at: &str) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO users (id, name, created_at) VALUES (?, ?, ?)")
            .bind(id)
            .bind(name)
            .bind(created_at)
            .execute(&*self.pool)
            .await?;
        Ok(())
    }

    /// Register a session token for a user, replacing any previous session
    /// with the same token
    pub async fn ensure_session(&self, token: &str, user_id: &str, created_at: &str) -> Result<()> {
        sqlx::query("INSERT OR REPLACE INTO sessions (token, user_id, created_at) VALUES (?, ?, ?)")
            .bind(token)
            .bind(user_id)
            .bind(created_at)
            .execute(&*self.pool)
            .await?;
        Ok(())
    }

    /// Resolve a session token to the owning user ID
    pub async fn session_owner(&self, token: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT user_id FROM sessions WHERE token = ?")
            .bind(token)
            .fetch_optional(&*self.pool)
            .await?;

        Ok(row.map(|r| r.get("user_id")))
    }

    /// Insert a new todo and return it with its store-assigned ID
    pub async fn create_todo(
        &self,
        owner_id: &str,
        title: &str,
        description: Option<&str>,
        created_at: &str,
    ) -> Result<Todo> {
        let result = sqlx::query(
            "INSERT INTO todos (owner_id, title, description, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(owner_id)
        .bind(title)
        .bind(description)
        .bind(created_at)
        .execute(&*self.pool)
        .await?;

        Ok(Todo {
            id: result.last_insert_rowid(),
            owner_id: owner_id.to_string(),
            title: title.to_string(),
            description: description.map(str::to_string),
            created_at: created_at.to_string(),
            completed_at: None,
            deleted_at: None,
        })
    }

    /// List an owner's todos created on a given date, newest first.
    /// Soft-deleted rows are excluded.
    pub async fn list_todos_for_date(&self, owner_id: &str, date: &str) -> Result<Vec<Todo>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, title, description, created_at, completed_at, deleted_at
            FROM todos
            WHERE owner_id = ?
              AND created_at >= ?
              AND created_at <= ?
              AND deleted_at IS NULL
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(owner_id)
        .bind(format!("{date}T00:00:00.000Z"))
        .bind(format!("{date}T23:59:59.999Z"))
        .fetch_all(&*self.pool)
        .await?;

        Ok(rows.iter().map(todo_from_row).collect())
    }

    /// List an owner's todos created within a calendar year, newest first.
    /// Soft-deleted rows are excluded.
    pub async fn list_todos_for_year(&self, owner_id: &str, year: i32) -> Result<Vec<Todo>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, title, description, created_at, completed_at, deleted_at
            FROM todos
            WHERE owner_id = ?
              AND created_at >= ?
              AND created_at <= ?
              AND deleted_at IS NULL
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(owner_id)
        .bind(format!("{year:04}-01-01T00:00:00.000Z"))
        .bind(format!("{year:04}-12-31T23:59:59.999Z"))
        .fetch_all(&*self.pool)
        .await?;

        Ok(rows.iter().map(todo_from_row).collect())
    }

    /// Fetch a single live todo by ID, scoped to its owner
    pub async fn get_todo(&self, owner_id: &str, id: i64) -> Result<Option<Todo>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, title, description, created_at, completed_at, deleted_at
            FROM todos
            WHERE id = ? AND owner_id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&*self.pool)
        .await?;

        Ok(row.as_ref().map(todo_from_row))
    }

    /// Write the mutable fields of a todo in one statement. Returns false
    /// when the row is absent, soft-deleted, or owned by someone else.
    pub async fn store_todo_fields(
        &self,
        owner_id: &str,
        id: i64,
        title: &str,
        description: Option<&str>,
        completed_at: Option<&str>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE todos
            SET title = ?, description = ?, completed_at = ?
            WHERE id = ? AND owner_id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(completed_at)
        .bind(id)
        .bind(owner_id)
        .execute(&*self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Soft-delete a todo by stamping `deleted_at`. The row is never removed.
    pub async fn soft_delete_todo(&self, owner_id: &str, id: i64, deleted_at: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE todos SET deleted_at = ? WHERE id = ? AND owner_id = ? AND deleted_at IS NULL",
        )
        .bind(deleted_at)
        .bind(id)
        .bind(owner_id)
        .execute(&*self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn todo_from_row(row: &SqliteRow) -> Todo {
    Todo {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        title: row.get("title"),
        description: row.get("description"),
        created_at: row.get("created_at"),
        completed_at: row.get("completed_at"),
        deleted_at: row.get("deleted_at"),
    }
}
