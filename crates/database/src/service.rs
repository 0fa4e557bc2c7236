use crate::Database;

use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{marker::PhantomData, time::Duration};
use surrealdb::{Surreal, engine::any::Any, opt::auth::Root};
use tokio::time::timeout;

use app_error::{AppError, AppErrorExt, AppResult};

lazy_static! {
    // SurrealDB identifier rules for table and field names
    static ref IDENTIFIER_REGEX: Regex = Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").unwrap();
}

#[derive(Clone)]
pub struct DbCredentials {
    username: String,
    password: String,
}

impl DbCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn get_username(&self) -> &str {
        &self.username
    }

    pub fn get_password(&self) -> &str {
        &self.password
    }
}

// Don't accidentally log credentials
impl std::fmt::Debug for DbCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Database {
    /// Open a connection without selecting a namespace
    pub async fn connect(connection_url: &str, connect_timeout: Duration) -> AppResult<Self> {
        if !connection_url.starts_with("ws://")
            && !connection_url.starts_with("wss://")
            && !connection_url.starts_with("mem://")
        {
            tracing::warn!(
                "Potentially invalid database connection URL format: {}",
                connection_url
            );
        }

        let conn_future = surrealdb::engine::any::connect(connection_url);
        match timeout(connect_timeout, conn_future).await {
            Ok(conn_result) => {
                let client = conn_result
                    .context("Failed to connect to database")
                    .db_err()?;
                Ok(Self { client })
            }
            Err(_) => Err(AppError::DatabaseError(anyhow::anyhow!(
                "Database connection timeout - could not establish connection within {:?}",
                connect_timeout
            ))),
        }
    }

    pub async fn initialize(
        connection_url: &str,
        namespace: &str,
        database: &str,
        credentials: &DbCredentials,
        connect_timeout: Duration,
    ) -> AppResult<Self> {
        if namespace.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Database namespace cannot be empty".into(),
            ));
        }

        if database.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Database name cannot be empty".into(),
            ));
        }

        let db = Self::connect(connection_url, connect_timeout).await?;

        db.client
            .signin(Root {
                username: credentials.get_username(),
                password: credentials.get_password(),
            })
            .await
            .context("Failed to authenticate with database")
            .db_err()?;

        db.use_namespace(namespace, database).await?;
        Ok(db)
    }

    /// Fresh embedded datastore; every call yields an independent database
    pub async fn initialize_memory_db(namespace: &str, database: &str) -> AppResult<Self> {
        let db = Self::connect("mem://", Duration::from_secs(5)).await?;
        db.use_namespace(namespace, database).await?;
        Ok(db)
    }

    async fn use_namespace(&self, namespace: &str, database: &str) -> AppResult<()> {
        self.client
            .use_ns(namespace)
            .use_db(database)
            .await
            .context("Failed to select namespace and database")
            .db_err()
    }

    pub fn client(&self) -> &Surreal<Any> {
        &self.client
    }

    pub async fn health_check(&self) -> AppResult<()> {
        self.client
            .health()
            .await
            .context("Database health check failed")
            .db_err()
    }

    pub fn create<T>(&self, location: (&str, &str)) -> CreateBuilder<'_, T> {
        CreateBuilder {
            client: &self.client,
            table: location.0.to_string(),
            id: location.1.to_string(),
            _phantom: PhantomData,
        }
    }

    pub fn update<T>(&self, location: (&str, &str)) -> UpdateBuilder<'_, T> {
        UpdateBuilder {
            client: &self.client,
            table: location.0.to_string(),
            id: location.1.to_string(),
            _phantom: PhantomData,
        }
    }

    pub async fn delete<T>(&self, location: (&str, &str)) -> AppResult<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        self.client
            .delete((location.0, location.1))
            .await
            .context("Failed to delete record")
            .db_err()
    }

    pub async fn select<T>(&self, location: (&str, &str)) -> AppResult<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        self.client
            .select((location.0, location.1))
            .await
            .context("Failed to select record")
            .db_err()
    }

    pub fn query(&self, sql: impl Into<String>) -> QueryBuilder<'_> {
        QueryBuilder {
            client: &self.client,
            sql: sql.into(),
            bindings: Vec::new(),
        }
    }
}

pub struct CreateBuilder<'a, T> {
    client: &'a Surreal<Any>,
    table: String,
    id: String,
    _phantom: PhantomData<T>,
}

impl<T> CreateBuilder<'_, T>
where
    T: Serialize + Send + Sync + 'static,
{
    pub async fn content(self, data: T) -> AppResult<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        self.client
            .create((self.table.as_str(), self.id.as_str()))
            .content(data)
            .await
            .context("Failed to create record")
            .db_err()
    }
}

pub struct UpdateBuilder<'a, T> {
    client: &'a Surreal<Any>,
    table: String,
    id: String,
    _phantom: PhantomData<T>,
}

impl<T> UpdateBuilder<'_, T>
where
    T: Serialize + Send + Sync + 'static,
{
    pub async fn content(self, data: T) -> AppResult<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        self.client
            .update((self.table.as_str(), self.id.as_str()))
            .content(data)
            .await
            .context("Failed to update record")
            .db_err()
    }

    /// Patch only the given fields
    pub async fn merge(self, patch: serde_json::Value) -> AppResult<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        self.client
            .update((self.table.as_str(), self.id.as_str()))
            .merge(patch)
            .await
            .context("Failed to merge record")
            .db_err()
    }
}

pub struct QueryBuilder<'a> {
    client: &'a Surreal<Any>,
    sql: String,
    bindings: Vec<(String, serde_json::Value)>,
}

impl QueryBuilder<'_> {
    pub fn bind(mut self, binding: (impl Into<String>, impl Into<serde_json::Value>)) -> Self {
        self.bindings.push((binding.0.into(), binding.1.into()));
        self
    }

    pub async fn r#await(self) -> AppResult<QueryResponse> {
        let mut query = self.client.query(self.sql);

        for (name, value) in self.bindings {
            query = query.bind((name, value));
        }

        let response = query.await.context("Failed to execute query").db_err()?;
        Ok(QueryResponse(response))
    }
}

pub struct QueryResponse(surrealdb::Response);

impl QueryResponse {
    pub fn take<T>(mut self, index: usize) -> AppResult<Vec<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        self.0
            .take(index)
            .map_err(|e| anyhow::anyhow!("Failed to extract query results: {}", e))
            .db_err()
    }

    /// Surface the first failed statement, if any
    pub fn check(self) -> AppResult<()> {
        self.0
            .check()
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!("Query statement failed: {}", e))
            .db_err()
    }
}

/// Typed access to one table whose records are addressed by a string key.
pub struct DbService<T> {
    db: Database,
    table_name: String,
    _phantom: PhantomData<T>,
}

impl<T> DbService<T>
where
    T: Clone + Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static,
{
    pub fn new(db: &Database, table_name: impl Into<String>) -> Self {
        Self {
            db: db.clone(),
            table_name: table_name.into(),
            _phantom: PhantomData,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    // Generic DB operation wrapper with consistent error handling and logging
    async fn execute_db_operation<F, R>(&self, operation: &str, execute: F) -> AppResult<R>
    where
        F: Future<Output = AppResult<R>>,
    {
        execute.await.map_err(|e| {
            if let AppError::DatabaseError(err) = e {
                AppError::DatabaseError(anyhow::anyhow!(
                    "Failed to {} {} record: {:#}",
                    operation,
                    self.table_name,
                    err
                ))
            } else {
                e
            }
        })
    }

    pub async fn create_record(&self, key: &str, item: T) -> AppResult<Option<T>> {
        self.execute_db_operation("create", async {
            self.db.create((self.table_name.as_str(), key)).content(item).await
        })
        .await
    }

    pub async fn update_record(&self, key: &str, updated_data: T) -> AppResult<Option<T>> {
        self.execute_db_operation("update", async {
            self.db
                .update((self.table_name.as_str(), key))
                .content(updated_data)
                .await
        })
        .await
    }

    pub async fn merge_record(&self, key: &str, patch: serde_json::Value) -> AppResult<Option<T>> {
        self.execute_db_operation("merge", async {
            self.db.update((self.table_name.as_str(), key)).merge(patch).await
        })
        .await
    }

    pub async fn delete_record(&self, key: &str) -> AppResult<Option<T>> {
        self.execute_db_operation("delete", async {
            self.db.delete((self.table_name.as_str(), key)).await
        })
        .await
    }

    pub async fn get_record_by_id(&self, key: &str) -> AppResult<Option<T>> {
        self.execute_db_operation("fetch", async {
            self.db.select((self.table_name.as_str(), key)).await
        })
        .await
    }

    // Guard for names interpolated into SurrealQL
    fn validate_identifier(&self, identifier: &str) -> AppResult<()> {
        if !IDENTIFIER_REGEX.is_match(identifier) {
            return Err(AppError::ValidationError(format!(
                "Invalid identifier '{}': must start with a letter or underscore and contain only alphanumeric characters and underscores",
                identifier
            )));
        }

        Ok(())
    }

    pub async fn get_records_by_field<V>(&self, field: &str, value: V) -> AppResult<Vec<T>>
    where
        V: Serialize + Send + Sync + 'static,
    {
        self.validate_identifier(field)?;
        self.validate_identifier(&self.table_name)?;

        let sql = format!("SELECT * FROM {} WHERE {} = $value", self.table_name, field);

        let value_json = serde_json::to_value(value).map_err(|e| {
            AppError::ValidationError(format!(
                "Failed to serialize value for field '{}': {}",
                field, e
            ))
        })?;

        self.execute_db_operation("query", async {
            let response = self.db.query(sql).bind(("value", value_json)).r#await().await?;
            response.take(0)
        })
        .await
    }

    /// Run a parameterised statement and return the rows of its first result
    pub async fn run_custom_query(
        &self,
        sql: &str,
        bindings: Vec<(String, serde_json::Value)>,
    ) -> AppResult<Vec<T>> {
        tracing::debug!("Executing custom query on {}: {}", self.table_name, sql);

        if sql.contains("${") || sql.contains("'+") || sql.contains("--") || sql.contains(";")
            || sql.contains("/*")
        {
            return Err(AppError::ValidationError(
                "Custom SQL queries must use parameterized queries ($param) for security".into(),
            ));
        }

        self.execute_db_operation("custom query", async {
            let mut query = self.db.query(sql);

            for (name, value) in bindings {
                if !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
                    return Err(AppError::ValidationError(format!(
                        "Invalid parameter name '{}': must contain only alphanumeric characters and underscores",
                        name
                    )));
                }

                query = query.bind((name, value));
            }

            let response = query.r#await().await?;
            response.take(0)
        })
        .await
    }
}
