use app_config::SurrealDbConfig;
use app_error::AppResult;
use std::{sync::Arc, time::Duration};

use crate::{Database, DbCredentials};

/// Schema bootstrap, safe to run on every start.
///
/// `confirmed` was added to `users` after the first release; the default keeps
/// older rows readable as unconfirmed.
const SCHEMA: &str = r#"
DEFINE TABLE IF NOT EXISTS users SCHEMALESS;
DEFINE FIELD IF NOT EXISTS confirmed ON TABLE users TYPE bool DEFAULT false;
DEFINE TABLE IF NOT EXISTS contacts SCHEMALESS;
DEFINE INDEX IF NOT EXISTS contacts_owner ON TABLE contacts FIELDS owner;
"#;

pub async fn initialize_db(db_config: &SurrealDbConfig) -> AppResult<Arc<Database>> {
    tracing::debug!("Connecting to SurrealDB: {}", db_config.endpoint);

    if db_config.endpoint.starts_with("wss://") {
        tracing::info!("Using secure TLS connection to database");
    } else if !db_config.endpoint.starts_with("mem://") {
        tracing::warn!("Using non-secure database connection");
    }

    let connect_timeout = Duration::from_millis(db_config.connection_timeout);

    let db = if db_config.endpoint.starts_with("mem://") {
        // the embedded engine has no users to sign in as
        Database::initialize_memory_db(&db_config.namespace, &db_config.database).await?
    } else {
        let credentials = DbCredentials::new(&db_config.username, &db_config.password);
        Database::initialize(
            &db_config.endpoint,
            &db_config.namespace,
            &db_config.database,
            &credentials,
            connect_timeout,
        )
        .await?
    };

    define_schema(&db).await?;
    tracing::info!("Successfully connected to SurrealDB");

    Ok(Arc::new(db))
}

pub async fn initialize_memory_db() -> AppResult<Arc<Database>> {
    let db = Database::initialize_memory_db("test", "test").await?;
    define_schema(&db).await?;

    tracing::info!("Successfully connected to in-memory SurrealDB");

    Ok(Arc::new(db))
}

pub async fn define_schema(db: &Database) -> AppResult<()> {
    db.query(SCHEMA).r#await().await?.check()
}
