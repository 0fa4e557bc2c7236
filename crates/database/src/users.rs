use app_error::{AppError, AppResult, with_context};
use app_models::User;
use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use crate::{Database, DbService};

const USERS_TABLE: &str = "users";

/// Persistence operations the authentication flow depends on
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Fails with `ResourceExistsError` when the email is taken
    async fn create(&self, user: User) -> AppResult<User>;

    /// Overwrite the stored refresh token; `None` revokes it
    async fn update_refresh_token(&self, email: &str, token: Option<&str>) -> AppResult<()>;

    /// Replace the stored refresh token only if it still equals `expected`.
    /// Returns whether the swap happened.
    async fn swap_refresh_token(&self, email: &str, expected: &str, next: &str) -> AppResult<bool>;

    async fn mark_confirmed(&self, email: &str) -> AppResult<()>;
}

/// `UserStore` over the `users` table, keyed by email
pub struct UserRepository {
    users: DbService<User>,
}

impl UserRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            users: DbService::new(db, USERS_TABLE),
        }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.users.get_record_by_id(email).await
    }

    async fn create(&self, user: User) -> AppResult<User> {
        let email = user.email.clone();

        match self.users.create_record(&email, user).await {
            Ok(Some(stored)) => {
                info!("Stored new user: {}", stored.email);
                Ok(stored)
            }
            Ok(None) => Err(AppError::DatabaseError(anyhow::anyhow!(
                "Database did not return stored user"
            ))),
            Err(AppError::DatabaseError(e)) if e.to_string().contains("already exists") => {
                Err(AppError::resource_exists("User", &email))
            }
            Err(e) => Err(e),
        }
    }

    async fn update_refresh_token(&self, email: &str, token: Option<&str>) -> AppResult<()> {
        debug!("Updating refresh token for {}", email);
        self.users
            .merge_record(email, json!({ "refresh_token": token }))
            .await?
            .ok_or_else(|| AppError::resource_not_found("User", email))?;
        Ok(())
    }

    async fn swap_refresh_token(&self, email: &str, expected: &str, next: &str) -> AppResult<bool> {
        let response = self
            .users
            .run_custom_query(
                "UPDATE type::thing($table, $email) SET refresh_token = $next WHERE refresh_token = $expected RETURN AFTER",
                vec![
                    ("table".to_string(), json!(USERS_TABLE)),
                    ("email".to_string(), json!(email)),
                    ("expected".to_string(), json!(expected)),
                    ("next".to_string(), json!(next)),
                ],
            )
            .await;

        let updated = with_context!(response, "Failed to rotate refresh token")?;
        Ok(!updated.is_empty())
    }

    async fn mark_confirmed(&self, email: &str) -> AppResult<()> {
        self.users
            .merge_record(email, json!({ "confirmed": true }))
            .await?
            .ok_or_else(|| AppError::resource_not_found("User", email))?;
        info!("Email confirmed for {}", email);
        Ok(())
    }
}
