use app_config::{JwtConfig, PasswordConfig};
use app_database::UserStore;
use app_error::{AppError, AppResult, auth_error};
use app_middleware::{
    JwtService,
    security::password,
    validation::{normalize_email, normalize_username, validate_password},
};
use app_models::{
    LoginInput, MessageResponse, RequestEmailInput, SignupInput, SignupResponse, TokenPair,
    TokenScope, User, UserProfile,
};
use app_utils::{Mailer, dispatch_confirmation, email::confirmation_url};
use async_trait::async_trait;
use std::{sync::Arc, time::Duration};
use tracing::{info, warn};

use crate::messages;

/// Account lifecycle: signup, email confirmation, login and token rotation
#[async_trait]
pub trait AuthServiceTrait: Send + Sync {
    async fn signup(&self, input: SignupInput) -> AppResult<SignupResponse>;

    async fn login(&self, input: LoginInput) -> AppResult<TokenPair>;

    /// Rotate a refresh token. Presenting anything but the latest one revokes it.
    async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair>;

    async fn confirm_email(&self, token: &str) -> AppResult<MessageResponse>;

    async fn request_email(&self, input: RequestEmailInput) -> AppResult<MessageResponse>;

    async fn logout(&self, email: &str) -> AppResult<MessageResponse>;

    async fn current_user(&self, email: &str) -> AppResult<UserProfile>;

    fn get_jwt_service(&self) -> Arc<JwtService>;
}

pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt_service: Arc<JwtService>,
    mailer: Arc<dyn Mailer>,
    jwt_config: JwtConfig,
    password_rules: PasswordConfig,
    base_url: String,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        jwt_service: Arc<JwtService>,
        mailer: Arc<dyn Mailer>,
        jwt_config: JwtConfig,
        password_rules: PasswordConfig,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            users,
            jwt_service,
            mailer,
            jwt_config,
            password_rules,
            base_url: base_url.into(),
        }
    }

    fn send_confirmation(&self, user: &User) -> AppResult<()> {
        let token = self.jwt_service.issue_confirmation_token(&user.email)?;
        dispatch_confirmation(
            Arc::clone(&self.mailer),
            user.email.clone(),
            user.username.clone(),
            confirmation_url(&self.base_url, &token),
        );
        Ok(())
    }

    fn issue_pair(&self, email: &str, access_ttl: Duration) -> AppResult<TokenPair> {
        let access_token = self.jwt_service.issue_access_token(email, access_ttl)?;
        let refresh_token = self.jwt_service.issue_refresh_token(email)?;
        Ok(TokenPair::bearer(access_token, refresh_token))
    }
}

#[async_trait]
impl AuthServiceTrait for AuthService {
    fn get_jwt_service(&self) -> Arc<JwtService> {
        Arc::clone(&self.jwt_service)
    }

    async fn signup(&self, input: SignupInput) -> AppResult<SignupResponse> {
        let email = normalize_email(&input.email)?;
        let username = normalize_username(&input.username)?;
        validate_password(&input.password, &self.password_rules)?;

        if self.users.get_by_email(&email).await?.is_some() {
            return Err(AppError::ResourceExistsError(messages::ALREADY_EXISTS.to_string()));
        }

        let hashed = password::hash_password(&input.password)?;
        let user = match self.users.create(User::new(email, username, hashed)).await {
            Ok(user) => user,
            // lost a race with a concurrent signup for the same address
            Err(AppError::ResourceExistsError(_)) => {
                return Err(AppError::ResourceExistsError(messages::ALREADY_EXISTS.to_string()));
            }
            Err(e) => return Err(e),
        };

        info!("User signed up: {}", user.email);
        self.send_confirmation(&user)?;

        Ok(SignupResponse {
            user: UserProfile::from(user),
            detail: messages::SUCCESS_CREATE_USER.to_string(),
        })
    }

    async fn login(&self, input: LoginInput) -> AppResult<TokenPair> {
        let email = input.username.trim().to_lowercase();

        let Some(user) = self.users.get_by_email(&email).await? else {
            return auth_error!(messages::INVALID_EMAIL);
        };

        if !user.confirmed {
            return auth_error!(messages::EMAIL_NOT_CONFIRMED);
        }

        if !password::verify_password(&input.password, &user.password)? {
            warn!("Failed login for {}", email);
            return auth_error!(messages::INVALID_PASSWORD);
        }

        let pair = self.issue_pair(&user.email, self.jwt_config.login_access_token_ttl())?;
        self.users
            .update_refresh_token(&user.email, Some(&pair.refresh_token))
            .await?;

        info!("User logged in: {}", user.email);
        Ok(pair)
    }

    async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let claims = self.jwt_service.decode(refresh_token, TokenScope::RefreshToken)?;

        if self.users.get_by_email(&claims.sub).await?.is_none() {
            return auth_error!(messages::INVALID_TOKEN);
        }

        let pair = self.issue_pair(&claims.sub, self.jwt_config.access_token_ttl())?;

        let rotated = self
            .users
            .swap_refresh_token(&claims.sub, refresh_token, &pair.refresh_token)
            .await?;

        if !rotated {
            warn!("Stale refresh token presented for {}, revoking", claims.sub);
            self.users.update_refresh_token(&claims.sub, None).await?;
            return auth_error!(messages::INVALID_TOKEN);
        }

        Ok(pair)
    }

    async fn confirm_email(&self, token: &str) -> AppResult<MessageResponse> {
        let claims = self
            .jwt_service
            .decode(token, TokenScope::EmailToken)
            .map_err(|_| AppError::InputError(messages::INVALID_EMAIL_TOKEN.to_string()))?;

        let Some(user) = self.users.get_by_email(&claims.sub).await? else {
            return Err(AppError::InputError(messages::VERIFICATION_ERROR.to_string()));
        };

        if user.confirmed {
            return Ok(MessageResponse::new(messages::EMAIL_ALREADY_CONFIRMED));
        }

        self.users.mark_confirmed(&user.email).await?;
        Ok(MessageResponse::new(messages::EMAIL_CONFIRMED))
    }

    async fn request_email(&self, input: RequestEmailInput) -> AppResult<MessageResponse> {
        let email = normalize_email(&input.email)?;

        match self.users.get_by_email(&email).await? {
            Some(user) if user.confirmed => {
                Ok(MessageResponse::new(messages::EMAIL_ALREADY_CONFIRMED))
            }
            Some(user) => {
                self.send_confirmation(&user)?;
                Ok(MessageResponse::new(messages::CHECK_EMAIL))
            }
            // same answer as for a real account
            None => Ok(MessageResponse::new(messages::CHECK_EMAIL)),
        }
    }

    async fn logout(&self, email: &str) -> AppResult<MessageResponse> {
        self.users
            .update_refresh_token(email, None)
            .await
            .map_err(|e| match e {
                AppError::NotFoundError(_) => AppError::token_invalid(),
                other => other,
            })?;

        info!("User logged out: {}", email);
        Ok(MessageResponse::new(messages::LOGGED_OUT))
    }

    async fn current_user(&self, email: &str) -> AppResult<UserProfile> {
        self.users
            .get_by_email(email)
            .await?
            .map(UserProfile::from)
            .ok_or_else(AppError::token_invalid)
    }
}
