use axum::{Json, extract::State};

use app_error::AppResult;
use app_middleware::AuthUser;
use app_models::UserProfile;

use crate::state::AppState;

pub async fn me(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<UserProfile>> {
    state.auth.current_user(user.email()).await.map(Json)
}
