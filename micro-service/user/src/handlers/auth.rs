use axum::{Json, extract::State, http::StatusCode};

use app_error::{
    AppResult,
    extract::{AppForm, AppJson, AppPath},
};
use app_middleware::{AuthUser, BearerToken};
use app_models::{
    LoginInput, MessageResponse, RequestEmailInput, SignupInput, SignupResponse, TokenPair,
};

use crate::state::AppState;

pub async fn signup(
    State(state): State<AppState>,
    AppJson(input): AppJson<SignupInput>,
) -> AppResult<(StatusCode, Json<SignupResponse>)> {
    let created = state.auth.signup(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn login(
    State(state): State<AppState>,
    AppForm(input): AppForm<LoginInput>,
) -> AppResult<Json<TokenPair>> {
    state.auth.login(input).await.map(Json)
}

pub async fn refresh_token(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> AppResult<Json<TokenPair>> {
    state.auth.refresh(&token).await.map(Json)
}

pub async fn confirmed_email(
    State(state): State<AppState>,
    AppPath(token): AppPath<String>,
) -> AppResult<Json<MessageResponse>> {
    state.auth.confirm_email(&token).await.map(Json)
}

pub async fn request_email(
    State(state): State<AppState>,
    AppJson(input): AppJson<RequestEmailInput>,
) -> AppResult<Json<MessageResponse>> {
    state.auth.request_email(input).await.map(Json)
}

pub async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<MessageResponse>> {
    state.auth.logout(user.email()).await.map(Json)
}
