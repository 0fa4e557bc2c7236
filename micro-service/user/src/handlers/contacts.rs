use axum::{Json, extract::State, http::StatusCode};

use app_error::{
    AppResult,
    extract::{AppJson, AppPath, AppQuery},
};
use app_middleware::AuthUser;
use app_models::{BirthdayQuery, ContactInput, ContactListQuery, ContactResponse, ContactSearchQuery};

use crate::state::AppState;

fn respond(contacts: Vec<app_models::Contact>) -> Json<Vec<ContactResponse>> {
    Json(contacts.into_iter().map(ContactResponse::from).collect())
}

pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(query): AppQuery<ContactListQuery>,
) -> AppResult<Json<Vec<ContactResponse>>> {
    state.contacts.list(user.email(), query).await.map(respond)
}

pub async fn search(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(query): AppQuery<ContactSearchQuery>,
) -> AppResult<Json<Vec<ContactResponse>>> {
    state.contacts.search(user.email(), &query.q).await.map(respond)
}

pub async fn birthdays(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(query): AppQuery<BirthdayQuery>,
) -> AppResult<Json<Vec<ContactResponse>>> {
    state
        .contacts
        .upcoming_birthdays(user.email(), query.days)
        .await
        .map(respond)
}

pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<String>,
) -> AppResult<Json<ContactResponse>> {
    let contact = state.contacts.get(user.email(), &id).await?;
    Ok(Json(contact.into()))
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(input): AppJson<ContactInput>,
) -> AppResult<(StatusCode, Json<ContactResponse>)> {
    let contact = state.contacts.create(user.email(), input).await?;
    Ok((StatusCode::CREATED, Json(contact.into())))
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<String>,
    AppJson(input): AppJson<ContactInput>,
) -> AppResult<Json<ContactResponse>> {
    let contact = state.contacts.update(user.email(), &id, input).await?;
    Ok(Json(contact.into()))
}

pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<String>,
) -> AppResult<Json<ContactResponse>> {
    let contact = state.contacts.remove(user.email(), &id).await?;
    Ok(Json(contact.into()))
}
