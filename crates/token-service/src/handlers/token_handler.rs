use crate::errors::TsError;
use crate::models::{TokenQuery, TokenResponse};
use crate::routes::AppState;
use crate::services::token_service;
use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;
use tracing::instrument;

/// Handle `GET /token?room=&identity=&is_publisher=`.
///
/// Parameter validation happens in the service layer so that missing
/// parameters produce the same JSON error body as any other rejection.
#[instrument(
    name = "ts.token.issue",
    skip_all,
    fields(room = query.room.as_deref().unwrap_or_default(), is_publisher = query.is_publisher.as_deref().unwrap_or("false"))
)]
pub async fn get_token(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<TokenResponse>, TsError> {
    let response = token_service::issue_room_token(&state.signer, &state.config, &query)?;
    Ok(Json(response))
}
