use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Form, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use kith_shared::errors::{AppError, AppResult};
use kith_shared::types::auth::AuthUser;
use kith_shared::types::ApiResponse;

use crate::services::feed_service::{self, FeedEntry};
use crate::services::profile_service;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct FeedContext {
    pub entries: Vec<FeedEntry>,
}

// --- GET /feed ---

pub async fn my_feed(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<FeedContext>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let entries = feed_service::own_feed(&mut conn, user.id)?;

    Ok(Json(ApiResponse::ok(FeedContext { entries })))
}

// --- GET /feed/friends ---

pub async fn friends_feed(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<FeedContext>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    // A user without a profile has no friends yet; their feed is empty.
    let entries = match profile_service::find_by_user(&mut conn, user.id)? {
        Some(profile) => feed_service::friends_feed(&mut conn, &profile)?,
        None => Vec::new(),
    };

    Ok(Json(ApiResponse::ok(FeedContext { entries })))
}

// --- POST /feed/friends ---

/// The like button posts back to the friends feed with the liked post's id.
#[derive(Debug, Deserialize)]
pub struct LikeForm {
    pub like: Option<Uuid>,
}

pub async fn submit_like(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Form(form): Form<LikeForm>,
) -> AppResult<Response> {
    let Some(post_id) = form.like else {
        // No like in the submission: behave like the page view.
        return Ok(friends_feed(user, State(state)).await?.into_response());
    };

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let created = feed_service::like_post(&mut conn, post_id, user.id)?;
    if created {
        tracing::info!(post_id = %post_id, user_id = %user.id, "post liked");
    }

    Ok(Redirect::to("/feed/friends").into_response())
}
