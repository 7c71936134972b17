use axum::extract::{Multipart, State};
use axum::response::Redirect;
use axum::Json;
use diesel::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use kith_shared::errors::{AppError, AppResult, ErrorCode};
use kith_shared::types::auth::AuthUser;
use kith_shared::types::ApiResponse;

use crate::models::{NewPost, Post};
use crate::schema::posts;
use crate::AppState;

const POST_BODY_MAX_CHARS: usize = 2000;
const ACCEPTED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/webp", "image/gif"];

// --- GET /posts/new ---

#[derive(Debug, Serialize)]
pub struct NewPostFormContext {
    pub body_max_chars: usize,
    pub accepted_image_types: &'static [&'static str],
}

/// The constraints a client needs to render the new-post form.
pub async fn new_post_form(_user: AuthUser) -> Json<ApiResponse<NewPostFormContext>> {
    Json(ApiResponse::ok(NewPostFormContext {
        body_max_chars: POST_BODY_MAX_CHARS,
        accepted_image_types: ACCEPTED_IMAGE_TYPES,
    }))
}

// --- POST /posts/new ---

pub async fn create_post(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> AppResult<Redirect> {
    let mut body: Option<String> = None;
    let mut image: Option<(Vec<u8>, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::new(ErrorCode::ValidationError, format!("failed to read multipart: {e}")))?
    {
        match field.name().unwrap_or("") {
            "body" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::new(ErrorCode::ValidationError, format!("failed to read field: {e}")))?;
                body = Some(text);
            }
            "image" => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::new(ErrorCode::ValidationError, format!("failed to read file data: {e}")))?;

                // Browsers submit an empty file part when no image was chosen
                if !data.is_empty() {
                    image = Some((data.to_vec(), content_type));
                }
            }
            _ => {}
        }
    }

    let body = validate_body(body)?;

    let image_url = match image {
        Some((data, content_type)) => {
            let ext = image_extension(&content_type).ok_or_else(|| {
                AppError::new(
                    ErrorCode::ValidationError,
                    "unsupported image format, accepted: jpeg, png, webp, gif",
                )
            })?;

            let key = format!("posts/{}.{}", Uuid::now_v7(), ext);
            let url = state
                .media
                .store(&key, data)
                .await
                .map_err(AppError::internal)?;
            Some(url)
        }
        None => None,
    };

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let post = diesel::insert_into(posts::table)
        .values(&NewPost {
            author_id: user.id,
            body,
            image_url,
        })
        .get_result::<Post>(&mut conn)?;

    tracing::info!(
        post_id = %post.id,
        author_id = %user.id,
        has_image = post.image_url.is_some(),
        "post created"
    );

    Ok(Redirect::to("/feed"))
}

/// The post body must have visible content and fit the column.
fn validate_body(body: Option<String>) -> AppResult<String> {
    let body = body.unwrap_or_default();
    let trimmed = body.trim();

    if trimmed.is_empty() {
        return Err(AppError::with_details(
            ErrorCode::ValidationError,
            "invalid form submission",
            serde_json::json!({ "body": "post body must not be empty" }),
        ));
    }
    if trimmed.chars().count() > POST_BODY_MAX_CHARS {
        return Err(AppError::with_details(
            ErrorCode::ValidationError,
            "invalid form submission",
            serde_json::json!({ "body": "post body must be at most 2000 characters" }),
        ));
    }

    Ok(trimmed.to_string())
}

/// File extension for an accepted image content type.
fn image_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}
