use axum::extract::{Path, State};
use axum::{Form, Json};
use diesel::prelude::*;
use diesel::PgConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use kith_shared::errors::{AppError, AppResult};
use kith_shared::types::auth::AuthUser;
use kith_shared::types::ApiResponse;

use crate::models::{Comment, NewComment, Post};
use crate::schema::{comments, posts};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct CommentsContext {
    pub post: Post,
    pub comments: Vec<Comment>,
}

// --- GET /posts/:post_id/comments ---

pub async fn view_comments(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CommentsContext>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let context = load_context(&mut conn, post_id)?;

    Ok(Json(ApiResponse::ok(context)))
}

// --- POST /posts/:post_id/comments ---

/// Form body of the comment box. `submit` is the button marker; without it
/// the text is ignored and the page just re-renders.
#[derive(Debug, Deserialize)]
pub struct CommentForm {
    pub comment: Option<String>,
    pub submit: Option<String>,
}

pub async fn add_comment(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<Uuid>,
    Form(form): Form<CommentForm>,
) -> AppResult<Json<ApiResponse<CommentsContext>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    if form.submit.is_some() {
        let comment = diesel::insert_into(comments::table)
            .values(&NewComment {
                post_id,
                author_id: user.id,
                body: form.comment.unwrap_or_default(),
            })
            .get_result::<Comment>(&mut conn)?;

        tracing::info!(
            comment_id = %comment.id,
            post_id = %post_id,
            author_id = %user.id,
            "comment added"
        );
    }

    let context = load_context(&mut conn, post_id)?;

    Ok(Json(ApiResponse::ok(context)))
}

/// The post with its comments in the order they were written. A missing
/// post surfaces from the first read.
fn load_context(conn: &mut PgConnection, post_id: Uuid) -> AppResult<CommentsContext> {
    let post = posts::table.find(post_id).first::<Post>(conn)?;

    let post_comments = comments::table
        .filter(comments::post_id.eq(post_id))
        .order(comments::created_at.asc())
        .load::<Comment>(conn)?;

    Ok(CommentsContext {
        post,
        comments: post_comments,
    })
}
