use axum::extract::State;
use axum::response::Redirect;
use axum::{Form, Json};
use diesel::prelude::*;
use std::sync::Arc;
use validator::Validate;

use kith_shared::errors::{AppError, AppResult};
use kith_shared::types::auth::AuthUser;
use kith_shared::types::ApiResponse;

use crate::models::{Profile, UpdateProfile};
use crate::schema::profiles;
use crate::services::profile_service;
use crate::AppState;

// --- GET /profile ---

pub async fn view_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let profile = profile_service::get_or_create(&mut conn, user.id)?;

    Ok(Json(ApiResponse::ok(profile)))
}

// --- POST /profile ---

pub async fn update_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Form(form): Form<UpdateProfile>,
) -> AppResult<Redirect> {
    form.validate().map_err(super::form_error)?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    // The profile page serves first-time visitors too, so the write path
    // creates the row the same way the read path does.
    let profile = profile_service::get_or_create(&mut conn, user.id)?;

    diesel::update(profiles::table.filter(profiles::id.eq(profile.id)))
        .set((&form, profiles::updated_at.eq(chrono::Utc::now())))
        .execute(&mut conn)?;

    tracing::info!(profile_id = %profile.id, "profile updated");

    Ok(Redirect::to("/profile"))
}

#[cfg(test)]
mod tests {
    use crate::models::UpdateProfile;
    use validator::Validate;

    #[test]
    fn empty_form_is_valid() {
        let form = UpdateProfile::default();
        assert!(form.validate().is_ok());
    }

    #[test]
    fn overlong_display_name_is_rejected() {
        let form = UpdateProfile {
            display_name: Some("x".repeat(31)),
            bio: None,
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("display_name"));
    }

    #[test]
    fn overlong_bio_is_rejected() {
        let form = UpdateProfile {
            display_name: None,
            bio: Some("b".repeat(501)),
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("bio"));
    }

    #[test]
    fn fields_at_their_limits_are_accepted() {
        let form = UpdateProfile {
            display_name: Some("x".repeat(30)),
            bio: Some("b".repeat(500)),
        };
        assert!(form.validate().is_ok());
    }
}
