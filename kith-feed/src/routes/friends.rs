use axum::extract::State;
use axum::response::Redirect;
use axum::Json;
use axum_extra::extract::Form;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use kith_shared::errors::{AppError, AppResult};
use kith_shared::types::auth::AuthUser;
use kith_shared::types::ApiResponse;

use crate::models::{Profile, Relationship};
use crate::schema::profiles;
use crate::services::relationship_service;
use crate::AppState;

// --- GET /friends ---

#[derive(Debug, Serialize)]
pub struct ReceivedRequest {
    pub id: Uuid,
    pub sender: Profile,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct FriendsContext {
    pub friends: Vec<Profile>,
    pub sent_requests: Vec<Relationship>,
    pub received_requests: Vec<ReceivedRequest>,
    pub eligible: Vec<Profile>,
}

pub async fn friends_page(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<FriendsContext>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let me = profiles::table
        .filter(profiles::user_id.eq(user.id))
        .first::<Profile>(&mut conn)?;

    relationship_service::ensure_admin_bootstrap(&mut conn, &me, state.config.admin_user_id)?;

    let friends = relationship_service::confirmed_friends(&mut conn, &me)?;
    let sent_requests = relationship_service::sent_requests(&mut conn, &me)?;
    let received = relationship_service::received_requests(&mut conn, &me)?;
    let eligible = relationship_service::eligible_recipients(&mut conn, &me)?;

    let received_requests = received
        .into_iter()
        .map(|(relationship, sender)| ReceivedRequest {
            id: relationship.id,
            sender,
            created_at: relationship.created_at,
        })
        .collect();

    Ok(Json(ApiResponse::ok(FriendsContext {
        friends,
        sent_requests,
        received_requests,
        eligible,
    })))
}

// --- POST /friends ---

/// Form body of the friends page. The page hosts two forms: the checkbox
/// list of profiles to request, and the received-requests list whose
/// button posts the `accept_requests` marker alongside the checked
/// `friend_requests` ids.
#[derive(Debug, Deserialize)]
pub struct FriendsForm {
    #[serde(default)]
    pub send_requests: Vec<Uuid>,
    pub accept_requests: Option<String>,
    #[serde(default)]
    pub friend_requests: Vec<Uuid>,
}

#[derive(Debug, PartialEq)]
enum FriendsAction {
    Send(Vec<Uuid>),
    Accept(Vec<Uuid>),
    Nothing,
}

/// Which of the page's two forms was submitted. Checked send boxes win;
/// the accept marker is only honored without them.
fn dispatch(form: FriendsForm) -> FriendsAction {
    if !form.send_requests.is_empty() {
        FriendsAction::Send(form.send_requests)
    } else if form.accept_requests.is_some() {
        FriendsAction::Accept(form.friend_requests)
    } else {
        FriendsAction::Nothing
    }
}

pub async fn friends_action(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Form(form): Form<FriendsForm>,
) -> AppResult<Redirect> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let me = profiles::table
        .filter(profiles::user_id.eq(user.id))
        .first::<Profile>(&mut conn)?;

    relationship_service::ensure_admin_bootstrap(&mut conn, &me, state.config.admin_user_id)?;

    match dispatch(form) {
        FriendsAction::Send(receiver_ids) => {
            relationship_service::send_requests(&mut conn, &me, &receiver_ids)?;
        }
        FriendsAction::Accept(relationship_ids) => {
            relationship_service::accept_requests(&mut conn, &me, &relationship_ids)?;
        }
        FriendsAction::Nothing => {}
    }

    Ok(Redirect::to("/friends"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::{header, Request};
    use metrics_exporter_prometheus::PrometheusBuilder;

    use kith_shared::clients::media::MediaStore;
    use kith_shared::types::auth::UserRole;

    use crate::config::AppConfig;
    use crate::services::profile_service;
    use crate::test_support;

    fn form(send: Vec<Uuid>, marker: Option<&str>, accept: Vec<Uuid>) -> FriendsForm {
        FriendsForm {
            send_requests: send,
            accept_requests: marker.map(str::to_string),
            friend_requests: accept,
        }
    }

    #[test]
    fn checked_send_boxes_dispatch_to_send() {
        let id = Uuid::now_v7();
        assert_eq!(
            dispatch(form(vec![id], None, vec![])),
            FriendsAction::Send(vec![id])
        );
    }

    #[test]
    fn send_boxes_win_over_the_accept_marker() {
        let send_id = Uuid::now_v7();
        let accept_id = Uuid::now_v7();
        assert_eq!(
            dispatch(form(vec![send_id], Some("Accept"), vec![accept_id])),
            FriendsAction::Send(vec![send_id])
        );
    }

    #[test]
    fn accept_marker_dispatches_the_checked_requests() {
        let id = Uuid::now_v7();
        assert_eq!(
            dispatch(form(vec![], Some("Accept"), vec![id])),
            FriendsAction::Accept(vec![id])
        );
    }

    #[test]
    fn accept_marker_without_checked_requests_accepts_nothing() {
        assert_eq!(
            dispatch(form(vec![], Some("Accept"), vec![])),
            FriendsAction::Accept(vec![])
        );
    }

    #[test]
    fn empty_submission_does_nothing() {
        assert_eq!(dispatch(form(vec![], None, vec![])), FriendsAction::Nothing);
    }

    #[tokio::test]
    async fn repeated_fields_collect_into_lists() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        let body = format!("send_requests={a}&send_requests={b}");

        let request = Request::builder()
            .method("POST")
            .uri("/friends")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();

        let Form(parsed) = Form::<FriendsForm>::from_request(request, &()).await.unwrap();
        assert_eq!(parsed.send_requests, vec![a, b]);
        assert!(parsed.accept_requests.is_none());
        assert!(parsed.friend_requests.is_empty());
    }

    #[tokio::test]
    async fn accept_form_parses_marker_and_ids() {
        let id = Uuid::now_v7();
        let body = format!("accept_requests=Accept&friend_requests={id}");

        let request = Request::builder()
            .method("POST")
            .uri("/friends")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();

        let Form(parsed) = Form::<FriendsForm>::from_request(request, &()).await.unwrap();
        assert!(parsed.send_requests.is_empty());
        assert_eq!(parsed.accept_requests.as_deref(), Some("Accept"));
        assert_eq!(parsed.friend_requests, vec![id]);
    }

    // Needs a schema-bearing database at TEST_DATABASE_URL; skips otherwise.
    #[tokio::test]
    async fn send_only_submission_still_seeds_the_admin_request() {
        let Some(pool) = test_support::test_pool() else {
            return;
        };

        let admin_user = Uuid::now_v7();
        let me_user = Uuid::now_v7();
        let other_user = Uuid::now_v7();

        let (admin, other) = {
            let mut conn = pool.get().unwrap();
            let admin = profile_service::get_or_create(&mut conn, admin_user).unwrap();
            profile_service::get_or_create(&mut conn, me_user).unwrap();
            let other = profile_service::get_or_create(&mut conn, other_user).unwrap();
            (admin, other)
        };

        let media_root =
            std::env::temp_dir().join(format!("kith-friends-test-{}", Uuid::now_v7()));
        let state = Arc::new(AppState {
            db: pool.clone(),
            config: AppConfig {
                port: 8000,
                database_url: String::new(),
                db_pool_size: 1,
                admin_user_id: admin_user,
                media_root: media_root.display().to_string(),
                media_public_url: "http://localhost:8000/media".into(),
            },
            media: MediaStore::new(&media_root, "http://localhost:8000/media").await,
            metrics_handle: PrometheusBuilder::new().build_recorder().handle(),
        });

        // First friends interaction ever is the POST half of the page.
        let user = AuthUser {
            id: me_user,
            role: UserRole::User,
            token_id: Uuid::now_v7(),
        };
        let form = FriendsForm {
            send_requests: vec![other.id],
            accept_requests: None,
            friend_requests: vec![],
        };
        friends_action(user, State(state), Form(form)).await.unwrap();

        // Both the explicit request and the welcome request exist.
        let mut conn = pool.get().unwrap();
        let me = profile_service::find_by_user(&mut conn, me_user)
            .unwrap()
            .unwrap();
        let sent = relationship_service::sent_requests(&mut conn, &me).unwrap();
        assert!(sent
            .iter()
            .any(|r| r.receiver_id == admin.id && r.status == "sent"));
        assert!(sent
            .iter()
            .any(|r| r.receiver_id == other.id && r.status == "sent"));

        // A later page view seeds nothing further.
        relationship_service::ensure_admin_bootstrap(&mut conn, &me, admin_user).unwrap();
        let sent = relationship_service::sent_requests(&mut conn, &me).unwrap();
        assert_eq!(sent.len(), 2);

        tokio::fs::remove_dir_all(&media_root).await.ok();
    }
}
