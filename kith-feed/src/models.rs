use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::schema::{comments, friendships, likes, posts, profiles, relationships};

// --- Profile ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = profiles)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = profiles)]
pub struct NewProfile {
    pub user_id: Uuid,
}

/// Form body of `POST /profile`. Absent fields leave the stored value
/// untouched.
#[derive(Debug, AsChangeset, Deserialize, Validate, Default)]
#[diesel(table_name = profiles)]
pub struct UpdateProfile {
    #[validate(length(max = 30, message = "display name must be at most 30 characters"))]
    pub display_name: Option<String>,
    #[validate(length(max = 500, message = "bio must be at most 500 characters"))]
    pub bio: Option<String>,
}

// --- Friendship ---

// Friendship edges are only ever written or filtered by id; nothing loads
// whole rows, so the insertable struct is the only mapping here.
#[derive(Debug, Insertable)]
#[diesel(table_name = friendships)]
pub struct NewFriendship {
    pub profile_id: Uuid,
    pub friend_id: Uuid,
}

// --- Relationship ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = relationships)]
pub struct Relationship {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = relationships)]
pub struct NewRelationship {
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub status: String,
}

// --- Post ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = posts)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = posts)]
pub struct NewPost {
    pub author_id: Uuid,
    pub body: String,
    pub image_url: Option<String>,
}

// --- Comment ---

#[derive(Debug, Queryable, Identifiable, Serialize)]
#[diesel(table_name = comments)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = comments)]
pub struct NewComment {
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
}

// --- Like ---

#[derive(Debug, Queryable, Identifiable, Serialize)]
#[diesel(table_name = likes)]
pub struct Like {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = likes)]
pub struct NewLike {
    pub post_id: Uuid,
    pub user_id: Uuid,
}
