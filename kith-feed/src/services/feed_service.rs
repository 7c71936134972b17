use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel::PgConnection;
use serde::Serialize;
use uuid::Uuid;

use kith_shared::errors::AppResult;

use crate::models::{NewLike, Post, Profile};
use crate::schema::{comments, likes, posts};
use crate::services::relationship_service;

/// A post as the feed pages show it, with its interaction counts.
#[derive(Debug, Serialize)]
pub struct FeedEntry {
    pub post: Post,
    pub comment_count: i64,
    pub like_count: i64,
}

/// The caller's own posts, newest first.
pub fn own_feed(conn: &mut PgConnection, author_id: Uuid) -> AppResult<Vec<FeedEntry>> {
    let own_posts = posts::table
        .filter(posts::author_id.eq(author_id))
        .order(posts::created_at.desc())
        .load::<Post>(conn)?;

    annotate_counts(conn, own_posts)
}

/// Posts authored by the profile's confirmed friends, newest first.
pub fn friends_feed(conn: &mut PgConnection, profile: &Profile) -> AppResult<Vec<FeedEntry>> {
    let friends = relationship_service::confirmed_friends(conn, profile)?;
    let author_ids: Vec<Uuid> = friends.iter().map(|p| p.user_id).collect();

    let friend_posts = posts::table
        .filter(posts::author_id.eq_any(&author_ids))
        .order(posts::created_at.desc())
        .load::<Post>(conn)?;

    annotate_counts(conn, friend_posts)
}

/// Records that `user_id` likes the post. Returns whether a row was
/// written; a repeat like is absorbed by the (post, user) unique
/// constraint and writes nothing.
pub fn like_post(conn: &mut PgConnection, post_id: Uuid, user_id: Uuid) -> AppResult<bool> {
    let created = diesel::insert_into(likes::table)
        .values(&NewLike { post_id, user_id })
        .on_conflict_do_nothing()
        .execute(conn)?;

    Ok(created > 0)
}

/// One comment count and one like count per post, the way the feed pages
/// display them.
fn annotate_counts(conn: &mut PgConnection, feed_posts: Vec<Post>) -> AppResult<Vec<FeedEntry>> {
    let mut entries = Vec::with_capacity(feed_posts.len());

    for post in feed_posts {
        let comment_count: i64 = comments::table
            .filter(comments::post_id.eq(post.id))
            .select(count_star())
            .first(conn)?;
        let like_count: i64 = likes::table
            .filter(likes::post_id.eq(post.id))
            .select(count_star())
            .first(conn)?;

        entries.push(FeedEntry {
            post,
            comment_count,
            like_count,
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn feed_entry_serializes_with_nested_post() {
        let entry = FeedEntry {
            post: Post {
                id: Uuid::now_v7(),
                author_id: Uuid::now_v7(),
                body: "first post".into(),
                image_url: None,
                created_at: Utc::now(),
            },
            comment_count: 3,
            like_count: 7,
        };

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["post"]["body"], "first post");
        assert_eq!(value["comment_count"], 3);
        assert_eq!(value["like_count"], 7);
        assert!(value["post"]["image_url"].is_null());
    }
}
