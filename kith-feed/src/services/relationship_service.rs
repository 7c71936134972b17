use diesel::prelude::*;
use diesel::PgConnection;
use uuid::Uuid;

use kith_shared::errors::AppResult;

use crate::models::{NewFriendship, NewRelationship, Profile, Relationship};
use crate::schema::{friendships, profiles, relationships};

/// Seeds the welcome friend request on a user's first friends-page visit.
///
/// A user who has never sent a request gets one created towards the
/// administrator profile, so newcomers always have a pending connection.
/// The emptiness check plus the (sender, receiver) unique constraint keep
/// this single-shot even when first visits race.
pub fn ensure_admin_bootstrap(
    conn: &mut PgConnection,
    user_profile: &Profile,
    admin_user_id: Uuid,
) -> AppResult<()> {
    let admin_profile = profiles::table
        .filter(profiles::user_id.eq(admin_user_id))
        .first::<Profile>(conn)?;

    let sent_count: i64 = relationships::table
        .filter(relationships::sender_id.eq(user_profile.id))
        .count()
        .get_result(conn)?;

    if sent_count > 0 {
        return Ok(());
    }

    let created = diesel::insert_into(relationships::table)
        .values(&NewRelationship {
            sender_id: user_profile.id,
            receiver_id: admin_profile.id,
            status: "sent".into(),
        })
        .on_conflict_do_nothing()
        .execute(conn)?;

    if created > 0 {
        tracing::info!(
            profile_id = %user_profile.id,
            admin_profile_id = %admin_profile.id,
            "welcome friend request created"
        );
    }

    Ok(())
}

/// Sends a friend request to each listed profile. Requests that already
/// exist for a pair are skipped by the conditional insert; unknown receiver
/// ids fail the whole call.
pub fn send_requests(
    conn: &mut PgConnection,
    sender: &Profile,
    receiver_ids: &[Uuid],
) -> AppResult<usize> {
    let mut created = 0;

    for receiver_id in receiver_ids {
        let receiver = profiles::table
            .find(*receiver_id)
            .first::<Profile>(conn)?;

        created += diesel::insert_into(relationships::table)
            .values(&NewRelationship {
                sender_id: sender.id,
                receiver_id: receiver.id,
                status: "sent".into(),
            })
            .on_conflict_do_nothing()
            .execute(conn)?;
    }

    tracing::info!(
        profile_id = %sender.id,
        requested = receiver_ids.len(),
        created = created,
        "friend requests sent"
    );

    Ok(created)
}

/// Accepts the listed friend requests on behalf of `receiver`: each
/// relationship is marked accepted and a confirmed-friend edge is written
/// in both directions.
///
/// The status update and the edge insert are separate statements, so a
/// crash in between leaves an accepted relationship without its edges;
/// re-accepting repairs it because both writes are idempotent.
pub fn accept_requests(
    conn: &mut PgConnection,
    receiver: &Profile,
    relationship_ids: &[Uuid],
) -> AppResult<usize> {
    let mut accepted = 0;

    for relationship_id in relationship_ids {
        let relationship: Relationship =
            diesel::update(relationships::table.find(*relationship_id))
                .set((
                    relationships::status.eq("accepted"),
                    relationships::updated_at.eq(chrono::Utc::now()),
                ))
                .get_result(conn)?;

        diesel::insert_into(friendships::table)
            .values(&vec![
                NewFriendship {
                    profile_id: receiver.id,
                    friend_id: relationship.sender_id,
                },
                NewFriendship {
                    profile_id: relationship.sender_id,
                    friend_id: receiver.id,
                },
            ])
            .on_conflict_do_nothing()
            .execute(conn)?;

        accepted += 1;

        tracing::info!(
            relationship_id = %relationship.id,
            profile_id = %receiver.id,
            sender_id = %relationship.sender_id,
            "friend request accepted"
        );
    }

    Ok(accepted)
}

/// Confirmed friends of `profile`, most recently added first.
pub fn confirmed_friends(
    conn: &mut PgConnection,
    profile: &Profile,
) -> AppResult<Vec<Profile>> {
    let friend_ids: Vec<Uuid> = friendships::table
        .filter(friendships::profile_id.eq(profile.id))
        .order(friendships::created_at.desc())
        .select(friendships::friend_id)
        .load::<Uuid>(conn)?;

    let mut friends = profiles::table
        .filter(profiles::id.eq_any(&friend_ids))
        .load::<Profile>(conn)?;

    // Preserve order from the friendships query (most recent first)
    let id_order: std::collections::HashMap<Uuid, usize> =
        friend_ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    friends.sort_by_key(|p| id_order.get(&p.id).copied().unwrap_or(usize::MAX));

    Ok(friends)
}

/// Requests `profile` has sent, whatever their current status.
pub fn sent_requests(
    conn: &mut PgConnection,
    profile: &Profile,
) -> AppResult<Vec<Relationship>> {
    let sent = relationships::table
        .filter(relationships::sender_id.eq(profile.id))
        .order(relationships::created_at.desc())
        .load::<Relationship>(conn)?;

    Ok(sent)
}

/// Pending requests addressed to `profile`, paired with the sender's profile.
pub fn received_requests(
    conn: &mut PgConnection,
    profile: &Profile,
) -> AppResult<Vec<(Relationship, Profile)>> {
    let received = relationships::table
        .inner_join(profiles::table)
        .filter(relationships::receiver_id.eq(profile.id))
        .filter(relationships::status.eq("sent"))
        .order(relationships::created_at.desc())
        .load::<(Relationship, Profile)>(conn)?;

    Ok(received)
}

/// Profiles `profile` could still send a request to: everyone except
/// themselves, their confirmed friends, and receivers they already
/// requested.
pub fn eligible_recipients(
    conn: &mut PgConnection,
    profile: &Profile,
) -> AppResult<Vec<Profile>> {
    let friend_ids = friendships::table
        .filter(friendships::profile_id.eq(profile.id))
        .select(friendships::friend_id);
    let requested_ids = relationships::table
        .filter(relationships::sender_id.eq(profile.id))
        .select(relationships::receiver_id);

    let eligible = profiles::table
        .filter(profiles::id.ne(profile.id))
        .filter(profiles::id.ne_all(friend_ids))
        .filter(profiles::id.ne_all(requested_ids))
        .order(profiles::created_at.asc())
        .load::<Profile>(conn)?;

    Ok(eligible)
}
