use diesel::prelude::*;
use diesel::PgConnection;
use uuid::Uuid;

use kith_shared::errors::AppResult;

use crate::models::{NewProfile, Profile};
use crate::schema::profiles;

/// Returns the caller's profile, creating an empty one on the first visit.
///
/// The insert is conditional on the `user_id` unique constraint, so two
/// concurrent first visits converge on a single row and both callers read
/// it back.
pub fn get_or_create(conn: &mut PgConnection, user_id: Uuid) -> AppResult<Profile> {
    let created = diesel::insert_into(profiles::table)
        .values(&NewProfile { user_id })
        .on_conflict(profiles::user_id)
        .do_nothing()
        .execute(conn)?;

    if created > 0 {
        tracing::info!(user_id = %user_id, "profile created");
    }

    let profile = profiles::table
        .filter(profiles::user_id.eq(user_id))
        .first::<Profile>(conn)?;

    Ok(profile)
}

/// Looks up the caller's profile without creating one.
pub fn find_by_user(conn: &mut PgConnection, user_id: Uuid) -> AppResult<Option<Profile>> {
    let profile = profiles::table
        .filter(profiles::user_id.eq(user_id))
        .first::<Profile>(conn)
        .optional()?;

    Ok(profile)
}
