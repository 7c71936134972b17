//! Helpers for tests that need a live Postgres.
//!
//! Each helper reads `TEST_DATABASE_URL` and returns `None` when it is unset
//! or unreachable, so database-backed tests skip on machines without one.
//! Everything runs inside a diesel test transaction and rolls back on drop;
//! the pointed-at database must carry the service schema.

use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::PgConnection;

use kith_shared::clients::db::DbPool;

pub fn test_connection() -> Option<PgConnection> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let mut conn = PgConnection::establish(&url).ok()?;
    conn.begin_test_transaction().ok()?;
    Some(conn)
}

/// Single-connection pool with an open test transaction, so handler code
/// checking connections out of the pool shares the transaction with the
/// test's own setup and assertions.
pub fn test_pool() -> Option<DbPool> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let manager = ConnectionManager::<PgConnection>::new(url);
    let pool = Pool::builder().max_size(1).build(manager).ok()?;
    {
        let mut conn = pool.get().ok()?;
        conn.begin_test_transaction().ok()?;
    }
    Some(pool)
}
