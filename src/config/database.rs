//! PostgreSQL connection pool initialization.
//!
//! The connection string is read from `DATABASE_URL`. Pending migrations are
//! applied at startup so a fresh database is usable immediately.
//!
//! # Panics
//!
//! Panics if `DATABASE_URL` is unset, the connection fails, or a migration
//! cannot be applied. All three are unrecoverable at startup.

use sqlx::PgPool;
use std::env;

pub async fn init_db_pool() -> PgPool {
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    pool
}
