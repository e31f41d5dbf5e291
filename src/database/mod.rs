pub mod document_repository;
pub mod models;
pub mod user_repository;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::config::PostgresConfig;

/// Build a connection pool from the discrete postgres settings. Pings once so
/// a bad address fails at startup instead of on the first request.
pub async fn connect_pool(cfg: &PostgresConfig) -> Result<PgPool, sqlx::Error> {
    let url = format!(
        "postgres://{}:{}@{}:{}/{}",
        cfg.user, cfg.password, cfg.host, cfg.port, cfg.db_name
    );
    let pool = PgPoolOptions::new()
        .max_connections(cfg.pool_max_cons)
        .connect(&url)
        .await?;
    sqlx::query("SELECT 1").execute(&pool).await?;
    info!(host = %cfg.host, db = %cfg.db_name, max_cons = cfg.pool_max_cons, "created database pool");
    Ok(pool)
}

/// Liveness probe used by the /health endpoints.
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Returns the violated constraint name when `err` is a unique violation,
/// so callers can surface `UniqueConflict` instead of an opaque database
/// error.
pub(crate) fn unique_violation(err: &sqlx::Error) -> Option<String> {
    if let sqlx::Error::Database(db_err) = err {
        if db_err.is_unique_violation() {
            return Some(db_err.constraint().unwrap_or("unique constraint").to_string());
        }
    }
    None
}
