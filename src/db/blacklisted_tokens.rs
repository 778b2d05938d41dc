use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Returns `false` when the jti was already on the list.
pub async fn insert(
    pool: &PgPool,
    jti: Uuid,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO blacklisted_tokens (jti, user_id, expires_at)
         VALUES ($1, $2, $3) ON CONFLICT (jti) DO NOTHING",
    )
    .bind(jti)
    .bind(user_id)
    .bind(expires_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn exists(pool: &PgPool, jti: Uuid) -> Result<bool, sqlx::Error> {
    let row: (bool,) =
        sqlx::query_as("SELECT EXISTS (SELECT 1 FROM blacklisted_tokens WHERE jti = $1)")
            .bind(jti)
            .fetch_one(pool)
            .await?;
    Ok(row.0)
}

/// Rows for tokens that have expired on their own no longer need to be kept.
pub async fn purge_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM blacklisted_tokens WHERE expires_at < now()")
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
