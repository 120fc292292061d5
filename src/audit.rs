use serde_json::Value;
use uuid::Uuid;

use crate::{db::DbPool, error::AppResult};

/// Append one row to the audit trail. Callers treat failures as non-fatal:
/// they log a warning and carry on with the main operation.
pub async fn log_audit(
    pool: &DbPool,
    actor: Option<Uuid>,
    action: &str,
    metadata: Value,
) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO audit_logs (id, user_id, action, metadata) VALUES ($1, $2, $3, $4)",
    )
    .bind(Uuid::new_v4())
    .bind(actor)
    .bind(action)
    .bind(metadata)
    .execute(pool)
    .await?;

    Ok(())
}
