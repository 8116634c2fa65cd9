use serde_json::Value;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

use intake_domain::session::SessionStatus;

use crate::{Error, Result, db::Db, models::SyncSession};

#[derive(Clone, Debug, Default)]
pub struct ProgressPatch {
	pub status: Option<SessionStatus>,
	pub current_step: Option<String>,
	pub progress_percentage: Option<i32>,
	pub total_items: Option<i32>,
	pub imported_items: Option<i32>,
	pub failed_items: Option<i32>,
}

pub async fn create(db: &Db, user_id: Uuid, service: &str, preferences: &Value) -> Result<Uuid> {
	let session_id = Uuid::new_v4();

	sqlx::query(
		"\
INSERT INTO sync_sessions (session_id, user_id, service, status, preferences)
VALUES ($1, $2, $3, 'started', $4)",
	)
	.bind(session_id)
	.bind(user_id)
	.bind(service)
	.bind(preferences)
	.execute(&db.pool)
	.await?;

	Ok(session_id)
}

/// Apply a progress patch in place. Terminal sessions are left untouched;
/// the return value reports whether a row was written.
pub async fn update_progress(db: &Db, session_id: Uuid, patch: &ProgressPatch) -> Result<bool> {
	let result = sqlx::query(
		"\
UPDATE sync_sessions
SET status = COALESCE($2, status),
	current_step = COALESCE($3, current_step),
	progress_percentage = COALESCE($4, progress_percentage),
	total_items = COALESCE($5, total_items),
	imported_items = COALESCE($6, imported_items),
	failed_items = COALESCE($7, failed_items)
WHERE session_id = $1 AND status NOT IN ('completed', 'failed')",
	)
	.bind(session_id)
	.bind(patch.status.map(|status| status.as_str()))
	.bind(patch.current_step.as_deref())
	.bind(patch.progress_percentage)
	.bind(patch.total_items)
	.bind(patch.imported_items)
	.bind(patch.failed_items)
	.execute(&db.pool)
	.await?;

	Ok(result.rows_affected() > 0)
}

pub async fn complete(db: &Db, session_id: Uuid) -> Result<bool> {
	let now = OffsetDateTime::now_utc();
	let result = sqlx::query(
		"\
UPDATE sync_sessions
SET status = 'completed', progress_percentage = 100, completed_at = $2
WHERE session_id = $1 AND status NOT IN ('completed', 'failed')",
	)
	.bind(session_id)
	.bind(now)
	.execute(&db.pool)
	.await?;

	Ok(result.rows_affected() > 0)
}

/// Fail the session, keeping whatever progress was already reported.
pub async fn fail(db: &Db, session_id: Uuid, error: &str) -> Result<bool> {
	let now = OffsetDateTime::now_utc();
	let timestamp = now
		.format(&Rfc3339)
		.map_err(|_| Error::InvalidArgument("Failed to format timestamp.".to_string()))?;
	let details = serde_json::json!({ "error": error, "timestamp": timestamp });
	let result = sqlx::query(
		"\
UPDATE sync_sessions
SET status = 'failed', error_details = $2, completed_at = $3
WHERE session_id = $1 AND status NOT IN ('completed', 'failed')",
	)
	.bind(session_id)
	.bind(details)
	.bind(now)
	.execute(&db.pool)
	.await?;

	Ok(result.rows_affected() > 0)
}

/// Attach a partial-failure summary without changing the session status.
pub async fn set_error_details(db: &Db, session_id: Uuid, details: &Value) -> Result<bool> {
	let result = sqlx::query(
		"\
UPDATE sync_sessions
SET error_details = $2
WHERE session_id = $1 AND status NOT IN ('completed', 'failed')",
	)
	.bind(session_id)
	.bind(details)
	.execute(&db.pool)
	.await?;

	Ok(result.rows_affected() > 0)
}

pub async fn fetch(db: &Db, session_id: Uuid) -> Result<Option<SyncSession>> {
	let session =
		sqlx::query_as::<_, SyncSession>("SELECT * FROM sync_sessions WHERE session_id = $1")
			.bind(session_id)
			.fetch_optional(&db.pool)
			.await?;

	Ok(session)
}
