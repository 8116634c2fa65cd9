use serde_json::Value;
use sqlx::QueryBuilder;
use time::OffsetDateTime;
use uuid::Uuid;

use intake_domain::job::{JobKind, Priority};

use crate::{Error, Result, db::Db, models::Job};

const JOB_COLUMNS: &str = "\
job_id, user_id, type, payload, status, priority, batch_id, attempts, last_error, available_at, \
created_at, claimed_at";

#[derive(Clone, Debug, Default)]
pub struct EnqueueOptions {
	pub priority: Priority,
	pub batch_id: Option<Uuid>,
}

pub async fn enqueue(
	db: &Db,
	user_id: Uuid,
	kind: JobKind,
	payload: &Value,
	options: &EnqueueOptions,
) -> Result<Uuid> {
	let job_id = Uuid::new_v4();

	sqlx::query(
		"\
INSERT INTO jobs (job_id, user_id, type, payload, status, priority, batch_id)
VALUES ($1, $2, $3, $4, 'queued', $5, $6)",
	)
	.bind(job_id)
	.bind(user_id)
	.bind(kind.as_str())
	.bind(payload)
	.bind(options.priority.as_str())
	.bind(options.batch_id)
	.execute(&db.pool)
	.await?;

	Ok(job_id)
}

pub async fn enqueue_batch(
	db: &Db,
	user_id: Uuid,
	kind: JobKind,
	items: &[(Value, EnqueueOptions)],
) -> Result<Vec<Uuid>> {
	if items.is_empty() {
		return Ok(Vec::new());
	}

	let mut job_ids = Vec::with_capacity(items.len());
	let mut builder = QueryBuilder::new(
		"INSERT INTO jobs (job_id, user_id, type, payload, status, priority, batch_id) ",
	);

	builder.push_values(items, |mut b, (payload, options)| {
		let job_id = Uuid::new_v4();

		job_ids.push(job_id);

		b.push_bind(job_id)
			.push_bind(user_id)
			.push_bind(kind.as_str())
			.push_bind(payload.clone())
			.push_bind("queued")
			.push_bind(options.priority.as_str())
			.push_bind(options.batch_id);
	});
	builder.build().execute(&db.pool).await?;

	Ok(job_ids)
}

/// Claim up to `limit` queued jobs for any user. The claim is one guarded
/// UPDATE over a `FOR UPDATE SKIP LOCKED` selection, so concurrent runners
/// never receive the same job.
pub async fn claim_next(db: &Db, limit: i64) -> Result<Vec<Job>> {
	claim(db, None, limit).await
}

pub async fn claim_next_for_user(db: &Db, user_id: Uuid, limit: i64) -> Result<Vec<Job>> {
	claim(db, Some(user_id), limit).await
}

async fn claim(db: &Db, user_id: Option<Uuid>, limit: i64) -> Result<Vec<Job>> {
	let now = OffsetDateTime::now_utc();
	let sql = format!(
		"\
UPDATE jobs
SET status = 'running', claimed_at = $1
WHERE job_id IN (
	SELECT job_id
	FROM jobs
	WHERE status = 'queued' AND available_at <= $1 AND ($2::uuid IS NULL OR user_id = $2)
	ORDER BY
		created_at ASC,
		CASE priority WHEN 'high' THEN 0 WHEN 'medium' THEN 1 ELSE 2 END ASC,
		job_id ASC
	LIMIT $3
	FOR UPDATE SKIP LOCKED
)
RETURNING {JOB_COLUMNS}"
	);
	let jobs = sqlx::query_as::<_, Job>(&sql)
		.bind(now)
		.bind(user_id)
		.bind(limit)
		.fetch_all(&db.pool)
		.await?;

	Ok(jobs)
}

pub async fn mark_done(db: &Db, job_id: Uuid) -> Result<()> {
	let result = sqlx::query(
		"UPDATE jobs SET status = 'done' WHERE job_id = $1 AND status = 'running'",
	)
	.bind(job_id)
	.execute(&db.pool)
	.await?;

	if result.rows_affected() == 0 {
		return Err(Error::NotFound(format!("Job {job_id} is not running.")));
	}

	Ok(())
}

/// Record a failure. Retryable failures requeue the job behind an exponential
/// backoff while attempts remain below `max_attempts`; everything else parks
/// it as `error`. Returns whether the job was requeued.
pub async fn mark_failed(
	db: &Db,
	job_id: Uuid,
	error: &str,
	retryable: bool,
	max_attempts: i32,
) -> Result<bool> {
	let attempts: i32 = sqlx::query_scalar("SELECT attempts FROM jobs WHERE job_id = $1")
		.bind(job_id)
		.fetch_one(&db.pool)
		.await?;
	let next_attempts = attempts.saturating_add(1);
	let available_at =
		OffsetDateTime::now_utc() + intake_domain::backoff::backoff_for_attempt(next_attempts);
	let status: String = sqlx::query_scalar(
		"\
UPDATE jobs
SET attempts = attempts + 1,
	last_error = $2,
	claimed_at = NULL,
	status = CASE WHEN $3 AND attempts + 1 < $4 THEN 'queued' ELSE 'error' END,
	available_at = CASE WHEN $3 AND attempts + 1 < $4 THEN $5 ELSE available_at END
WHERE job_id = $1
RETURNING status",
	)
	.bind(job_id)
	.bind(error)
	.bind(retryable)
	.bind(max_attempts)
	.bind(available_at)
	.fetch_one(&db.pool)
	.await?;

	Ok(status == "queued")
}

pub async fn fetch(db: &Db, job_id: Uuid) -> Result<Option<Job>> {
	let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE job_id = $1");
	let job = sqlx::query_as::<_, Job>(&sql).bind(job_id).fetch_optional(&db.pool).await?;

	Ok(job)
}
