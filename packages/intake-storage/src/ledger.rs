use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Result, db::Db, models::AiQuota};

/// Lazy monthly rollover. The upsert only resets credits when the stored
/// period is older than `period_start`; a same-month row is returned as-is.
pub async fn ensure_monthly_quota(
	db: &Db,
	user_id: Uuid,
	period_start: OffsetDateTime,
	monthly_credits: i32,
) -> Result<AiQuota> {
	sqlx::query(
		"\
INSERT INTO ai_quotas (user_id, period_start, credits_left)
VALUES ($1, $2, $3)
ON CONFLICT (user_id) DO UPDATE
SET period_start = EXCLUDED.period_start,
	credits_left = EXCLUDED.credits_left
WHERE ai_quotas.period_start < EXCLUDED.period_start",
	)
	.bind(user_id)
	.bind(period_start)
	.bind(monthly_credits)
	.execute(&db.pool)
	.await?;

	let quota = sqlx::query_as::<_, AiQuota>(
		"SELECT user_id, period_start, credits_left FROM ai_quotas WHERE user_id = $1",
	)
	.bind(user_id)
	.fetch_one(&db.pool)
	.await?;

	Ok(quota)
}

/// Atomic decrement guarded by `credits_left > 0`. `None` means the quota is
/// exhausted; the count never goes negative.
pub async fn spend_credit(db: &Db, user_id: Uuid) -> Result<Option<i32>> {
	let credits_left: Option<i32> = sqlx::query_scalar(
		"\
UPDATE ai_quotas
SET credits_left = credits_left - 1
WHERE user_id = $1 AND credits_left > 0
RETURNING credits_left",
	)
	.bind(user_id)
	.fetch_optional(&db.pool)
	.await?;

	Ok(credits_left)
}

pub async fn usage_count_since(db: &Db, user_id: Uuid, since: OffsetDateTime) -> Result<i64> {
	let count: i64 = sqlx::query_scalar(
		"SELECT count(*) FROM ai_usage WHERE user_id = $1 AND created_at > $2",
	)
	.bind(user_id)
	.bind(since)
	.fetch_one(&db.pool)
	.await?;

	Ok(count)
}

pub async fn usage_cost_since(db: &Db, user_id: Uuid, since: OffsetDateTime) -> Result<f64> {
	let cost: f64 = sqlx::query_scalar(
		"\
SELECT COALESCE(SUM(cost_usd), 0)::float8
FROM ai_usage
WHERE user_id = $1 AND created_at >= $2",
	)
	.bind(user_id)
	.bind(since)
	.fetch_one(&db.pool)
	.await?;

	Ok(cost)
}

pub async fn insert_usage(
	db: &Db,
	user_id: Uuid,
	model: &str,
	input_tokens: i64,
	output_tokens: i64,
	cost_usd: f64,
) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO ai_usage (usage_id, user_id, model, input_tokens, output_tokens, cost_usd)
VALUES ($1, $2, $3, $4, $5, $6)",
	)
	.bind(Uuid::new_v4())
	.bind(user_id)
	.bind(model)
	.bind(input_tokens)
	.bind(output_tokens)
	.bind(cost_usd)
	.execute(&db.pool)
	.await?;

	Ok(())
}
