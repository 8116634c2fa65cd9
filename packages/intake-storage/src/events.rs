use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Result,
	db::Db,
	models::{InsertOutcome, Interaction, RawEvent},
};

pub struct NewRawEvent<'a> {
	pub user_id: Uuid,
	pub provider: &'a str,
	pub source_id: &'a str,
	pub occurred_at: OffsetDateTime,
	pub payload: &'a Value,
	pub source_meta: &'a Value,
	pub batch_id: Option<Uuid>,
}

/// Idempotent capture insert. A duplicate `(user_id, provider, source_id)`
/// resolves to the existing row instead of erroring.
pub async fn insert_raw_event(db: &Db, event: &NewRawEvent<'_>) -> Result<(Uuid, InsertOutcome)> {
	let inserted: Option<Uuid> = sqlx::query_scalar(
		"\
INSERT INTO raw_events (
	raw_event_id, user_id, provider, source_id, occurred_at, payload, source_meta, batch_id
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
ON CONFLICT (user_id, provider, source_id) DO NOTHING
RETURNING raw_event_id",
	)
	.bind(Uuid::new_v4())
	.bind(event.user_id)
	.bind(event.provider)
	.bind(event.source_id)
	.bind(event.occurred_at)
	.bind(event.payload)
	.bind(event.source_meta)
	.bind(event.batch_id)
	.fetch_optional(&db.pool)
	.await?;

	if let Some(raw_event_id) = inserted {
		return Ok((raw_event_id, InsertOutcome::Created));
	}

	let existing: Uuid = sqlx::query_scalar(
		"SELECT raw_event_id FROM raw_events WHERE user_id = $1 AND provider = $2 AND source_id = $3",
	)
	.bind(event.user_id)
	.bind(event.provider)
	.bind(event.source_id)
	.fetch_one(&db.pool)
	.await?;

	Ok((existing, InsertOutcome::AlreadyExists))
}

pub async fn fetch_raw_event(db: &Db, raw_event_id: Uuid) -> Result<Option<RawEvent>> {
	let event =
		sqlx::query_as::<_, RawEvent>("SELECT * FROM raw_events WHERE raw_event_id = $1")
			.bind(raw_event_id)
			.fetch_optional(&db.pool)
			.await?;

	Ok(event)
}

pub struct NewInteraction<'a> {
	pub user_id: Uuid,
	pub contact_id: Option<Uuid>,
	pub r#type: &'a str,
	pub subject: &'a str,
	pub body_text: &'a str,
	pub source: &'a str,
	pub source_id: &'a str,
	pub batch_id: Option<Uuid>,
}

pub async fn find_interaction(
	db: &Db,
	user_id: Uuid,
	source: &str,
	source_id: &str,
) -> Result<Option<Interaction>> {
	let interaction = sqlx::query_as::<_, Interaction>(
		"SELECT * FROM interactions WHERE user_id = $1 AND source = $2 AND source_id = $3",
	)
	.bind(user_id)
	.bind(source)
	.bind(source_id)
	.fetch_optional(&db.pool)
	.await?;

	Ok(interaction)
}

/// Exactly-once normalization insert keyed on `(user_id, source, source_id)`.
pub async fn insert_interaction(
	db: &Db,
	row: &NewInteraction<'_>,
) -> Result<(Uuid, InsertOutcome)> {
	let inserted: Option<Uuid> = sqlx::query_scalar(
		"\
INSERT INTO interactions (
	interaction_id, user_id, contact_id, type, subject, body_text, source, source_id, batch_id
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
ON CONFLICT (user_id, source, source_id) DO NOTHING
RETURNING interaction_id",
	)
	.bind(Uuid::new_v4())
	.bind(row.user_id)
	.bind(row.contact_id)
	.bind(row.r#type)
	.bind(row.subject)
	.bind(row.body_text)
	.bind(row.source)
	.bind(row.source_id)
	.bind(row.batch_id)
	.fetch_optional(&db.pool)
	.await?;

	if let Some(interaction_id) = inserted {
		return Ok((interaction_id, InsertOutcome::Created));
	}

	let existing: Uuid = sqlx::query_scalar(
		"SELECT interaction_id FROM interactions WHERE user_id = $1 AND source = $2 AND source_id = $3",
	)
	.bind(row.user_id)
	.bind(row.source)
	.bind(row.source_id)
	.fetch_one(&db.pool)
	.await?;

	Ok((existing, InsertOutcome::AlreadyExists))
}

pub async fn fetch_interaction(db: &Db, interaction_id: Uuid) -> Result<Option<Interaction>> {
	let interaction =
		sqlx::query_as::<_, Interaction>("SELECT * FROM interactions WHERE interaction_id = $1")
			.bind(interaction_id)
			.fetch_optional(&db.pool)
			.await?;

	Ok(interaction)
}

pub async fn interactions_for_batch(
	db: &Db,
	user_id: Uuid,
	batch_id: Uuid,
) -> Result<Vec<Interaction>> {
	let interactions = sqlx::query_as::<_, Interaction>(
		"SELECT * FROM interactions WHERE user_id = $1 AND batch_id = $2 ORDER BY created_at ASC",
	)
	.bind(user_id)
	.bind(batch_id)
	.fetch_all(&db.pool)
	.await?;

	Ok(interactions)
}
