use serde_json::Value;
use uuid::Uuid;

use crate::{
	Result,
	db::Db,
	models::{EmbeddingRecord, InsertOutcome},
};

pub struct NewEmbedding<'a> {
	pub user_id: Uuid,
	pub owner_type: &'a str,
	pub owner_id: Uuid,
	pub vector: &'a [f32],
	pub content_hash: &'a str,
	pub chunk_index: i32,
	pub meta: &'a Value,
}

/// Store a vector under its content hash. A concurrent writer that already
/// stored the same hash wins; the existing row is returned.
pub async fn insert(db: &Db, row: &NewEmbedding<'_>) -> Result<(Uuid, InsertOutcome)> {
	let inserted: Option<Uuid> = sqlx::query_scalar(
		"\
INSERT INTO embeddings (
	embedding_id, user_id, owner_type, owner_id, vector, content_hash, chunk_index, meta
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
ON CONFLICT (user_id, owner_type, content_hash) DO NOTHING
RETURNING embedding_id",
	)
	.bind(Uuid::new_v4())
	.bind(row.user_id)
	.bind(row.owner_type)
	.bind(row.owner_id)
	.bind(row.vector.to_vec())
	.bind(row.content_hash)
	.bind(row.chunk_index)
	.bind(row.meta)
	.fetch_optional(&db.pool)
	.await?;

	if let Some(embedding_id) = inserted {
		return Ok((embedding_id, InsertOutcome::Created));
	}

	let existing: Uuid = sqlx::query_scalar(
		"\
SELECT embedding_id
FROM embeddings
WHERE user_id = $1 AND owner_type = $2 AND content_hash = $3",
	)
	.bind(row.user_id)
	.bind(row.owner_type)
	.bind(row.content_hash)
	.fetch_one(&db.pool)
	.await?;

	Ok((existing, InsertOutcome::AlreadyExists))
}

pub async fn find_by_hash(
	db: &Db,
	user_id: Uuid,
	content_hash: &str,
) -> Result<Option<EmbeddingRecord>> {
	let record = sqlx::query_as::<_, EmbeddingRecord>(
		"\
SELECT *
FROM embeddings
WHERE user_id = $1 AND content_hash = $2
ORDER BY created_at DESC
LIMIT 1",
	)
	.bind(user_id)
	.bind(content_hash)
	.fetch_optional(&db.pool)
	.await?;

	Ok(record)
}

pub async fn candidates_for_user(
	db: &Db,
	user_id: Uuid,
	owner_type: Option<&str>,
) -> Result<Vec<EmbeddingRecord>> {
	let records = sqlx::query_as::<_, EmbeddingRecord>(
		"\
SELECT *
FROM embeddings
WHERE user_id = $1 AND ($2::text IS NULL OR owner_type = $2)",
	)
	.bind(user_id)
	.bind(owner_type)
	.fetch_all(&db.pool)
	.await?;

	Ok(records)
}
