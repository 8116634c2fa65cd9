use serde::Serialize;
use uuid::Uuid;

use intake_domain::{hash, similarity};
use intake_storage::embeddings;

use crate::{Error, IntakeService, Result};

#[derive(Clone, Debug)]
pub struct SimilarRequest {
	pub user_id: Uuid,
	pub owner_type: Option<String>,
	pub limit: usize,
	pub threshold: f32,
}

#[derive(Clone, Debug, Serialize)]
pub struct SimilarItem {
	pub embedding_id: Uuid,
	pub owner_id: Uuid,
	pub similarity: f32,
}

impl IntakeService {
	/// Cache read keyed on the exact content hash; no fuzzy matching at this
	/// layer.
	pub async fn cached_embedding(
		&self,
		user_id: Uuid,
		content_hash: &str,
	) -> Result<Option<Vec<f32>>> {
		let record = embeddings::find_by_hash(&self.db, user_id, content_hash).await?;

		Ok(record.map(|record| record.vector))
	}

	pub async fn put_embedding(
		&self,
		user_id: Uuid,
		owner_type: &str,
		owner_id: Uuid,
		text: &str,
		chunk_index: i32,
		vector: &[f32],
	) -> Result<Uuid> {
		if text.trim().is_empty() {
			return Err(Error::Validation {
				message: "Embedding text must be non-empty.".to_string(),
			});
		}
		if vector.is_empty() {
			return Err(Error::Validation {
				message: "Embedding vector must be non-empty.".to_string(),
			});
		}

		let content_hash = hash::content_hash(text);
		let meta = serde_json::json!({});
		let row = embeddings::NewEmbedding {
			user_id,
			owner_type,
			owner_id,
			vector,
			content_hash: &content_hash,
			chunk_index,
			meta: &meta,
		};
		let (embedding_id, _) = embeddings::insert(&self.db, &row).await?;

		Ok(embedding_id)
	}

	/// Similarity search as a linear scan: load the user's candidates, score
	/// cosine in-process, filter by threshold, sort descending, truncate.
	/// This does not pretend to be an indexed search; it holds up at the
	/// per-user volumes this subsystem targets.
	pub async fn find_similar(
		&self,
		target: &[f32],
		req: &SimilarRequest,
	) -> Result<Vec<SimilarItem>> {
		let candidates =
			embeddings::candidates_for_user(&self.db, req.user_id, req.owner_type.as_deref())
				.await?;
		let mut items: Vec<SimilarItem> = candidates
			.into_iter()
			.map(|record| SimilarItem {
				embedding_id: record.embedding_id,
				owner_id: record.owner_id,
				similarity: similarity::cosine(target, &record.vector),
			})
			.filter(|item| item.similarity >= req.threshold)
			.collect();

		items.sort_by(|a, b| {
			b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal)
		});
		items.truncate(req.limit);

		Ok(items)
	}
}
