use serde_json::json;
use uuid::Uuid;

use intake_domain::hash;
use intake_storage::{embeddings, events, models::InsertOutcome};

use crate::{
	Error, IntakeService, Result,
	guardrails::{BlockedReason, GuardrailOutcome, MeteredCall},
};

pub const INTERACTION_OWNER: &str = "interaction";

#[derive(Clone, Debug)]
pub enum EmbedResult {
	Cached { embedding_id: Uuid },
	Generated { embedding_id: Uuid },
	Blocked { reason: BlockedReason },
}

impl IntakeService {
	pub async fn embed_interaction(&self, interaction_id: Uuid) -> Result<EmbedResult> {
		let interaction =
			events::fetch_interaction(&self.db, interaction_id).await?.ok_or_else(|| {
				Error::NotFound { message: format!("Interaction {interaction_id} does not exist.") }
			})?;
		let text = embedding_text(&interaction.subject, &interaction.body_text);

		self.embed_owner(
			interaction.user_id,
			INTERACTION_OWNER,
			interaction.interaction_id,
			&text,
			0,
		)
		.await
	}

	/// Content-hash keyed embedding. Identical text is a cache hit that never
	/// reaches the guarded generation path; only misses spend credits.
	pub async fn embed_owner(
		&self,
		user_id: Uuid,
		owner_type: &str,
		owner_id: Uuid,
		text: &str,
		chunk_index: i32,
	) -> Result<EmbedResult> {
		if text.trim().is_empty() {
			return Err(Error::Validation {
				message: "Embedding text must be non-empty.".to_string(),
			});
		}

		let content_hash = hash::content_hash(text);

		if let Some(cached) = embeddings::find_by_hash(&self.db, user_id, &content_hash).await? {
			return Ok(EmbedResult::Cached { embedding_id: cached.embedding_id });
		}

		let cfg = &self.cfg.providers.embedding;
		let outcome = self
			.with_guardrails(user_id, || async {
				let texts = vec![text.to_string()];
				let batch = self.providers.embedding.embed(cfg, &texts).await?;
				let input_tokens = batch.input_tokens.unwrap_or_else(|| estimate_tokens(text));
				let cost_usd = input_tokens as f64 / 1_000.0 * cfg.cost_per_1k_tokens_usd;
				let vector = batch.vectors.into_iter().next().ok_or_else(|| Error::Provider {
					message: "Embedding provider returned no vectors.".to_string(),
				})?;

				if vector.len() != cfg.dimensions as usize {
					return Err(Error::Provider {
						message: format!(
							"Embedding dimension {} does not match configured dimensions {}.",
							vector.len(),
							cfg.dimensions
						),
					});
				}

				Ok(MeteredCall {
					value: vector,
					model: cfg.model.clone(),
					input_tokens,
					output_tokens: 0,
					cost_usd,
				})
			})
			.await?;
		let vector = match outcome {
			GuardrailOutcome::Allowed(vector) => vector,
			GuardrailOutcome::Blocked(reason) => return Ok(EmbedResult::Blocked { reason }),
		};
		let meta = json!({ "model": cfg.model, "dimensions": cfg.dimensions });
		let row = embeddings::NewEmbedding {
			user_id,
			owner_type,
			owner_id,
			vector: &vector,
			content_hash: &content_hash,
			chunk_index,
			meta: &meta,
		};
		let (embedding_id, insert_outcome) = embeddings::insert(&self.db, &row).await?;

		Ok(match insert_outcome {
			InsertOutcome::Created => EmbedResult::Generated { embedding_id },
			// A concurrent writer stored the same hash first.
			InsertOutcome::AlreadyExists => EmbedResult::Cached { embedding_id },
		})
	}
}

fn embedding_text(subject: &str, body_text: &str) -> String {
	match (subject.is_empty(), body_text.is_empty()) {
		(false, false) => format!("{subject}\n\n{body_text}"),
		(false, true) => subject.to_string(),
		_ => body_text.to_string(),
	}
}

/// Fallback when the provider omits usage: four characters per billed token.
fn estimate_tokens(text: &str) -> i64 {
	(text.chars().count().div_ceil(4) as i64).max(1)
}
