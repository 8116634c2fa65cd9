use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

/// Outcome of an idempotent insert keyed on a composite unique constraint.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InsertOutcome {
	Created,
	AlreadyExists,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Job {
	pub job_id: Uuid,
	pub user_id: Uuid,
	pub r#type: String,
	pub payload: Value,
	pub status: String,
	pub priority: String,
	pub batch_id: Option<Uuid>,
	pub attempts: i32,
	pub last_error: Option<String>,
	pub available_at: OffsetDateTime,
	pub created_at: OffsetDateTime,
	pub claimed_at: Option<OffsetDateTime>,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct RawEvent {
	pub raw_event_id: Uuid,
	pub user_id: Uuid,
	pub provider: String,
	pub source_id: String,
	pub occurred_at: OffsetDateTime,
	pub payload: Value,
	pub source_meta: Value,
	pub batch_id: Option<Uuid>,
	pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Interaction {
	pub interaction_id: Uuid,
	pub user_id: Uuid,
	pub contact_id: Option<Uuid>,
	pub r#type: String,
	pub subject: String,
	pub body_text: String,
	pub source: String,
	pub source_id: String,
	pub batch_id: Option<Uuid>,
	pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct EmbeddingRecord {
	pub embedding_id: Uuid,
	pub user_id: Uuid,
	pub owner_type: String,
	pub owner_id: Uuid,
	pub vector: Vec<f32>,
	pub content_hash: String,
	pub chunk_index: i32,
	pub meta: Value,
	pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct SyncSession {
	pub session_id: Uuid,
	pub user_id: Uuid,
	pub service: String,
	pub status: String,
	pub current_step: String,
	pub progress_percentage: i32,
	pub total_items: i32,
	pub imported_items: i32,
	pub failed_items: i32,
	pub error_details: Option<Value>,
	pub preferences: Value,
	pub started_at: OffsetDateTime,
	pub completed_at: Option<OffsetDateTime>,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct AiQuota {
	pub user_id: Uuid,
	pub period_start: OffsetDateTime,
	pub credits_left: i32,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct AiUsage {
	pub usage_id: Uuid,
	pub user_id: Uuid,
	pub model: String,
	pub input_tokens: i64,
	pub output_tokens: i64,
	pub cost_usd: f64,
	pub created_at: OffsetDateTime,
}
