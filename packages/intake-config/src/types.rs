use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub guardrails: Guardrails,
	pub queue: Queue,
	pub worker: Worker,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub events: EventsProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	pub cost_per_1k_tokens_usd: f64,
	pub default_headers: Map<String, Value>,
}

/// Provider event feed. The API key is the already-provisioned service
/// credential handed to this subsystem; token refresh happens upstream.
#[derive(Debug, Deserialize)]
pub struct EventsProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub page_size: u32,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Guardrails {
	pub monthly_credits: i32,
	pub requests_per_minute: u32,
	/// Zero disables the daily cost cap.
	pub daily_cost_cap_usd: f64,
}

#[derive(Debug, Deserialize)]
pub struct Queue {
	pub max_attempts: i32,
	pub claim_batch: i64,
}

#[derive(Debug, Deserialize)]
pub struct Worker {
	pub poll_interval_ms: u64,
}
