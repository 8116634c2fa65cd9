mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, EventsProviderConfig, Guardrails, Postgres, Providers, Queue,
	Service, Storage, Worker,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if !cfg.providers.embedding.cost_per_1k_tokens_usd.is_finite()
		|| cfg.providers.embedding.cost_per_1k_tokens_usd < 0.0
	{
		return Err(Error::Validation {
			message: "providers.embedding.cost_per_1k_tokens_usd must be zero or greater."
				.to_string(),
		});
	}
	if cfg.providers.events.page_size == 0 {
		return Err(Error::Validation {
			message: "providers.events.page_size must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.events.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.events.timeout_ms must be greater than zero.".to_string(),
		});
	}

	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("events", &cfg.providers.events.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	if cfg.guardrails.monthly_credits <= 0 {
		return Err(Error::Validation {
			message: "guardrails.monthly_credits must be greater than zero.".to_string(),
		});
	}
	if cfg.guardrails.requests_per_minute == 0 {
		return Err(Error::Validation {
			message: "guardrails.requests_per_minute must be greater than zero.".to_string(),
		});
	}
	if !cfg.guardrails.daily_cost_cap_usd.is_finite() || cfg.guardrails.daily_cost_cap_usd < 0.0 {
		return Err(Error::Validation {
			message: "guardrails.daily_cost_cap_usd must be zero or greater.".to_string(),
		});
	}
	if cfg.queue.max_attempts < 1 {
		return Err(Error::Validation {
			message: "queue.max_attempts must be at least one.".to_string(),
		});
	}
	if cfg.queue.claim_batch <= 0 {
		return Err(Error::Validation {
			message: "queue.claim_batch must be greater than zero.".to_string(),
		});
	}
	if cfg.worker.poll_interval_ms == 0 {
		return Err(Error::Validation {
			message: "worker.poll_interval_ms must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for api_base in
		[&mut cfg.providers.embedding.api_base, &mut cfg.providers.events.api_base]
	{
		while api_base.ends_with('/') {
			api_base.pop();
		}
	}
}
