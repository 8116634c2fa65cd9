use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use intake_config::EmbeddingProviderConfig;

use crate::{Error, Result};

#[derive(Debug)]
pub struct EmbeddingBatch {
	pub vectors: Vec<Vec<f32>>,
	/// Billed prompt tokens as reported by the provider, when present.
	pub input_tokens: Option<i64>,
}

pub async fn embed(cfg: &EmbeddingProviderConfig, texts: &[String]) -> Result<EmbeddingBatch> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"input": texts,
		"dimensions": cfg.dimensions,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_embedding_response(json)
}

fn parse_embedding_response(json: Value) -> Result<EmbeddingBatch> {
	let data = json.get("data").and_then(|v| v.as_array()).ok_or_else(|| {
		Error::InvalidResponse { message: "Embedding response is missing data array.".to_string() }
	})?;

	let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());

	for (fallback_index, item) in data.iter().enumerate() {
		let index = item
			.get("index")
			.and_then(|v| v.as_u64())
			.map(|v| v as usize)
			.unwrap_or(fallback_index);
		let embedding = item.get("embedding").and_then(|v| v.as_array()).ok_or_else(|| {
			Error::InvalidResponse {
				message: "Embedding item missing embedding array.".to_string(),
			}
		})?;
		let mut vec = Vec::with_capacity(embedding.len());

		for value in embedding {
			let number = value.as_f64().ok_or_else(|| Error::InvalidResponse {
				message: "Embedding value must be numeric.".to_string(),
			})?;

			vec.push(number as f32);
		}

		indexed.push((index, vec));
	}

	indexed.sort_by_key(|(index, _)| *index);

	let input_tokens = json
		.get("usage")
		.and_then(|usage| usage.get("prompt_tokens").or_else(|| usage.get("total_tokens")))
		.and_then(|v| v.as_i64());

	Ok(EmbeddingBatch {
		vectors: indexed.into_iter().map(|(_, vec)| vec).collect(),
		input_tokens,
	})
}
