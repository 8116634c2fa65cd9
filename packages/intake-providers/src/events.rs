use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

use intake_config::EventsProviderConfig;

use crate::{Error, Result};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderEvent {
	pub source_id: String,
	pub occurred_at: OffsetDateTime,
	pub payload: Value,
	pub source_meta: Value,
}

#[derive(Debug)]
pub struct EventPage {
	pub events: Vec<ProviderEvent>,
	pub next_cursor: Option<String>,
}

/// Fetch one page of raw events for a user from the provider feed. Credential
/// refresh happens upstream; the configured key is assumed valid.
pub async fn fetch_events(
	cfg: &EventsProviderConfig,
	user_id: Uuid,
	service: &str,
	cursor: Option<&str>,
) -> Result<EventPage> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let mut request = client
		.get(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.query(&[
			("user_id", user_id.to_string()),
			("service", service.to_string()),
			("limit", cfg.page_size.to_string()),
		]);

	if let Some(cursor) = cursor {
		request = request.query(&[("cursor", cursor)]);
	}

	let json: Value = request.send().await?.error_for_status()?.json().await?;

	parse_event_page(json)
}

fn parse_event_page(json: Value) -> Result<EventPage> {
	let items = json.get("events").and_then(|v| v.as_array()).ok_or_else(|| {
		Error::InvalidResponse { message: "Event feed response is missing events array.".to_string() }
	})?;

	let mut events = Vec::with_capacity(items.len());

	for item in items {
		let source_id = item
			.get("id")
			.or_else(|| item.get("source_id"))
			.and_then(|v| v.as_str())
			.ok_or_else(|| Error::InvalidResponse {
				message: "Event item missing id.".to_string(),
			})?;
		let occurred_at = item
			.get("occurred_at")
			.and_then(|v| v.as_str())
			.and_then(|raw| OffsetDateTime::parse(raw, &Rfc3339).ok())
			.ok_or_else(|| Error::InvalidResponse {
				message: "Event item missing a valid occurred_at timestamp.".to_string(),
			})?;
		let payload = item.get("payload").cloned().unwrap_or_else(|| Value::Object(Default::default()));
		let source_meta = item.get("meta").cloned().unwrap_or_else(|| Value::Object(Default::default()));

		events.push(ProviderEvent {
			source_id: source_id.to_string(),
			occurred_at,
			payload,
			source_meta,
		});
	}

	let next_cursor = json
		.get("next_cursor")
		.and_then(|v| v.as_str())
		.filter(|cursor| !cursor.is_empty())
		.map(|cursor| cursor.to_string());

	Ok(EventPage { events, next_cursor })
}
