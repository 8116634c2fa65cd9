use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use intake_storage::{events, models::InsertOutcome};

use crate::{Error, IntakeService, Result};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizeOp {
	Created,
	Existing,
}

#[derive(Clone, Debug)]
pub struct NormalizedInteraction {
	pub interaction_id: Uuid,
	pub user_id: Uuid,
	pub op: NormalizeOp,
}

struct ExtractedFields {
	r#type: String,
	subject: String,
	body_text: String,
	contact_id: Option<Uuid>,
}

impl IntakeService {
	/// Project a raw event into its canonical interaction. Safe under
	/// at-least-once job delivery: the existing row is returned instead of a
	/// second insert.
	pub async fn normalize_event(&self, raw_event_id: Uuid) -> Result<NormalizedInteraction> {
		let event = events::fetch_raw_event(&self.db, raw_event_id).await?.ok_or_else(|| {
			Error::NotFound { message: format!("Raw event {raw_event_id} does not exist.") }
		})?;

		if let Some(existing) =
			events::find_interaction(&self.db, event.user_id, &event.provider, &event.source_id)
				.await?
		{
			return Ok(NormalizedInteraction {
				interaction_id: existing.interaction_id,
				user_id: event.user_id,
				op: NormalizeOp::Existing,
			});
		}

		let fields = extract_fields(&event.payload)?;
		let row = events::NewInteraction {
			user_id: event.user_id,
			contact_id: fields.contact_id,
			r#type: &fields.r#type,
			subject: &fields.subject,
			body_text: &fields.body_text,
			source: &event.provider,
			source_id: &event.source_id,
			batch_id: event.batch_id,
		};
		let (interaction_id, outcome) = events::insert_interaction(&self.db, &row).await?;

		Ok(NormalizedInteraction {
			interaction_id,
			user_id: event.user_id,
			op: match outcome {
				InsertOutcome::Created => NormalizeOp::Created,
				// A concurrent normalizer won the insert race.
				InsertOutcome::AlreadyExists => NormalizeOp::Existing,
			},
		})
	}
}

fn extract_fields(payload: &Value) -> Result<ExtractedFields> {
	let Some(object) = payload.as_object() else {
		return Err(Error::Validation {
			message: "Raw event payload must be a JSON object.".to_string(),
		});
	};

	let r#type = object.get("type").and_then(|v| v.as_str()).unwrap_or("event").to_string();
	let subject = object
		.get("subject")
		.or_else(|| object.get("title"))
		.and_then(|v| v.as_str())
		.unwrap_or_default()
		.to_string();
	let body_text = object
		.get("body_text")
		.or_else(|| object.get("body"))
		.or_else(|| object.get("snippet"))
		.or_else(|| object.get("text"))
		.and_then(|v| v.as_str())
		.unwrap_or_default()
		.to_string();
	let contact_id = object
		.get("contact_id")
		.and_then(|v| v.as_str())
		.and_then(|raw| Uuid::parse_str(raw).ok());

	Ok(ExtractedFields { r#type, subject, body_text, contact_id })
}
