use serde::Serialize;
use uuid::Uuid;

use intake_providers::events::ProviderEvent;
use intake_storage::{events, models::InsertOutcome};

use crate::{Error, IntakeService, Result};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureOutcome {
	Created,
	AlreadyExists,
}

#[derive(Clone, Debug)]
pub struct CapturedEvent {
	pub raw_event_id: Uuid,
	pub outcome: CaptureOutcome,
}

#[derive(Clone, Debug)]
pub struct CaptureRequest {
	pub user_id: Uuid,
	pub provider: String,
	pub batch_id: Option<Uuid>,
	pub events: Vec<ProviderEvent>,
}

impl IntakeService {
	/// Idempotent capture of one provider event; a duplicate source id
	/// resolves to the already-stored row and reports `AlreadyExists`.
	pub async fn capture_event(
		&self,
		user_id: Uuid,
		provider: &str,
		batch_id: Option<Uuid>,
		event: &ProviderEvent,
	) -> Result<CapturedEvent> {
		if provider.trim().is_empty() {
			return Err(Error::Validation {
				message: "Capture provider must be non-empty.".to_string(),
			});
		}
		if event.source_id.trim().is_empty() {
			return Err(Error::Validation {
				message: "Capture event source_id must be non-empty.".to_string(),
			});
		}

		let row = events::NewRawEvent {
			user_id,
			provider,
			source_id: &event.source_id,
			occurred_at: event.occurred_at,
			payload: &event.payload,
			source_meta: &event.source_meta,
			batch_id,
		};
		let (raw_event_id, outcome) = events::insert_raw_event(&self.db, &row).await?;

		Ok(CapturedEvent {
			raw_event_id,
			outcome: match outcome {
				InsertOutcome::Created => CaptureOutcome::Created,
				InsertOutcome::AlreadyExists => CaptureOutcome::AlreadyExists,
			},
		})
	}

	pub async fn capture_events(&self, req: &CaptureRequest) -> Result<Vec<CapturedEvent>> {
		let mut captured = Vec::with_capacity(req.events.len());

		for event in &req.events {
			captured
				.push(self.capture_event(req.user_id, &req.provider, req.batch_id, event).await?);
		}

		Ok(captured)
	}
}
