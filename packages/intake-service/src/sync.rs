use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

use intake_domain::{job::JobKind, progress, session::SessionStatus};
use intake_providers::events::ProviderEvent;
use intake_storage::{jobs, sessions as session_store};

use crate::{
	CaptureOutcome, IntakeService, Result,
	runner::UserRunReport,
	sessions::{ProgressEvent, progress_channel, spawn_progress_writer},
};

const IMPORT_PROGRESS_START: i32 = 5;
const IMPORT_PROGRESS_END: i32 = 75;
const PROCESS_PROGRESS_START: i32 = 75;
const PROGRESS_BUFFER: usize = 64;
const PROGRESS_EVERY: usize = 10;

#[derive(Clone, Debug)]
pub struct SyncRequest {
	pub user_id: Uuid,
	pub service: String,
	pub preferences: Value,
	/// Drain the user's queue synchronously before completing the session.
	pub run_jobs: bool,
	/// Claim limit for the synchronous drain; ignored when `run_jobs` is off.
	pub limit: i64,
}

#[derive(Debug)]
pub struct SyncReport {
	pub session_id: Uuid,
	pub batch_id: Uuid,
	pub imported: u32,
	pub already_present: u32,
	pub failed: u32,
	pub run: Option<UserRunReport>,
}

struct ImportTally {
	imported: u32,
	already_present: u32,
	failed: u32,
	run: Option<UserRunReport>,
}

impl IntakeService {
	/// One user-initiated bulk import: create a session, page the provider
	/// feed into raw events, enqueue a normalize job per captured event under
	/// a fresh batch id, then optionally drain the user's queue. Partial
	/// failures leave the session completed with a failure summary; only a
	/// feed failure fails it outright.
	pub async fn run_sync(&self, req: &SyncRequest) -> Result<SyncReport> {
		let session_id =
			self.create_session(req.user_id, &req.service, req.preferences.clone()).await?;
		let batch_id = Uuid::new_v4();
		let (tx, rx) = progress_channel(PROGRESS_BUFFER);
		let writer = spawn_progress_writer(self.db.clone(), session_id, rx);
		let result = self.run_sync_inner(req, batch_id, &tx).await;

		// Close the channel and let the writer flush every queued update
		// before the session turns terminal.
		drop(tx);
		let _ = writer.await;

		match result {
			Ok(tally) => {
				if tally.failed > 0 {
					let details = serde_json::json!({
						"error": format!("{} events failed during sync.", tally.failed),
						"failed_items": tally.failed,
					});

					session_store::set_error_details(&self.db, session_id, &details).await?;
				}

				self.complete_session(session_id).await?;

				Ok(SyncReport {
					session_id,
					batch_id,
					imported: tally.imported,
					already_present: tally.already_present,
					failed: tally.failed,
					run: tally.run,
				})
			},
			Err(err) => {
				self.fail_session(session_id, &err.to_string()).await?;

				Err(err)
			},
		}
	}

	async fn run_sync_inner(
		&self,
		req: &SyncRequest,
		batch_id: Uuid,
		progress: &mpsc::Sender<ProgressEvent>,
	) -> Result<ImportTally> {
		send_progress(
			progress,
			ProgressEvent {
				status: Some(SessionStatus::Importing),
				step: "importing".to_string(),
				percentage: IMPORT_PROGRESS_START,
				total_items: None,
				imported_items: None,
				failed_items: None,
			},
		)
		.await;

		let events = self.fetch_all_events(req).await?;
		let total = events.len();
		let mut tally =
			ImportTally { imported: 0, already_present: 0, failed: 0, run: None };

		for (index, event) in events.iter().enumerate() {
			match self.capture_event(req.user_id, &req.service, Some(batch_id), event).await {
				Ok(captured) => {
					match captured.outcome {
						CaptureOutcome::Created => tally.imported += 1,
						CaptureOutcome::AlreadyExists => tally.already_present += 1,
					}

					if let Err(err) = jobs::enqueue(
						&self.db,
						req.user_id,
						JobKind::Normalize,
						&serde_json::json!({ "raw_event_id": captured.raw_event_id }),
						&jobs::EnqueueOptions { priority: Default::default(), batch_id: Some(batch_id) },
					)
					.await
					{
						tally.failed += 1;

						tracing::error!(error = %err, source_id = %event.source_id, "Failed to enqueue normalization.");
					}
				},
				Err(err) => {
					tally.failed += 1;

					tracing::error!(error = %err, source_id = %event.source_id, "Failed to capture event.");
				},
			}

			let done = index + 1;

			if done % PROGRESS_EVERY == 0 || done == total {
				send_progress(
					progress,
					ProgressEvent {
						status: None,
						step: "importing".to_string(),
						percentage: progress::scale_progress(
							IMPORT_PROGRESS_START,
							IMPORT_PROGRESS_END,
							done,
							total,
						),
						total_items: Some(total as i32),
						imported_items: Some(tally.imported as i32),
						failed_items: Some(tally.failed as i32),
					},
				)
				.await;
			}
		}

		send_progress(
			progress,
			ProgressEvent {
				status: Some(SessionStatus::Processing),
				step: "processing".to_string(),
				percentage: PROCESS_PROGRESS_START,
				total_items: Some(total as i32),
				imported_items: Some(tally.imported as i32),
				failed_items: Some(tally.failed as i32),
			},
		)
		.await;

		if req.run_jobs {
			tally.run = Some(self.process_user_jobs(req.user_id, req.limit).await?);
		}

		Ok(tally)
	}

	async fn fetch_all_events(&self, req: &SyncRequest) -> Result<Vec<ProviderEvent>> {
		let mut events = Vec::new();
		let mut cursor: Option<String> = None;

		loop {
			let page = self
				.providers
				.events
				.fetch_events(
					&self.cfg.providers.events,
					req.user_id,
					&req.service,
					cursor.as_deref(),
				)
				.await?;

			events.extend(page.events);

			match page.next_cursor {
				Some(next) => cursor = Some(next),
				None => break,
			}
		}

		Ok(events)
	}
}

/// Progress is advisory: a consumer that went away must never abort import
/// work, so send failures are ignored.
async fn send_progress(tx: &mpsc::Sender<ProgressEvent>, event: ProgressEvent) {
	let _ = tx.send(event).await;
}
