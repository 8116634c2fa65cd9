use serde_json::Value;
use tokio::{sync::mpsc, task::JoinHandle};
use uuid::Uuid;

use intake_domain::session::SessionStatus;
use intake_storage::{db::Db, models::SyncSession, sessions};

use crate::{Error, IntakeService, Result};

/// One progress report from a driving stage. The percentage is
/// producer-supplied; each phase assigns its own meaning to "percent done".
#[derive(Clone, Debug)]
pub struct ProgressEvent {
	pub status: Option<SessionStatus>,
	pub step: String,
	pub percentage: i32,
	pub total_items: Option<i32>,
	pub imported_items: Option<i32>,
	pub failed_items: Option<i32>,
}

pub fn progress_channel(
	buffer: usize,
) -> (mpsc::Sender<ProgressEvent>, mpsc::Receiver<ProgressEvent>) {
	mpsc::channel(buffer)
}

/// Consume progress events and apply them to the session row. Stops once the
/// channel closes or the session turns terminal; a failed write is logged and
/// skipped so producers are never stalled by the tracker.
pub fn spawn_progress_writer(
	db: Db,
	session_id: Uuid,
	mut rx: mpsc::Receiver<ProgressEvent>,
) -> JoinHandle<()> {
	tokio::spawn(async move {
		while let Some(event) = rx.recv().await {
			let patch = patch_from_event(&event);

			match sessions::update_progress(&db, session_id, &patch).await {
				Ok(true) => {},
				Ok(false) => break,
				Err(err) => {
					tracing::warn!(error = %err, session_id = %session_id, "Progress write failed.");
				},
			}
		}
	})
}

fn patch_from_event(event: &ProgressEvent) -> sessions::ProgressPatch {
	sessions::ProgressPatch {
		status: event.status,
		current_step: Some(event.step.clone()),
		progress_percentage: Some(event.percentage),
		total_items: event.total_items,
		imported_items: event.imported_items,
		failed_items: event.failed_items,
	}
}

impl IntakeService {
	pub async fn create_session(
		&self,
		user_id: Uuid,
		service: &str,
		preferences: Value,
	) -> Result<Uuid> {
		if service.trim().is_empty() {
			return Err(Error::InvalidRequest {
				message: "Sync service must be non-empty.".to_string(),
			});
		}

		Ok(sessions::create(&self.db, user_id, service, &preferences).await?)
	}

	/// Returns false when the session is already terminal; terminal sessions
	/// accept no further progress.
	pub async fn update_progress(&self, session_id: Uuid, event: &ProgressEvent) -> Result<bool> {
		Ok(sessions::update_progress(&self.db, session_id, &patch_from_event(event)).await?)
	}

	pub async fn complete_session(&self, session_id: Uuid) -> Result<bool> {
		Ok(sessions::complete(&self.db, session_id).await?)
	}

	pub async fn fail_session(&self, session_id: Uuid, error: &str) -> Result<bool> {
		Ok(sessions::fail(&self.db, session_id, error).await?)
	}

	pub async fn fetch_session(&self, session_id: Uuid) -> Result<Option<SyncSession>> {
		Ok(sessions::fetch(&self.db, session_id).await?)
	}
}
