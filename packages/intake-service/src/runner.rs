use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use intake_domain::job::{JobKind, Priority};
use intake_storage::{jobs, models::Job};

use crate::{EmbedResult, Error, IntakeService, Result, sync::SyncRequest};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SweepReport {
	pub processed: u32,
	pub failed: u32,
}

#[derive(Clone, Debug, Default)]
pub struct UserRunReport {
	pub succeeded: u32,
	pub failed: u32,
	pub errors: Vec<JobError>,
}

#[derive(Clone, Debug)]
pub struct JobError {
	pub job_id: Uuid,
	pub message: String,
}

#[derive(Debug, serde::Deserialize)]
struct NormalizeJob {
	raw_event_id: Uuid,
}

#[derive(Debug, serde::Deserialize)]
struct EmbedJob {
	interaction_id: Uuid,
}

#[derive(Debug, serde::Deserialize)]
struct SyncJob {
	service: String,
	#[serde(default)]
	preferences: Value,
}

impl IntakeService {
	/// Scheduled sweep over every user's queue. Claims batches until the
	/// queue drains; one job's failure never aborts the sweep.
	pub async fn process_pending_jobs(&self) -> Result<SweepReport> {
		let mut report = SweepReport::default();

		loop {
			let claimed = jobs::claim_next(&self.db, self.cfg.queue.claim_batch).await?;

			if claimed.is_empty() {
				break;
			}

			for job in &claimed {
				match self.settle_job(job).await? {
					None => report.processed += 1,
					Some(_) => report.failed += 1,
				}
			}
		}

		Ok(report)
	}

	/// Synchronous per-user drain for callers that wait on the outcome, e.g.
	/// a blocking sync.
	pub async fn process_user_jobs(&self, user_id: Uuid, limit: i64) -> Result<UserRunReport> {
		let mut report = UserRunReport::default();
		let claimed = jobs::claim_next_for_user(&self.db, user_id, limit).await?;

		for job in &claimed {
			match self.settle_job(job).await? {
				None => report.succeeded += 1,
				Some(error) => {
					report.failed += 1;
					report.errors.push(error);
				},
			}
		}

		Ok(report)
	}

	/// Run one claimed job and record its outcome. Retry is the queue's
	/// decision via `mark_failed`; the runner only reports.
	async fn settle_job(&self, job: &Job) -> Result<Option<JobError>> {
		match self.run_job(job).await {
			Ok(()) => {
				jobs::mark_done(&self.db, job.job_id).await?;

				Ok(None)
			},
			Err(err) => {
				let message = err.to_string();
				let requeued = jobs::mark_failed(
					&self.db,
					job.job_id,
					&message,
					err.is_retryable(),
					self.cfg.queue.max_attempts,
				)
				.await?;

				tracing::error!(error = %err, job_id = %job.job_id, requeued, "Job failed.");

				Ok(Some(JobError { job_id: job.job_id, message }))
			},
		}
	}

	async fn run_job(&self, job: &Job) -> Result<()> {
		let Some(kind) = JobKind::parse(&job.r#type) else {
			return Err(Error::Configuration {
				message: format!("Unknown job type {:?}.", job.r#type),
			});
		};

		match kind {
			JobKind::Normalize => {
				let payload: NormalizeJob = parse_payload(&job.payload)?;
				let normalized = self.normalize_event(payload.raw_event_id).await?;

				// Embed work is enqueued only after normalization lands, so
				// the embed job always observes a fully normalized row.
				jobs::enqueue(
					&self.db,
					job.user_id,
					JobKind::Embed,
					&serde_json::json!({ "interaction_id": normalized.interaction_id }),
					&jobs::EnqueueOptions {
						priority: Priority::parse(&job.priority).unwrap_or_default(),
						batch_id: job.batch_id,
					},
				)
				.await?;

				Ok(())
			},
			JobKind::Embed => {
				let payload: EmbedJob = parse_payload(&job.payload)?;

				match self.embed_interaction(payload.interaction_id).await? {
					EmbedResult::Blocked { reason } => Err(Error::Blocked { reason }),
					EmbedResult::Cached { .. } | EmbedResult::Generated { .. } => Ok(()),
				}
			},
			JobKind::Sync => {
				let payload: SyncJob = parse_payload(&job.payload)?;
				// A claimed sync job never drains the queue itself; the sweep
				// that claimed it picks up the enqueued work next pass.
				let request = SyncRequest {
					user_id: job.user_id,
					service: payload.service,
					preferences: payload.preferences,
					run_jobs: false,
					limit: 0,
				};

				Box::pin(self.run_sync(&request)).await?;

				Ok(())
			},
		}
	}
}

fn parse_payload<T>(payload: &Value) -> Result<T>
where
	T: DeserializeOwned,
{
	serde_json::from_value(payload.clone())
		.map_err(|err| Error::Validation { message: format!("Malformed job payload: {err}.") })
}
