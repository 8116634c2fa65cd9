use std::time::Duration;

use tokio::time as tokio_time;

use intake_service::IntakeService;

/// Poll loop behind the scheduled trigger. Sweep failures are logged and the
/// next tick retries; the worker itself never dies on a bad batch.
pub async fn run_worker(service: IntakeService) -> color_eyre::Result<()> {
	let poll = Duration::from_millis(service.cfg.worker.poll_interval_ms);

	tracing::info!("Worker started.");

	loop {
		match service.process_pending_jobs().await {
			Ok(report) =>
				if report.processed > 0 || report.failed > 0 {
					tracing::info!(
						processed = report.processed,
						failed = report.failed,
						"Swept pending jobs."
					);
				},
			Err(err) => {
				tracing::error!(error = %err, "Job sweep failed.");
			},
		}

		tokio_time::sleep(poll).await;
	}
}
