use serde_json::{Value, json};
use uuid::Uuid;

use intake_domain::job::JobKind;
use intake_storage::{events, jobs};

use super::{SpyEmbedding, sample_event, stub_providers, test_config};

#[tokio::test]
#[ignore = "Requires external Postgres. Set INTAKE_PG_DSN to run."]
async fn a_batch_of_normalize_jobs_drains_cleanly() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping a_batch_of_normalize_jobs_drains_cleanly; set INTAKE_PG_DSN to run this test."
		);

		return;
	};
	let providers = stub_providers(SpyEmbedding::new(), Vec::new());
	let cfg = test_config(test_db.dsn().to_string());
	let service = super::build_service(cfg, providers).await.expect("Failed to build service.");
	let user_id = Uuid::new_v4();
	let batch_id = Uuid::new_v4();
	let mut items: Vec<(Value, jobs::EnqueueOptions)> = Vec::new();

	for ordinal in 0..3 {
		let event = sample_event(
			&format!("msg_{ordinal}"),
			&format!("Subject {ordinal}"),
			"Body text.",
		);
		let captured = service
			.capture_event(user_id, "gmail", Some(batch_id), &event)
			.await
			.expect("Capture failed.");

		items.push((
			json!({ "raw_event_id": captured.raw_event_id }),
			jobs::EnqueueOptions { priority: Default::default(), batch_id: Some(batch_id) },
		));
	}

	let job_ids = jobs::enqueue_batch(&service.db, user_id, JobKind::Normalize, &items)
		.await
		.expect("Failed to enqueue batch.");

	assert_eq!(job_ids.len(), 3);

	let report = service.process_user_jobs(user_id, 10).await.expect("Runner pass failed.");

	assert_eq!(report.succeeded, 3);
	assert_eq!(report.failed, 0);
	assert!(report.errors.is_empty());

	let interactions = events::interactions_for_batch(&service.db, user_id, batch_id)
		.await
		.expect("Failed to list interactions.");

	assert_eq!(interactions.len(), 3);

	for interaction in &interactions {
		assert_eq!(interaction.batch_id, Some(batch_id));
	}

	// Normalization queued the follow-up embed work; a second pass drains it
	// against the stub provider.
	let report = service.process_user_jobs(user_id, 10).await.expect("Second pass failed.");

	assert_eq!(report.succeeded, 3);
	assert_eq!(report.failed, 0);

	let embedding_count: i64 =
		sqlx::query_scalar("SELECT count(*) FROM embeddings WHERE user_id = $1")
			.bind(user_id)
			.fetch_one(&service.db.pool)
			.await
			.expect("Failed to count embeddings.");

	assert_eq!(embedding_count, 3);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set INTAKE_PG_DSN to run."]
async fn unknown_job_types_park_without_retry() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping unknown_job_types_park_without_retry; set INTAKE_PG_DSN to run this test."
		);

		return;
	};
	let providers = stub_providers(SpyEmbedding::new(), Vec::new());
	let cfg = test_config(test_db.dsn().to_string());
	let service = super::build_service(cfg, providers).await.expect("Failed to build service.");
	let user_id = Uuid::new_v4();
	let job_id = Uuid::new_v4();

	// Seeded directly: enqueue() refuses unknown kinds, but rows written by
	// older deployments can still carry them.
	sqlx::query(
		"INSERT INTO jobs (job_id, user_id, type, payload) VALUES ($1, $2, 'reindex', '{}'::jsonb)",
	)
	.bind(job_id)
	.bind(user_id)
	.execute(&service.db.pool)
	.await
	.expect("Failed to seed job.");

	let report = service.process_user_jobs(user_id, 10).await.expect("Runner pass failed.");

	assert_eq!(report.succeeded, 0);
	assert_eq!(report.failed, 1);
	assert!(report.errors[0].message.contains("Unknown job type"));

	let job = jobs::fetch(&service.db, job_id)
		.await
		.expect("Fetch failed.")
		.expect("Job missing.");

	assert_eq!(job.status, "error");
	assert_eq!(job.attempts, 1);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set INTAKE_PG_DSN to run."]
async fn malformed_payloads_fail_validation_without_retry() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping malformed_payloads_fail_validation_without_retry; set INTAKE_PG_DSN to run this test."
		);

		return;
	};
	let providers = stub_providers(SpyEmbedding::new(), Vec::new());
	let cfg = test_config(test_db.dsn().to_string());
	let service = super::build_service(cfg, providers).await.expect("Failed to build service.");
	let user_id = Uuid::new_v4();
	let job_id = jobs::enqueue(
		&service.db,
		user_id,
		JobKind::Normalize,
		&json!({ "wrong_field": true }),
		&jobs::EnqueueOptions::default(),
	)
	.await
	.expect("Failed to enqueue job.");

	let report = service.process_user_jobs(user_id, 10).await.expect("Runner pass failed.");

	assert_eq!(report.failed, 1);
	assert!(report.errors[0].message.contains("Malformed job payload"));

	let job = jobs::fetch(&service.db, job_id)
		.await
		.expect("Fetch failed.")
		.expect("Job missing.");

	assert_eq!(job.status, "error");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
