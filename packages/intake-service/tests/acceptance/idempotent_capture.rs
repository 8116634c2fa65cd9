use uuid::Uuid;

use intake_service::{CaptureOutcome, CaptureRequest, NormalizeOp};

use super::{SpyEmbedding, sample_event, stub_providers, test_config};

#[tokio::test]
#[ignore = "Requires external Postgres. Set INTAKE_PG_DSN to run."]
async fn capturing_the_same_event_twice_stores_one_row() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping capturing_the_same_event_twice_stores_one_row; set INTAKE_PG_DSN to run this test."
		);

		return;
	};
	let providers = stub_providers(SpyEmbedding::new(), Vec::new());
	let cfg = test_config(test_db.dsn().to_string());
	let service = super::build_service(cfg, providers).await.expect("Failed to build service.");
	let user_id = Uuid::new_v4();
	let event = sample_event("msg_1", "Invoice", "Please find the invoice attached.");

	let first = service
		.capture_event(user_id, "gmail", None, &event)
		.await
		.expect("First capture failed.");

	// The bulk path must land on the same row as the single-item path.
	let bulk = service
		.capture_events(&CaptureRequest {
			user_id,
			provider: "gmail".to_string(),
			batch_id: None,
			events: vec![event.clone()],
		})
		.await
		.expect("Bulk capture failed.");

	assert_eq!(first.outcome, CaptureOutcome::Created);
	assert_eq!(bulk.len(), 1);
	assert_eq!(bulk[0].outcome, CaptureOutcome::AlreadyExists);
	assert_eq!(first.raw_event_id, bulk[0].raw_event_id);

	let raw_count: i64 = sqlx::query_scalar("SELECT count(*) FROM raw_events WHERE user_id = $1")
		.bind(user_id)
		.fetch_one(&service.db.pool)
		.await
		.expect("Failed to count raw events.");

	assert_eq!(raw_count, 1);

	let first_normalize =
		service.normalize_event(first.raw_event_id).await.expect("First normalize failed.");
	let second_normalize =
		service.normalize_event(first.raw_event_id).await.expect("Second normalize failed.");

	assert_eq!(first_normalize.op, NormalizeOp::Created);
	assert_eq!(second_normalize.op, NormalizeOp::Existing);
	assert_eq!(first_normalize.interaction_id, second_normalize.interaction_id);

	let interaction_count: i64 =
		sqlx::query_scalar("SELECT count(*) FROM interactions WHERE user_id = $1")
			.bind(user_id)
			.fetch_one(&service.db.pool)
			.await
			.expect("Failed to count interactions.");

	assert_eq!(interaction_count, 1);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
