use uuid::Uuid;

use intake_domain::session::SessionStatus;
use intake_service::{ProgressEvent, sessions};

use super::{SpyEmbedding, stub_providers, test_config};

#[tokio::test]
#[ignore = "Requires external Postgres. Set INTAKE_PG_DSN to run."]
async fn failing_a_session_keeps_reported_progress() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping failing_a_session_keeps_reported_progress; set INTAKE_PG_DSN to run this test."
		);

		return;
	};
	let providers = stub_providers(SpyEmbedding::new(), Vec::new());
	let cfg = test_config(test_db.dsn().to_string());
	let service = super::build_service(cfg, providers).await.expect("Failed to build service.");
	let user_id = Uuid::new_v4();
	let session_id = service
		.create_session(user_id, "gmail", serde_json::json!({}))
		.await
		.expect("Failed to create session.");
	let session = service
		.fetch_session(session_id)
		.await
		.expect("Fetch failed.")
		.expect("Session missing.");

	assert_eq!(session.status, "started");

	let written = service
		.update_progress(
			session_id,
			&ProgressEvent {
				status: Some(SessionStatus::Importing),
				step: "importing".to_string(),
				percentage: 50,
				total_items: Some(10),
				imported_items: Some(5),
				failed_items: None,
			},
		)
		.await
		.expect("Progress write failed.");

	assert!(written);

	let failed = service
		.fail_session(session_id, "Provider exploded.")
		.await
		.expect("Fail write failed.");

	assert!(failed);

	let session = service
		.fetch_session(session_id)
		.await
		.expect("Fetch failed.")
		.expect("Session missing.");

	assert_eq!(session.status, "failed");
	assert_eq!(session.progress_percentage, 50, "Failure must not rewrite progress.");

	let details = session.error_details.expect("Failure must record error details.");

	assert_eq!(details.get("error").and_then(|v| v.as_str()), Some("Provider exploded."));
	assert!(details.get("timestamp").is_some());

	// Terminal means terminal: no further writes land.
	let written = service
		.update_progress(
			session_id,
			&ProgressEvent {
				status: None,
				step: "importing".to_string(),
				percentage: 80,
				total_items: None,
				imported_items: None,
				failed_items: None,
			},
		)
		.await
		.expect("Progress write failed.");

	assert!(!written);
	assert!(!service.complete_session(session_id).await.expect("Complete write failed."));

	let session = service
		.fetch_session(session_id)
		.await
		.expect("Fetch failed.")
		.expect("Session missing.");

	assert_eq!(session.status, "failed");
	assert_eq!(session.progress_percentage, 50);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set INTAKE_PG_DSN to run."]
async fn the_progress_writer_applies_channel_events_in_order() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping the_progress_writer_applies_channel_events_in_order; set INTAKE_PG_DSN to run this test."
		);

		return;
	};
	let providers = stub_providers(SpyEmbedding::new(), Vec::new());
	let cfg = test_config(test_db.dsn().to_string());
	let service = super::build_service(cfg, providers).await.expect("Failed to build service.");
	let user_id = Uuid::new_v4();
	let session_id = service
		.create_session(user_id, "gmail", serde_json::json!({}))
		.await
		.expect("Failed to create session.");
	let (tx, rx) = sessions::progress_channel(8);
	let writer = sessions::spawn_progress_writer(service.db.clone(), session_id, rx);

	tx.send(ProgressEvent {
		status: Some(SessionStatus::Importing),
		step: "importing".to_string(),
		percentage: 20,
		total_items: Some(4),
		imported_items: Some(1),
		failed_items: None,
	})
	.await
	.expect("Send failed.");
	tx.send(ProgressEvent {
		status: Some(SessionStatus::Processing),
		step: "processing".to_string(),
		percentage: 75,
		total_items: None,
		imported_items: Some(4),
		failed_items: Some(0),
	})
	.await
	.expect("Send failed.");

	drop(tx);
	writer.await.expect("Writer task panicked.");

	let session = service
		.fetch_session(session_id)
		.await
		.expect("Fetch failed.")
		.expect("Session missing.");

	assert_eq!(session.status, "processing");
	assert_eq!(session.current_step, "processing");
	assert_eq!(session.progress_percentage, 75);
	assert_eq!(session.total_items, 4);
	assert_eq!(session.imported_items, 4);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
