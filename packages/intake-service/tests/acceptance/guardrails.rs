use time::OffsetDateTime;
use uuid::Uuid;

use intake_domain::period;
use intake_service::{BlockedReason, EmbedResult};

use super::{SpyEmbedding, stub_providers, test_config};

#[tokio::test]
#[ignore = "Requires external Postgres. Set INTAKE_PG_DSN to run."]
async fn the_two_hundred_first_credit_spend_is_blocked() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping the_two_hundred_first_credit_spend_is_blocked; set INTAKE_PG_DSN to run this test."
		);

		return;
	};
	let providers = stub_providers(SpyEmbedding::new(), Vec::new());
	let cfg = test_config(test_db.dsn().to_string());
	let service = super::build_service(cfg, providers).await.expect("Failed to build service.");
	let user_id = Uuid::new_v4();
	let quota = service.ensure_monthly_quota(user_id).await.expect("Quota upsert failed.");

	assert_eq!(quota.credits_left, 200);

	for spend in 1..=200 {
		let credits_left = service
			.try_spend_credit(user_id)
			.await
			.expect("Spend failed.")
			.unwrap_or_else(|| panic!("Spend {spend} should succeed."));

		assert_eq!(credits_left, 200 - spend);
	}

	let blocked = service.try_spend_credit(user_id).await.expect("Spend failed.");

	assert!(blocked.is_none(), "The 201st spend must be blocked, not negative.");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set INTAKE_PG_DSN to run."]
async fn a_stale_period_rolls_over_on_read() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping a_stale_period_rolls_over_on_read; set INTAKE_PG_DSN to run this test.");

		return;
	};
	let providers = stub_providers(SpyEmbedding::new(), Vec::new());
	let cfg = test_config(test_db.dsn().to_string());
	let service = super::build_service(cfg, providers).await.expect("Failed to build service.");
	let user_id = Uuid::new_v4();

	service.ensure_monthly_quota(user_id).await.expect("Quota upsert failed.");

	// Age the row into the previous month with some credits already burned.
	sqlx::query(
		"\
UPDATE ai_quotas
SET period_start = period_start - INTERVAL '40 days', credits_left = 3
WHERE user_id = $1",
	)
	.bind(user_id)
	.execute(&service.db.pool)
	.await
	.expect("Failed to age quota row.");

	let quota = service.ensure_monthly_quota(user_id).await.expect("Rollover upsert failed.");

	assert_eq!(quota.credits_left, 200);
	assert_eq!(quota.period_start, period::month_start(OffsetDateTime::now_utc()));

	// A second read in the same month must not reset again.
	service.try_spend_credit(user_id).await.expect("Spend failed.");

	let quota = service.ensure_monthly_quota(user_id).await.expect("Same-month upsert failed.");

	assert_eq!(quota.credits_left, 199);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set INTAKE_PG_DSN to run."]
async fn rate_limit_refuses_the_ninth_request_in_a_minute() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping rate_limit_refuses_the_ninth_request_in_a_minute; set INTAKE_PG_DSN to run this test."
		);

		return;
	};
	let providers = stub_providers(SpyEmbedding::new(), Vec::new());
	let cfg = test_config(test_db.dsn().to_string());
	let service = super::build_service(cfg, providers).await.expect("Failed to build service.");
	let user_id = Uuid::new_v4();

	for _ in 0..7 {
		service
			.log_usage(user_id, "stub-embedding", 7, 0, 0.0001)
			.await
			.expect("Usage insert failed.");
	}

	assert!(service.check_rate_limit(user_id).await.expect("Rate check failed."));

	service
		.log_usage(user_id, "stub-embedding", 7, 0, 0.0001)
		.await
		.expect("Usage insert failed.");

	assert!(!service.check_rate_limit(user_id).await.expect("Rate check failed."));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set INTAKE_PG_DSN to run."]
async fn an_exhausted_quota_blocks_the_embed_stage() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping an_exhausted_quota_blocks_the_embed_stage; set INTAKE_PG_DSN to run this test."
		);

		return;
	};
	let spy = SpyEmbedding::new();
	let calls = spy.calls.clone();
	let providers = stub_providers(spy, Vec::new());
	let cfg = test_config(test_db.dsn().to_string());
	let service = super::build_service(cfg, providers).await.expect("Failed to build service.");
	let user_id = Uuid::new_v4();

	service.ensure_monthly_quota(user_id).await.expect("Quota upsert failed.");
	sqlx::query("UPDATE ai_quotas SET credits_left = 0 WHERE user_id = $1")
		.bind(user_id)
		.execute(&service.db.pool)
		.await
		.expect("Failed to drain quota.");

	let result = service
		.embed_owner(user_id, "interaction", Uuid::new_v4(), "Some interaction text.", 0)
		.await
		.expect("Embed call failed.");

	match result {
		EmbedResult::Blocked { reason } => assert_eq!(reason, BlockedReason::QuotaExceeded),
		other => panic!("Expected a quota block, got {other:?}"),
	}

	assert_eq!(
		calls.load(std::sync::atomic::Ordering::SeqCst),
		0,
		"A blocked call must never reach the provider."
	);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set INTAKE_PG_DSN to run."]
async fn the_daily_cost_cap_blocks_once_spent() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping the_daily_cost_cap_blocks_once_spent; set INTAKE_PG_DSN to run this test."
		);

		return;
	};
	let providers = stub_providers(SpyEmbedding::new(), Vec::new());
	let mut cfg = test_config(test_db.dsn().to_string());

	cfg.guardrails.daily_cost_cap_usd = 0.05;

	let service = super::build_service(cfg, providers).await.expect("Failed to build service.");
	let user_id = Uuid::new_v4();

	service.ensure_monthly_quota(user_id).await.expect("Quota upsert failed.");

	assert!(service.under_daily_cost_cap(user_id).await.expect("Cost check failed."));

	service
		.log_usage(user_id, "stub-embedding", 7, 0, 0.06)
		.await
		.expect("Usage insert failed.");

	assert!(!service.under_daily_cost_cap(user_id).await.expect("Cost check failed."));

	let result = service
		.embed_owner(user_id, "interaction", Uuid::new_v4(), "Some interaction text.", 0)
		.await
		.expect("Embed call failed.");

	match result {
		EmbedResult::Blocked { reason } => assert_eq!(reason, BlockedReason::CostCapped),
		other => panic!("Expected a cost-cap block, got {other:?}"),
	}

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
