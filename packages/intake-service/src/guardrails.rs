use std::future::Future;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use intake_domain::{period, rate};
use intake_storage::{ledger, models::AiQuota};

use crate::{IntakeService, Result};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockedReason {
	QuotaExceeded,
	RateLimited,
	CostCapped,
}
impl BlockedReason {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::QuotaExceeded => "quota_exceeded",
			Self::RateLimited => "rate_limited",
			Self::CostCapped => "cost_capped",
		}
	}
}
impl std::fmt::Display for BlockedReason {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug)]
pub enum GuardrailOutcome<T> {
	Allowed(T),
	Blocked(BlockedReason),
}

/// A completed metered call together with the usage it incurred.
#[derive(Debug)]
pub struct MeteredCall<T> {
	pub value: T,
	pub model: String,
	pub input_tokens: i64,
	pub output_tokens: i64,
	pub cost_usd: f64,
}

impl IntakeService {
	/// Upsert the quota row, lazily rolling the period forward to the current
	/// month. No scheduled job is involved; correctness comes from evaluating
	/// the rollover on read.
	pub async fn ensure_monthly_quota(&self, user_id: Uuid) -> Result<AiQuota> {
		let period_start = period::month_start(OffsetDateTime::now_utc());
		let quota = ledger::ensure_monthly_quota(
			&self.db,
			user_id,
			period_start,
			self.cfg.guardrails.monthly_credits,
		)
		.await?;

		Ok(quota)
	}

	/// `None` means the monthly quota is exhausted.
	pub async fn try_spend_credit(&self, user_id: Uuid) -> Result<Option<i32>> {
		Ok(ledger::spend_credit(&self.db, user_id).await?)
	}

	pub async fn check_rate_limit(&self, user_id: Uuid) -> Result<bool> {
		let since = period::rate_window_start(OffsetDateTime::now_utc());
		let recent = ledger::usage_count_since(&self.db, user_id, since).await?;

		Ok(rate::within_rate_limit(recent, self.cfg.guardrails.requests_per_minute))
	}

	pub async fn under_daily_cost_cap(&self, user_id: Uuid) -> Result<bool> {
		let cap = self.cfg.guardrails.daily_cost_cap_usd;

		if cap <= 0.0 {
			return Ok(true);
		}

		let since = period::day_start(OffsetDateTime::now_utc());
		let spent = ledger::usage_cost_since(&self.db, user_id, since).await?;

		Ok(rate::under_cost_cap(spent, cap))
	}

	pub async fn log_usage(
		&self,
		user_id: Uuid,
		model: &str,
		input_tokens: i64,
		output_tokens: i64,
		cost_usd: f64,
	) -> Result<()> {
		ledger::insert_usage(&self.db, user_id, model, input_tokens, output_tokens, cost_usd)
			.await?;

		Ok(())
	}

	/// The one production path to a metered call. Checks run quota first,
	/// then rate, then cost, then the atomic spend, so an exhausted quota is
	/// the reported reason even when other ceilings are also hit. Usage is
	/// logged after every successful call.
	pub async fn with_guardrails<T, F, Fut>(
		&self,
		user_id: Uuid,
		call: F,
	) -> Result<GuardrailOutcome<T>>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<MeteredCall<T>>>,
	{
		let quota = self.ensure_monthly_quota(user_id).await?;

		if quota.credits_left <= 0 {
			return Ok(GuardrailOutcome::Blocked(BlockedReason::QuotaExceeded));
		}
		if !self.check_rate_limit(user_id).await? {
			return Ok(GuardrailOutcome::Blocked(BlockedReason::RateLimited));
		}
		if !self.under_daily_cost_cap(user_id).await? {
			return Ok(GuardrailOutcome::Blocked(BlockedReason::CostCapped));
		}
		if self.try_spend_credit(user_id).await?.is_none() {
			return Ok(GuardrailOutcome::Blocked(BlockedReason::QuotaExceeded));
		}

		let metered = call().await?;

		self.log_usage(
			user_id,
			&metered.model,
			metered.input_tokens,
			metered.output_tokens,
			metered.cost_usd,
		)
		.await?;

		Ok(GuardrailOutcome::Allowed(metered.value))
	}
}
