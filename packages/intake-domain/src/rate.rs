/// True while the trailing-window request count is strictly below the
/// configured ceiling. At exactly the ceiling the next request is refused.
pub fn within_rate_limit(recent_requests: i64, requests_per_minute: u32) -> bool {
	recent_requests < i64::from(requests_per_minute)
}

/// True while today's spend is strictly below the cap. A cap of zero or less
/// disables the check.
pub fn under_cost_cap(spent_today_usd: f64, cap_usd: f64) -> bool {
	if cap_usd <= 0.0 {
		return true;
	}

	spent_today_usd < cap_usd
}
