use time::{Duration, OffsetDateTime};

/// Start of the monthly billing period containing `now`. Quota rows whose
/// stored period is older than this are due for a lazy rollover.
pub fn month_start(now: OffsetDateTime) -> OffsetDateTime {
	let date = now.date();
	let first = date.replace_day(1).unwrap_or(date);

	first.midnight().assume_utc()
}

/// Start of the UTC day containing `now`, the window for the daily cost cap.
pub fn day_start(now: OffsetDateTime) -> OffsetDateTime {
	now.date().midnight().assume_utc()
}

/// Start of the trailing window for the per-minute rate check.
pub fn rate_window_start(now: OffsetDateTime) -> OffsetDateTime {
	now - Duration::seconds(60)
}
