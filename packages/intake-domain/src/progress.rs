/// Map `done` of `total` items onto a phase's percentage range. Each driving
/// phase owns its own slice of the bar, e.g. import 5-75 and processing
/// 75-100.
pub fn scale_progress(phase_start: i32, phase_end: i32, done: usize, total: usize) -> i32 {
	if total == 0 {
		return phase_end;
	}

	let span = f64::from((phase_end - phase_start).max(0));
	let ratio = done.min(total) as f64 / total as f64;

	phase_start + (span * ratio).round() as i32
}
