pub fn render_schema() -> String {
	let init = include_str!("../../../sql/init.sql");

	expand_includes(init)
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"tables/001_jobs.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_jobs.sql")),
				"tables/002_raw_events.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_raw_events.sql")),
				"tables/003_interactions.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_interactions.sql")),
				"tables/004_embeddings.sql" =>
					out.push_str(include_str!("../../../sql/tables/004_embeddings.sql")),
				"tables/005_sync_sessions.sql" =>
					out.push_str(include_str!("../../../sql/tables/005_sync_sessions.sql")),
				"tables/006_ai_quotas.sql" =>
					out.push_str(include_str!("../../../sql/tables/006_ai_quotas.sql")),
				"tables/007_ai_usage.sql" =>
					out.push_str(include_str!("../../../sql/tables/007_ai_usage.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}
