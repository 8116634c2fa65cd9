use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub mod providers;
pub mod worker;

#[derive(Debug, Parser)]
#[command(
	version = intake_cli::VERSION,
	rename_all = "kebab",
	styles = intake_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: std::path::PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = intake_config::load(&args.config)?;
	let filter = EnvFilter::new(config.service.log_level.clone());

	tracing_subscriber::fmt().with_env_filter(filter).init();

	let db = intake_storage::db::Db::connect(&config.storage.postgres).await?;

	db.ensure_schema().await?;

	let providers = intake_service::Providers::new(
		Arc::new(providers::HttpEmbedding),
		Arc::new(providers::HttpEvents),
	);
	let service = intake_service::IntakeService::new(config, db, providers);

	worker::run_worker(service).await
}
