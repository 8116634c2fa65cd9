use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = intake_worker::Args::parse();

	intake_worker::run(args).await
}
