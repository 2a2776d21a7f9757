use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = prior_api::Args::parse();

	prior_api::run(args).await
}
