// crates.io
use clap::Parser;
// self
use prior_eval::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = Args::parse();

	prior_eval::run(args).await
}
