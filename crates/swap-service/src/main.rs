use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use swap_config::{ConfigLoader, EngineConfig};
use swap_types::{QuoteDirection, SwapRequest};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod service;

#[derive(Parser)]
#[command(name = "swap-engine")]
#[command(about = "Swap quote engine", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	#[arg(short, long, value_name = "FILE", default_value = "config/example.toml")]
	config: PathBuf,

	/// Log filter; defaults to `engine.log_level` from the config
	#[arg(long, env = "SWAP_LOG_LEVEL")]
	log_level: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Direction {
	From,
	To,
	Max,
}

impl From<Direction> for QuoteDirection {
	fn from(direction: Direction) -> Self {
		match direction {
			Direction::From => QuoteDirection::From,
			Direction::To => QuoteDirection::To,
			Direction::Max => QuoteDirection::Max,
		}
	}
}

#[derive(Subcommand)]
enum Commands {
	/// Validate the configuration file
	Validate,
	/// Request a quote and print it as JSON
	Quote {
		/// Backend name; the first enabled backend when omitted
		#[arg(short, long)]
		backend: Option<String>,

		/// Asset to spend, as CODE@network
		#[arg(long)]
		from: String,
		#[arg(long, default_value_t = 8)]
		from_decimals: u32,
		/// Contract address when the from asset is a token
		#[arg(long)]
		from_token: Option<String>,

		/// Asset to receive, as CODE@network
		#[arg(long)]
		to: String,
		#[arg(long, default_value_t = 18)]
		to_decimals: u32,
		/// Contract address when the to asset is a token
		#[arg(long)]
		to_token: Option<String>,

		/// Native amount (smallest units); ignored with `--direction max`
		#[arg(long, default_value = "0")]
		amount: String,

		#[arg(long, value_enum, default_value = "from")]
		direction: Direction,

		/// Execute the quote with the configured wallet
		#[arg(long)]
		execute: bool,
	},
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	let config = ConfigLoader::new()
		.with_file(&cli.config)
		.load()
		.await
		.with_context(|| format!("Failed to load configuration from {:?}", cli.config))?;

	// Initialize tracing
	setup_tracing(cli.log_level.as_deref().unwrap_or(&config.engine.log_level))?;

	match cli.command {
		Commands::Validate => validate_config(&config),
		Commands::Quote {
			backend,
			from,
			from_decimals,
			from_token,
			to,
			to_decimals,
			to_token,
			amount,
			direction,
			execute,
		} => {
			let request = SwapRequest::new(
				service::parse_asset(&from, from_decimals, from_token.as_deref())?,
				service::parse_asset(&to, to_decimals, to_token.as_deref())?,
				amount,
				direction.into(),
			);
			quote(&config, backend.as_deref(), request, execute).await
		}
	}
}

fn validate_config(config: &EngineConfig) -> Result<()> {
	info!("Configuration is valid");
	info!("Wallet: {}", config.wallet.kind);
	info!("Enabled backends:");
	for (name, backend) in config.enabled_backends() {
		info!(
			"  {} ({}, quotes live {}s)",
			name, backend.kind, backend.quote_lifetime_secs
		);
	}
	Ok(())
}

async fn quote(
	config: &EngineConfig,
	backend: Option<&str>,
	request: SwapRequest,
	execute: bool,
) -> Result<()> {
	let wallet = service::build_wallet(config)?;
	let engine = service::build_engine(config, backend, wallet)?;

	let quote = engine
		.fetch_quote(&request)
		.await
		.context("Failed to fetch quote")?;
	println!("{}", serde_json::to_string_pretty(&quote)?);

	if execute {
		let mut sequencer = engine.sequencer(quote);
		let report = sequencer
			.execute()
			.await
			.context("Failed to execute quote")?;
		println!("{}", serde_json::to_string_pretty(&report)?);
	}

	Ok(())
}

fn setup_tracing(log_level: &str) -> Result<()> {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

	tracing_subscriber::registry()
		.with(env_filter)
		.with(tracing_subscriber::fmt::layer())
		.init();

	Ok(())
}
