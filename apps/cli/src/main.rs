use std::{
	path::{Path, PathBuf},
	sync::Arc,
};

use anyhow::{anyhow, Context as _, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use mejour_config::{default_data_dir, AppConfig};
use mejour_core::{CurrentUser, Error, FollowStore, LoginCredentials, Session, SyncEngine};
use mejour_remote_api::Client;

mod context;
mod domains;
mod util;

use crate::{
	context::{Context, OutputFormat},
	domains::{config::ConfigCmd, follow::FollowCmd, places::PlaceCmd, posts::PostCmd},
};

#[derive(Parser, Debug)]
#[command(name = "mejour", about = "Places and posts from the terminal")]
struct Cli {
	/// Path to mejour data directory
	#[arg(long)]
	data_dir: Option<PathBuf>,

	/// Output format
	#[arg(long, value_enum, default_value = "human")]
	format: OutputFormat,

	/// Password of the configured account
	#[arg(long, env = "MEJOUR_PASSWORD", hide_env_values = true)]
	password: Option<String>,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Sign in and reload the place catalog and your own posts
	Refresh,
	/// Place operations
	#[command(subcommand)]
	Places(PlaceCmd),
	/// Post operations
	#[command(subcommand)]
	Posts(PostCmd),
	/// Followed users
	#[command(subcommand)]
	Follow(FollowCmd),
	/// Configuration
	#[command(subcommand)]
	Config(ConfigCmd),
}

fn init_tracing(config: &AppConfig) {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();
}

fn build_engine(
	config: &AppConfig,
	data_dir: &Path,
	password: Option<String>,
) -> Result<SyncEngine> {
	let gateway = Client::new(config.api_url.clone())
		.with_context(|| format!("Invalid api_url {}", config.api_url))?;

	let login = config
		.username
		.clone()
		.zip(password)
		.map(|(username, password)| LoginCredentials::new(username, password));

	if login.is_none() {
		debug!("No username or password configured");
	}

	let follows = FollowStore::open(AppConfig::follows_path(data_dir))?;

	Ok(SyncEngine::new(
		Arc::new(gateway),
		Session::new(login),
		follows,
		config.sync.clone(),
	))
}

async fn run(ctx: &Context, command: Commands) -> Result<()> {
	match command {
		Commands::Refresh => {
			let count = ctx.engine.refresh().await?;
			let user = ctx.engine.current_user().await;

			print_output!(ctx, &user, |u: &Option<CurrentUser>| {
				if let Some(user) = u {
					println!("Signed in as {} (#{})", user.display_name, user.id);
				}
				println!("{count} places loaded");
			});
		}
		Commands::Places(cmd) => domains::places::run(ctx, cmd).await?,
		Commands::Posts(cmd) => domains::posts::run(ctx, cmd).await?,
		Commands::Follow(cmd) => domains::follow::run(ctx, cmd).await?,
		Commands::Config(cmd) => domains::config::run(&ctx.data_dir, cmd)?,
	}

	Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();
	let data_dir = match cli.data_dir {
		Some(dir) => dir,
		None => default_data_dir()?,
	};

	let config = AppConfig::load_from(&data_dir)?;
	init_tracing(&config);

	let engine = build_engine(&config, &data_dir, cli.password)?;
	let ctx = Context::new(engine, cli.format, data_dir);

	run(&ctx, cli.command).await.map_err(|e| match e.downcast::<Error>() {
		Ok(e) => anyhow!("{} ({e})", e.user_message()),
		Err(e) => e,
	})
}
