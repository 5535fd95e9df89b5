//! On-disk configuration for mejour clients

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::{
	fs,
	path::{Path, PathBuf},
	time::Duration,
};
use tracing::{info, warn};

const CONFIG_FILE_NAME: &str = "mejour.json";
const FOLLOWS_FILE_NAME: &str = "follows.json";
const CURRENT_VERSION: u32 = 1;

/// Platform-specific data directory resolution
pub fn default_data_dir() -> Result<PathBuf> {
	#[cfg(any(target_os = "macos", target_os = "ios", target_os = "android"))]
	let dir = dirs::data_dir()
		.ok_or_else(|| anyhow!("Could not determine data directory"))?
		.join("mejour");

	#[cfg(target_os = "windows")]
	let dir = dirs::data_dir()
		.ok_or_else(|| anyhow!("Could not determine data directory"))?
		.join("Mejour");

	#[cfg(not(any(
		target_os = "macos",
		target_os = "ios",
		target_os = "android",
		target_os = "windows"
	)))]
	let dir = dirs::data_local_dir()
		.ok_or_else(|| anyhow!("Could not determine data directory"))?
		.join("mejour");

	// Create directory if it doesn't exist
	fs::create_dir_all(&dir)?;

	Ok(dir)
}

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
	/// Config schema version
	pub version: u32,

	/// Base URL of the backend API, without the trailing slash
	pub api_url: String,

	/// Account used for silent re-authentication; the password comes from the environment
	#[serde(default)]
	pub username: Option<String>,

	/// Logging level used when `RUST_LOG` is not set
	pub log_level: String,

	#[serde(default)]
	pub sync: SyncConfig,
}

/// Tunables of the synchronization engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
	/// How long a user's post list stays fresh
	pub author_posts_ttl_secs: u64,
	/// Radius within which a same-named place is reused instead of created
	pub dedup_radius_meters: f64,
	/// Radius within which same-named places collapse into one pin
	pub index_merge_radius_meters: f64,
	pub nearby_radius_meters: f64,
	pub nearby_limit: usize,
	/// Age after which a followed user's cached display name is resolved again
	pub display_name_ttl_hours: u64,
}

impl Default for SyncConfig {
	fn default() -> Self {
		Self {
			author_posts_ttl_secs: 5 * 60,
			dedup_radius_meters: 30.0,
			index_merge_radius_meters: 30.0,
			nearby_radius_meters: 30.0,
			nearby_limit: 10,
			display_name_ttl_hours: 24,
		}
	}
}

impl SyncConfig {
	#[must_use]
	pub const fn author_posts_ttl(&self) -> Duration {
		Duration::from_secs(self.author_posts_ttl_secs)
	}

	#[must_use]
	pub const fn display_name_ttl(&self) -> Duration {
		Duration::from_secs(self.display_name_ttl_hours * 60 * 60)
	}
}

impl Default for AppConfig {
	fn default() -> Self {
		Self {
			version: CURRENT_VERSION,
			api_url: "https://meejing-backend.vercel.app/api".to_string(),
			username: None,
			log_level: "info".to_string(),
			sync: SyncConfig::default(),
		}
	}
}

impl AppConfig {
	/// Get the config file path
	#[must_use]
	pub fn config_path(data_dir: &Path) -> PathBuf {
		data_dir.join(CONFIG_FILE_NAME)
	}

	/// Get the followed users file path
	#[must_use]
	pub fn follows_path(data_dir: &Path) -> PathBuf {
		data_dir.join(FOLLOWS_FILE_NAME)
	}

	/// Load configuration from the default location
	pub fn load() -> Result<Self> {
		let data_dir = default_data_dir()?;
		Self::load_from(&data_dir)
	}

	/// Load configuration from a specific data directory, creating a default one if missing
	pub fn load_from(data_dir: &Path) -> Result<Self> {
		let config_path = Self::config_path(data_dir);

		if config_path.exists() {
			info!("Loading config from {:?}", config_path);
			let json = fs::read_to_string(&config_path)?;
			let config: Self = serde_json::from_str(&json)?;

			if config.version != CURRENT_VERSION {
				return Err(anyhow!("Unknown config version: {}", config.version));
			}

			Ok(config)
		} else {
			warn!("No config found, creating default at {:?}", config_path);
			let config = Self::default();
			config.save(data_dir)?;
			Ok(config)
		}
	}

	/// Save configuration to the data directory
	pub fn save(&self, data_dir: &Path) -> Result<()> {
		fs::create_dir_all(data_dir)?;

		let config_path = Self::config_path(data_dir);
		let json = serde_json::to_string_pretty(self)?;
		fs::write(&config_path, json)?;
		info!("Saved config to {:?}", config_path);
		Ok(())
	}

	/// Set a single value by dotted key and save
	pub fn set(&mut self, key: &str, value: &str, data_dir: &Path) -> Result<()> {
		match key {
			"api_url" => self.api_url = value.trim_end_matches('/').to_string(),
			"username" => {
				self.username = Some(value.to_string()).filter(|name| !name.trim().is_empty());
			}
			"log_level" => self.log_level = value.to_string(),
			"sync.author_posts_ttl_secs" => self.sync.author_posts_ttl_secs = value.parse()?,
			"sync.dedup_radius_meters" => self.sync.dedup_radius_meters = value.parse()?,
			"sync.index_merge_radius_meters" => {
				self.sync.index_merge_radius_meters = value.parse()?;
			}
			"sync.nearby_radius_meters" => self.sync.nearby_radius_meters = value.parse()?,
			"sync.nearby_limit" => self.sync.nearby_limit = value.parse()?,
			"sync.display_name_ttl_hours" => self.sync.display_name_ttl_hours = value.parse()?,
			_ => return Err(anyhow!("Unknown config key: {}", key)),
		}

		self.save(data_dir)
	}
}
