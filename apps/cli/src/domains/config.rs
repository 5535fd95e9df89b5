use std::path::Path;

use anyhow::Result;
use clap::Subcommand;

use mejour_config::AppConfig;

use crate::util::output::table;

#[derive(Subcommand, Debug)]
pub enum ConfigCmd {
	/// Show all configuration
	Show,
	/// Set a configuration value
	Set {
		/// Configuration key (e.g., "api_url", "sync.nearby_limit")
		key: String,
		/// Configuration value
		value: String,
	},
}

pub fn run(data_dir: &Path, cmd: ConfigCmd) -> Result<()> {
	let mut config = AppConfig::load_from(data_dir)?;

	match cmd {
		ConfigCmd::Show => {
			let sync = &config.sync;
			let mut table = table(&["Key", "Value"]);

			table.add_row(vec!["api_url".to_string(), config.api_url.clone()]);
			table.add_row(vec![
				"username".to_string(),
				config
					.username
					.clone()
					.unwrap_or_else(|| "(not set)".to_string()),
			]);
			table.add_row(vec!["log_level".to_string(), config.log_level.clone()]);
			table.add_row(vec![
				"sync.author_posts_ttl_secs".to_string(),
				sync.author_posts_ttl_secs.to_string(),
			]);
			table.add_row(vec![
				"sync.dedup_radius_meters".to_string(),
				sync.dedup_radius_meters.to_string(),
			]);
			table.add_row(vec![
				"sync.index_merge_radius_meters".to_string(),
				sync.index_merge_radius_meters.to_string(),
			]);
			table.add_row(vec![
				"sync.nearby_radius_meters".to_string(),
				sync.nearby_radius_meters.to_string(),
			]);
			table.add_row(vec![
				"sync.nearby_limit".to_string(),
				sync.nearby_limit.to_string(),
			]);
			table.add_row(vec![
				"sync.display_name_ttl_hours".to_string(),
				sync.display_name_ttl_hours.to_string(),
			]);

			println!("{table}");
			println!();
			println!("Config file: {}", AppConfig::config_path(data_dir).display());
		}
		ConfigCmd::Set { key, value } => {
			config.set(&key, &value, data_dir)?;
			println!("Set {key} = {value}");
		}
	}

	Ok(())
}
