use std::path::PathBuf;

use mejour_core::SyncEngine;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
	Human,
	Json,
}

pub struct Context {
	pub engine: SyncEngine,
	pub format: OutputFormat,
	pub data_dir: PathBuf,
}

impl Context {
	pub const fn new(
		engine: SyncEngine,
		format: OutputFormat,
		data_dir: PathBuf,
	) -> Self {
		Self {
			engine,
			format,
			data_dir,
		}
	}
}
