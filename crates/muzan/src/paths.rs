use std::fs::DirBuilder;
use std::io;
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};

use crate::error::Error;

const RUN_DIR_MODE: u32 = 0o755;

/// Filesystem layout of one app, rooted at the directory holding its
/// executable.
///
/// ```text
/// <root>/run/<app>.pid
/// <root>/logs/<app>.log
/// <root>/<app>.toml
/// ```
#[derive(Debug, Clone)]
pub struct RunPaths {
	pub app_name: String,
	pub root: PathBuf,
}

impl RunPaths {
	pub fn new(app_name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
		Self {
			app_name: app_name.into(),
			root: root.into(),
		}
	}

	/// Roots the layout next to the running executable.
	pub fn beside_executable(app_name: impl Into<String>) -> Self {
		let root = current_binary()
			.parent()
			.map(Path::to_path_buf)
			.unwrap_or_else(|| PathBuf::from("."));
		Self::new(app_name, root)
	}

	pub fn run_dir(&self) -> PathBuf {
		self.root.join("run")
	}

	pub fn pid_path(&self) -> PathBuf {
		self.run_dir().join(format!("{}.pid", self.app_name))
	}

	pub fn log_dir(&self) -> PathBuf {
		self.root.join("logs")
	}

	pub fn log_path(&self) -> PathBuf {
		self.log_dir().join(format!("{}.log", self.app_name))
	}

	pub fn config_path(&self) -> PathBuf {
		self.root.join(format!("{}.toml", self.app_name))
	}

	/// Creates the run directory (mode 0755) if it is missing.
	pub fn ensure_run_dir(&self) -> Result<(), Error> {
		let dir = self.run_dir();
		ensure_dir(&dir).map_err(|source| Error::RunDir { path: dir, source })
	}
}

fn ensure_dir(dir: &Path) -> io::Result<()> {
	if dir.is_dir() {
		return Ok(());
	}
	DirBuilder::new().recursive(true).mode(RUN_DIR_MODE).create(dir)
}

/// Absolute path of the running executable.
pub fn current_binary() -> PathBuf {
	std::env::current_exe()
		.or_else(|_| {
			let arg0 = std::env::args().next().unwrap_or_default();
			std::path::absolute(arg0)
		})
		.unwrap_or_else(|_| PathBuf::from("daemon"))
}
