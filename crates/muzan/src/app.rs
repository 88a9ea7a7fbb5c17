use std::io;
use std::sync::Arc;

use kagaya::{StartError, StopReport, Supervisor, SupervisorConfig, Task};
use tokio::task::JoinHandle;

use crate::args::{self, LaunchMode};
use crate::config::{self, AppConfig};
use crate::daemon::{DaemonController, Dispatch};
use crate::logging;
use crate::paths::RunPaths;
use crate::platform::{Native, Platform};
use crate::watcher::{Release, SignalWatcher};

/// A service that manages its own background lifecycle.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use kagaya::{FnTask, Task};
/// use muzan::{App, AppConfig};
///
/// # #[tokio::main]
/// # async fn main() {
/// let app = App::new(AppConfig::new("billing", "1.4.0").with_port(8080));
/// app.init();
///
/// let worker: Arc<dyn Task> = Arc::new(FnTask::new("worker", || Ok(()), || Ok(())));
/// app.add([worker]).await;
/// app.watch(|| {}).unwrap();
/// app.start_all().await.unwrap();
/// # }
/// ```
pub struct App<P: Platform = Native> {
	pub config: AppConfig,
	pub paths: RunPaths,
	supervisor: Arc<Supervisor>,
	platform: P,
}

impl App<Native> {
	/// Lays the app out beside its executable and applies `<app>.toml` from
	/// there, if present.
	pub fn new(config: AppConfig) -> Self {
		let paths = RunPaths::beside_executable(config.name.clone());
		let config = config.apply(config::load_overrides(&paths.config_path()));
		Self::with_platform(config, paths, Native)
	}
}

impl<P: Platform + Clone> App<P> {
	pub fn with_platform(config: AppConfig, paths: RunPaths, platform: P) -> Self {
		let supervisor = Supervisor::new(SupervisorConfig {
			stop_timeout: config.stop_timeout,
		});
		Self {
			config,
			paths,
			supervisor,
			platform,
		}
	}

	/// Acts on the process's launch arguments. Exits the process for help,
	/// version, stop, an already running instance and the foreground half of
	/// daemonizing; otherwise returns the mode this process continues in.
	pub fn init(&self) -> LaunchMode {
		let args: Vec<String> = std::env::args().skip(1).collect();
		match self.prepare(&args) {
			(_, Dispatch::Exit(code)) => std::process::exit(code),
			(mode, Dispatch::Continue) => mode,
		}
	}

	/// `init` without the exit: parse, set up logging, dispatch.
	pub fn prepare(&self, args: &[String]) -> (LaunchMode, Dispatch) {
		let mode = args::parse(args);
		logging::init(mode);

		let controller = DaemonController::new(&self.config, &self.paths, self.platform.clone());
		let dispatch = controller.dispatch(mode, args);
		if dispatch == Dispatch::Continue {
			logging::banner(&self.config);
		}
		(mode, dispatch)
	}

	pub fn supervisor(&self) -> &Arc<Supervisor> {
		&self.supervisor
	}

	pub async fn add<I>(&self, tasks: I)
	where
		I: IntoIterator<Item = Arc<dyn Task>>,
	{
		self.supervisor.add(tasks).await;
	}

	pub async fn start_all(&self) -> Result<(), StartError> {
		self.supervisor.start_all().await
	}

	pub async fn stop_all(&self) -> StopReport {
		self.supervisor.stop_all().await
	}

	/// Arms the signal watcher: on a termination signal every task is
	/// stopped, `release` runs once, and the process exits.
	pub fn watch<R: Release + 'static>(&self, release: R) -> io::Result<JoinHandle<StopReport>> {
		SignalWatcher::new(Arc::clone(&self.supervisor), release)
			.with_pid_record(self.paths.pid_path())
			.arm()
	}
}
