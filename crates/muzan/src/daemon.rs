use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::args::{self, LaunchMode};
use crate::config::AppConfig;
use crate::paths::{self, RunPaths};
use crate::pid;
use crate::platform::Platform;

pub const EXIT_OK: i32 = 0;
/// Startup could not prepare the run directory.
pub const EXIT_FATAL: i32 = 1;
/// The background copy could not be spawned.
pub const EXIT_SPAWN_FAILED: i32 = -1;

/// How long a restart waits for the killed instance to disappear.
const RESTART_EXIT_WAIT: Duration = Duration::from_secs(3);
const EXIT_POLL: Duration = Duration::from_millis(50);

/// What the caller should do after dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
	/// Terminate the process with this status.
	Exit(i32),
	/// Carry on into normal operation.
	Continue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KillOutcome {
	Killed(u32),
	NotRunning,
	Failed { pid: u32, reason: String },
}

/// Turns a `LaunchMode` into side effects: spawn the background copy, stop
/// the running one, or write our own PID record and let the caller go on.
pub struct DaemonController<'a, P: Platform> {
	pub config: &'a AppConfig,
	pub paths: &'a RunPaths,
	pub platform: P,
	/// Executable re-launched for the background copy.
	pub exe: PathBuf,
}

impl<'a, P: Platform> DaemonController<'a, P> {
	pub fn new(config: &'a AppConfig, paths: &'a RunPaths, platform: P) -> Self {
		Self {
			config,
			paths,
			platform,
			exe: paths::current_binary(),
		}
	}

	/// `args` are the launch arguments `mode` was parsed from, program name
	/// excluded; the background copy is started with a rewrite of them.
	pub fn dispatch(&self, mode: LaunchMode, args: &[String]) -> Dispatch {
		match mode {
			LaunchMode::Help => {
				eprint!("{}", args::usage(&self.config.name));
				Dispatch::Exit(EXIT_OK)
			}
			LaunchMode::PrintVersion => {
				print!("{}", self.version_text());
				Dispatch::Exit(EXIT_OK)
			}
			LaunchMode::Stop => self.with_run_dir(|| {
				self.kill();
				Dispatch::Exit(EXIT_OK)
			}),
			LaunchMode::Daemonize => self.with_run_dir(|| self.daemonize(args, true)),
			LaunchMode::Restart => self.with_run_dir(|| {
				if let KillOutcome::Killed(pid) = self.kill() {
					self.wait_for_exit(pid, RESTART_EXIT_WAIT);
				}
				self.daemonize(args, false)
			}),
			LaunchMode::RunDebug => self.with_run_dir(|| {
				match self.running_instance() {
					Some(pid) => {
						eprintln!(
							"{} already running (pid {}), its pid file is left alone",
							self.config.label(),
							pid
						);
						tracing::warn!("running in foreground beside pid {}", pid);
					}
					None => self.write_pid(),
				}
				Dispatch::Continue
			}),
		}
	}

	/// What `-version` prints: the configured version and nothing else.
	pub fn version_text(&self) -> String {
		format!("{}\n", self.config.version)
	}

	fn with_run_dir(&self, then: impl FnOnce() -> Dispatch) -> Dispatch {
		if let Err(e) = self.paths.ensure_run_dir() {
			eprintln!("{}", e);
			tracing::error!("{}", e);
			return Dispatch::Exit(EXIT_FATAL);
		}
		then()
	}

	/// Pid of another live instance named by the PID record, if any.
	pub fn running_instance(&self) -> Option<u32> {
		let pid_path = self.paths.pid_path();
		let pid = pid::read(&pid_path)?;
		if pid == self.platform.pid() {
			return None;
		}
		if self.platform.is_alive(pid) {
			Some(pid)
		} else {
			tracing::debug!("stale pid file {} (pid {})", pid_path.display(), pid);
			None
		}
	}

	/// In the foreground: spawn the background copy and exit. In the
	/// background copy: write the PID record and continue.
	pub fn daemonize(&self, args: &[String], check_running: bool) -> Dispatch {
		if check_running {
			if let Some(pid) = self.running_instance() {
				eprintln!("{} already running (pid {})", self.config.label(), pid);
				return Dispatch::Exit(EXIT_OK);
			}
		}

		if self.platform.is_detached() {
			self.platform.detach();
			self.write_pid();
			return Dispatch::Continue;
		}

		let child_args = args::detached_args(args);
		let log_path = self.paths.log_path();
		match self.platform.spawn_detached(&self.exe, &child_args, &log_path) {
			Ok(pid) => {
				eprintln!(
					"{} running in background (pid {}, log {})",
					self.config.label(),
					pid,
					log_path.display()
				);
				Dispatch::Exit(EXIT_OK)
			}
			Err(e) => {
				eprintln!("{}: {} {:?}: {}", self.config.name, self.exe.display(), child_args, e);
				tracing::error!("{}", e);
				Dispatch::Exit(EXIT_SPAWN_FAILED)
			}
		}
	}

	/// Finds the running instance (PID record first, then the listening
	/// socket) and kills it. The record is only removed when the kill worked.
	pub fn kill(&self) -> KillOutcome {
		let Some(pid) = self.resolve_pid() else {
			eprintln!("{}: not running, nothing to stop", self.config.name);
			return KillOutcome::NotRunning;
		};

		match self.platform.kill(pid) {
			Ok(()) => {
				pid::remove(&self.paths.pid_path());
				eprintln!("{} stopped (pid {})", self.config.label(), pid);
				tracing::info!("killed {} (pid {})", self.config.name, pid);
				KillOutcome::Killed(pid)
			}
			Err(e) => {
				eprintln!("{}: kill failed: {}", self.config.name, e);
				tracing::warn!("{}", e);
				KillOutcome::Failed {
					pid,
					reason: e.to_string(),
				}
			}
		}
	}

	fn resolve_pid(&self) -> Option<u32> {
		let pid_path = self.paths.pid_path();
		let own = self.platform.pid();

		if let Some(pid) = pid::read(&pid_path) {
			if pid != own && self.platform.is_alive(pid) {
				return Some(pid);
			}
			tracing::warn!("pid file {} names pid {} which is not running", pid_path.display(), pid);
		}

		let port = self.config.port?;
		match self.platform.locate(&self.config.name, port) {
			Ok(pid) if pid != own => Some(pid),
			Ok(_) => None,
			Err(e) => {
				tracing::info!("no {} listening on port {}: {}", self.config.name, port, e);
				None
			}
		}
	}

	fn write_pid(&self) {
		let pid_path = self.paths.pid_path();
		let pid = self.platform.pid();
		match pid::save(&pid_path, pid) {
			Ok(()) => tracing::debug!("wrote pid {} to {}", pid, pid_path.display()),
			Err(e) => {
				eprintln!("{}", e);
				tracing::warn!("{}", e);
			}
		}
	}

	fn wait_for_exit(&self, pid: u32, limit: Duration) {
		let began = Instant::now();
		while self.platform.is_alive(pid) {
			if began.elapsed() >= limit {
				tracing::warn!("pid {} still alive after {:?}", pid, limit);
				return;
			}
			std::thread::sleep(EXIT_POLL);
		}
	}
}
