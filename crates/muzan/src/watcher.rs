//! Signal-driven shutdown.
//!
//! One watcher per process. On the first of SIGINT, SIGTERM, SIGHUP or
//! SIGQUIT it stops every task, releases external resources once, removes
//! this process's PID record and exits with `EXIT_SHUTDOWN`. A second signal
//! while that is in progress exits immediately with `EXIT_FORCED`.

use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use kagaya::{StopReport, Supervisor};
use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio::task::JoinHandle;

use crate::pid;

pub const EXIT_SHUTDOWN: i32 = 1;
pub const EXIT_FORCED: i32 = 2;

/// Releases resources held outside the supervised tasks (connection pools
/// and the like) during shutdown.
pub trait Release: Send + Sync {
	fn release(&self);
}

impl<F> Release for F
where
	F: Fn() + Send + Sync,
{
	fn release(&self) {
		self()
	}
}

/// Runs the wrapped hook at most once.
pub struct ReleaseOnce<R> {
	inner: R,
	done: AtomicBool,
}

impl<R: Release> ReleaseOnce<R> {
	pub fn new(inner: R) -> Self {
		Self {
			inner,
			done: AtomicBool::new(false),
		}
	}

	/// Returns whether this call ran the hook.
	pub fn release(&self) -> bool {
		if self.done.swap(true, Ordering::SeqCst) {
			return false;
		}
		self.inner.release();
		true
	}
}

struct TerminationSignals {
	interrupt: Signal,
	terminate: Signal,
	hangup: Signal,
	quit: Signal,
}

impl TerminationSignals {
	fn register() -> io::Result<Self> {
		Ok(Self {
			interrupt: signal(SignalKind::interrupt())?,
			terminate: signal(SignalKind::terminate())?,
			hangup: signal(SignalKind::hangup())?,
			quit: signal(SignalKind::quit())?,
		})
	}

	async fn recv(&mut self) -> &'static str {
		tokio::select! {
			_ = self.interrupt.recv() => "SIGINT",
			_ = self.terminate.recv() => "SIGTERM",
			_ = self.hangup.recv() => "SIGHUP",
			_ = self.quit.recv() => "SIGQUIT",
		}
	}
}

type ExitHook = Arc<dyn Fn(i32) + Send + Sync>;

fn exit_process(code: i32) {
	std::process::exit(code)
}

pub struct SignalWatcher<R> {
	supervisor: Arc<Supervisor>,
	release: ReleaseOnce<R>,
	pid_path: Option<PathBuf>,
	exit: ExitHook,
}

impl<R: Release + 'static> SignalWatcher<R> {
	pub fn new(supervisor: Arc<Supervisor>, release: R) -> Self {
		Self {
			supervisor,
			release: ReleaseOnce::new(release),
			pid_path: None,
			exit: Arc::new(exit_process),
		}
	}

	/// PID record to remove on shutdown if it still names this process.
	pub fn with_pid_record(mut self, path: PathBuf) -> Self {
		self.pid_path = Some(path);
		self
	}

	/// Hands exit statuses to `exit` instead of terminating the process. The
	/// watcher's task then finishes with the stop report.
	pub fn with_exit<F>(mut self, exit: F) -> Self
	where
		F: Fn(i32) + Send + Sync + 'static,
	{
		self.exit = Arc::new(exit);
		self
	}

	/// Return the stop report from the watcher's task instead of exiting.
	pub fn without_exit(self) -> Self {
		self.with_exit(|_| {})
	}

	/// Stops all tasks, then releases resources, then drops the PID record.
	pub async fn shutdown(&self) -> StopReport {
		let report = self.supervisor.stop_all().await;
		let failed = report.failures().count();
		if failed > 0 {
			tracing::warn!("{} of {} task(s) did not stop cleanly", failed, report.outcomes.len());
		}

		if self.release.release() {
			tracing::info!("resources released");
		}

		if let Some(path) = &self.pid_path {
			pid::remove_if_owned(path, std::process::id());
		}
		report
	}

	/// Registers the signal handlers and spawns the watcher. Must be called
	/// from within a tokio runtime.
	pub fn arm(self) -> io::Result<JoinHandle<StopReport>> {
		let mut signals = TerminationSignals::register()?;

		Ok(tokio::spawn(async move {
			let name = signals.recv().await;
			tracing::warn!("received {}, shutting down", name);

			let force = Arc::clone(&self.exit);
			tokio::spawn(async move {
				let name = signals.recv().await;
				tracing::error!("received {} during shutdown, forcing exit", name);
				force(EXIT_FORCED);
			});

			let report = self.shutdown().await;
			(self.exit)(EXIT_SHUTDOWN);
			report
		}))
	}
}
