use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, RwLock};

use crate::task::Task;
use crate::types::*;

pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct SupervisorConfig {
	/// Upper bound on a single task's `stop`. Past it the task is reported as
	/// timed out and shutdown moves on to the next task.
	pub stop_timeout: Duration,
}

impl Default for SupervisorConfig {
	fn default() -> Self {
		Self {
			stop_timeout: DEFAULT_STOP_TIMEOUT,
		}
	}
}

/// Ordered, append-only collection of tasks with fail-fast start and
/// best-effort stop.
///
/// `start_all` and `stop_all` walk a snapshot of the collection, so tasks
/// added while a traversal is in flight are picked up by the next one.
pub struct Supervisor {
	pub tasks: RwLock<Vec<ManagedTask>>,
	pub config: SupervisorConfig,
}

pub struct ManagedTask {
	pub task: Arc<dyn Task>,
	pub status: TaskStatus,
}

impl Supervisor {
	pub fn new(config: SupervisorConfig) -> Arc<Self> {
		Arc::new(Self {
			tasks: RwLock::new(Vec::new()),
			config,
		})
	}

	pub async fn add<I>(&self, tasks: I)
	where
		I: IntoIterator<Item = Arc<dyn Task>>,
	{
		let mut managed = self.tasks.write().await;
		for task in tasks {
			tracing::debug!("registered task {}", task.name());
			managed.push(ManagedTask {
				task,
				status: TaskStatus::NotStarted,
			});
		}
	}

	pub async fn len(&self) -> usize {
		self.tasks.read().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.tasks.read().await.is_empty()
	}

	pub async fn status(&self) -> Vec<TaskSnapshot> {
		self.tasks
			.read()
			.await
			.iter()
			.map(|m| TaskSnapshot {
				name: m.task.name().to_string(),
				status: m.status,
			})
			.collect()
	}

	/// Starts tasks in insertion order and stops at the first failure.
	///
	/// Tasks after the failing one are never started. Tasks before it are left
	/// running; callers that want them down call `stop_all`. Tasks that are
	/// already running are skipped, so calling this again after `add` only
	/// starts the newcomers.
	pub async fn start_all(&self) -> Result<(), StartError> {
		for (idx, task, status) in self.snapshot().await {
			let name = task.name().to_string();
			if status.is_running() {
				tracing::debug!("task {} already running", name);
				continue;
			}

			tracing::info!("starting task {}", name);
			let result = match tokio::task::spawn_blocking(move || task.start()).await {
				Ok(r) => r,
				Err(e) => Err(format!("start panicked: {}", e).into()),
			};

			match result {
				Ok(()) => self.set_status(idx, TaskStatus::Running).await,
				Err(source) => {
					tracing::error!("task {} failed to start: {}", name, source);
					self.set_status(idx, TaskStatus::FailedToStart).await;
					return Err(StartError { task: name, source });
				}
			}
		}
		Ok(())
	}

	/// Calls `stop` on every task in insertion order, whatever its status and
	/// whatever happened to the previous ones. Each outcome is logged and
	/// returned individually.
	pub async fn stop_all(&self) -> StopReport {
		let mut report = StopReport::default();

		for (idx, task, _) in self.snapshot().await {
			let name = task.name().to_string();
			tracing::info!("stopping task {}", name);

			let result = stop_bounded(task, self.config.stop_timeout).await;
			match &result {
				StopResult::Stopped => tracing::info!("task {} stopped", name),
				StopResult::Failed(e) => tracing::warn!("task {} failed to stop: {}", name, e),
				StopResult::TimedOut(after) => {
					tracing::warn!("task {} did not stop within {:?}, moving on", name, after)
				}
				StopResult::Aborted(msg) => tracing::warn!("task {} stop aborted: {}", name, msg),
			}

			let status = if result.is_ok() {
				TaskStatus::Stopped
			} else {
				TaskStatus::StopFailed
			};
			self.set_status(idx, status).await;
			report.outcomes.push(StopOutcome { task: name, result });
		}

		report
	}

	async fn snapshot(&self) -> Vec<(usize, Arc<dyn Task>, TaskStatus)> {
		self.tasks
			.read()
			.await
			.iter()
			.enumerate()
			.map(|(idx, m)| (idx, Arc::clone(&m.task), m.status))
			.collect()
	}

	async fn set_status(&self, idx: usize, status: TaskStatus) {
		let mut tasks = self.tasks.write().await;
		if let Some(managed) = tasks.get_mut(idx) {
			managed.status = status;
		}
	}
}

/// Runs `stop` on a dedicated thread so a hung task cannot hold up the caller
/// past `timeout`. The thread is left behind if it never returns.
async fn stop_bounded(task: Arc<dyn Task>, timeout: Duration) -> StopResult {
	let (tx, rx) = oneshot::channel();
	let thread_name = format!("stop-{}", task.name());

	let spawned = std::thread::Builder::new().name(thread_name).spawn(move || {
		let _ = tx.send(task.stop());
	});
	if let Err(e) = spawned {
		return StopResult::Aborted(format!("failed to spawn stop thread: {}", e));
	}

	match tokio::time::timeout(timeout, rx).await {
		Ok(Ok(Ok(()))) => StopResult::Stopped,
		Ok(Ok(Err(e))) => StopResult::Failed(e),
		Ok(Err(_)) => StopResult::Aborted("stop panicked".to_string()),
		Err(_) => StopResult::TimedOut(timeout),
	}
}
