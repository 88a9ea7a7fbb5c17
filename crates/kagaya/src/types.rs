use std::fmt;
use std::time::Duration;

use crate::task::TaskError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
	NotStarted,
	Running,
	Stopped,
	FailedToStart,
	/// `stop` returned an error or did not return within the stop timeout.
	StopFailed,
}

impl TaskStatus {
	pub fn is_running(&self) -> bool {
		matches!(self, TaskStatus::Running)
	}
}

impl fmt::Display for TaskStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			TaskStatus::NotStarted => "not started",
			TaskStatus::Running => "running",
			TaskStatus::Stopped => "stopped",
			TaskStatus::FailedToStart => "failed to start",
			TaskStatus::StopFailed => "stop failed",
		};
		f.write_str(s)
	}
}

/// Returned by `Supervisor::start_all` for the first task that failed.
#[derive(Debug)]
pub struct StartError {
	pub task: String,
	pub source: TaskError,
}

impl fmt::Display for StartError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "task {} failed to start: {}", self.task, self.source)
	}
}

impl std::error::Error for StartError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		Some(self.source.as_ref())
	}
}

#[derive(Debug)]
pub enum StopResult {
	Stopped,
	Failed(TaskError),
	TimedOut(Duration),
	/// The stop thread panicked or could not be spawned.
	Aborted(String),
}

impl StopResult {
	pub fn is_ok(&self) -> bool {
		matches!(self, StopResult::Stopped)
	}
}

#[derive(Debug)]
pub struct StopOutcome {
	pub task: String,
	pub result: StopResult,
}

/// Per-task results of `Supervisor::stop_all`, in insertion order.
#[derive(Debug, Default)]
pub struct StopReport {
	pub outcomes: Vec<StopOutcome>,
}

impl StopReport {
	pub fn all_stopped(&self) -> bool {
		self.outcomes.iter().all(|o| o.result.is_ok())
	}

	pub fn failures(&self) -> impl Iterator<Item = &StopOutcome> {
		self.outcomes.iter().filter(|o| !o.result.is_ok())
	}
}

/// Point-in-time view of one supervised task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSnapshot {
	pub name: String,
	pub status: TaskStatus,
}
