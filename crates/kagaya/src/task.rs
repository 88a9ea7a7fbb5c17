/// Error type task implementations return from `start` / `stop`.
pub type TaskError = Box<dyn std::error::Error + Send + Sync>;

/// A named, independently pluggable long-running unit.
///
/// `start` and `stop` are synchronous from the supervisor's point of view. A
/// task that needs background work should launch it from `start` and return.
/// The name is only used for reporting; it does not have to be unique.
pub trait Task: Send + Sync {
	fn name(&self) -> &str;
	fn start(&self) -> Result<(), TaskError>;
	fn stop(&self) -> Result<(), TaskError>;
}

type Hook = Box<dyn Fn() -> Result<(), TaskError> + Send + Sync>;

/// A `Task` assembled from two closures.
pub struct FnTask {
	name: String,
	start: Hook,
	stop: Hook,
}

impl FnTask {
	pub fn new<S, T>(name: impl Into<String>, start: S, stop: T) -> Self
	where
		S: Fn() -> Result<(), TaskError> + Send + Sync + 'static,
		T: Fn() -> Result<(), TaskError> + Send + Sync + 'static,
	{
		Self {
			name: name.into(),
			start: Box::new(start),
			stop: Box::new(stop),
		}
	}
}

impl Task for FnTask {
	fn name(&self) -> &str {
		&self.name
	}

	fn start(&self) -> Result<(), TaskError> {
		(self.start)()
	}

	fn stop(&self) -> Result<(), TaskError> {
		(self.stop)()
	}
}

impl std::fmt::Debug for FnTask {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FnTask").field("name", &self.name).finish()
	}
}
