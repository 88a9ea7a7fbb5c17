use std::io;
use std::path::PathBuf;

/// Errors from daemon lifecycle operations.
#[derive(Debug)]
pub enum Error {
	/// The run directory could not be created.
	RunDir { path: PathBuf, source: io::Error },
	/// Spawning the background copy of this executable failed.
	Spawn(io::Error),
	/// Writing the PID record failed.
	PidWrite { path: PathBuf, source: io::Error },
	/// Sending a signal to a process failed.
	Signal { pid: u32, source: nix::errno::Errno },
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Error::RunDir { path, source } => {
				write!(f, "mkdir {}: {}", path.display(), source)
			}
			Error::Spawn(e) => write!(f, "spawn failed: {}", e),
			Error::PidWrite { path, source } => {
				write!(f, "write pid file {}: {}", path.display(), source)
			}
			Error::Signal { pid, source } => write!(f, "signal pid {}: {}", pid, source),
		}
	}
}

impl std::error::Error for Error {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Error::RunDir { source, .. } => Some(source),
			Error::Spawn(e) => Some(e),
			Error::PidWrite { source, .. } => Some(source),
			Error::Signal { source, .. } => Some(source),
		}
	}
}

/// Errors from locating a running instance by its listening socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocateError {
	/// No listening socket on the port is owned by a process with that name.
	NotFound,
	/// Neither the native socket table nor `netstat` is available.
	Unsupported,
	Io(String),
}

impl std::fmt::Display for LocateError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			LocateError::NotFound => write!(f, "pid not found"),
			LocateError::Unsupported => write!(f, "socket table not available on this platform"),
			LocateError::Io(e) => write!(f, "socket table: {}", e),
		}
	}
}

impl std::error::Error for LocateError {}
