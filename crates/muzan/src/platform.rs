use std::fs::OpenOptions;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Command, Stdio};

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

use crate::error::{Error, LocateError};

/// Set on the background copy so it knows not to spawn again.
pub const DETACHED_ENV: &str = "MUZAN_DETACHED";

/// Pid of init, the reaper orphaned processes are re-parented to.
pub const INIT_PID: u32 = 1;

/// The OS operations the daemon controller needs.
pub trait Platform {
	fn pid(&self) -> u32;
	fn parent_pid(&self) -> u32;
	/// Whether this process was started by `spawn_detached`.
	fn has_detached_marker(&self) -> bool;
	fn is_alive(&self, pid: u32) -> bool;
	/// Forceful, uncatchable termination.
	fn kill(&self, pid: u32) -> Result<(), Error>;
	/// Starts `exe` with `args` in the background and returns its pid.
	fn spawn_detached(&self, exe: &Path, args: &[String], log: &Path) -> Result<u32, Error>;
	/// Leaves the controlling terminal's session.
	fn detach(&self);
	fn locate(&self, app_name: &str, port: u16) -> Result<u32, LocateError>;

	/// Already in the background: either marked by the parent or re-parented
	/// to init.
	fn is_detached(&self) -> bool {
		self.has_detached_marker() || self.parent_pid() == INIT_PID
	}
}

/// A single process `kill(2)` can address. Zero and anything beyond `i32::MAX`
/// would be read as a process group or as every process.
fn single_process(pid: u32) -> Option<Pid> {
	i32::try_from(pid).ok().filter(|p| *p > 0).map(Pid::from_raw)
}

/// The real OS.
#[derive(Debug, Clone, Copy, Default)]
pub struct Native;

impl Platform for Native {
	fn pid(&self) -> u32 {
		std::process::id()
	}

	fn parent_pid(&self) -> u32 {
		nix::unistd::getppid().as_raw() as u32
	}

	fn has_detached_marker(&self) -> bool {
		std::env::var(DETACHED_ENV).is_ok_and(|v| v == "1")
	}

	fn is_alive(&self, pid: u32) -> bool {
		let Some(target) = single_process(pid) else {
			return false;
		};
		match kill(target, None) {
			Ok(()) => true,
			// exists, owned by someone else
			Err(Errno::EPERM) => true,
			Err(_) => false,
		}
	}

	fn kill(&self, pid: u32) -> Result<(), Error> {
		let target = single_process(pid).ok_or(Error::Signal {
			pid,
			source: Errno::ESRCH,
		})?;
		kill(target, Signal::SIGKILL).map_err(|source| Error::Signal { pid, source })
	}

	fn spawn_detached(&self, exe: &Path, args: &[String], log: &Path) -> Result<u32, Error> {
		if let Some(dir) = log.parent() {
			std::fs::create_dir_all(dir).map_err(Error::Spawn)?;
		}
		let out = OpenOptions::new()
			.create(true)
			.append(true)
			.open(log)
			.map_err(Error::Spawn)?;
		let err = out.try_clone().map_err(Error::Spawn)?;

		let mut cmd = Command::new(exe);
		cmd.args(args)
			.env(DETACHED_ENV, "1")
			.stdin(Stdio::null())
			.stdout(Stdio::from(out))
			.stderr(Stdio::from(err));
		// New session before exec, so a hangup on our terminal never reaches it.
		// SAFETY: setsid is async-signal-safe and touches no parent state.
		unsafe {
			cmd.pre_exec(|| {
				nix::unistd::setsid()?;
				Ok(())
			});
		}
		let child = cmd.spawn().map_err(Error::Spawn)?;

		Ok(child.id())
	}

	fn detach(&self) {
		if let Err(e) = nix::unistd::setsid() {
			tracing::debug!("setsid: {}", e);
		}
	}

	fn locate(&self, app_name: &str, port: u16) -> Result<u32, LocateError> {
		crate::locate::find_by_port(app_name, port)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn own_process_is_alive() {
		assert!(Native.is_alive(std::process::id()));
	}

	#[test]
	fn unused_pid_is_not_alive() {
		assert!(!Native.is_alive(0));
		assert!(!Native.is_alive(999_999_999));
	}

	#[test]
	fn pids_beyond_pid_t_are_never_signalled() {
		for pid in [u32::MAX, 2_147_483_648] {
			assert!(!Native.is_alive(pid));
			let err = Native.kill(pid).unwrap_err();
			assert!(
				matches!(err, Error::Signal { source: Errno::ESRCH, .. }),
				"pid {}: {}",
				pid,
				err
			);
		}
		assert!(Native.kill(0).is_err());
	}

	#[test]
	fn spawned_copy_leads_its_own_session() {
		let dir = std::env::temp_dir().join(format!("muzan-platform-{}", std::process::id()));
		let log = dir.join("spawn.log");
		let pid = Native
			.spawn_detached(Path::new("sleep"), &["5".to_string()], &log)
			.unwrap();

		let sid = nix::unistd::getsid(Some(Pid::from_raw(pid as i32))).unwrap();
		assert_eq!(sid.as_raw() as u32, pid);
		assert_ne!(sid, nix::unistd::getsid(None).unwrap());

		Native.kill(pid).unwrap();
		let _ = std::fs::remove_dir_all(&dir);
	}

	#[test]
	fn kill_unknown_pid_fails() {
		let err = Native.kill(999_999_999).unwrap_err();
		assert!(matches!(err, Error::Signal { pid: 999_999_999, .. }));
	}

	#[test]
	fn exited_child_is_not_alive() {
		let mut child = Command::new("true").spawn().unwrap();
		let pid = child.id();
		child.wait().unwrap();
		assert!(!Native.is_alive(pid));
	}

	#[test]
	fn parent_pid_matches_std() {
		assert_eq!(Native.parent_pid(), std::os::unix::process::parent_id());
	}
}
