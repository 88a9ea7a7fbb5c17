//! On-disk PID record: the decimal process id as plain text.
//!
//! A record can be stale (naming a process that has since exited); every
//! reader has to cope with that.

use std::path::{Path, PathBuf};

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PidRecord {
	pub path: PathBuf,
	pub pid: u32,
}

impl PidRecord {
	/// Loads the record at `path`. Missing, unreadable, empty, non-numeric and
	/// out-of-range contents all yield `None`.
	pub fn load(path: &Path) -> Option<Self> {
		read(path).map(|pid| Self {
			path: path.to_path_buf(),
			pid,
		})
	}
}

pub fn save(path: &Path, pid: u32) -> Result<(), Error> {
	std::fs::write(path, pid.to_string()).map_err(|source| Error::PidWrite {
		path: path.to_path_buf(),
		source,
	})
}

pub fn read(path: &Path) -> Option<u32> {
	std::fs::read_to_string(path).ok().as_deref().and_then(parse)
}

/// Parses a process id the OS can address. `pid_t` is signed, and zero or a
/// negative value would name a process group instead of one process.
pub fn parse(text: &str) -> Option<u32> {
	text.trim()
		.parse::<i32>()
		.ok()
		.filter(|pid| *pid > 0)
		.map(|pid| pid as u32)
}

/// Best-effort removal; a failure is only logged.
pub fn remove(path: &Path) {
	match std::fs::remove_file(path) {
		Ok(()) => tracing::debug!("removed pid file {}", path.display()),
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
		Err(e) => tracing::warn!("remove pid file {}: {}", path.display(), e),
	}
}

/// Removes the record only if it still names `pid`.
pub fn remove_if_owned(path: &Path, pid: u32) -> bool {
	if read(path) == Some(pid) {
		remove(path);
		true
	} else {
		false
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicU32, Ordering};

	static COUNTER: AtomicU32 = AtomicU32::new(0);

	fn temp_file(name: &str) -> PathBuf {
		let n = COUNTER.fetch_add(1, Ordering::SeqCst);
		std::env::temp_dir().join(format!("muzan-pid-{}-{}-{}", std::process::id(), n, name))
	}

	#[test]
	fn save_then_read() {
		let path = temp_file("roundtrip");
		save(&path, 4242).unwrap();
		assert_eq!(std::fs::read_to_string(&path).unwrap(), "4242");
		assert_eq!(read(&path), Some(4242));
		remove(&path);
		assert!(!path.exists());
	}

	#[test]
	fn read_missing_is_none() {
		assert_eq!(read(&temp_file("missing")), None);
	}

	#[test]
	fn read_tolerates_whitespace() {
		let path = temp_file("ws");
		std::fs::write(&path, " 77\n").unwrap();
		assert_eq!(read(&path), Some(77));
		remove(&path);
	}

	#[test]
	fn read_rejects_garbage_zero_and_negative() {
		let path = temp_file("garbage");
		for content in ["", "abc", "0", "-5", "12ab"] {
			std::fs::write(&path, content).unwrap();
			assert_eq!(read(&path), None, "content {:?}", content);
		}
		remove(&path);
	}

	#[test]
	fn read_rejects_pids_beyond_pid_t() {
		let path = temp_file("range");
		for content in ["4294967295", "2147483648", "99999999999"] {
			std::fs::write(&path, content).unwrap();
			assert_eq!(read(&path), None, "content {:?}", content);
		}
		std::fs::write(&path, "2147483647").unwrap();
		assert_eq!(read(&path), Some(2_147_483_647));
		remove(&path);
	}

	#[test]
	fn save_into_missing_dir_fails() {
		let path = temp_file("nodir").join("x.pid");
		let err = save(&path, 1).unwrap_err();
		assert!(matches!(err, Error::PidWrite { .. }));
	}

	#[test]
	fn remove_missing_is_silent() {
		remove(&temp_file("never-created"));
	}

	#[test]
	fn remove_if_owned_checks_pid() {
		let path = temp_file("owned");
		save(&path, 10).unwrap();
		assert!(!remove_if_owned(&path, 11));
		assert!(path.exists());
		assert!(remove_if_owned(&path, 10));
		assert!(!path.exists());
	}

	#[test]
	fn load_builds_record() {
		let path = temp_file("load");
		save(&path, 99).unwrap();
		let record = PidRecord::load(&path).unwrap();
		assert_eq!(record, PidRecord { path: path.clone(), pid: 99 });
		remove(&path);
	}
}
