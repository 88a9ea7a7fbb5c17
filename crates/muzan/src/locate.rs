//! Finds a running instance by the listening socket it owns.
//!
//! Used when the PID record is missing or stale. The native socket table is
//! tried first; `netstat -tnlp` text is the fallback.

use std::process::Command;

use crate::error::LocateError;

/// Linux truncates process names (`comm`) to this many bytes.
const COMM_LEN: usize = 15;

/// Pid of the process named `app_name` listening on TCP `port`.
pub fn find_by_port(app_name: &str, port: u16) -> Result<u32, LocateError> {
	match native::find(app_name, port) {
		Ok(pid) => return Ok(pid),
		Err(LocateError::NotFound) => return Err(LocateError::NotFound),
		Err(e) => tracing::debug!("native socket table unavailable ({}), trying netstat", e),
	}
	find_with_netstat(app_name, port)
}

fn find_with_netstat(app_name: &str, port: u16) -> Result<u32, LocateError> {
	let output = Command::new("netstat")
		.arg("-tnlp")
		.output()
		.map_err(|e| match e.kind() {
			std::io::ErrorKind::NotFound => LocateError::Unsupported,
			_ => LocateError::Io(e.to_string()),
		})?;

	let table = String::from_utf8_lossy(&output.stdout);
	find_in_table(&table, app_name, Some(port)).ok_or(LocateError::NotFound)
}

/// Scans `netstat`-style rows. With `port` set, only rows whose local address
/// ends in `:<port>` are considered.
pub fn find_in_table(table: &str, app_name: &str, port: Option<u16>) -> Option<u32> {
	let suffix = port.map(|p| format!(":{}", p));
	table
		.lines()
		.filter(|line| match &suffix {
			Some(s) => line
				.split_whitespace()
				.nth(3)
				.is_some_and(|local| local.ends_with(s.as_str())),
			None => true,
		})
		.find_map(|line| match_row(line, app_name))
}

/// Reads the trailing `<pid>/<name>` field of one row and returns the pid if
/// the name matches.
///
/// `tcp 0 0 127.0.0.1:5432 0.0.0.0:* LISTEN 19436/postgres` yields `19436`
/// for `postgres`.
pub fn match_row(line: &str, app_name: &str) -> Option<u32> {
	let owner = line.split_whitespace().last()?;
	let (pid, name) = owner.split_once('/')?;
	if !names_match(name.trim(), app_name) {
		return None;
	}
	crate::pid::parse(pid)
}

pub fn names_match(found: &str, app_name: &str) -> bool {
	!found.is_empty() && found == app_name
}

/// Like `names_match`, but also accepts a `comm` the kernel cut to
/// `COMM_LEN` bytes when that is a prefix of `app_name`.
pub fn comm_matches(comm: &str, app_name: &str) -> bool {
	if names_match(comm, app_name) {
		return true;
	}
	let truncated = comm.len() == COMM_LEN && app_name.starts_with(comm);
	if truncated {
		tracing::debug!("matched truncated process name {:?} to {:?}", comm, app_name);
	}
	truncated
}

#[cfg(any(target_os = "linux", target_os = "macos"))]
mod native {
	use netstat2::*;

	use crate::error::LocateError;

	pub fn find(app_name: &str, port: u16) -> Result<u32, LocateError> {
		let af = AddressFamilyFlags::IPV4 | AddressFamilyFlags::IPV6;
		let proto = ProtocolFlags::TCP;
		let sockets = get_sockets_info(af, proto).map_err(|e| LocateError::Io(e.to_string()))?;

		for si in &sockets {
			let ProtocolSocketInfo::Tcp(ref tcp) = si.protocol_socket_info else {
				continue;
			};
			if tcp.state != TcpState::Listen || tcp.local_port != port {
				continue;
			}
			for pid in &si.associated_pids {
				if process_matches(*pid, app_name) {
					return Ok(*pid);
				}
			}
		}
		Err(LocateError::NotFound)
	}

	#[cfg(target_os = "linux")]
	fn process_matches(pid: u32, app_name: &str) -> bool {
		std::fs::read_to_string(format!("/proc/{}/comm", pid))
			.is_ok_and(|comm| super::comm_matches(comm.trim(), app_name))
	}

	#[cfg(target_os = "macos")]
	fn process_matches(pid: u32, app_name: &str) -> bool {
		libproc::proc_pid::name(pid as i32).is_ok_and(|name| super::names_match(&name, app_name))
	}
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
mod native {
	use crate::error::LocateError;

	pub fn find(_app_name: &str, _port: u16) -> Result<u32, LocateError> {
		Err(LocateError::Unsupported)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const TABLE: &str = "\
Active Internet connections (only servers)
Proto Recv-Q Send-Q Local Address           Foreign Address         State       PID/Program name
tcp        0      0 127.0.0.1:5432          0.0.0.0:*               LISTEN      19436/postgres
tcp        0      0 0.0.0.0:80              0.0.0.0:*               LISTEN      812/nginx
tcp6       0      0 :::8080                 :::*                    LISTEN      2201/billing-api
tcp        0      0 0.0.0.0:22              0.0.0.0:*               LISTEN      -
";

	#[test]
	fn row_matches_owner_name() {
		let row = "tcp 0 0 127.0.0.1:5432 0.0.0.0:* LISTEN 19436/postgres";
		assert_eq!(match_row(row, "postgres"), Some(19436));
		assert_eq!(match_row(row, "nginx"), None);
	}

	#[test]
	fn row_without_owner_is_skipped() {
		assert_eq!(match_row("tcp 0 0 0.0.0.0:22 0.0.0.0:* LISTEN -", "sshd"), None);
		assert_eq!(match_row("", "sshd"), None);
		assert_eq!(match_row("tcp 0 0 0.0.0.0:22 0.0.0.0:* LISTEN x/sshd", "sshd"), None);
	}

	#[test]
	fn table_scan_by_name() {
		assert_eq!(find_in_table(TABLE, "nginx", None), Some(812));
		assert_eq!(find_in_table(TABLE, "billing-api", None), Some(2201));
		assert_eq!(find_in_table(TABLE, "redis", None), None);
	}

	#[test]
	fn table_scan_filters_by_port() {
		assert_eq!(find_in_table(TABLE, "postgres", Some(5432)), Some(19436));
		assert_eq!(find_in_table(TABLE, "postgres", Some(543)), None);
		assert_eq!(find_in_table(TABLE, "billing-api", Some(8080)), Some(2201));
	}

	#[test]
	fn row_names_must_match_exactly() {
		assert!(names_match("api", "api"));
		assert!(!names_match("", "anything"));
		assert!(!names_match("payment-gateway", "payment-gateway-service"));

		let row = "tcp 0 0 0.0.0.0:9000 0.0.0.0:* LISTEN 88/payment-gateway";
		assert_eq!(match_row(row, "payment-gateway-service"), None);
	}

	#[test]
	fn truncated_comm_matches_by_prefix() {
		assert!(comm_matches("payment-gateway", "payment-gateway-service"));
		assert!(comm_matches("api", "api"));
		assert!(!comm_matches("payment", "payment-gateway-service"));
		assert!(!comm_matches("", "anything"));
	}

	#[test]
	fn row_with_out_of_range_pid_is_skipped() {
		let row = "tcp 0 0 127.0.0.1:5432 0.0.0.0:* LISTEN 4294967295/postgres";
		assert_eq!(match_row(row, "postgres"), None);
		let row = "tcp 0 0 127.0.0.1:5432 0.0.0.0:* LISTEN 2147483648/postgres";
		assert_eq!(match_row(row, "postgres"), None);
	}

	#[test]
	fn nothing_listens_for_unknown_app() {
		let result = find_by_port("muzan-no-such-app-xyz", 1);
		assert!(result.is_err());
	}
}
