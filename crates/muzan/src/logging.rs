use std::io::IsTerminal;
use std::net::UdpSocket;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::Level;

use crate::args::LaunchMode;
use crate::config::AppConfig;

pub fn level_for(mode: LaunchMode) -> Level {
	match mode {
		LaunchMode::RunDebug => Level::DEBUG,
		_ => Level::INFO,
	}
}

/// Installs the global `fmt` subscriber on stderr. In the background copy
/// stderr is the log file the parent opened, so colours are off there.
/// Calling it again is a no-op.
pub fn init(mode: LaunchMode) {
	let ansi = std::io::stderr().is_terminal();
	let _ = tracing_subscriber::fmt()
		.with_max_level(level_for(mode))
		.with_ansi(ansi)
		.with_writer(std::io::stderr)
		.try_init();
}

/// Address of the interface used for outbound traffic. Connecting a UDP
/// socket only picks a route; nothing is sent.
pub fn local_addr() -> Option<String> {
	let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
	socket.connect("8.8.8.8:80").ok()?;
	socket.local_addr().ok().map(|a| a.ip().to_string())
}

pub fn banner(config: &AppConfig) {
	let started = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_secs())
		.unwrap_or(0);
	let addr = local_addr().unwrap_or_else(|| "unknown".to_string());

	tracing::info!("------------------------------------------");
	tracing::info!("app_name: {}", config.name);
	tracing::info!("app_version: {}", config.version);
	tracing::info!("env: {}", config.env);
	tracing::info!("local_address: {}", addr);
	tracing::info!("pid: {}", std::process::id());
	tracing::info!("started_at: {}", started);
	tracing::info!("------------------------------------------");
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn debug_mode_logs_more() {
		assert_eq!(level_for(LaunchMode::RunDebug), Level::DEBUG);
		assert_eq!(level_for(LaunchMode::Daemonize), Level::INFO);
		assert_eq!(level_for(LaunchMode::Restart), Level::INFO);
	}

	#[test]
	fn init_twice_is_harmless() {
		init(LaunchMode::RunDebug);
		init(LaunchMode::Daemonize);
		banner(&AppConfig::new("svc", "0.0.1"));
	}
}
