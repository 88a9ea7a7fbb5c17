//! Launch flag interpretation.
//!
//! Flags are single-dash words (`-nc`, `-stop`, ...). Unknown tokens are
//! ignored so an application can take its own arguments alongside these.

use owo_colors::OwoColorize;

pub const HELP: &str = "-help";
pub const VERSION: &str = "-version";
pub const DEBUG: &str = "-debug";
pub const DETACH: &str = "-nc";
pub const STOP: &str = "-stop";
pub const RESTART: &str = "-restart";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
	Help,
	PrintVersion,
	/// Foreground, logging to the console.
	RunDebug,
	/// Re-launch detached from the terminal, or continue as the detached copy.
	Daemonize,
	Stop,
	/// `Stop` followed by `Daemonize`.
	Restart,
}

impl LaunchMode {
	/// Whether the mode ends the process right after dispatch.
	pub fn is_terminal(&self) -> bool {
		matches!(self, LaunchMode::Help | LaunchMode::PrintVersion | LaunchMode::Stop)
	}
}

/// Interprets launch arguments, program name excluded.
///
/// `-help` and `-version` win as soon as they are seen. Otherwise `-debug`
/// without `-nc` runs in the foreground, then `-stop`, `-nc` and `-restart`
/// are considered in that order. Nothing recognised means `Help`.
pub fn parse<I, S>(args: I) -> LaunchMode
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	let (mut debug, mut detach, mut stop, mut restart) = (false, false, false, false);

	for arg in args {
		match arg.as_ref() {
			HELP => return LaunchMode::Help,
			VERSION => return LaunchMode::PrintVersion,
			DEBUG => debug = true,
			DETACH => detach = true,
			STOP => stop = true,
			RESTART => restart = true,
			_ => {}
		}
	}

	if !debug && !detach && !stop && !restart {
		LaunchMode::Help
	} else if debug && !detach {
		LaunchMode::RunDebug
	} else if stop {
		LaunchMode::Stop
	} else if detach {
		LaunchMode::Daemonize
	} else {
		LaunchMode::Restart
	}
}

/// Arguments for the background copy: `-restart` becomes `-nc` and `-stop`
/// is dropped, everything else passes through in order.
pub fn detached_args(args: &[String]) -> Vec<String> {
	let mut out: Vec<String> = Vec::with_capacity(args.len() + 1);
	for arg in args {
		match arg.as_str() {
			STOP => {}
			RESTART => {
				if !out.iter().any(|a| a == DETACH) {
					out.push(DETACH.to_string());
				}
			}
			DETACH if out.iter().any(|a| a == DETACH) => {}
			_ => out.push(arg.clone()),
		}
	}
	if !out.iter().any(|a| a == DETACH) {
		out.push(DETACH.to_string());
	}
	out
}

pub fn usage(program: &str) -> String {
	let rows = [
		(HELP, "show this message"),
		(VERSION, "print server version and exit"),
		(DEBUG, "run in the foreground and print log to console"),
		(DETACH, "run in the background and write log to file"),
		(STOP, "stop the server"),
		(RESTART, "restart the server"),
	];

	let mut out = format!("{} {} [OPTIONS]\n\n", "usage:".bold(), program);
	out.push_str(&format!("{}\n", "options".cyan().bold()));
	for (flag, text) in rows {
		out.push_str(&format!("  {:<10} {}\n", flag.bold(), text));
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;

	fn mode(args: &[&str]) -> LaunchMode {
		parse(args.iter())
	}

	#[test]
	fn no_arguments_is_help() {
		assert_eq!(mode(&[]), LaunchMode::Help);
	}

	#[test]
	fn only_unknown_arguments_is_help() {
		assert_eq!(mode(&["--port", "8080", "serve"]), LaunchMode::Help);
	}

	#[test]
	fn help_and_version_short_circuit() {
		assert_eq!(mode(&["-nc", "-help"]), LaunchMode::Help);
		assert_eq!(mode(&["-stop", "-version"]), LaunchMode::PrintVersion);
		assert_eq!(mode(&["-version", "-help"]), LaunchMode::PrintVersion);
		assert_eq!(mode(&["-help", "-version"]), LaunchMode::Help);
	}

	#[test]
	fn single_flags() {
		assert_eq!(mode(&["-debug"]), LaunchMode::RunDebug);
		assert_eq!(mode(&["-nc"]), LaunchMode::Daemonize);
		assert_eq!(mode(&["-stop"]), LaunchMode::Stop);
		assert_eq!(mode(&["-restart"]), LaunchMode::Restart);
	}

	#[test]
	fn debug_without_detach_wins_over_stop_and_restart() {
		assert_eq!(mode(&["-debug", "-stop"]), LaunchMode::RunDebug);
		assert_eq!(mode(&["-restart", "-debug"]), LaunchMode::RunDebug);
	}

	#[test]
	fn debug_with_detach_daemonizes() {
		assert_eq!(mode(&["-debug", "-nc"]), LaunchMode::Daemonize);
	}

	#[test]
	fn stop_beats_detach_and_restart() {
		assert_eq!(mode(&["-nc", "-stop"]), LaunchMode::Stop);
		assert_eq!(mode(&["-restart", "-stop"]), LaunchMode::Stop);
	}

	#[test]
	fn detach_beats_restart() {
		assert_eq!(mode(&["-restart", "-nc"]), LaunchMode::Daemonize);
	}

	#[test]
	fn unknown_tokens_are_ignored() {
		assert_eq!(mode(&["--verbose", "-nc", "extra"]), LaunchMode::Daemonize);
	}

	#[test]
	fn terminal_modes() {
		assert!(LaunchMode::Help.is_terminal());
		assert!(LaunchMode::PrintVersion.is_terminal());
		assert!(LaunchMode::Stop.is_terminal());
		assert!(!LaunchMode::Daemonize.is_terminal());
		assert!(!LaunchMode::Restart.is_terminal());
		assert!(!LaunchMode::RunDebug.is_terminal());
	}

	#[test]
	fn detached_args_rewrites_restart() {
		let args: Vec<String> = vec!["-restart".into(), "--port=9".into()];
		assert_eq!(detached_args(&args), vec!["-nc", "--port=9"]);
	}

	#[test]
	fn detached_args_keeps_single_detach_flag() {
		let args: Vec<String> = vec!["-nc".into(), "-debug".into(), "-nc".into()];
		assert_eq!(detached_args(&args), vec!["-nc", "-debug"]);
	}

	#[test]
	fn detached_args_always_detaches() {
		let args: Vec<String> = vec!["-stop".into()];
		assert_eq!(detached_args(&args), vec!["-nc"]);
	}

	#[test]
	fn usage_lists_every_flag() {
		let text = usage("svc");
		for flag in [HELP, VERSION, DEBUG, DETACH, STOP, RESTART] {
			assert!(text.contains(flag), "missing {}", flag);
		}
	}
}
