//! # muzan
//!
//! Daemon lifecycle toolkit for Rust services.
//!
//! Turns a foreground program into a manageable background service driven by
//! single-dash launch flags:
//!
//! | flag       | effect                                               |
//! |------------|------------------------------------------------------|
//! | `-nc`      | re-launch detached, write `run/<app>.pid`            |
//! | `-debug`   | stay in the foreground, log to the console           |
//! | `-stop`    | kill the instance named by the PID record or port    |
//! | `-restart` | `-stop` then `-nc`                                   |
//! | `-version` | print the version                                    |
//! | `-help`    | print usage (also the default with no flags)         |
//!
//! Long-running work is plugged in as [`kagaya::Task`]s and shut down in
//! order when a termination signal arrives.

pub mod app;
pub mod args;
pub mod config;
pub mod daemon;
pub mod error;
pub mod locate;
pub mod logging;
pub mod paths;
pub mod pid;
pub mod platform;
pub mod watcher;

pub use app::App;
pub use args::LaunchMode;
pub use config::{AppConfig, ConfigOverrides};
pub use daemon::{DaemonController, Dispatch, KillOutcome};
pub use error::{Error, LocateError};
pub use paths::RunPaths;
pub use pid::PidRecord;
pub use platform::{Native, Platform};
pub use watcher::{Release, ReleaseOnce, SignalWatcher};
