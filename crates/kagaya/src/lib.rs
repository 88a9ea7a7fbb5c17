//! # kagaya
//!
//! Task supervisor for Rust daemons.
//!
//! Holds an ordered set of named [`Task`]s and drives them through a
//! coordinated lifecycle: `start_all` is fail-fast, `stop_all` is best-effort
//! over every task with a bounded wait per task. Pairs with
//! [`muzan`](https://crates.io/crates/muzan) for daemon lifecycle.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use kagaya::{FnTask, Supervisor, SupervisorConfig, Task};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let sup = Supervisor::new(SupervisorConfig::default());
//!
//! let worker: Arc<dyn Task> = Arc::new(FnTask::new("worker", || Ok(()), || Ok(())));
//! sup.add([worker]).await;
//!
//! sup.start_all().await.unwrap();
//! let report = sup.stop_all().await;
//! assert!(report.all_stopped());
//! # }
//! ```

pub mod task;
pub mod types;
pub mod supervisor;

pub use task::{FnTask, Task, TaskError};
pub use types::*;
pub use supervisor::{Supervisor, SupervisorConfig, ManagedTask, DEFAULT_STOP_TIMEOUT};
