//! A service with two workers and a fake connection pool.
//!
//! ```text
//! cargo run --example heartbeat -- -debug     # foreground, logs to console
//! cargo run --example heartbeat -- -nc        # background, logs to logs/heartbeat.log
//! cargo run --example heartbeat -- -stop
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use kagaya::{Task, TaskError};
use muzan::{App, AppConfig};

struct Heartbeat {
	name: String,
	every: Duration,
	running: Arc<AtomicBool>,
}

impl Heartbeat {
	fn new(name: &str, every: Duration) -> Arc<dyn Task> {
		Arc::new(Self {
			name: name.to_string(),
			every,
			running: Arc::new(AtomicBool::new(false)),
		})
	}
}

impl Task for Heartbeat {
	fn name(&self) -> &str {
		&self.name
	}

	fn start(&self) -> Result<(), TaskError> {
		self.running.store(true, Ordering::SeqCst);
		let running = Arc::clone(&self.running);
		let (name, every) = (self.name.clone(), self.every);
		std::thread::Builder::new().name(name.clone()).spawn(move || {
			while running.load(Ordering::SeqCst) {
				tracing::info!("{}: beat", name);
				std::thread::sleep(every);
			}
		})?;
		Ok(())
	}

	fn stop(&self) -> Result<(), TaskError> {
		self.running.store(false, Ordering::SeqCst);
		Ok(())
	}
}

struct Pool;

impl Pool {
	fn close_all(&self) {
		tracing::info!("pool: closed all connections");
	}
}

#[tokio::main]
async fn main() {
	let app = App::new(
		AppConfig::new("heartbeat", env!("CARGO_PKG_VERSION"))
			.with_port(7878)
			.with_stop_timeout(Duration::from_secs(2)),
	);
	app.init();

	app.add([
		Heartbeat::new("fast", Duration::from_secs(1)),
		Heartbeat::new("slow", Duration::from_secs(5)),
	])
	.await;

	let pool = Arc::new(Pool);
	if let Err(e) = app.watch(move || pool.close_all()) {
		tracing::error!("cannot watch signals: {}", e);
		std::process::exit(1);
	}

	if let Err(e) = app.start_all().await {
		tracing::error!("{}", e);
		app.stop_all().await;
		std::process::exit(1);
	}

	let listener = match tokio::net::TcpListener::bind(("127.0.0.1", 7878)).await {
		Ok(l) => l,
		Err(e) => {
			tracing::error!("failed to bind 127.0.0.1:7878: {}", e);
			app.stop_all().await;
			std::process::exit(1);
		}
	};
	tracing::info!("listening on {}", listener.local_addr().map(|a| a.to_string()).unwrap_or_default());

	loop {
		if let Ok((stream, peer)) = listener.accept().await {
			tracing::debug!("connection from {}", peer);
			drop(stream);
		}
	}
}
