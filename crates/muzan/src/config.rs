use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

fn default_env() -> String {
	"dev".to_string()
}

fn default_stop_timeout() -> Duration {
	kagaya::DEFAULT_STOP_TIMEOUT
}

/// Identity and tunables of the managed application.
#[derive(Debug, Clone)]
pub struct AppConfig {
	pub name: String,
	pub version: String,
	pub env: String,
	/// Port the app listens on; lets `-stop` find it without a PID record.
	pub port: Option<u16>,
	pub stop_timeout: Duration,
}

impl AppConfig {
	pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			version: version.into(),
			env: default_env(),
			port: None,
			stop_timeout: default_stop_timeout(),
		}
	}

	pub fn with_env(mut self, env: impl Into<String>) -> Self {
		self.env = env.into();
		self
	}

	pub fn with_port(mut self, port: u16) -> Self {
		self.port = Some(port);
		self
	}

	pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
		self.stop_timeout = timeout;
		self
	}

	pub fn apply(mut self, overrides: ConfigOverrides) -> Self {
		if let Some(env) = overrides.env {
			self.env = env;
		}
		if let Some(port) = overrides.port {
			self.port = Some(port);
		}
		if let Some(secs) = overrides.stop_timeout_secs {
			self.stop_timeout = Duration::from_secs(secs);
		}
		self
	}

	/// `name version [env]`, used in console messages.
	pub fn label(&self) -> String {
		format!("{} {} [{}]", self.name, self.version, self.env)
	}
}

// ── <app>.toml beside the executable ─────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConfigOverrides {
	pub env: Option<String>,
	pub port: Option<u16>,
	pub stop_timeout_secs: Option<u64>,
}

pub fn parse_overrides(content: &str) -> Result<ConfigOverrides, toml::de::Error> {
	toml::from_str(content)
}

/// Reads overrides from `path`. A missing file means no overrides; a broken
/// one is reported and ignored.
pub fn load_overrides(path: &Path) -> ConfigOverrides {
	if path.exists() {
		match std::fs::read_to_string(path) {
			Ok(content) => match parse_overrides(&content) {
				Ok(overrides) => return overrides,
				Err(e) => eprintln!("warning: failed to parse {}: {}", path.display(), e),
			},
			Err(e) => eprintln!("warning: failed to read {}: {}", path.display(), e),
		}
	}
	ConfigOverrides::default()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults() {
		let config = AppConfig::new("svc", "1.0.0");
		assert_eq!(config.env, "dev");
		assert_eq!(config.port, None);
		assert_eq!(config.stop_timeout, Duration::from_secs(10));
		assert_eq!(config.label(), "svc 1.0.0 [dev]");
	}

	#[test]
	fn builder_sets_fields() {
		let config = AppConfig::new("svc", "1.0.0")
			.with_env("prod")
			.with_port(8080)
			.with_stop_timeout(Duration::from_secs(3));
		assert_eq!(config.env, "prod");
		assert_eq!(config.port, Some(8080));
		assert_eq!(config.stop_timeout, Duration::from_secs(3));
	}

	#[test]
	fn parse_partial_overrides() {
		let o = parse_overrides("port = 9000\n").unwrap();
		assert_eq!(o, ConfigOverrides { env: None, port: Some(9000), stop_timeout_secs: None });
	}

	#[test]
	fn parse_rejects_bad_types() {
		assert!(parse_overrides("port = \"eighty\"").is_err());
	}

	#[test]
	fn apply_only_touches_set_fields() {
		let config = AppConfig::new("svc", "1")
			.with_port(1)
			.apply(ConfigOverrides {
				env: Some("staging".into()),
				port: None,
				stop_timeout_secs: Some(30),
			});
		assert_eq!(config.env, "staging");
		assert_eq!(config.port, Some(1));
		assert_eq!(config.stop_timeout, Duration::from_secs(30));
	}

	#[test]
	fn load_missing_file_is_default() {
		let path = std::env::temp_dir().join("muzan-config-does-not-exist.toml");
		assert_eq!(load_overrides(&path), ConfigOverrides::default());
	}

	#[test]
	fn load_broken_file_is_default() {
		let path = std::env::temp_dir().join(format!("muzan-config-broken-{}.toml", std::process::id()));
		std::fs::write(&path, "port = [").unwrap();
		assert_eq!(load_overrides(&path), ConfigOverrides::default());
		let _ = std::fs::remove_file(&path);
	}
}
