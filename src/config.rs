use std::{env, fmt::Display, net::IpAddr, str::FromStr};

use tracing::level_filters::LevelFilter;

/// 10 MiB
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("invalid {key} value {value:?}: {reason}")]
	Invalid {
		key: &'static str,
		value: String,
		reason: String,
	},
}

/// Settings read from the environment (and `.env`, if present).
#[derive(Debug, Clone)]
pub struct Config {
	/// Without a database, everything is kept in memory.
	pub database_url: Option<String>,
	pub host: IpAddr,
	pub port: u16,
	/// The base URL uploaded objects are served from.
	pub public_url: String,
	pub log_level: LevelFilter,
	pub otlp_endpoint: Option<String>,
	pub max_upload_bytes: usize,
}

impl Config {
	pub fn from_env() -> Result<Self, ConfigError> {
		dotenvy::dotenv().ok();

		let host = parse("HOST", "127.0.0.1")?;
		let port = parse("PORT", "3000")?;
		let public_url = var("PUBLIC_URL").unwrap_or_else(|| format!("http://{host}:{port}"));

		Ok(Self {
			database_url: var("DATABASE_URL"),
			host,
			port,
			public_url,
			log_level: parse("LOG_LEVEL", "info")?,
			otlp_endpoint: var("OTEL_EXPORTER_OTLP_ENDPOINT"),
			max_upload_bytes: parse("MAX_UPLOAD_BYTES", &DEFAULT_MAX_UPLOAD_BYTES.to_string())?,
		})
	}
}

/// A set, non-empty variable.
fn var(key: &str) -> Option<String> {
	env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
	T::Err: Display,
{
	let value = var(key).unwrap_or_else(|| default.to_owned());

	value.parse().map_err(|error: T::Err| ConfigError::Invalid {
		key,
		reason: error.to_string(),
		value,
	})
}
