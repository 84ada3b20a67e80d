// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Engine configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::event::{LogLevel, DEFAULT_RETENTION_HOURS};

/// What to do when the record queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QueueOverflowPolicy {
	/// Evict the oldest queued non-critical record to admit the new one.
	#[default]
	DropOldest,
	/// Drop the new record.
	DropNewest,
}

/// Configuration for one rotating file sink.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileSinkConfig {
	pub path: PathBuf,
	/// Rotate once the active file would exceed this many bytes.
	pub max_bytes: u64,
	/// Historical files retained after rotation.
	pub max_backups: usize,
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TelemetryConfig {
	pub enabled: bool,
	/// Bounded record queue capacity.
	pub queue_capacity: usize,
	pub overflow_policy: QueueOverflowPolicy,
	/// Retention horizon for stored security events, in hours.
	pub retention_hours: i64,
	/// Cadence of the retention sweep, in seconds.
	pub sweep_interval_secs: u64,
	/// Console sink threshold.
	pub console_min_level: LogLevel,
	/// Directory holding the durable log streams.
	pub log_dir: PathBuf,
	pub max_file_bytes: u64,
	pub max_backups: usize,
}

fn default_queue_capacity() -> usize {
	1024
}

fn default_max_file_bytes() -> u64 {
	10 * 1024 * 1024
}

impl Default for TelemetryConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			queue_capacity: default_queue_capacity(),
			overflow_policy: QueueOverflowPolicy::default(),
			retention_hours: DEFAULT_RETENTION_HOURS,
			sweep_interval_secs: 30,
			console_min_level: LogLevel::Info,
			log_dir: PathBuf::from("logs"),
			max_file_bytes: default_max_file_bytes(),
			max_backups: 5,
		}
	}
}

impl TelemetryConfig {
	/// Loads configuration from `VIGIL_*` environment variables layered over
	/// the defaults. Malformed values fall back to the default rather than
	/// failing startup.
	pub fn from_env() -> Self {
		let mut config = Self::default();

		if let Ok(v) = std::env::var("VIGIL_ENABLED") {
			config.enabled = !matches!(v.to_lowercase().as_str(), "0" | "false" | "off");
		}
		if let Ok(v) = std::env::var("VIGIL_QUEUE_CAPACITY") {
			if let Ok(n) = v.parse() {
				config.queue_capacity = n;
			}
		}
		if let Ok(v) = std::env::var("VIGIL_OVERFLOW_POLICY") {
			config.overflow_policy = match v.to_lowercase().as_str() {
				"drop_newest" => QueueOverflowPolicy::DropNewest,
				_ => QueueOverflowPolicy::DropOldest,
			};
		}
		if let Ok(v) = std::env::var("VIGIL_RETENTION_HOURS") {
			if let Ok(n) = v.parse() {
				config.retention_hours = n;
			}
		}
		if let Ok(v) = std::env::var("VIGIL_SWEEP_INTERVAL_SECS") {
			if let Ok(n) = v.parse() {
				config.sweep_interval_secs = n;
			}
		}
		if let Ok(v) = std::env::var("VIGIL_CONSOLE_MIN_LEVEL") {
			config.console_min_level = LogLevel::parse_lenient(&v);
		}
		if let Ok(v) = std::env::var("VIGIL_LOG_DIR") {
			config.log_dir = PathBuf::from(v);
		}
		if let Ok(v) = std::env::var("VIGIL_MAX_FILE_BYTES") {
			if let Ok(n) = v.parse() {
				config.max_file_bytes = n;
			}
		}
		if let Ok(v) = std::env::var("VIGIL_MAX_BACKUPS") {
			if let Ok(n) = v.parse() {
				config.max_backups = n;
			}
		}

		config
	}

	/// Config for one of the durable streams under `log_dir`.
	pub fn file_sink(&self, file_name: &str) -> FileSinkConfig {
		FileSinkConfig {
			path: self.log_dir.join(file_name),
			max_bytes: self.max_file_bytes,
			max_backups: self.max_backups,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults() {
		let config = TelemetryConfig::default();
		assert!(config.enabled);
		assert_eq!(config.queue_capacity, 1024);
		assert_eq!(config.overflow_policy, QueueOverflowPolicy::DropOldest);
		assert_eq!(config.retention_hours, DEFAULT_RETENTION_HOURS);
		assert_eq!(config.sweep_interval_secs, 30);
		assert_eq!(config.console_min_level, LogLevel::Info);
		assert_eq!(config.max_backups, 5);
	}

	#[test]
	fn file_sink_paths_live_under_log_dir() {
		let config = TelemetryConfig {
			log_dir: PathBuf::from("/var/log/vigil"),
			..Default::default()
		};
		let sink = config.file_sink("security.log");
		assert_eq!(sink.path, PathBuf::from("/var/log/vigil/security.log"));
		assert_eq!(sink.max_bytes, config.max_file_bytes);
		assert_eq!(sink.max_backups, config.max_backups);
	}

	#[test]
	fn overflow_policy_serde_is_snake_case() {
		let parsed: QueueOverflowPolicy = serde_json::from_str("\"drop_newest\"").unwrap();
		assert_eq!(parsed, QueueOverflowPolicy::DropNewest);
		assert_eq!(
			serde_json::to_string(&QueueOverflowPolicy::DropOldest).unwrap(),
			"\"drop_oldest\""
		);
	}
}
