// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The `SecureLogger` facade.
//!
//! One instance is constructed at process start, handed by reference to every
//! caller, and shut down (flushing pending writes) at process end. No call on
//! this facade returns an error or panics: internal faults are reported on
//! the fallback channel and swallowed.

use std::panic::Location;
use std::sync::Arc;

use chrono::{Duration, Utc};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::TelemetryConfig;
use crate::event::{
	authentication_severity, LogLevel, SecurityEvent, Severity, THREAT_DETECTION_SOURCE,
};
use crate::pipeline::{fallback_report, Pipeline};
use crate::record::LogRecord;
use crate::sink::{ConsoleSink, LogSink, RotatingFileSink, SinkFilter};
use crate::store::{EventStore, ThreatSummary};

/// The secure audit-logging and threat-telemetry engine.
///
/// Owns the event store and the sink registry. Safe for unsynchronized
/// concurrent use from any number of tasks.
pub struct SecureLogger {
	config: TelemetryConfig,
	store: EventStore,
	pipeline: Pipeline,
	sweeper: Mutex<Option<JoinHandle<()>>>,
	shutdown_tx: watch::Sender<bool>,
}

impl SecureLogger {
	/// Builds the engine with its four standard sinks: console (info+),
	/// general durable stream (trace+), security-events-only stream
	/// (warning+), errors-only stream (error+).
	///
	/// Must be called within a tokio runtime; spawns the fan-out worker and
	/// the retention sweeper.
	pub fn new(config: TelemetryConfig) -> Self {
		let sinks: Vec<Arc<dyn LogSink>> = if config.enabled {
			vec![
				Arc::new(ConsoleSink::new(config.console_min_level)),
				Arc::new(RotatingFileSink::new(
					"general",
					config.file_sink("vigil.log"),
					SinkFilter::with_min_level(LogLevel::Trace),
				)),
				Arc::new(RotatingFileSink::new(
					"security",
					config.file_sink("security.log"),
					SinkFilter::security_only(LogLevel::Warning),
				)),
				Arc::new(RotatingFileSink::new(
					"errors",
					config.file_sink("errors.log"),
					SinkFilter::with_min_level(LogLevel::Error),
				)),
			]
		} else {
			Vec::new()
		};

		Self::with_sinks(config, sinks)
	}

	/// Builds the engine with an explicit sink registry.
	pub fn with_sinks(config: TelemetryConfig, sinks: Vec<Arc<dyn LogSink>>) -> Self {
		let pipeline = Pipeline::new(sinks, config.queue_capacity, config.overflow_policy);
		let store = EventStore::new();

		let (shutdown_tx, shutdown_rx) = watch::channel(false);
		let sweeper = tokio::spawn(Self::sweeper_loop(
			store.clone(),
			Duration::hours(config.retention_hours),
			config.sweep_interval_secs,
			shutdown_rx,
		));

		Self {
			config,
			store,
			pipeline,
			sweeper: Mutex::new(Some(sweeper)),
			shutdown_tx,
		}
	}

	async fn sweeper_loop(
		store: EventStore,
		horizon: Duration,
		interval_secs: u64,
		mut shutdown_rx: watch::Receiver<bool>,
	) {
		let mut interval =
			tokio::time::interval(std::time::Duration::from_secs(interval_secs.max(1)));
		// The first tick fires immediately; skip it.
		interval.tick().await;

		loop {
			tokio::select! {
				_ = interval.tick() => {
					let evicted = store.sweep_retention(horizon);
					if evicted > 0 {
						debug!(evicted, "retention sweep evicted expired events");
					}
				}
				_ = shutdown_rx.changed() => break,
			}
		}
	}

	/// Hands a record to the pipeline. A drop is reported on the fallback
	/// channel and swallowed; the caller never sees it.
	fn submit(&self, record: LogRecord) {
		if let Err(e) = self.pipeline.publish(record) {
			fallback_report("record not queued", &e);
		}
	}

	#[track_caller]
	fn call_site() -> (String, String) {
		let location = Location::caller();
		let file = location
			.file()
			.rsplit(['/', '\\'])
			.next()
			.unwrap_or("unknown");
		let target = file.strip_suffix(".rs").unwrap_or(file).to_string();
		(target, format!("{}:{}", file, location.line()))
	}

	#[track_caller]
	fn build_record(
		&self,
		level: LogLevel,
		message: &str,
		fields: Option<Map<String, Value>>,
		security_event: Option<SecurityEvent>,
	) -> LogRecord {
		let (target, location) = Self::call_site();

		LogRecord {
			timestamp: Utc::now(),
			level,
			target,
			location,
			message: vigil_redact::redact_text(message).into_owned(),
			fields: vigil_redact::sanitize_map(fields.unwrap_or_default()),
			security_event,
		}
	}

	/// Sanitizes `message` and `fields` and routes them to sinks at `level`.
	#[track_caller]
	pub fn log(&self, level: LogLevel, message: &str, fields: Option<Map<String, Value>>) {
		let record = self.build_record(level, message, fields, None);
		self.submit(record);
	}

	/// Classifies a security event, appends it to the event store, and
	/// routes it to sinks at the severity's log level.
	#[track_caller]
	#[allow(clippy::too_many_arguments)]
	pub fn log_security_event(
		&self,
		event_type: &str,
		severity: Severity,
		source: &str,
		actor_id: Option<&str>,
		network_origin: Option<&str>,
		client_descriptor: Option<&str>,
		details: Option<Value>,
	) {
		let mut builder = SecurityEvent::builder(event_type)
			.severity(severity)
			.source(source)
			.details(details.unwrap_or(Value::Null));

		if let Some(actor) = actor_id {
			builder = builder.actor(actor);
		}
		if let Some(origin) = network_origin {
			builder = builder.network_origin(origin);
		}
		if let Some(descriptor) = client_descriptor {
			builder = builder.client_descriptor(descriptor);
		}

		let event = builder.build();
		self.store.append(event.clone());

		let record = self.build_record(
			severity.log_level(),
			&format!("Security event: {event_type}"),
			None,
			Some(event),
		);
		self.submit(record);
	}

	/// Records an ordinary user action as a low-severity security event.
	#[track_caller]
	pub fn log_user_action(&self, actor_id: &str, action: &str, details: Option<Value>) {
		self.log_security_event(
			"USER_ACTION",
			Severity::Low,
			"user_activity",
			Some(actor_id),
			None,
			None,
			Some(with_action(details, action)),
		);
	}

	/// Records an administrative action.
	///
	/// Dual-write: one entry in the general log stream plus a
	/// medium-severity security event.
	#[track_caller]
	pub fn log_admin_action(&self, actor_id: &str, action: &str, details: Option<Value>) {
		let mut fields = Map::new();
		fields.insert("actor_id".to_string(), Value::String(actor_id.to_string()));
		fields.insert("action".to_string(), Value::String(action.to_string()));
		self.log(
			LogLevel::Info,
			&format!("Admin action: {action}"),
			Some(fields),
		);

		self.log_security_event(
			"ADMIN_ACTION",
			Severity::Medium,
			"admin_activity",
			Some(actor_id),
			None,
			None,
			Some(with_action(details, action)),
		);
	}

	/// Records an authentication attempt.
	///
	/// Low severity only on an explicit success; an absent flag is treated
	/// as failure.
	#[track_caller]
	pub fn log_authentication_event(
		&self,
		actor_id: Option<&str>,
		success: Option<bool>,
		network_origin: Option<&str>,
		client_descriptor: Option<&str>,
		details: Option<Value>,
	) {
		let severity = authentication_severity(success);
		let mut details = match details {
			Some(Value::Object(map)) => map,
			Some(other) => {
				let mut map = Map::new();
				map.insert("details".to_string(), other);
				map
			}
			None => Map::new(),
		};
		details.insert(
			"success".to_string(),
			Value::Bool(success.unwrap_or(false)),
		);

		self.log_security_event(
			"AUTH_LOGIN",
			severity,
			"authentication",
			actor_id,
			network_origin,
			client_descriptor,
			Some(Value::Object(details)),
		);
	}

	/// Records suspicious activity at high severity.
	#[track_caller]
	pub fn log_suspicious_activity(
		&self,
		description: &str,
		actor_id: Option<&str>,
		network_origin: Option<&str>,
		details: Option<Value>,
	) {
		self.log_security_event(
			"SUSPICIOUS_ACTIVITY",
			Severity::High,
			THREAT_DETECTION_SOURCE,
			actor_id,
			network_origin,
			None,
			Some(with_action(details, description)),
		);
	}

	/// Records a caller-supplied error at error level.
	///
	/// Captures the error's type name and message text (sanitized) as
	/// fields; never re-raises.
	#[track_caller]
	pub fn log_error<E: std::error::Error>(
		&self,
		error: &E,
		context: Option<Map<String, Value>>,
		actor_id: Option<&str>,
		network_origin: Option<&str>,
	) {
		let mut fields = context.unwrap_or_default();
		fields.insert(
			"error_kind".to_string(),
			Value::String(std::any::type_name::<E>().to_string()),
		);
		fields.insert(
			"error".to_string(),
			Value::String(vigil_redact::redact_text(&error.to_string()).into_owned()),
		);
		if let Some(actor) = actor_id {
			fields.insert("actor_id".to_string(), Value::String(actor.to_string()));
		}
		if let Some(origin) = network_origin {
			fields.insert(
				"network_origin".to_string(),
				Value::String(origin.to_string()),
			);
		}

		let record = self.build_record(LogLevel::Error, "Application error", Some(fields), None);
		self.submit(record);
	}

	/// Stored security events within `window`, newest last, optionally
	/// filtered to one severity. `None` means all retained events.
	pub fn get_events(
		&self,
		window: Option<Duration>,
		severity: Option<Severity>,
	) -> Vec<SecurityEvent> {
		self.store.query(window, severity)
	}

	/// Aggregate threat statistics over `window`.
	pub fn get_summary(&self, window: Option<Duration>) -> ThreatSummary {
		self.store.summarize(window)
	}

	/// Runs one retention sweep immediately. Returns the eviction count.
	pub fn sweep_retention_now(&self) -> usize {
		self.store
			.sweep_retention(Duration::hours(self.config.retention_hours))
	}

	/// Records dropped by the queue overflow policy so far.
	pub fn dropped_records(&self) -> u64 {
		self.pipeline.dropped()
	}

	/// Stops the retention sweeper and drains the pipeline.
	///
	/// Call once at process teardown; pending sink writes are flushed before
	/// this returns.
	pub async fn shutdown(&self) {
		let _ = self.shutdown_tx.send(true);
		let sweeper = self.sweeper.lock().take();
		if let Some(sweeper) = sweeper {
			if let Err(e) = sweeper.await {
				fallback_report("retention sweeper join failed", &e);
			}
		}

		self.pipeline.shutdown().await;
	}
}

/// Folds a human-readable action label into the caller-supplied details.
fn with_action(details: Option<Value>, action: &str) -> Value {
	let mut map = match details {
		Some(Value::Object(map)) => map,
		Some(other) => {
			let mut map = Map::new();
			map.insert("details".to_string(), other);
			map
		}
		None => Map::new(),
	};
	map.entry("action".to_string())
		.or_insert_with(|| Value::String(action.to_string()));
	Value::Object(map)
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;
	use vigil_redact::REDACTION_MARKER;

	fn quiet_config() -> TelemetryConfig {
		// No sinks are registered through with_sinks, so nothing touches
		// the filesystem or the console.
		TelemetryConfig::default()
	}

	fn make_logger() -> SecureLogger {
		SecureLogger::with_sinks(quiet_config(), Vec::new())
	}

	#[tokio::test]
	async fn security_events_are_stored_synchronously() {
		let logger = make_logger();
		logger.log_security_event(
			"AUTH_LOGIN",
			Severity::High,
			"auth",
			Some("user-1"),
			None,
			None,
			None,
		);

		let events = logger.get_events(None, None);
		assert_eq!(events.len(), 1);
		assert_eq!(events[0].event_type, "AUTH_LOGIN");
		logger.shutdown().await;
	}

	#[tokio::test]
	async fn details_are_sanitized_before_storage() {
		let logger = make_logger();
		logger.log_security_event(
			"DATA_EXPORT",
			Severity::Medium,
			"exporter",
			None,
			None,
			None,
			Some(json!({ "password": "hunter2", "rows": 10 })),
		);

		let events = logger.get_events(None, None);
		assert_eq!(events[0].details["password"], REDACTION_MARKER);
		assert_eq!(events[0].details["rows"], 10);
		logger.shutdown().await;
	}

	#[tokio::test]
	async fn authentication_severity_policy() {
		let logger = make_logger();
		logger.log_authentication_event(Some("u"), Some(true), None, None, None);
		logger.log_authentication_event(Some("u"), Some(false), None, None, None);
		logger.log_authentication_event(Some("u"), None, None, None, None);

		let events = logger.get_events(None, None);
		assert_eq!(events[0].severity, Severity::Low);
		assert_eq!(events[1].severity, Severity::High);
		assert_eq!(events[2].severity, Severity::High);
		assert_eq!(events[1].details["success"], false);
		assert_eq!(events[2].details["success"], false);
		logger.shutdown().await;
	}

	#[tokio::test]
	async fn suspicious_activity_is_high_and_threat_detection() {
		let logger = make_logger();
		logger.log_suspicious_activity("rate limit evasion", Some("u9"), Some("203.0.113.9"), None);

		let events = logger.get_events(None, None);
		assert_eq!(events[0].severity, Severity::High);
		assert_eq!(events[0].source, THREAT_DETECTION_SOURCE);
		// The origin string itself is stored on the event, not inside
		// details, so it survives for summarization.
		assert_eq!(events[0].network_origin.as_deref(), Some("203.0.113.9"));
		logger.shutdown().await;
	}

	#[tokio::test]
	async fn admin_action_is_medium_severity() {
		let logger = make_logger();
		logger.log_admin_action("admin-1", "purged cache", None);

		let events = logger.get_events(None, None);
		assert_eq!(events.len(), 1);
		assert_eq!(events[0].severity, Severity::Medium);
		assert_eq!(events[0].details["action"], "purged cache");
		logger.shutdown().await;
	}

	#[tokio::test]
	async fn summary_matches_stored_events() {
		let logger = make_logger();
		logger.log_security_event("A", Severity::Low, "s", Some("u1"), None, None, None);
		logger.log_security_event("B", Severity::High, "s", Some("u2"), None, None, None);
		logger.log_security_event("C", Severity::Critical, "s", Some("u1"), None, None, None);

		let summary = logger.get_summary(Some(Duration::hours(1)));
		assert_eq!(summary.total_events, 3);
		assert_eq!(summary.low_events, 1);
		assert_eq!(summary.medium_events, 0);
		assert_eq!(summary.high_events, 1);
		assert_eq!(summary.critical_events, 1);
		assert_eq!(summary.distinct_actors, 2);
		logger.shutdown().await;
	}

	#[tokio::test]
	async fn log_error_records_kind_and_sanitized_message() {
		let logger = make_logger();
		let error = std::io::Error::new(
			std::io::ErrorKind::PermissionDenied,
			"denied for token=abc123",
		);

		// Only verifying it neither panics nor stores a security event.
		logger.log_error(&error, None, Some("u1"), None);
		assert!(logger.get_events(None, None).is_empty());
		logger.shutdown().await;
	}

	#[tokio::test]
	async fn logging_after_shutdown_is_swallowed() {
		let logger = make_logger();
		logger.shutdown().await;

		// The closed queue rejects the records internally; the facade stays
		// infallible and the store still accepts the event.
		logger.log(LogLevel::Info, "late record", None);
		logger.log_security_event("LATE", Severity::Low, "s", None, None, None, None);
		assert_eq!(logger.get_events(None, None).len(), 1);
	}

	#[tokio::test]
	async fn shutdown_is_idempotent_enough_for_teardown() {
		let logger = make_logger();
		logger.shutdown().await;
		// A second shutdown finds no sweeper handle and a closed queue.
		logger.shutdown().await;
	}
}
