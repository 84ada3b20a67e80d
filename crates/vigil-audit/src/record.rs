// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The record routed through the pipeline to sinks.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SinkError;
use crate::event::{LogLevel, SecurityEvent, Severity};

/// A single sanitized log record ready for sink delivery.
///
/// Every field has passed through sanitization before the record is built;
/// sinks render it without further inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
	/// When the record was created.
	pub timestamp: DateTime<Utc>,
	/// Routing level.
	pub level: LogLevel,
	/// Originating module path.
	pub target: String,
	/// Call site as `file:line`.
	pub location: String,
	/// Sanitized message text.
	pub message: String,
	/// Sanitized extra fields.
	pub fields: Map<String, Value>,
	/// Present when this record carries a security event.
	pub security_event: Option<SecurityEvent>,
}

impl LogRecord {
	/// Whether this record carries a security event.
	pub fn is_security(&self) -> bool {
		self.security_event.is_some()
	}
}

/// Renders a record as one self-contained JSON line for durable sinks.
///
/// Extra fields are flattened into the top-level object so downstream tooling
/// can query them without unwrapping.
pub fn format_json_line(record: &LogRecord) -> Result<String, SinkError> {
	let mut object = Map::new();

	object.insert(
		"timestamp".to_string(),
		Value::String(record.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)),
	);
	object.insert(
		"level".to_string(),
		Value::String(record.level.to_string()),
	);
	// Every line carries a severity so downstream tooling can classify plain
	// records and security events on one axis. For security records the
	// level round-trips to the embedded event's severity.
	object.insert(
		"severity".to_string(),
		Value::String(Severity::from_log_level(record.level).to_string()),
	);
	object.insert("target".to_string(), Value::String(record.target.clone()));
	object.insert(
		"location".to_string(),
		Value::String(record.location.clone()),
	);
	object.insert(
		"message".to_string(),
		Value::String(record.message.clone()),
	);

	for (key, value) in &record.fields {
		// Flattened fields must not shadow the envelope.
		if !object.contains_key(key) {
			object.insert(key.clone(), value.clone());
		}
	}

	if let Some(ref event) = record.security_event {
		let event_json = serde_json::to_value(event)
			.map_err(|e| SinkError::Permanent(format!("event serialization failed: {e}")))?;
		object.insert("security_event".to_string(), event_json);
	}

	let json = serde_json::to_string(&Value::Object(object))
		.map_err(|e| SinkError::Permanent(format!("JSON serialization failed: {e}")))?;
	Ok(format!("{json}\n"))
}

/// Renders a record as a single human-readable console line:
/// `[timestamp] [LEVEL] [target:location] - message key=value ...`
pub fn format_console_line(record: &LogRecord) -> String {
	let mut line = format!(
		"[{}] [{}] [{}:{}] - {}",
		record.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
		record.level.label(),
		record.target,
		record.location,
		record.message,
	);

	for (key, value) in &record.fields {
		match value {
			Value::String(s) => line.push_str(&format!(" {key}={s}")),
			other => line.push_str(&format!(" {key}={other}")),
		}
	}

	if let Some(ref event) = record.security_event {
		line.push_str(&format!(
			" event_type={} severity={} source={}",
			event.event_type, event.severity, event.source
		));
	}

	line
}
