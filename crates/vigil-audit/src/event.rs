// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core event types for the telemetry engine.
//!
//! This module provides:
//!
//! - [`Severity`]: ordered threat-severity classification
//! - [`LogLevel`]: ordered log levels driving sink routing
//! - [`SecurityEvent`]: the canonical security event record
//! - [`SecurityEventBuilder`]: fluent API for constructing events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Default retention horizon for stored security events, in hours.
pub const DEFAULT_RETENTION_HOURS: i64 = 24;

/// Source label attached to events raised by suspicious-activity detection.
pub const THREAT_DETECTION_SOURCE: &str = "threat_detection";

/// Severity of a security event, ordered from least to most serious.
#[derive(
	Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
	Low,
	#[default]
	Medium,
	High,
	Critical,
}

impl Severity {
	/// The log level a security event of this severity is routed at.
	pub fn log_level(&self) -> LogLevel {
		match self {
			Severity::Low => LogLevel::Info,
			Severity::Medium => LogLevel::Warning,
			Severity::High => LogLevel::Error,
			Severity::Critical => LogLevel::Critical,
		}
	}

	/// The severity corresponding to a log level.
	pub fn from_log_level(level: LogLevel) -> Self {
		match level {
			LogLevel::Trace | LogLevel::Debug | LogLevel::Info => Severity::Low,
			LogLevel::Warning => Severity::Medium,
			LogLevel::Error => Severity::High,
			LogLevel::Critical => Severity::Critical,
		}
	}

	/// Parses a severity name, defaulting to `Medium` for anything
	/// unrecognized. Losing a security event over a malformed severity is
	/// worse than misclassifying it, so this never fails.
	pub fn parse_lenient(name: &str) -> Self {
		match name.trim().to_lowercase().as_str() {
			"low" => Severity::Low,
			"medium" => Severity::Medium,
			"high" => Severity::High,
			"critical" => Severity::Critical,
			_ => Severity::Medium,
		}
	}

	/// All severities, least to most serious.
	pub fn all() -> &'static [Severity] {
		&[
			Severity::Low,
			Severity::Medium,
			Severity::High,
			Severity::Critical,
		]
	}
}

impl fmt::Display for Severity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			Severity::Low => "low",
			Severity::Medium => "medium",
			Severity::High => "high",
			Severity::Critical => "critical",
		};
		write!(f, "{s}")
	}
}

/// Log levels driving sink thresholds, ordered from least to most severe.
#[derive(
	Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
	Trace,
	Debug,
	#[default]
	Info,
	Warning,
	Error,
	Critical,
}

impl LogLevel {
	/// Uppercase label used by the console renderer.
	pub fn label(&self) -> &'static str {
		match self {
			LogLevel::Trace => "TRACE",
			LogLevel::Debug => "DEBUG",
			LogLevel::Info => "INFO",
			LogLevel::Warning => "WARNING",
			LogLevel::Error => "ERROR",
			LogLevel::Critical => "CRITICAL",
		}
	}

	/// Parses a level name, defaulting to `Info` for anything unrecognized.
	pub fn parse_lenient(name: &str) -> Self {
		match name.trim().to_lowercase().as_str() {
			"trace" => LogLevel::Trace,
			"debug" => LogLevel::Debug,
			"info" => LogLevel::Info,
			"warn" | "warning" => LogLevel::Warning,
			"error" => LogLevel::Error,
			"critical" => LogLevel::Critical,
			_ => LogLevel::Info,
		}
	}
}

impl fmt::Display for LogLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			LogLevel::Trace => "trace",
			LogLevel::Debug => "debug",
			LogLevel::Info => "info",
			LogLevel::Warning => "warning",
			LogLevel::Error => "error",
			LogLevel::Critical => "critical",
		};
		write!(f, "{s}")
	}
}

/// The severity assigned to an authentication event.
///
/// An absent success flag is treated as failure: a lost or unknown outcome
/// must not be classified as a benign login.
pub fn authentication_severity(success: Option<bool>) -> Severity {
	if success == Some(true) {
		Severity::Low
	} else {
		Severity::High
	}
}

/// A security event recorded by the telemetry engine.
///
/// Immutable once built. `timestamp` is always assigned at construction and
/// `details` has already passed through sanitization, so a constructed event
/// can never carry a raw sensitive value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityEvent {
	/// Unique identifier for this event.
	pub id: Uuid,
	/// When the event was recorded (server-side, never caller-supplied).
	pub timestamp: DateTime<Utc>,
	/// Caller-supplied category, e.g. `AUTH_LOGIN`.
	pub event_type: String,
	/// Severity classification.
	pub severity: Severity,
	/// The subsystem that raised the event.
	pub source: String,
	/// The user or admin the event is attributed to, if known.
	pub actor_id: Option<String>,
	/// Originating network address, if known.
	pub network_origin: Option<String>,
	/// Client or user-agent label, if known.
	pub client_descriptor: Option<String>,
	/// Sanitized event-specific details.
	pub details: Value,
}

impl SecurityEvent {
	/// Create a new builder for the given event type.
	pub fn builder(event_type: impl Into<String>) -> SecurityEventBuilder {
		SecurityEventBuilder::new(event_type)
	}
}

/// Builder for constructing security events with a fluent API.
#[derive(Debug, Clone)]
pub struct SecurityEventBuilder {
	event_type: String,
	severity: Severity,
	source: String,
	actor_id: Option<String>,
	network_origin: Option<String>,
	client_descriptor: Option<String>,
	details: Value,
}

impl SecurityEventBuilder {
	pub fn new(event_type: impl Into<String>) -> Self {
		Self {
			event_type: event_type.into(),
			severity: Severity::default(),
			source: "application".to_string(),
			actor_id: None,
			network_origin: None,
			client_descriptor: None,
			details: Value::Null,
		}
	}

	/// Set the severity. Defaults to `Medium`.
	pub fn severity(mut self, severity: Severity) -> Self {
		self.severity = severity;
		self
	}

	/// Set the subsystem that raised the event.
	pub fn source(mut self, source: impl Into<String>) -> Self {
		self.source = source.into();
		self
	}

	/// Set the actor the event is attributed to.
	pub fn actor(mut self, actor_id: impl Into<String>) -> Self {
		self.actor_id = Some(actor_id.into());
		self
	}

	/// Set the originating network address.
	pub fn network_origin(mut self, origin: impl Into<String>) -> Self {
		self.network_origin = Some(origin.into());
		self
	}

	/// Set the client or user-agent label.
	pub fn client_descriptor(mut self, descriptor: impl Into<String>) -> Self {
		self.client_descriptor = Some(descriptor.into());
		self
	}

	/// Set event-specific details. Sanitized at build time.
	pub fn details(mut self, details: Value) -> Self {
		self.details = details;
		self
	}

	/// Build the event, assigning id and timestamp and sanitizing details.
	pub fn build(self) -> SecurityEvent {
		let mut details = self.details;
		vigil_redact::sanitize_value(&mut details);

		SecurityEvent {
			id: Uuid::new_v4(),
			timestamp: Utc::now(),
			event_type: self.event_type,
			severity: self.severity,
			source: self.source,
			actor_id: self.actor_id,
			network_origin: self.network_origin,
			client_descriptor: self.client_descriptor,
			details,
		}
	}
}
