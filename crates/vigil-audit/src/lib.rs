// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Secure audit-logging and threat-telemetry engine.
//!
//! Accepts application log entries and structured security events,
//! guarantees sensitive data never reaches a persisted or displayed output,
//! classifies events by severity, fans them out to independent sinks with
//! per-sink thresholds, and keeps a bounded in-memory event store queryable
//! by time window and severity.

pub mod config;
pub mod error;
pub mod event;
pub mod logger;
pub mod pipeline;
pub mod record;
pub mod sink;
pub mod store;
pub mod telemetry;

pub use config::{FileSinkConfig, QueueOverflowPolicy, TelemetryConfig};
pub use error::{SinkError, TelemetryError, TelemetryResult};
pub use event::{
	authentication_severity, LogLevel, SecurityEvent, SecurityEventBuilder, Severity,
	DEFAULT_RETENTION_HOURS, THREAT_DETECTION_SOURCE,
};
pub use logger::SecureLogger;
pub use pipeline::{Pipeline, RecordQueue};
pub use record::{format_console_line, format_json_line, LogRecord};
pub use sink::{ConsoleSink, LogSink, RotatingFileSink, SinkFilter};
pub use store::{EventStore, ThreatSummary};
pub use telemetry::{default_env_filter, init_tracing};

pub use vigil_redact::REDACTION_MARKER;
