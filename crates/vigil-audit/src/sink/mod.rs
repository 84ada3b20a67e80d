// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Sink trait and delivery filtering.

pub mod console;
pub mod file;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SinkError;
use crate::event::LogLevel;
use crate::record::LogRecord;

pub use console::ConsoleSink;
pub use file::RotatingFileSink;

/// Delivery threshold for one sink.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SinkFilter {
	/// Inclusive minimum level.
	pub min_level: LogLevel,
	/// When set, only records carrying a security event are delivered.
	pub security_only: bool,
}

impl Default for SinkFilter {
	fn default() -> Self {
		Self {
			min_level: LogLevel::Info,
			security_only: false,
		}
	}
}

impl SinkFilter {
	pub fn with_min_level(min_level: LogLevel) -> Self {
		Self {
			min_level,
			security_only: false,
		}
	}

	pub fn security_only(min_level: LogLevel) -> Self {
		Self {
			min_level,
			security_only: true,
		}
	}

	pub fn allows(&self, record: &LogRecord) -> bool {
		if record.level < self.min_level {
			return false;
		}
		if self.security_only && !record.is_security() {
			return false;
		}
		true
	}
}

/// An independent output destination for log records.
///
/// Sinks receive already-sanitized records. A sink failure is local: the
/// pipeline reports it on the fallback channel and continues with the
/// remaining sinks.
#[async_trait]
pub trait LogSink: Send + Sync {
	fn name(&self) -> &str;

	fn filter(&self) -> &SinkFilter;

	async fn publish(&self, record: Arc<LogRecord>) -> Result<(), SinkError>;
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::event::{SecurityEvent, Severity};
	use chrono::Utc;
	use serde_json::Map;

	fn make_record(level: LogLevel, security: bool) -> LogRecord {
		LogRecord {
			timestamp: Utc::now(),
			level,
			target: "test".to_string(),
			location: "test.rs:1".to_string(),
			message: "m".to_string(),
			fields: Map::new(),
			security_event: security.then(|| {
				SecurityEvent::builder("T").severity(Severity::Medium).build()
			}),
		}
	}

	#[test]
	fn min_level_is_inclusive() {
		let filter = SinkFilter::with_min_level(LogLevel::Warning);
		assert!(!filter.allows(&make_record(LogLevel::Info, false)));
		assert!(filter.allows(&make_record(LogLevel::Warning, false)));
		assert!(filter.allows(&make_record(LogLevel::Error, false)));
	}

	#[test]
	fn security_only_drops_plain_records() {
		let filter = SinkFilter::security_only(LogLevel::Warning);
		assert!(!filter.allows(&make_record(LogLevel::Error, false)));
		assert!(filter.allows(&make_record(LogLevel::Error, true)));
		assert!(!filter.allows(&make_record(LogLevel::Info, true)));
	}

	#[test]
	fn default_filter_is_info_and_above() {
		let filter = SinkFilter::default();
		assert!(!filter.allows(&make_record(LogLevel::Debug, false)));
		assert!(filter.allows(&make_record(LogLevel::Info, false)));
	}
}

#[cfg(test)]
mod proptests {
	use super::*;
	use crate::event::{SecurityEvent, Severity};
	use chrono::Utc;
	use proptest::prelude::*;
	use serde_json::Map;

	fn arb_level() -> impl Strategy<Value = LogLevel> {
		prop_oneof![
			Just(LogLevel::Trace),
			Just(LogLevel::Debug),
			Just(LogLevel::Info),
			Just(LogLevel::Warning),
			Just(LogLevel::Error),
			Just(LogLevel::Critical),
		]
	}

	fn make_record(level: LogLevel, security: bool) -> LogRecord {
		LogRecord {
			timestamp: Utc::now(),
			level,
			target: "test".to_string(),
			location: "test.rs:1".to_string(),
			message: "m".to_string(),
			fields: Map::new(),
			security_event: security.then(|| {
				SecurityEvent::builder("T").severity(Severity::Medium).build()
			}),
		}
	}

	proptest! {
		#[test]
		fn level_threshold_is_monotonic(
			min in arb_level(),
			level in arb_level(),
			security in any::<bool>(),
		) {
			let filter = SinkFilter { min_level: min, security_only: false };
			let record = make_record(level, security);
			prop_assert_eq!(filter.allows(&record), level >= min);
		}

		#[test]
		fn security_only_never_passes_plain_records(
			min in arb_level(),
			level in arb_level(),
		) {
			let filter = SinkFilter { min_level: min, security_only: true };
			let record = make_record(level, false);
			prop_assert!(!filter.allows(&record));
		}
	}
}
