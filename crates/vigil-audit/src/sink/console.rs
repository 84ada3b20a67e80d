// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SinkError;
use crate::event::LogLevel;
use crate::record::{format_console_line, LogRecord};
use crate::sink::{LogSink, SinkFilter};

/// Human-readable single-line sink writing to standard error.
pub struct ConsoleSink {
	filter: SinkFilter,
}

impl ConsoleSink {
	pub fn new(min_level: LogLevel) -> Self {
		Self {
			filter: SinkFilter::with_min_level(min_level),
		}
	}
}

impl Default for ConsoleSink {
	fn default() -> Self {
		Self::new(LogLevel::Info)
	}
}

#[async_trait]
impl LogSink for ConsoleSink {
	fn name(&self) -> &str {
		"console"
	}

	fn filter(&self) -> &SinkFilter {
		&self.filter
	}

	async fn publish(&self, record: Arc<LogRecord>) -> Result<(), SinkError> {
		let line = format_console_line(&record);
		let mut stderr = std::io::stderr().lock();
		writeln!(stderr, "{line}")
			.map_err(|e| SinkError::Transient(format!("console write failed: {e}")))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_threshold_is_info() {
		let sink = ConsoleSink::default();
		assert_eq!(sink.filter().min_level, LogLevel::Info);
		assert!(!sink.filter().security_only);
	}

	#[test]
	fn name_is_console() {
		assert_eq!(ConsoleSink::default().name(), "console");
	}
}
