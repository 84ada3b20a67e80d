// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use thiserror::Error;

pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Internal fault taxonomy.
///
/// Produced by the queue and the fan-out worker. None of these ever cross
/// the [`crate::SecureLogger`] facade: they are reported on the fallback
/// channel and discarded.
#[derive(Error, Debug)]
pub enum TelemetryError {
	#[error("record queue is at capacity")]
	QueueFull,

	#[error("sink '{sink}' error: {source}")]
	Sink {
		sink: String,
		#[source]
		source: SinkError,
	},

	#[error("engine is shutting down")]
	Shutdown,
}

#[derive(Error, Debug)]
pub enum SinkError {
	#[error("transient error: {0}")]
	Transient(String),

	#[error("permanent error: {0}")]
	Permanent(String),
}
