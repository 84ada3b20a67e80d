// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Process-level tracing bootstrap.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Crates whose own loggers are capped at `warn` so they cannot flood the
/// structured log. Startup contract, not engine behavior.
const NOISY_CRATES: &[&str] = &["hyper", "reqwest", "h2", "rustls", "sqlx", "tokio_util"];

/// Builds the default environment filter: `RUST_LOG` wins, otherwise `info`
/// with third-party client crates capped at `warn`.
pub fn default_env_filter() -> EnvFilter {
	let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

	for krate in NOISY_CRATES {
		if let Ok(directive) = format!("{krate}=warn").parse() {
			filter = filter.add_directive(directive);
		}
	}

	filter
}

/// Initializes the global tracing subscriber. Safe to call more than once;
/// later calls are no-ops.
pub fn init_tracing() {
	let _ = tracing_subscriber::registry()
		.with(default_env_filter())
		.with(tracing_subscriber::fmt::layer())
		.try_init();
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn init_is_idempotent() {
		init_tracing();
		init_tracing();
	}

	#[test]
	fn filter_builds_without_env() {
		let _ = default_env_filter();
	}
}
