// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Bounded, time-windowed store of security events.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::event::{SecurityEvent, Severity};

/// Aggregate statistics over a time window of stored security events.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ThreatSummary {
	pub total_events: u64,
	pub low_events: u64,
	pub medium_events: u64,
	pub high_events: u64,
	pub critical_events: u64,
	/// Distinct non-null actor identifiers in the window.
	pub distinct_actors: u64,
	/// Distinct non-null network origins in the window.
	pub distinct_origins: u64,
	/// Occurrences per event type in the window.
	pub events_by_type: BTreeMap<String, u64>,
}

/// Insertion-ordered store of security events with front-only eviction.
///
/// Appends keep store-observed timestamps monotonically non-decreasing, so
/// retention sweeps only ever remove from the front. Reads take a snapshot;
/// mutation is exclusive.
#[derive(Clone, Default)]
pub struct EventStore {
	inner: Arc<RwLock<VecDeque<SecurityEvent>>>,
}

impl EventStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends an event, clamping a timestamp that would regress below the
	/// current tail. Concurrent callers may build events in any order; the
	/// store's view stays non-decreasing.
	pub fn append(&self, mut event: SecurityEvent) {
		let mut events = self.inner.write();
		if let Some(last) = events.back() {
			if event.timestamp < last.timestamp {
				event.timestamp = last.timestamp;
			}
		}
		events.push_back(event);
	}

	/// Events with `timestamp >= now - window`, in insertion order,
	/// optionally filtered to one severity. A `None` window means all
	/// retained events.
	pub fn query(
		&self,
		window: Option<Duration>,
		severity: Option<Severity>,
	) -> Vec<SecurityEvent> {
		let cutoff = window.map(|w| Utc::now() - w);
		self.query_at(cutoff, severity)
	}

	fn query_at(
		&self,
		cutoff: Option<DateTime<Utc>>,
		severity: Option<Severity>,
	) -> Vec<SecurityEvent> {
		let events = self.inner.read();

		events
			.iter()
			.filter(|e| {
				if let Some(cutoff) = cutoff {
					if e.timestamp < cutoff {
						return false;
					}
				}
				if let Some(severity) = severity {
					if e.severity != severity {
						return false;
					}
				}
				true
			})
			.cloned()
			.collect()
	}

	/// Removes every event older than `horizon`. Timestamps are
	/// non-decreasing, so eviction only pops from the front. Returns the
	/// number of events evicted.
	pub fn sweep_retention(&self, horizon: Duration) -> usize {
		let cutoff = Utc::now() - horizon;
		let mut events = self.inner.write();

		let mut evicted = 0;
		while let Some(front) = events.front() {
			if front.timestamp >= cutoff {
				break;
			}
			events.pop_front();
			evicted += 1;
		}

		evicted
	}

	/// Computes the [`ThreatSummary`] over `query(window)`.
	pub fn summarize(&self, window: Option<Duration>) -> ThreatSummary {
		let events = self.query(window, None);

		let mut summary = ThreatSummary::default();
		let mut actors: HashSet<&str> = HashSet::new();
		let mut origins: HashSet<&str> = HashSet::new();

		for event in &events {
			summary.total_events += 1;
			match event.severity {
				Severity::Low => summary.low_events += 1,
				Severity::Medium => summary.medium_events += 1,
				Severity::High => summary.high_events += 1,
				Severity::Critical => summary.critical_events += 1,
			}

			if let Some(ref actor) = event.actor_id {
				actors.insert(actor);
			}
			if let Some(ref origin) = event.network_origin {
				origins.insert(origin);
			}

			*summary
				.events_by_type
				.entry(event.event_type.clone())
				.or_insert(0) += 1;
		}

		summary.distinct_actors = actors.len() as u64;
		summary.distinct_origins = origins.len() as u64;
		summary
	}

	/// Number of events currently retained.
	pub fn len(&self) -> usize {
		self.inner.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.read().is_empty()
	}
}
